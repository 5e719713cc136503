use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An exercise as the REST surface returns it. A sequence is `None` when the
/// gateway omitted it and `Some(vec![])` when it came back as `[]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exercise {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscle_groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExerciseList {
    pub exercises: Vec<Exercise>,
}

/// Filters for [`ExerciseClient::list`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscle_group: Option<String>,
}

/// Error body returned by the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub code: i32,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid gateway URL: {0}")]
    Url(String),

    #[error("gateway returned {}: {}", .0.status, .0.message)]
    Api(ApiError),
}

pub struct ExerciseClient {
    client: Client,
    base_url: Url,
}

impl ExerciseClient {
    pub fn new(base_url: &str) -> Result<Self, SdkError> {
        let base_url = Url::parse(base_url).map_err(|e| SdkError::Url(e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// `/v1/exercises`, plus `id` as one escaped segment when given.
    fn url(&self, id: Option<&str>) -> Result<Url, SdkError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SdkError::Url(self.base_url.to_string()))?;
            segments.pop_if_empty().push("v1").push("exercises");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, id: Option<&str>) -> Result<RequestBuilder, SdkError> {
        Ok(self.client.request(method, self.url(id)?))
    }

    pub async fn create(&self, exercise: &Exercise) -> Result<Exercise, SdkError> {
        let res = self.request(Method::POST, None)?.json(exercise).send().await?;
        decode(res).await
    }

    pub async fn get(&self, id: &str) -> Result<Exercise, SdkError> {
        let res = self.request(Method::GET, Some(id))?.send().await?;
        decode(res).await
    }

    /// Partial update. Only the keys present in `patch` are written.
    pub async fn update(&self, id: &str, patch: &serde_json::Value) -> Result<Exercise, SdkError> {
        let res = self
            .request(Method::PATCH, Some(id))?
            .json(patch)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), SdkError> {
        let res = self.request(Method::DELETE, Some(id))?.send().await?;
        decode::<serde_json::Value>(res).await.map(|_| ())
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ExerciseList, SdkError> {
        let res = self.request(Method::GET, None)?.query(query).send().await?;
        decode(res).await
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, SdkError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }

    let text = res.text().await?;
    let mut error = serde_json::from_str::<ApiError>(&text).unwrap_or(ApiError {
        status: 0,
        code: 2,
        message: text,
    });
    error.status = status.as_u16();
    Err(SdkError::Api(error))
}
