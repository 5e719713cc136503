//! MongoDB exercise store.
//!
//! # Responsibilities
//! - Connect to the configured deployment and verify it with a ping
//! - Translate between `StoredExercise` and the collection's documents
//! - Map driver failures onto `StoreError`
//!
//! # Design Decisions
//! - Ids are ObjectIds on disk and 24-char hex strings everywhere else
//! - Empty strings and missing sequences are omitted on insert and `$unset`
//!   on update; a present sequence is stored even when empty, so `[]` reads
//!   back as `[]`
//! - No timeouts beyond the driver's own connection settings

use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::error::{Error as DriverError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::storage::{
    ExerciseField, ExerciseStore, ListFilter, StoreError, StoreResult, StoredExercise, UpdateMask,
};

/// Duplicate key and write conflict server codes.
const CONFLICT_CODES: [i32; 2] = [11000, 112];

/// Document layout of the `exercises` collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ExerciseDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    kind: String,

    #[serde(rename = "category", default, skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    muscles: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    muscle_groups: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    videos: Option<Vec<String>>,
}

impl From<ExerciseDocument> for StoredExercise {
    fn from(document: ExerciseDocument) -> Self {
        Self {
            id: document.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            name: document.name,
            kind: document.kind,
            categories: document.categories,
            muscles: document.muscles,
            muscle_groups: document.muscle_groups,
            images: document.images,
            videos: document.videos,
        }
    }
}

impl ExerciseDocument {
    /// Build an insertable document. The caller's id is discarded.
    fn for_insert(exercise: StoredExercise) -> Self {
        Self {
            id: None,
            name: exercise.name,
            kind: exercise.kind,
            categories: exercise.categories,
            muscles: exercise.muscles,
            muscle_groups: exercise.muscle_groups,
            images: exercise.images,
            videos: exercise.videos,
        }
    }
}

/// Stored key of a field.
fn column(field: ExerciseField) -> &'static str {
    match field {
        ExerciseField::Categories => "category",
        other => other.as_str(),
    }
}

/// Split the masked fields into `$set` and `$unset` documents.
fn update_document(exercise: &StoredExercise, mask: &UpdateMask) -> Document {
    let mut set = Document::new();
    let mut unset = Document::new();

    let text = |value: &String| (!value.is_empty()).then(|| Bson::from(value.as_str()));
    let sequence = |values: &Option<Vec<String>>| values.clone().map(Bson::from);

    for field in mask.iter() {
        let value = match field {
            ExerciseField::Name => text(&exercise.name),
            ExerciseField::Kind => text(&exercise.kind),
            ExerciseField::Categories => sequence(&exercise.categories),
            ExerciseField::Muscles => sequence(&exercise.muscles),
            ExerciseField::MuscleGroups => sequence(&exercise.muscle_groups),
            ExerciseField::Images => sequence(&exercise.images),
            ExerciseField::Videos => sequence(&exercise.videos),
        };
        match value {
            Some(value) => set.insert(column(field), value),
            None => unset.insert(column(field), ""),
        };
    }

    let mut update = Document::new();
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}

fn filter_document(filter: &ListFilter) -> Document {
    let mut query = Document::new();
    if let Some(kind) = &filter.kind {
        query.insert("kind", kind.as_str());
    }
    if let Some(name) = &filter.name {
        query.insert("name", name.as_str());
    }
    if let Some(group) = &filter.muscle_group {
        query.insert("muscle_groups", group.as_str());
    }
    query
}

fn parse_object_id(id: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

fn classify(err: DriverError) -> StoreError {
    let message = err.to_string();
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) if CONFLICT_CODES.contains(&e.code) => {
            StoreError::WriteConflict(message)
        }
        ErrorKind::Command(e) if CONFLICT_CODES.contains(&e.code) => {
            StoreError::WriteConflict(message)
        }
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => StoreError::Unavailable(message),
        _ => StoreError::Internal(message),
    }
}

/// Exercise store backed by a MongoDB collection.
pub struct MongoStore {
    client: Client,
    collection: Collection<ExerciseDocument>,
}

impl MongoStore {
    /// Connect to the configured deployment and ping it once.
    pub async fn connect(config: &StorageConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.uri).await.map_err(classify)?;
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options).map_err(classify)?;
        let database = client.database(&config.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(classify)?;

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "MongoDB store connected"
        );

        Ok(Self {
            collection: database.collection(&config.collection),
            client,
        })
    }

    /// Close the driver's connection pools.
    pub async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("MongoDB connection closed");
    }
}

#[async_trait]
impl ExerciseStore for MongoStore {
    async fn create(&self, exercise: StoredExercise) -> StoreResult<StoredExercise> {
        let document = ExerciseDocument::for_insert(exercise);
        let result = self
            .collection
            .insert_one(&document)
            .await
            .map_err(classify)?;
        let oid = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Internal("inserted id is not an ObjectId".into()))?;

        let mut stored = StoredExercise::from(document);
        stored.id = oid.to_hex();
        Ok(stored)
    }

    async fn read(&self, id: &str) -> StoreResult<StoredExercise> {
        let oid = parse_object_id(id)?;
        self.collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(classify)?
            .map(StoredExercise::from)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(
        &self,
        id: &str,
        exercise: StoredExercise,
        mask: &UpdateMask,
    ) -> StoreResult<StoredExercise> {
        let oid = parse_object_id(id)?;
        let update = update_document(&exercise, mask);
        if update.is_empty() {
            return self.read(id).await;
        }

        self.collection
            .find_one_and_update(doc! { "_id": oid }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(classify)?
            .map(StoredExercise::from)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let oid = parse_object_id(id)?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(classify)?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(true)
    }

    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<StoredExercise>> {
        let cursor = self
            .collection
            .find(filter_document(filter))
            .await
            .map_err(classify)?;
        let documents: Vec<ExerciseDocument> = cursor.try_collect().await.map_err(classify)?;
        Ok(documents.into_iter().map(StoredExercise::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_object_id_is_invalid() {
        assert!(matches!(parse_object_id("abc123"), Err(StoreError::InvalidId(_))));
        assert!(parse_object_id("5f43a1b2c3d4e5f6a7b8c9d0").is_ok());
    }

    #[test]
    fn update_document_unsets_empty_fields() {
        let exercise = StoredExercise {
            name: "Squat".into(),
            categories: Some(vec!["strength".into()]),
            images: Some(Vec::new()),
            ..Default::default()
        };
        let mask =
            UpdateMask::from_paths(["name", "kind", "categories", "images", "videos"]).unwrap();
        let update = update_document(&exercise, &mask);

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("name").unwrap(), "Squat");
        assert_eq!(set.get_array("category").unwrap().len(), 1);
        assert!(set.get_array("images").unwrap().is_empty());
        let unset = update.get_document("$unset").unwrap();
        assert!(unset.contains_key("kind"));
        assert!(unset.contains_key("videos"));
    }

    #[test]
    fn empty_mask_builds_no_update() {
        let update = update_document(&StoredExercise::default(), &UpdateMask::default());
        assert!(update.is_empty());
    }

    #[test]
    fn filter_document_matches_array_membership() {
        let filter = ListFilter {
            muscle_group: Some("legs".into()),
            ..Default::default()
        };
        let query = filter_document(&filter);
        assert_eq!(query.get_str("muscle_groups").unwrap(), "legs");
        assert!(filter_document(&ListFilter::default()).is_empty());
    }

    #[test]
    fn document_round_trips_to_stored_exercise() {
        let oid = ObjectId::new();
        let document = ExerciseDocument {
            id: Some(oid),
            name: "Plank".into(),
            muscles: Some(vec!["core".into()]),
            ..Default::default()
        };
        let stored = StoredExercise::from(document);
        assert_eq!(stored.id, oid.to_hex());
        assert_eq!(stored.muscles, Some(vec!["core".to_string()]));
    }

    #[test]
    fn document_keeps_empty_sequences_but_omits_missing_ones() {
        let document = ExerciseDocument::for_insert(StoredExercise {
            name: "Plank".into(),
            videos: Some(Vec::new()),
            ..Default::default()
        });
        let bson = mongodb::bson::to_document(&document).unwrap();
        assert!(bson.get_array("videos").unwrap().is_empty());
        assert!(!bson.contains_key("muscles"));

        let decoded: ExerciseDocument = mongodb::bson::from_document(bson).unwrap();
        let stored = StoredExercise::from(decoded);
        assert_eq!(stored.videos, Some(Vec::new()));
        assert_eq!(stored.muscles, None);
    }
}
