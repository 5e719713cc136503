//! Wire messages for the `exrs.v1.ExerciseService` RPC surface.
//!
//! The messages mirror `proto/exrs/v1/exercise_service.proto`. They carry both
//! `prost` derives (binary RPC payloads) and `serde` derives (the REST/JSON
//! facade), so one type serves both protocols.
//!
//! JSON uses the protobuf field names. Inbound JSON also accepts the
//! lowerCamelCase names. Empty scalars on an [`Exercise`] are omitted on
//! output, as proto3 JSON does for default values.
//!
//! Sequence fields are `Option<Vec<String>>`: a JSON body can say "no list"
//! or "an empty list", and both survive the trip to storage and back. The
//! protobuf encoding is that of plain `repeated string` fields, which carries
//! no presence, so an empty sequence decodes from the binary wire as `None`.

use bytes::{Buf, BufMut};
use prost::encoding::{self, string, DecodeContext, WireType};
use prost::DecodeError;
use serde::{Deserialize, Serialize};

/// `google.protobuf.Empty`.
pub type Empty = ();

/// The externally visible exercise entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exercise {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none", alias = "category")]
    pub categories: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscles: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "muscleGroups")]
    pub muscle_groups: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<String>>,
}

impl Exercise {
    /// Tags 4..=8, in field order.
    fn sequences(&self) -> [(u32, &[String]); 5] {
        [
            (4, self.categories.as_deref().unwrap_or_default()),
            (5, self.muscles.as_deref().unwrap_or_default()),
            (6, self.muscle_groups.as_deref().unwrap_or_default()),
            (7, self.images.as_deref().unwrap_or_default()),
            (8, self.videos.as_deref().unwrap_or_default()),
        ]
    }

    fn sequence_mut(&mut self, tag: u32) -> Option<(&'static str, &mut Option<Vec<String>>)> {
        match tag {
            4 => Some(("categories", &mut self.categories)),
            5 => Some(("muscles", &mut self.muscles)),
            6 => Some(("muscle_groups", &mut self.muscle_groups)),
            7 => Some(("images", &mut self.images)),
            8 => Some(("videos", &mut self.videos)),
            _ => None,
        }
    }

    fn scalars(&self) -> [(u32, &String); 3] {
        [(1, &self.id), (2, &self.name), (3, &self.kind)]
    }
}

impl prost::Message for Exercise {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        for (tag, value) in self.scalars() {
            if !value.is_empty() {
                string::encode(tag, value, buf);
            }
        }
        for (tag, values) in self.sequences() {
            string::encode_repeated(tag, values, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let (field, result) = match tag {
            1 => ("id", string::merge(wire_type, &mut self.id, buf, ctx)),
            2 => ("name", string::merge(wire_type, &mut self.name, buf, ctx)),
            3 => ("kind", string::merge(wire_type, &mut self.kind, buf, ctx)),
            _ => match self.sequence_mut(tag) {
                Some((field, values)) => {
                    let values = values.get_or_insert_with(Vec::new);
                    (field, string::merge_repeated(wire_type, values, buf, ctx))
                }
                None => return encoding::skip_field(wire_type, tag, buf, ctx),
            },
        };
        result.map_err(|mut e| {
            e.push("Exercise", field);
            e
        })
    }

    fn encoded_len(&self) -> usize {
        let scalars: usize = self
            .scalars()
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(tag, value)| string::encoded_len(tag, value))
            .sum();
        let sequences: usize = self
            .sequences()
            .into_iter()
            .map(|(tag, values)| string::encoded_len_repeated(tag, values))
            .sum();
        scalars + sequences
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateExerciseRequest {
    #[prost(message, optional, tag = "1")]
    pub exercise: Option<Exercise>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetExerciseRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateRequest {
    #[prost(string, tag = "1")]
    pub id: String,

    #[prost(message, optional, tag = "2")]
    pub exercise: Option<Exercise>,

    /// Fields to overwrite. Absent or empty means "every non-empty field of
    /// `exercise`".
    #[prost(message, optional, tag = "3")]
    pub update_mask: Option<::prost_types::FieldMask>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

/// Optional list filters; every non-empty field must match.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListExercisesRequest {
    #[prost(string, tag = "1")]
    pub kind: String,

    #[prost(string, tag = "2")]
    pub name: String,

    #[prost(string, tag = "3")]
    pub muscle_group: String,
}

/// The `exercises` field is always serialized, as `[]` when empty.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ListExercisesResponse {
    #[prost(message, repeated, tag = "1")]
    pub exercises: Vec<Exercise>,
}

include!(concat!(env!("OUT_DIR"), "/exrs.v1.ExerciseService.rs"));

pub use exercise_service_client::ExerciseServiceClient;
pub use exercise_service_server::{ExerciseService, ExerciseServiceServer};
