//! Storage Port subsystem.
//!
//! # Data Flow
//! ```text
//! RPC Service
//!     → ExerciseStore (async CRUD contract)
//!     → memory.rs  (DashMap, decimal ids)    tests / local runs
//!     → mongo.rs   (collection, ObjectId ids) production
//! ```
//!
//! # Design Decisions
//! - The gateway only sees [`StoredExercise`] with an opaque string id;
//!   each backend translates its native identifier at its own boundary
//! - Backends own all synchronization; the gateway never locks
//! - Updates carry an explicit [`UpdateMask`] so an empty value can be
//!   written on purpose
//! - Sequence fields keep presence: `None` was never given, `Some(vec![])`
//!   was given empty

pub mod memory;
pub mod mongo;

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Exercise as persisted by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredExercise {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub categories: Option<Vec<String>>,
    pub muscles: Option<Vec<String>>,
    pub muscle_groups: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
}

/// Errors a backend may report.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("exercise not found: {0}")]
    NotFound(String),

    #[error("invalid exercise id: {0}")]
    InvalidId(String),

    #[error("write conflict: {0}")]
    WriteConflict(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A replaceable (non-id) field of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExerciseField {
    Name,
    Kind,
    Categories,
    Muscles,
    MuscleGroups,
    Images,
    Videos,
}

impl ExerciseField {
    pub const ALL: [ExerciseField; 7] = [
        ExerciseField::Name,
        ExerciseField::Kind,
        ExerciseField::Categories,
        ExerciseField::Muscles,
        ExerciseField::MuscleGroups,
        ExerciseField::Images,
        ExerciseField::Videos,
    ];

    /// Wire (protobuf) name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseField::Name => "name",
            ExerciseField::Kind => "kind",
            ExerciseField::Categories => "categories",
            ExerciseField::Muscles => "muscles",
            ExerciseField::MuscleGroups => "muscle_groups",
            ExerciseField::Images => "images",
            ExerciseField::Videos => "videos",
        }
    }

    /// Parse a field path. Accepts protobuf and lowerCamelCase names.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "name" => Some(ExerciseField::Name),
            "kind" => Some(ExerciseField::Kind),
            "categories" | "category" => Some(ExerciseField::Categories),
            "muscles" => Some(ExerciseField::Muscles),
            "muscle_groups" | "muscleGroups" => Some(ExerciseField::MuscleGroups),
            "images" => Some(ExerciseField::Images),
            "videos" => Some(ExerciseField::Videos),
            _ => None,
        }
    }

    /// Copy this field from `source` into `target`.
    pub fn copy(&self, source: &StoredExercise, target: &mut StoredExercise) {
        match self {
            ExerciseField::Name => target.name = source.name.clone(),
            ExerciseField::Kind => target.kind = source.kind.clone(),
            ExerciseField::Categories => target.categories = source.categories.clone(),
            ExerciseField::Muscles => target.muscles = source.muscles.clone(),
            ExerciseField::MuscleGroups => target.muscle_groups = source.muscle_groups.clone(),
            ExerciseField::Images => target.images = source.images.clone(),
            ExerciseField::Videos => target.videos = source.videos.clone(),
        }
    }

    fn is_set_on(&self, exercise: &StoredExercise) -> bool {
        fn filled(values: &Option<Vec<String>>) -> bool {
            values.as_ref().is_some_and(|v| !v.is_empty())
        }
        match self {
            ExerciseField::Name => !exercise.name.is_empty(),
            ExerciseField::Kind => !exercise.kind.is_empty(),
            ExerciseField::Categories => filled(&exercise.categories),
            ExerciseField::Muscles => filled(&exercise.muscles),
            ExerciseField::MuscleGroups => filled(&exercise.muscle_groups),
            ExerciseField::Images => filled(&exercise.images),
            ExerciseField::Videos => filled(&exercise.videos),
        }
    }
}

impl fmt::Display for ExerciseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of fields an update overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateMask {
    fields: BTreeSet<ExerciseField>,
}

impl UpdateMask {
    /// Every replaceable field.
    pub fn all() -> Self {
        ExerciseField::ALL.into_iter().collect()
    }

    /// The fields of `exercise` that hold a non-default value.
    pub fn non_empty(exercise: &StoredExercise) -> Self {
        ExerciseField::ALL
            .into_iter()
            .filter(|field| field.is_set_on(exercise))
            .collect()
    }

    /// Parse a list of field paths. Returns the offending path on failure.
    pub fn from_paths<I, S>(paths: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref().trim();
                ExerciseField::from_path(path).ok_or_else(|| path.to_string())
            })
            .collect()
    }

    pub fn contains(&self, field: ExerciseField) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ExerciseField> + '_ {
        self.fields.iter().copied()
    }

    /// Overwrite the masked fields of `target` with those of `source`.
    pub fn apply(&self, source: &StoredExercise, target: &mut StoredExercise) {
        for field in self.iter() {
            field.copy(source, target);
        }
    }
}

impl FromIterator<ExerciseField> for UpdateMask {
    fn from_iter<T: IntoIterator<Item = ExerciseField>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Record filter for [`ExerciseStore::list`]. The default matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListFilter {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub muscle_group: Option<String>,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.name.is_none() && self.muscle_group.is_none()
    }

    pub fn matches(&self, exercise: &StoredExercise) -> bool {
        self.kind.as_ref().map_or(true, |kind| &exercise.kind == kind)
            && self.name.as_ref().map_or(true, |name| &exercise.name == name)
            && self
                .muscle_group
                .as_ref()
                .map_or(true, |group| {
                    exercise
                        .muscle_groups
                        .as_ref()
                        .is_some_and(|groups| groups.contains(group))
                })
    }
}

/// CRUD contract the gateway depends on.
#[async_trait]
pub trait ExerciseStore: Send + Sync {
    /// Persist a new exercise, ignoring any supplied id.
    async fn create(&self, exercise: StoredExercise) -> StoreResult<StoredExercise>;

    async fn read(&self, id: &str) -> StoreResult<StoredExercise>;

    /// Overwrite the masked fields of the record at `id` and return it.
    async fn update(
        &self,
        id: &str,
        exercise: StoredExercise,
        mask: &UpdateMask,
    ) -> StoreResult<StoredExercise>;

    async fn delete(&self, id: &str) -> StoreResult<bool>;

    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<StoredExercise>>;
}
