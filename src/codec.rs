//! Entity codec between the wire `Exercise` and the stored exercise.
//!
//! Both shapes carry the same eight fields, so every conversion is a verbatim
//! copy and cannot fail. Absence is propagated: `None` in, `None` out, for
//! whole entities and for each sequence field alike.

use crate::proto::Exercise;
use crate::storage::StoredExercise;

impl From<&Exercise> for StoredExercise {
    fn from(e: &Exercise) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            kind: e.kind.clone(),
            categories: e.categories.clone(),
            muscles: e.muscles.clone(),
            muscle_groups: e.muscle_groups.clone(),
            images: e.images.clone(),
            videos: e.videos.clone(),
        }
    }
}

impl From<StoredExercise> for Exercise {
    fn from(e: StoredExercise) -> Self {
        Self {
            id: e.id,
            name: e.name,
            kind: e.kind,
            categories: e.categories,
            muscles: e.muscles,
            muscle_groups: e.muscle_groups,
            images: e.images,
            videos: e.videos,
        }
    }
}

/// Wire exercise → stored exercise.
pub fn to_storage(wire: Option<&Exercise>) -> Option<StoredExercise> {
    wire.map(StoredExercise::from)
}

/// Stored exercise → wire exercise.
pub fn to_wire(stored: Option<&StoredExercise>) -> Option<Exercise> {
    stored.cloned().map(Exercise::from)
}

/// Element-wise [`to_wire`]. A missing list stays missing; an empty list
/// stays empty.
pub fn to_wire_list(stored: Option<Vec<StoredExercise>>) -> Option<Vec<Exercise>> {
    stored.map(|list| list.into_iter().map(Exercise::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_wire() -> Exercise {
        Exercise {
            id: "id".into(),
            name: "name".into(),
            kind: "kind".into(),
            categories: Some(vec!["category".into()]),
            muscles: Some(vec!["muscles".into()]),
            muscle_groups: Some(vec!["muscle groups".into()]),
            images: Some(vec!["images".into()]),
            videos: Some(vec!["videos".into()]),
        }
    }

    fn full_stored() -> StoredExercise {
        StoredExercise {
            id: "id".into(),
            name: "name".into(),
            kind: "kind".into(),
            categories: Some(vec!["category".into()]),
            muscles: Some(vec!["muscles".into()]),
            muscle_groups: Some(vec!["muscle groups".into()]),
            images: Some(vec!["images".into()]),
            videos: Some(vec!["videos".into()]),
        }
    }

    #[test]
    fn absent_input_stays_absent() {
        assert_eq!(to_storage(None), None);
        assert_eq!(to_wire(None), None);
        assert_eq!(to_wire_list(None), None);
    }

    #[test]
    fn full_instance_copies_every_field() {
        assert_eq!(to_storage(Some(&full_wire())), Some(full_stored()));
        assert_eq!(to_wire(Some(&full_stored())), Some(full_wire()));
    }

    #[test]
    fn round_trips_in_both_directions() {
        let samples = vec![
            Exercise::default(),
            full_wire(),
            Exercise {
                name: "Lunge".into(),
                muscle_groups: Some(vec!["legs".into(), "legs".into(), "glutes".into()]),
                ..Default::default()
            },
        ];
        for wire in samples {
            let stored = to_storage(Some(&wire)).unwrap();
            assert_eq!(to_wire(Some(&stored)), Some(wire.clone()));
            assert_eq!(to_storage(to_wire(Some(&stored)).as_ref()), Some(stored));
        }
    }

    #[test]
    fn sequence_presence_survives_both_directions() {
        let wire = Exercise {
            name: "Plank".into(),
            categories: Some(Vec::new()),
            muscles: None,
            images: Some(vec!["plank.png".into()]),
            ..Default::default()
        };
        let stored = to_storage(Some(&wire)).unwrap();
        assert_eq!(stored.categories, Some(Vec::new()));
        assert_eq!(stored.muscles, None);
        assert_eq!(to_wire(Some(&stored)), Some(wire));

        let stored = StoredExercise {
            videos: Some(Vec::new()),
            ..Default::default()
        };
        let wire = to_wire(Some(&stored)).unwrap();
        assert_eq!(wire.videos, Some(Vec::new()));
        assert_eq!(wire.muscle_groups, None);
        assert_eq!(to_storage(Some(&wire)), Some(stored));
    }

    #[test]
    fn wire_list_preserves_emptiness_and_order() {
        assert_eq!(to_wire_list(Some(Vec::new())), Some(Vec::new()));

        let stored: Vec<StoredExercise> = ["a", "b", "c"]
            .iter()
            .map(|id| StoredExercise {
                id: id.to_string(),
                ..full_stored()
            })
            .collect();
        let wire = to_wire_list(Some(stored)).unwrap();
        let ids: Vec<&str> = wire.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
