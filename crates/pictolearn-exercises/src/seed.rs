//! Startup seeding of the exercise catalog.
//!
//! A seed file is a JSON array of exercise payloads in the same shape the
//! create endpoint accepts, optionally carrying an `_id`. Seeded exercises
//! have no owner, so no teacher can modify them through the API.
//!
//! Seeding is repeatable: against a persistent store, exercises whose `_id`
//! is already stored are left as they are.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ExerciseError, Result};
use crate::exercise::{Exercise, ExerciseId, NewExercise};
use crate::store::{ExerciseStore, StoreError};

#[derive(Debug, Deserialize)]
struct SeedEntry {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(flatten)]
    payload: NewExercise,
}

/// Loads and validates the exercises of a seed file, in file order.
///
/// # Errors
///
/// Returns `ExerciseError::SeedLoadError` if the file cannot be read, is
/// not a JSON array of objects, or holds an incomplete exercise. The error
/// names the zero-based position of the first bad entry.
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<Exercise>> {
    let path = path.as_ref();

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ExerciseError::seed_load(path, format!("failed to read file: {e}")))?;

    let entries: Vec<SeedEntry> = serde_json::from_str(&contents)
        .map_err(|e| ExerciseError::seed_load(path, e.to_string()))?;

    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            let id = entry
                .id
                .map_or_else(ExerciseId::generate, ExerciseId::from);
            entry
                .payload
                .into_exercise(id, None)
                .map_err(|e| ExerciseError::seed_load(path, format!("entry {position}: {e}")))
        })
        .collect()
}

/// Inserts seed exercises into `store`, returning how many were newly
/// stored. Exercises whose id is already taken are skipped.
///
/// # Errors
///
/// Returns `ExerciseError::Store` if the store fails.
pub async fn seed_store(store: &dyn ExerciseStore, exercises: Vec<Exercise>) -> Result<usize> {
    let mut inserted = 0;
    let mut skipped = 0;
    for exercise in exercises {
        match store.insert(exercise).await {
            Ok(_) => inserted += 1,
            Err(StoreError::Duplicate(id)) => {
                debug!(exercise_id = %id, "Seed exercise already stored");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    info!(inserted, skipped, "Seeded exercise catalog");
    Ok(inserted)
}
