//! Exercise persistence.
//!
//! [`ExerciseStore`] is the data-access seam of the service. Stores return
//! records in their natural (insertion) order; the guided learning path
//! relies on that order to break ties between exercises of the same tier.
//!
//! [`InMemoryExerciseStore`] is the bundled implementation. Each call takes
//! the lock once, so every single-record operation is atomic.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::exercise::{Exercise, ExerciseId, ExercisePatch, TeacherId};

/// Store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same id already exists.
    #[error("Duplicate exercise id: {0}")]
    Duplicate(String),

    /// The backing storage failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Equality filter over stored exercises.
///
/// Every field that is set must match. Values are compared as stored, so
/// callers normalize case before building a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseFilter {
    /// Language code (lowercase).
    pub language: Option<String>,
    /// Category (uppercase).
    pub category: Option<String>,
    /// Stored representation (uppercase).
    pub representation: Option<String>,
    /// Owning teacher. Unowned exercises never match.
    pub teacher_id: Option<TeacherId>,
}

impl ExerciseFilter {
    /// Filter selecting one language.
    #[must_use]
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }

    /// Filter selecting the exercises owned by `teacher`.
    #[must_use]
    pub fn owned_by(teacher: TeacherId) -> Self {
        Self {
            teacher_id: Some(teacher),
            ..Self::default()
        }
    }

    /// Adds a category constraint.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Adds a stored-representation constraint.
    #[must_use]
    pub fn with_representation(mut self, representation: impl Into<String>) -> Self {
        self.representation = Some(representation.into());
        self
    }

    /// Returns `true` if `exercise` satisfies every set constraint.
    #[must_use]
    pub fn matches(&self, exercise: &Exercise) -> bool {
        self.language
            .as_ref()
            .map_or(true, |language| &exercise.language == language)
            && self
                .category
                .as_ref()
                .map_or(true, |category| &exercise.category == category)
            && self
                .representation
                .as_ref()
                .map_or(true, |representation| &exercise.representation == representation)
            && self
                .teacher_id
                .as_ref()
                .map_or(true, |teacher| exercise.is_owned_by(teacher))
    }
}

/// Exercise persistence.
#[async_trait]
pub trait ExerciseStore: Send + Sync {
    /// Stores a new exercise and returns it as stored.
    async fn insert(&self, exercise: Exercise) -> Result<Exercise, StoreError>;

    /// Loads an exercise by id.
    async fn find_by_id(&self, id: &ExerciseId) -> Result<Option<Exercise>, StoreError>;

    /// Lists exercises matching `filter`, in natural order.
    async fn find(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError>;

    /// Applies `patch` and returns the updated exercise, or `None` if the id
    /// does not resolve.
    async fn update(
        &self,
        id: &ExerciseId,
        patch: &ExercisePatch,
    ) -> Result<Option<Exercise>, StoreError>;

    /// Removes an exercise and returns it, or `None` if the id does not
    /// resolve.
    async fn delete(&self, id: &ExerciseId) -> Result<Option<Exercise>, StoreError>;
}

/// In-memory store for development, seeding and tests.
#[derive(Debug, Default)]
pub struct InMemoryExerciseStore {
    exercises: RwLock<Vec<Exercise>>,
}

impl InMemoryExerciseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored exercises.
    pub async fn len(&self) -> usize {
        self.exercises.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.exercises.read().await.is_empty()
    }
}

#[async_trait]
impl ExerciseStore for InMemoryExerciseStore {
    async fn insert(&self, exercise: Exercise) -> Result<Exercise, StoreError> {
        let mut exercises = self.exercises.write().await;
        if exercises.iter().any(|existing| existing.id == exercise.id) {
            return Err(StoreError::Duplicate(exercise.id.to_string()));
        }
        exercises.push(exercise.clone());
        Ok(exercise)
    }

    async fn find_by_id(&self, id: &ExerciseId) -> Result<Option<Exercise>, StoreError> {
        let exercises = self.exercises.read().await;
        Ok(exercises.iter().find(|exercise| &exercise.id == id).cloned())
    }

    async fn find(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError> {
        let exercises = self.exercises.read().await;
        Ok(exercises
            .iter()
            .filter(|exercise| filter.matches(exercise))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: &ExerciseId,
        patch: &ExercisePatch,
    ) -> Result<Option<Exercise>, StoreError> {
        let mut exercises = self.exercises.write().await;
        Ok(exercises
            .iter_mut()
            .find(|exercise| &exercise.id == id)
            .map(|exercise| {
                patch.apply_to(exercise);
                exercise.clone()
            }))
    }

    async fn delete(&self, id: &ExerciseId) -> Result<Option<Exercise>, StoreError> {
        let mut exercises = self.exercises.write().await;
        let position = exercises.iter().position(|exercise| &exercise.id == id);
        Ok(position.map(|position| exercises.remove(position)))
    }
}
