//! Exercise service.
//!
//! Orchestrates the store, the identity collaborator and the guided
//! sequence builder. Reads of the catalog and of the guided path are
//! public; every operation on a single exercise, and listing one's own
//! exercises, requires an authenticated teacher, and mutations further
//! require that teacher to own the exercise.

use std::cmp::Ordering;
use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::error::{ExerciseError, Result};
use crate::exercise::{Exercise, ExerciseId, ExercisePatch, NewExercise, Representation, TeacherId};
use crate::guided::{GuidedEntry, GuidedSequence};
use crate::store::{ExerciseFilter, ExerciseStore};

/// Representation the category listing is restricted to.
const CATEGORY_LISTING_REPRESENTATION: Representation = Representation::Mixed;

/// Orders by `closedOrder` ascending, exercises without one first.
fn by_closed_order(a: &Exercise, b: &Exercise) -> Ordering {
    a.closed_order.cmp(&b.closed_order)
}

/// Exercise operations over a store and an authenticator.
#[derive(Clone)]
pub struct ExerciseService {
    store: Arc<dyn ExerciseStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl std::fmt::Debug for ExerciseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExerciseService").finish_non_exhaustive()
    }
}

impl ExerciseService {
    /// Creates a service over the given collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn ExerciseStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    // ------------------------------------------------------------------------
    // Authenticated operations
    // ------------------------------------------------------------------------

    /// Creates an exercise owned by the caller.
    ///
    /// The payload is validated before the store is touched.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Auth` if the caller is not an authenticated
    /// teacher, or `ExerciseError::Validation` if the payload is
    /// incomplete.
    pub async fn create(&self, credentials: &HeaderMap, payload: NewExercise) -> Result<Exercise> {
        let teacher = self.authenticator.identify(credentials).await?;
        let exercise = payload.into_exercise(ExerciseId::generate(), Some(teacher.clone()))?;
        let stored = self.store.insert(exercise).await?;

        info!(
            exercise_id = %stored.id,
            teacher_id = %teacher,
            language = %stored.language,
            "Exercise created"
        );
        Ok(stored)
    }

    /// Returns an exercise the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Auth` if the caller is not an authenticated
    /// teacher, `ExerciseError::NotFound` if `id` is unknown, or
    /// `ExerciseError::Forbidden` if someone else owns it.
    pub async fn get_owned(&self, credentials: &HeaderMap, id: &ExerciseId) -> Result<Exercise> {
        let teacher = self.authenticator.identify(credentials).await?;
        self.load_owned(&teacher, id).await
    }

    /// Lists every exercise the caller owns, in store order.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Auth` if the caller is not an authenticated
    /// teacher.
    pub async fn list_owned_by_caller(&self, credentials: &HeaderMap) -> Result<Vec<Exercise>> {
        let teacher = self.authenticator.identify(credentials).await?;
        let exercises = self.store.find(&ExerciseFilter::owned_by(teacher.clone())).await?;

        debug!(teacher_id = %teacher, count = exercises.len(), "Listed owned exercises");
        Ok(exercises)
    }

    /// Patches an exercise the caller owns and returns it as updated.
    ///
    /// Ownership is checked before the patch is validated.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Auth` if the caller is not an authenticated
    /// teacher, `ExerciseError::NotFound`,
    /// `ExerciseError::Forbidden` or `ExerciseError::Validation`.
    pub async fn update(
        &self,
        credentials: &HeaderMap,
        id: &ExerciseId,
        patch: &ExercisePatch,
    ) -> Result<Exercise> {
        let teacher = self.authenticator.identify(credentials).await?;
        self.load_owned(&teacher, id).await?;
        patch.validate()?;

        let updated = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| ExerciseError::not_found(id.as_str()))?;

        info!(exercise_id = %id, teacher_id = %teacher, "Exercise updated");
        Ok(updated)
    }

    /// Deletes an exercise the caller owns and returns the removed record.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Auth` if the caller is not an authenticated
    /// teacher, `ExerciseError::NotFound` or
    /// `ExerciseError::Forbidden`.
    pub async fn delete(&self, credentials: &HeaderMap, id: &ExerciseId) -> Result<Exercise> {
        let teacher = self.authenticator.identify(credentials).await?;
        self.load_owned(&teacher, id).await?;

        let removed = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| ExerciseError::not_found(id.as_str()))?;

        info!(exercise_id = %id, teacher_id = %teacher, "Exercise deleted");
        Ok(removed)
    }

    /// Loads an exercise and checks that `teacher` owns it.
    async fn load_owned(&self, teacher: &TeacherId, id: &ExerciseId) -> Result<Exercise> {
        let exercise = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ExerciseError::not_found(id.as_str()))?;

        if !exercise.is_owned_by(teacher) {
            warn!(
                exercise_id = %id,
                teacher_id = %teacher,
                "Rejected access to exercise owned by someone else"
            );
            return Err(ExerciseError::forbidden(id.as_str()));
        }

        Ok(exercise)
    }

    // ------------------------------------------------------------------------
    // Public reads
    // ------------------------------------------------------------------------
    //
    // These fail only with `ExerciseError::Store`.

    /// Lists the exercises of a language, optionally by `closedOrder`.
    pub async fn list_by_language(
        &self,
        language: &str,
        sort_by_closed_order: bool,
    ) -> Result<Vec<Exercise>> {
        let mut exercises = self
            .store
            .find(&ExerciseFilter::language(language.to_lowercase()))
            .await?;

        if sort_by_closed_order {
            exercises.sort_by(by_closed_order);
        }
        Ok(exercises)
    }

    /// Lists the mixed-representation exercises of a language, optionally
    /// restricted to a category.
    pub async fn list_by_language_and_category(
        &self,
        language: &str,
        category: Option<&str>,
    ) -> Result<Vec<Exercise>> {
        let mut filter = ExerciseFilter::language(language.to_lowercase())
            .with_representation(CATEGORY_LISTING_REPRESENTATION.as_str());
        if let Some(category) = category.filter(|category| !category.is_empty()) {
            filter = filter.with_category(category.to_uppercase());
        }

        Ok(self.store.find(&filter).await?)
    }

    /// Builds the guided sequence of a language.
    pub async fn guided(&self, language: &str) -> Result<GuidedSequence> {
        let language = language.to_lowercase();
        let catalog = self
            .store
            .find(&ExerciseFilter::language(language.as_str()))
            .await?;

        let sequence = GuidedSequence::build(&language, &catalog);
        debug!(language = %language, entries = sequence.len(), "Built guided sequence");
        Ok(sequence)
    }

    /// Returns the guided entry at `index`, or `None` if out of range.
    pub async fn guided_at(&self, language: &str, index: i64) -> Result<Option<GuidedEntry>> {
        Ok(self.guided(language).await?.at(index).cloned())
    }

    /// Returns the guided entry after `index`, or `None` if `index` is not
    /// a number or its successor is out of range.
    pub async fn guided_after(&self, language: &str, index: &str) -> Result<Option<GuidedEntry>> {
        Ok(self.guided(language).await?.after(index).cloned())
    }
}
