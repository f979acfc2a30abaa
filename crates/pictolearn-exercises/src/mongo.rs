//! MongoDB-backed exercise store.
//!
//! Exercises live in a single collection, one document per exercise, in the
//! same camelCase shape the API serves (`_id` is the exercise id string).
//! Listing relies on the collection's natural order, which for an
//! append-only workload is insertion order.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::{
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::ReturnDocument,
    Client, Collection,
};
use tracing::info;

use crate::exercise::{Exercise, ExerciseId, ExercisePatch};
use crate::store::{ExerciseFilter, ExerciseStore, StoreError};

/// Name of the exercises collection.
pub const EXERCISE_COLLECTION: &str = "exercises";

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// [`ExerciseStore`] persisting to a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoExerciseStore {
    collection: Collection<Exercise>,
}

impl MongoExerciseStore {
    /// Connects to `uri`, checks the server answers, and opens the
    /// exercises collection of `database`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` if the URI is invalid or the server
    /// does not answer a ping.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        info!(database, "Connecting to MongoDB");

        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Internal(format!("failed to connect to MongoDB: {e}")))?;

        let database = client.database(database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Internal(format!("MongoDB ping failed: {e}")))?;

        info!(database = %database.name(), "Connected to MongoDB");

        Ok(Self {
            collection: database.collection(EXERCISE_COLLECTION),
        })
    }
}

fn store_error(err: MongoError) -> StoreError {
    StoreError::Internal(err.to_string())
}

fn id_filter(id: &ExerciseId) -> Document {
    doc! { "_id": id.as_str() }
}

/// Translates an [`ExerciseFilter`] into a query document.
fn filter_document(filter: &ExerciseFilter) -> Document {
    let mut query = Document::new();
    if let Some(language) = &filter.language {
        query.insert("language", language.as_str());
    }
    if let Some(category) = &filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(representation) = &filter.representation {
        query.insert("representation", representation.as_str());
    }
    if let Some(teacher) = &filter.teacher_id {
        query.insert("teacherId", teacher.as_str());
    }
    query
}

/// Builds the `$set` fields of a patch, normalized and without absent fields.
fn set_document(patch: &ExercisePatch) -> Result<Document, StoreError> {
    let fields = bson::to_document(&patch.normalized())
        .map_err(|e| StoreError::Internal(format!("cannot encode exercise patch: {e}")))?;

    Ok(fields
        .into_iter()
        .filter(|(_, value)| !matches!(value, Bson::Null))
        .collect())
}

#[async_trait]
impl ExerciseStore for MongoExerciseStore {
    async fn insert(&self, exercise: Exercise) -> Result<Exercise, StoreError> {
        match self.collection.insert_one(&exercise).await {
            Ok(_) => Ok(exercise),
            Err(err) => match err.kind.as_ref() {
                ErrorKind::Write(WriteFailure::WriteError(write_error))
                    if write_error.code == DUPLICATE_KEY_CODE =>
                {
                    Err(StoreError::Duplicate(exercise.id.to_string()))
                }
                _ => Err(store_error(err)),
            },
        }
    }

    async fn find_by_id(&self, id: &ExerciseId) -> Result<Option<Exercise>, StoreError> {
        self.collection
            .find_one(id_filter(id))
            .await
            .map_err(store_error)
    }

    async fn find(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError> {
        let cursor = self
            .collection
            .find(filter_document(filter))
            .await
            .map_err(store_error)?;

        cursor.try_collect().await.map_err(store_error)
    }

    async fn update(
        &self,
        id: &ExerciseId,
        patch: &ExercisePatch,
    ) -> Result<Option<Exercise>, StoreError> {
        let fields = set_document(patch)?;
        if fields.is_empty() {
            return self.find_by_id(id).await;
        }

        self.collection
            .find_one_and_update(id_filter(id), doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await
            .map_err(store_error)
    }

    async fn delete(&self, id: &ExerciseId) -> Result<Option<Exercise>, StoreError> {
        self.collection
            .find_one_and_delete(id_filter(id))
            .await
            .map_err(store_error)
    }
}
