//! Pictolearn exercises service
//!
//! Stores pictogram exercises, gates teacher-owned changes behind the users
//! service's check-login endpoint, and builds the guided sequence every
//! learner walks through: each exercise of a language is shown in the four
//! representations, network tier by network tier.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod exercise;
pub mod guided;
pub mod mongo;
pub mod seed;
pub mod service;
pub mod store;

pub use api::{create_router, AppState, CategoryRequest, ErrorBody, ErrorResponse};
pub use auth::{Authenticator, HttpAuthenticator};
pub use config::Config;
pub use error::{ExerciseError, Result};
pub use exercise::{
    Exercise, ExerciseId, ExercisePatch, NetworkTier, NewExercise, Representation, TeacherId,
};
pub use guided::{GuidedEntry, GuidedSequence, NETWORK_ORDER, REPRESENTATION_ORDER};
pub use mongo::MongoExerciseStore;
pub use seed::{load_seed_file, seed_store};
pub use service::ExerciseService;
pub use store::{ExerciseFilter, ExerciseStore, InMemoryExerciseStore, StoreError};
