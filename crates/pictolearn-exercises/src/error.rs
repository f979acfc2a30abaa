//! Error types for the Pictolearn exercises service.
//!
//! This module defines the error hierarchy for every service operation,
//! including payload validation, delegated authentication, ownership checks,
//! store access, configuration loading and seeding.

use std::path::PathBuf;

use crate::store::StoreError;

/// A specialized `Result` type for exercise service operations.
pub type Result<T> = std::result::Result<T, ExerciseError>;

/// Errors that can occur while serving exercises.
///
/// The HTTP layer translates each variant into the failure envelope
/// `{ "error": { "type", "message" } }`, except [`ExerciseError::Auth`]
/// which relays the identity service's own payload.
#[derive(Debug, thiserror::Error)]
pub enum ExerciseError {
    // ========================================================================
    // Request Errors
    // ========================================================================
    /// A required field is missing or empty.
    #[error("Exercise validation failed: {message}")]
    Validation {
        /// Description of every offending field.
        message: String,
    },

    /// The identity service rejected the caller.
    ///
    /// `error` is the identity service's `error` payload, relayed verbatim
    /// together with its status code.
    #[error("Authentication rejected by identity service (status {status})")]
    Auth {
        /// HTTP status returned by the identity service.
        status: u16,
        /// The `error` payload returned by the identity service.
        error: serde_json::Value,
    },

    /// No exercise exists with the given id.
    #[error("Exercise not found: '{id}'")]
    NotFound {
        /// The id that did not resolve.
        id: String,
    },

    /// The caller is authenticated but does not own the exercise.
    #[error("This exercise is not yours: '{id}'")]
    Forbidden {
        /// The id of the exercise the caller tried to access.
        id: String,
    },

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// The exercise store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The identity service could not be reached or answered with an
    /// unreadable body.
    #[error("Identity service unavailable: {message}")]
    IdentityUnavailable {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Startup Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your pictolearn.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The seed file could not be loaded.
    #[error("Failed to load seed file '{path}': {message}\n\nSuggestion: The seed file must be a JSON array of complete exercises")]
    SeedLoadError {
        /// Path to the seed file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

impl ExerciseError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `Auth` error relaying the identity service response.
    #[must_use]
    pub const fn auth(status: u16, error: serde_json::Value) -> Self {
        Self::Auth { status, error }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(id: impl Into<String>) -> Self {
        Self::Forbidden { id: id.into() }
    }

    /// Creates a new `IdentityUnavailable` error.
    #[must_use]
    pub fn identity_unavailable(message: impl Into<String>) -> Self {
        Self::IdentityUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `SeedLoadError`.
    #[must_use]
    pub fn seed_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SeedLoadError {
            path: path.into(),
            message: message.into(),
        }
    }
}
