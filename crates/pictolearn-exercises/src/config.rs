//! Configuration for the Pictolearn exercises service.
//!
//! Configuration is read from `pictolearn.json`. Every field has a default,
//! so a missing file is a valid (default) configuration. Unknown fields are
//! ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExerciseError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "pictolearn.json";

/// Default bind address.
fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Default HTTP port.
const fn default_port() -> u16 {
    3000
}

/// Default base URL of the users service.
fn default_users_service_url() -> String {
    "http://localhost:4000".to_string()
}

/// Default path of the check-login endpoint on the users service.
fn default_check_login_path() -> String {
    "/teachers/checkLogin".to_string()
}

/// Default timeout for identity calls, in seconds.
const fn default_auth_timeout() -> u32 {
    10
}

/// Default language of the `/next` endpoint.
fn default_language() -> String {
    "es".to_string()
}

/// Default MongoDB database name.
fn default_mongo_database() -> String {
    "pictolearn".to_string()
}

/// Main configuration for the exercises service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the users (identity) service.
    #[serde(default = "default_users_service_url")]
    pub users_service_url: String,

    /// Path of the check-login endpoint, relative to `usersServiceUrl`.
    #[serde(default = "default_check_login_path")]
    pub check_login_path: String,

    /// Timeout for each identity call in seconds.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u32,

    /// Language used by `/next/:index` when no `lang` query is given.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Optional JSON file of exercises loaded at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<String>,

    /// MongoDB connection string. Without one, exercises are kept in memory
    /// and lost on restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongo_uri: Option<String>,

    /// MongoDB database holding the exercises collection.
    #[serde(default = "default_mongo_database")]
    pub mongo_database: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            users_service_url: default_users_service_url(),
            check_login_path: default_check_login_path(),
            auth_timeout_seconds: default_auth_timeout(),
            default_language: default_language(),
            seed_file: None,
            mongo_uri: None,
            mongo_database: default_mongo_database(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `pictolearn.json` in the current directory. If not found,
    /// returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            ExerciseError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `pictolearn.json` in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::ConfigParseError` if the file exists but
    /// contains invalid JSON.
    ///
    /// Returns `ExerciseError::ConfigValidationError` if the configuration
    /// values are invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(ExerciseError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ExerciseError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ExerciseError::config_validation(
                "host must not be empty",
                "Set host to an address such as 127.0.0.1 or 0.0.0.0 in your pictolearn.json",
            ));
        }

        if self.port == 0 {
            return Err(ExerciseError::config_validation(
                "port must be greater than 0",
                "Set port to a free TCP port in your pictolearn.json or pass --port",
            ));
        }

        if !(self.users_service_url.starts_with("http://")
            || self.users_service_url.starts_with("https://"))
        {
            return Err(ExerciseError::config_validation(
                format!(
                    "usersServiceUrl must be an http(s) URL, got '{}'",
                    self.users_service_url
                ),
                "Set usersServiceUrl (or USERS_SERVICE_URL) to the users service base URL",
            ));
        }

        if !self.check_login_path.starts_with('/') {
            return Err(ExerciseError::config_validation(
                "checkLoginPath must start with '/'",
                "Use a path such as /teachers/checkLogin in your pictolearn.json",
            ));
        }

        if self.auth_timeout_seconds == 0 {
            return Err(ExerciseError::config_validation(
                "authTimeoutSeconds must be greater than 0",
                "Set authTimeoutSeconds to at least 1 second in your pictolearn.json",
            ));
        }

        if self.default_language.trim().is_empty() {
            return Err(ExerciseError::config_validation(
                "defaultLanguage must not be empty",
                "Set defaultLanguage to a language code such as 'es' in your pictolearn.json",
            ));
        }

        if let Some(uri) = &self.mongo_uri {
            if !(uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://")) {
                return Err(ExerciseError::config_validation(
                    "mongoUri must be a mongodb:// or mongodb+srv:// connection string",
                    "Set mongoUri (or MONGO_URI) to a URI such as mongodb://localhost:27017",
                ));
            }
        }

        if self.mongo_database.trim().is_empty() {
            return Err(ExerciseError::config_validation(
                "mongoDatabase must not be empty",
                "Set mongoDatabase to a database name such as 'pictolearn' in your pictolearn.json",
            ));
        }

        Ok(())
    }

    /// Full URL of the check-login endpoint.
    #[must_use]
    pub fn check_login_url(&self) -> String {
        format!(
            "{}{}",
            self.users_service_url.trim_end_matches('/'),
            self.check_login_path
        )
    }
}
