//! Core error types for stillpoint-core.
//!
//! One `thiserror` hierarchy covers every failure class the session engine
//! can surface: remote API, local storage, configuration and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stillpoint-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local storage errors (draft slot, practice log, token store)
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Audio playback errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the remote HTTP collaborator.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network or transport failure (DNS, TLS, timeout, connection reset)
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-2xx status
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Server answered but the body was not the JSON we expected
    #[error("{endpoint} returned a malformed body: {message}")]
    MalformedBody { endpoint: String, message: String },

    /// The base URL could not be parsed or joined with an endpoint path
    #[error("invalid endpoint URL '{0}'")]
    InvalidUrl(String),

    /// Local token store failed while preparing or finishing a request
    #[error("token store: {0}")]
    Token(#[from] StorageError),
}

impl ApiError {
    /// HTTP status for application-level errors, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Local storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored blob could not be (de)serialized
    #[error("Corrupt stored value for '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// OS keyring failure
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Audio backend errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Asset could not be loaded
    #[error("Failed to load audio asset '{asset}': {message}")]
    LoadFailed { asset: String, message: String },

    /// Playback command issued before anything was loaded
    #[error("No audio asset loaded")]
    NotLoaded,

    /// Backend-specific failure
    #[error("Audio backend error: {0}")]
    Backend(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// No practice variant with this id
    #[error("Unknown practice variant '{0}'")]
    UnknownVariant(String),

    /// Operation needs an active session
    #[error("No active practice session")]
    NoActiveSession,

    /// Operation not valid on the current page
    #[error("'{operation}' is not allowed on page '{page}'")]
    WrongPage { operation: String, page: String },

    /// Value outside the accepted range
    #[error("Value for '{field}' out of range: {message}")]
    OutOfRange { field: String, message: String },

    /// Variant definition is unusable
    #[error("Invalid variant '{id}': {message}")]
    InvalidVariant { id: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseBusy => {
                StorageError::Locked
            }
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

impl From<keyring::Error> for StorageError {
    fn from(err: keyring::Error) -> Self {
        StorageError::Keyring(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
