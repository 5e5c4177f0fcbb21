use std::path::PathBuf;

use thiserror::Error;

use crate::messages;

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o failure on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("another process holds the data directory {path:?}")]
    Locked { path: PathBuf },

    #[error("collection '{collection}' is corrupt: {message}")]
    Corrupt {
        collection: &'static str,
        message: String,
    },

    #[error("failed to encode record for '{collection}': {message}")]
    Encode {
        collection: &'static str,
        message: String,
    },

    #[error("no record with id {id} in '{collection}'")]
    NotFound {
        collection: &'static str,
        id: String,
    },

    #[error("starter dataset is invalid: {0}")]
    Seed(String),
}

/// Login and identity resolution failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("administrative credentials did not match")]
    BadAdministrativeCredentials,

    #[error("no client record matches the submitted identifier and secret")]
    NoMatchingClient,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Localized text shown to the person at the prompt. Diagnostics stay in
    /// the `Display` impl; this is the product-facing string.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadAdministrativeCredentials => messages::LOGIN_FAILED,
            Self::NoMatchingClient => messages::LOGIN_NO_MATCH,
            Self::Store(_) => messages::STORE_FAILED,
        }
    }
}

/// Failures raised by the registry, case desk, and ledger services.
#[derive(Debug, Error)]
pub enum OfficeError {
    #[error("{message}")]
    Validation { message: String },

    #[error("role '{role}' may not {action}")]
    Forbidden {
        role: &'static str,
        action: &'static str,
    },

    #[error("{what} not found")]
    NotFound { what: &'static str },

    #[error("a client with the same email and Emirates ID already exists")]
    DuplicateClient,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl OfficeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::Forbidden { action, .. } if *action == "archive cases" => {
                messages::ARCHIVE_ADMIN_ONLY.to_string()
            }
            Self::Forbidden { .. } => messages::ACTION_NOT_ALLOWED.to_string(),
            Self::NotFound { what } => match *what {
                "case" => messages::CASE_NOT_FOUND.to_string(),
                "client" => messages::CLIENT_NOT_FOUND.to_string(),
                _ => messages::RECORD_NOT_FOUND.to_string(),
            },
            Self::DuplicateClient => messages::CLIENT_DUPLICATE.to_string(),
            Self::Store(_) => messages::STORE_FAILED.to_string(),
            Self::Template(_) => messages::DRAFT_FAILED.to_string(),
            Self::Export(_) => messages::EXPORT_FAILED.to_string(),
        }
    }
}

/// Advisory gateway failures. Callers substitute a localized fallback reply
/// for any of these; the variants exist for logging and tests.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory gateway is disabled: no API key configured")]
    Disabled,

    #[error("invalid advisory endpoint: {0}")]
    Endpoint(String),

    #[error("advisory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("advisory gateway returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("advisory gateway returned an empty response")]
    Empty,

    #[error("failed to decode advisory payload: {0}")]
    Decode(String),
}
