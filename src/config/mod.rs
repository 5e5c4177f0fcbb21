//! Resolved runtime configuration: file-backed [`crate::settings::Settings`]
//! overlaid with environment variables.

pub(crate) mod helpers;
mod office;

pub use office::{
    AdminCredentials, AdvisoryConfig, AppConfig, AuditConfig, CONFIG_FILE, resolve_data_dir,
};
