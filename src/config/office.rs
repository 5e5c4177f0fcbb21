use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::config::helpers::{optional_env, parse_bool_env, parse_string_env, parse_u64_env};
use crate::error::ConfigError;
use crate::settings::{AdvisorySettings, AuditSettings, CredentialSettings, Settings};

/// Name of the settings file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Static administrative credentials, resolved from settings and env.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub admin_passphrase: SecretString,
    pub staff_email: String,
    pub staff_passphrase: SecretString,
    pub staff_name: String,
}

/// Advisory gateway controls.
#[derive(Debug, Clone)]
pub struct AdvisoryConfig {
    pub base_url: Url,
    /// From `ADVISORY_API_KEY` only; never read from the settings file.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub image_model: String,
    pub timeout: Duration,
}

/// Office audit log controls. `path` is absolute by the time it gets here.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub hash_chain: bool,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub office_name: String,
    pub data_dir: PathBuf,
    pub ephemeral: bool,
    pub credentials: AdminCredentials,
    pub advisory: AdvisoryConfig,
    pub audit: AuditConfig,
}

/// Pick the data directory: CLI flag, then `WAKEEL_DATA_DIR`, then the
/// platform data dir.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(raw) = optional_env("WAKEEL_DATA_DIR")? {
        return Ok(PathBuf::from(raw));
    }
    Ok(dirs::data_dir()
        .map(|base| base.join("wakeel"))
        .unwrap_or_else(|| PathBuf::from(".wakeel")))
}

/// The audit file stays inside the data directory: the configured path must
/// be relative, free of `..`, and name a file below `logs/`. Returns the
/// normalized relative path.
fn validate_audit_path(raw: &str) -> Result<PathBuf, ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidValue {
        key: "WAKEEL_AUDIT_PATH".to_string(),
        message: message.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("audit log path must not be empty"));
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(invalid("audit log path must not contain '..' components"));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("audit log path must be relative to the data directory"));
            }
        }
    }

    if !normalized.starts_with("logs") || normalized.components().count() < 2 {
        return Err(invalid("audit log path must be a file under 'logs/'"));
    }

    Ok(normalized)
}

impl AdminCredentials {
    fn resolve(settings: &CredentialSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            admin_passphrase: match optional_env("WAKEEL_ADMIN_PASSPHRASE")? {
                Some(raw) => SecretString::from(raw),
                None => settings.admin_passphrase.clone(),
            },
            staff_email: parse_string_env("WAKEEL_STAFF_EMAIL", settings.staff_email.clone())?,
            staff_passphrase: match optional_env("WAKEEL_STAFF_PASSPHRASE")? {
                Some(raw) => SecretString::from(raw),
                None => settings.staff_passphrase.clone(),
            },
            staff_name: parse_string_env("WAKEEL_STAFF_NAME", settings.staff_name.clone())?,
        })
    }
}

impl AdvisoryConfig {
    fn resolve(settings: &AdvisorySettings) -> Result<Self, ConfigError> {
        let raw_url = parse_string_env("ADVISORY_BASE_URL", settings.base_url.clone())?;
        let base_url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidValue {
            key: "ADVISORY_BASE_URL".to_string(),
            message: format!("'{raw_url}' is not a valid URL: {e}"),
        })?;

        let timeout_secs = parse_u64_env("ADVISORY_TIMEOUT_SECS", settings.timeout_secs)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ADVISORY_TIMEOUT_SECS".to_string(),
                message: "timeout must be at least one second".to_string(),
            });
        }

        Ok(Self {
            base_url,
            api_key: optional_env("ADVISORY_API_KEY")?.map(SecretString::from),
            model: parse_string_env("ADVISORY_MODEL", settings.model.clone())?,
            image_model: parse_string_env("ADVISORY_IMAGE_MODEL", settings.image_model.clone())?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl AuditConfig {
    fn resolve(data_dir: &Path, settings: &AuditSettings) -> Result<Self, ConfigError> {
        let raw = parse_string_env("WAKEEL_AUDIT_PATH", settings.path.clone())?;
        let relative = validate_audit_path(&raw)?;
        Ok(Self {
            enabled: parse_bool_env("WAKEEL_AUDIT_ENABLED", settings.enabled)?,
            path: data_dir.join(relative),
            hash_chain: parse_bool_env("WAKEEL_AUDIT_HASH_CHAIN", settings.hash_chain)?,
        })
    }
}

impl AppConfig {
    /// Load `config.toml` from the data directory and resolve everything.
    pub fn resolve(data_dir_flag: Option<PathBuf>, ephemeral: bool) -> Result<Self, ConfigError> {
        let data_dir = resolve_data_dir(data_dir_flag)?;
        let settings = Settings::load(&data_dir.join(CONFIG_FILE))?;
        Self::from_settings(data_dir, ephemeral, &settings)
    }

    pub(crate) fn from_settings(
        data_dir: PathBuf,
        ephemeral: bool,
        settings: &Settings,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            office_name: parse_string_env("WAKEEL_OFFICE_NAME", settings.office.name.clone())?,
            credentials: AdminCredentials::resolve(&settings.credentials)?,
            advisory: AdvisoryConfig::resolve(&settings.advisory)?,
            audit: AuditConfig::resolve(&data_dir, &settings.audit)?,
            data_dir,
            ephemeral,
        })
    }
}
