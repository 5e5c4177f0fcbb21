//! File-backed settings: the optional `config.toml` in the data directory.
//!
//! Every field has a working default so a fresh install runs with no file at
//! all. Environment overlays happen later, in [`crate::config`]; this layer
//! only reads the file.

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub office: OfficeSettings,
    pub credentials: CredentialSettings,
    pub advisory: AdvisorySettings,
    pub audit: AuditSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OfficeSettings {
    /// Name shown on the console banner and drafted documents.
    pub name: String,
}

impl Default for OfficeSettings {
    fn default() -> Self {
        Self {
            name: "مكتب وكيل للمحاماة والاستشارات القانونية".to_string(),
        }
    }
}

/// Static administrative credentials. Secrets deserialize into
/// [`SecretString`] and are never written back out.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub admin_passphrase: SecretString,
    pub staff_email: String,
    pub staff_passphrase: SecretString,
    pub staff_name: String,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            admin_passphrase: SecretString::from("admin123"),
            staff_email: "samarelabed90@gmail.com".to_string(),
            staff_passphrase: SecretString::from("123456"),
            staff_name: "سمر العبد".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisorySettings {
    pub base_url: String,
    pub model: String,
    pub image_model: String,
    pub timeout_secs: u64,
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    pub enabled: bool,
    /// Relative to the data directory; validated during resolution.
    pub path: String,
    pub hash_chain: bool,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "logs/office_audit.jsonl".to_string(),
            hash_chain: true,
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file is not an error; it yields
    /// the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::Settings;
    use crate::error::ConfigError;

    #[test]
    fn defaults_match_the_documented_install() {
        let settings = Settings::default();
        assert_eq!(
            settings.credentials.admin_passphrase.expose_secret(),
            "admin123"
        );
        assert_eq!(settings.credentials.staff_email, "samarelabed90@gmail.com");
        assert_eq!(settings.credentials.staff_name, "سمر العبد");
        assert_eq!(settings.advisory.model, "gemini-2.5-flash");
        assert_eq!(settings.advisory.timeout_secs, 30);
        assert!(settings.audit.enabled);
        assert!(settings.audit.hash_chain);
        assert_eq!(settings.audit.path, "logs/office_audit.jsonl");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load(&dir.path().join("config.toml")).expect("defaults");
        assert_eq!(settings.office.name, Settings::default().office.name);
    }

    #[test]
    fn partial_file_overlays_only_named_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            concat!(
                "[office]\n",
                "name = \"مكتب الاختبار\"\n\n",
                "[advisory]\n",
                "timeout_secs = 5\n",
            ),
        )
        .expect("write config");

        let settings = Settings::load(&path).expect("parse");
        assert_eq!(settings.office.name, "مكتب الاختبار");
        assert_eq!(settings.advisory.timeout_secs, 5);
        // Untouched sections keep their defaults.
        assert_eq!(settings.advisory.model, "gemini-2.5-flash");
        assert_eq!(settings.credentials.staff_email, "samarelabed90@gmail.com");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "office = [broken").expect("write config");

        let err = Settings::load(&path).expect_err("must reject malformed toml");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
