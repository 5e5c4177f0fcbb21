//! Office audit log: append-only JSONL with optional SHA-256 hash chaining.
//!
//! Events are metadata only; identifiers yes, secrets and record content no.
//! Free-text fragments that do end up in an event (case titles) must pass
//! through [`redact`] first so government-ID digit runs never reach disk.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::sync::{LazyLock, Mutex, OnceLock};

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::AuditConfig;

/// Emirates-ID shape first so a full ID wins over its embedded digit run.
static ID_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"784-\d{4}-\d{7}-\d|\d{7,}").expect("redaction pattern compiles"));

#[derive(Debug, Default, Clone, Serialize)]
struct SessionCounters {
    failed_logins: u64,
    blocked_actions: u64,
    redaction_events: u64,
}

#[derive(Debug, Serialize)]
struct AuditEvent<'a> {
    ts: String,
    event_type: &'a str,
    details: serde_json::Value,
    counters: SessionCounters,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
}

struct AuditLogger {
    path: PathBuf,
    hash_chain: bool,
    state: Mutex<Option<String>>,
    counters: Mutex<SessionCounters>,
}

impl AuditLogger {
    fn new(path: PathBuf, hash_chain: bool) -> Self {
        Self {
            path,
            hash_chain,
            state: Mutex::new(None),
            counters: Mutex::new(SessionCounters::default()),
        }
    }

    fn bump_counter<F>(&self, update: F)
    where
        F: FnOnce(&mut SessionCounters),
    {
        if let Ok(mut counters) = self.counters.lock() {
            update(&mut counters);
        }
    }

    fn write(&self, event_type: &str, details: serde_json::Value) {
        // Keep counters + hash-chain state locked through append so the
        // serialized counter snapshot is atomic with the written event.
        let counters_guard = match self.counters.lock() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Office audit counter lock poisoned: {}", e);
                return;
            }
        };

        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Office audit state lock poisoned: {}", e);
                return;
            }
        };
        let counters = counters_guard.clone();

        let prev_hash = state.clone();
        let mut event = AuditEvent {
            ts: Utc::now().to_rfc3339(),
            event_type,
            details,
            counters,
            prev_hash,
            hash: None,
        };

        if self.hash_chain {
            let to_hash = match serde_json::to_string(&event) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Failed to serialize audit event for hashing: {}", e);
                    return;
                }
            };
            let mut hasher = Sha256::new();
            hasher.update(to_hash.as_bytes());
            let hash = format!("{:x}", hasher.finalize());
            event.hash = Some(hash.clone());
            *state = Some(hash);
        }

        let line = match serde_json::to_string(&event) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to serialize office audit event: {}", e);
                return;
            }
        };

        if let Some(parent) = self.path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!("Failed to create office audit log dir {:?}: {}", parent, e);
            return;
        }

        // SECURITY: create files as owner-read/write (0o600). For pre-existing
        // files, fail closed if permissions are broader than 0o600.
        let mut open_opts = OpenOptions::new();
        open_opts.create(true).append(true);
        #[cfg(unix)]
        open_opts.mode(0o600);
        match open_opts.open(&self.path) {
            Ok(mut f) => {
                #[cfg(unix)]
                {
                    let mode = match f.metadata() {
                        Ok(meta) => meta.permissions().mode() & 0o777,
                        Err(e) => {
                            tracing::warn!(
                                "Failed to read permissions for office audit log {:?}: {}",
                                self.path,
                                e
                            );
                            return;
                        }
                    };
                    if mode != 0o600 {
                        tracing::warn!(
                            "Refusing to write office audit event; insecure mode {:o} on {:?} (expected 600)",
                            mode,
                            self.path
                        );
                        return;
                    }
                }
                if let Err(e) = writeln!(f, "{line}") {
                    tracing::warn!("Failed to append office audit event: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to open office audit log {:?}: {}", self.path, e);
            }
        }
    }
}

static LOGGER: OnceLock<AuditLogger> = OnceLock::new();
#[cfg(test)]
static TEST_EVENTS: OnceLock<Mutex<Vec<TestAuditEvent>>> = OnceLock::new();

#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct TestAuditEvent {
    pub event_type: String,
    pub details: serde_json::Value,
}

/// Initialize the office audit logger.
pub fn init(config: &AuditConfig) {
    if !config.enabled {
        return;
    }

    let _ = LOGGER.set(AuditLogger::new(config.path.clone(), config.hash_chain));
}

/// Log an office audit event.
pub fn record(event_type: &str, details: serde_json::Value) {
    #[cfg(test)]
    push_test_event(event_type, &details);
    if let Some(logger) = LOGGER.get() {
        logger.write(event_type, details);
    }
}

/// Increment the failed-login counter.
pub fn inc_failed_login() {
    if let Some(logger) = LOGGER.get() {
        logger.bump_counter(|c| c.failed_logins += 1);
    }
}

/// Increment the blocked-action counter.
pub fn inc_blocked_action() {
    if let Some(logger) = LOGGER.get() {
        logger.bump_counter(|c| c.blocked_actions += 1);
    }
}

/// Returns true if audit logging is active.
pub fn enabled() -> bool {
    LOGGER.get().is_some()
}

/// Replace government-ID shapes and long digit runs before text may enter an
/// audit event.
pub fn redact(text: &str) -> String {
    let scrubbed = ID_DIGITS.replace_all(text, "[redacted]");
    if let std::borrow::Cow::Owned(owned) = scrubbed {
        if let Some(logger) = LOGGER.get() {
            logger.bump_counter(|c| c.redaction_events += 1);
        }
        return owned;
    }
    text.to_string()
}

#[cfg(test)]
fn push_test_event(event_type: &str, details: &serde_json::Value) {
    let events = TEST_EVENTS.get_or_init(|| Mutex::new(Vec::new()));
    if let Ok(mut lock) = events.lock() {
        lock.push(TestAuditEvent {
            event_type: event_type.to_string(),
            details: details.clone(),
        });
    }
}

#[cfg(test)]
pub(crate) fn test_events_snapshot() -> Vec<TestAuditEvent> {
    TEST_EVENTS
        .get()
        .and_then(|events| events.lock().ok().map(|lock| lock.clone()))
        .unwrap_or_default()
}
