//! Identity and role resolution.
//!
//! Three login classes map to four roles: the administrative class carries
//! two fixed credential rules (office passphrase → administrator, staff
//! email+passphrase → staff), the client class matches a stored client's
//! email and Emirates ID, and the visitor class always succeeds. Secrets are
//! compared in constant time but otherwise exactly as submitted: no hashing,
//! no lockout, no attempt counting. Authentication state lives only in the
//! running session and is gone when the process exits.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::audit;
use crate::config::AdminCredentials;
use crate::error::AuthError;
use crate::practice::clients::Client;
use crate::store::{self, Collection, RecordStore};

/// Login surface selection, chosen before credentials are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    Administrative,
    Client,
    Visitor,
}

impl RoleClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrative => "administrative",
            Self::Client => "client",
            Self::Visitor => "visitor",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "administrative" | "admin" | "office" => Some(Self::Administrative),
            "client" => Some(Self::Client),
            "visitor" | "guest" => Some(Self::Visitor),
            _ => None,
        }
    }
}

/// Resolved role. The client role is bound to one client record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Administrator,
    Staff,
    Client { client_id: Uuid },
    Visitor,
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        match self {
            Self::Administrator => RoleKind::Administrator,
            Self::Staff => RoleKind::Staff,
            Self::Client { .. } => RoleKind::Client,
            Self::Visitor => RoleKind::Visitor,
        }
    }

    pub fn client_id(&self) -> Option<Uuid> {
        match self {
            Self::Client { client_id } => Some(*client_id),
            _ => None,
        }
    }

    /// Administrator and staff share the office-side surfaces.
    pub fn is_office(&self) -> bool {
        matches!(self, Self::Administrator | Self::Staff)
    }
}

/// Role discriminant persisted on comments and activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Administrator,
    Staff,
    Client,
    Visitor,
}

impl RoleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Staff => "staff",
            Self::Client => "client",
            Self::Visitor => "visitor",
        }
    }

    /// Label shown at the console prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::Administrator => "مدير المكتب",
            Self::Staff => "محامي المكتب",
            Self::Client => "موكل",
            Self::Visitor => "زائر",
        }
    }
}

/// Outcome of a successful resolution: the role plus the name shown in the
/// console and recorded on audit-trail entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub role: Role,
    pub display_name: String,
}

/// Per-process session state. Owned by the console root and passed down;
/// subordinate surfaces never mutate it directly.
#[derive(Debug, Default)]
pub struct Session {
    identity: Option<ResolvedIdentity>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&ResolvedIdentity> {
        self.identity.as_ref()
    }

    pub fn role(&self) -> Option<&Role> {
        self.identity.as_ref().map(|identity| &identity.role)
    }

    pub fn sign_in(&mut self, identity: ResolvedIdentity) {
        self.identity = Some(identity);
    }

    pub fn sign_out(&mut self) {
        self.identity = None;
    }
}

fn ct_eq(submitted: &str, stored: &str) -> bool {
    submitted.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Match submitted credentials against the rules for `class`.
///
/// Every resolution, successful or not, lands in the office audit log as
/// metadata (class and role only, never identifiers or secrets).
pub async fn resolve_identity(
    store: &dyn RecordStore,
    credentials: &AdminCredentials,
    class: RoleClass,
    identifier: &str,
    secret: &str,
) -> Result<ResolvedIdentity, AuthError> {
    let resolved = match class {
        RoleClass::Visitor => Ok(ResolvedIdentity {
            role: Role::Visitor,
            display_name: RoleKind::Visitor.label().to_string(),
        }),
        RoleClass::Administrative => resolve_administrative(credentials, identifier, secret),
        RoleClass::Client => resolve_client(store, identifier, secret).await,
    };

    match &resolved {
        Ok(identity) => audit::record(
            "login_succeeded",
            serde_json::json!({
                "class": class.as_str(),
                "role": identity.role.kind().as_str(),
            }),
        ),
        Err(_) => {
            audit::inc_failed_login();
            audit::record(
                "login_failed",
                serde_json::json!({ "class": class.as_str() }),
            );
        }
    }

    resolved
}

fn resolve_administrative(
    credentials: &AdminCredentials,
    identifier: &str,
    secret: &str,
) -> Result<ResolvedIdentity, AuthError> {
    if ct_eq(secret, credentials.admin_passphrase.expose_secret()) {
        return Ok(ResolvedIdentity {
            role: Role::Administrator,
            display_name: RoleKind::Administrator.label().to_string(),
        });
    }

    // Evaluate both comparisons before branching.
    let email_ok = ct_eq(identifier, &credentials.staff_email);
    let secret_ok = ct_eq(secret, credentials.staff_passphrase.expose_secret());
    if email_ok && secret_ok {
        return Ok(ResolvedIdentity {
            role: Role::Staff,
            display_name: credentials.staff_name.clone(),
        });
    }

    Err(AuthError::BadAdministrativeCredentials)
}

async fn resolve_client(
    store: &dyn RecordStore,
    identifier: &str,
    secret: &str,
) -> Result<ResolvedIdentity, AuthError> {
    let clients: Vec<Client> = store::fetch_all(store, Collection::Clients).await?;

    // First match wins; the registry keeps (email, emiratesId) pairs unique
    // for records it wrote.
    clients
        .into_iter()
        .find(|client| client.email == identifier && ct_eq(secret, &client.emirates_id))
        .map(|client| ResolvedIdentity {
            role: Role::Client {
                client_id: client.id,
            },
            display_name: client.name,
        })
        .ok_or(AuthError::NoMatchingClient)
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{ResolvedIdentity, Role, RoleClass, RoleKind, Session, resolve_identity};
    use crate::config::AdminCredentials;
    use crate::store::MemoryStore;

    fn test_credentials() -> AdminCredentials {
        AdminCredentials {
            admin_passphrase: SecretString::from("admin123"),
            staff_email: "samarelabed90@gmail.com".to_string(),
            staff_passphrase: SecretString::from("123456"),
            staff_name: "سمر العبد".to_string(),
        }
    }

    #[tokio::test]
    async fn visitor_class_always_resolves() {
        let store = MemoryStore::blank();
        let identity = resolve_identity(&store, &test_credentials(), RoleClass::Visitor, "", "")
            .await
            .expect("visitor resolves");
        assert_eq!(identity.role, Role::Visitor);
        assert_eq!(identity.role.client_id(), None);
    }

    #[tokio::test]
    async fn office_passphrase_resolves_to_administrator_with_no_client_id() {
        let store = MemoryStore::blank();
        let identity = resolve_identity(
            &store,
            &test_credentials(),
            RoleClass::Administrative,
            "",
            "admin123",
        )
        .await
        .expect("administrator resolves");
        assert_eq!(identity.role, Role::Administrator);
        assert_eq!(identity.role.client_id(), None);
    }

    #[tokio::test]
    async fn staff_pair_resolves_to_staff() {
        let store = MemoryStore::blank();
        let identity = resolve_identity(
            &store,
            &test_credentials(),
            RoleClass::Administrative,
            "samarelabed90@gmail.com",
            "123456",
        )
        .await
        .expect("staff resolves");
        assert_eq!(identity.role, Role::Staff);
        assert_eq!(identity.role.kind(), RoleKind::Staff);
    }

    #[tokio::test]
    async fn staff_email_with_wrong_secret_fails() {
        let store = MemoryStore::blank();
        let result = resolve_identity(
            &store,
            &test_credentials(),
            RoleClass::Administrative,
            "samarelabed90@gmail.com",
            "654321",
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unmatched_client_login_leaves_session_unauthenticated() {
        let store = MemoryStore::blank();
        let mut session = Session::new();

        let result = resolve_identity(
            &store,
            &test_credentials(),
            RoleClass::Client,
            "nobody@example.com",
            "784-0000-0000000-0",
        )
        .await;

        assert!(result.is_err());
        assert!(!session.is_authenticated());

        if let Ok(identity) = result {
            session.sign_in(identity);
        }
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn seeded_client_can_sign_in_with_email_and_emirates_id() {
        let store = MemoryStore::new();
        let identity = resolve_identity(
            &store,
            &test_credentials(),
            RoleClass::Client,
            "ahmed.alhashimi@example.com",
            "784-1985-1234567-1",
        )
        .await
        .expect("seeded client resolves");

        assert!(matches!(identity.role, Role::Client { .. }));
        assert_eq!(identity.display_name, "أحمد محمد الهاشمي");
    }

    #[test]
    fn session_sign_in_and_out() {
        let mut session = Session::new();
        assert!(!session.is_authenticated());

        session.sign_in(ResolvedIdentity {
            role: Role::Administrator,
            display_name: "مدير المكتب".to_string(),
        });
        assert!(session.is_authenticated());
        assert!(session.role().is_some_and(Role::is_office));

        session.sign_out();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn role_class_parses_console_spellings() {
        assert_eq!(
            RoleClass::from_name("Admin"),
            Some(RoleClass::Administrative)
        );
        assert_eq!(RoleClass::from_name("client"), Some(RoleClass::Client));
        assert_eq!(RoleClass::from_name("guest"), Some(RoleClass::Visitor));
        assert_eq!(RoleClass::from_name("root"), None);
    }
}
