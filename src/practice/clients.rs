//! Client registry.
//!
//! CRUD over client profiles plus the derived case lookups. The stored
//! `totalCases` field is a display cache; listings recompute the live count
//! from the case collection on every call so it can never go stale.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit;
use crate::error::OfficeError;
use crate::identity::Role;
use crate::messages;
use crate::practice::cases::LegalCase;
use crate::practice::require_office;
use crate::store::{self, Collection, RecordStore};

/// Individual or corporate client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Individual,
    Corporate,
}

impl ClientKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Corporate => "corporate",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "individual" => Some(Self::Individual),
            "corporate" | "company" => Some(Self::Corporate),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Individual => "فرد",
            Self::Corporate => "شركة",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Government ID string; paired with `email` it forms the client login
    /// key.
    pub emirates_id: String,
    pub client_type: ClientKind,
    pub broker_name: Option<String>,
    pub broker_commission: Option<Decimal>,
    /// Opaque document references.
    pub documents: Vec<String>,
    /// Cached count; listings recompute the live value.
    pub total_cases: usize,
    pub created_at: DateTime<Utc>,
}

/// Intake form for a new client profile.
#[derive(Debug, Clone, Default)]
pub struct ClientForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub emirates_id: String,
    pub client_type: ClientKind,
    pub broker_name: Option<String>,
    pub broker_commission: Option<Decimal>,
}

impl Default for ClientKind {
    fn default() -> Self {
        Self::Individual
    }
}

/// Build a new client record from an intake form. Name, government ID, and
/// phone are required; everything else may be filled in later.
pub fn new_client(form: ClientForm) -> Result<Client, OfficeError> {
    if form.name.trim().is_empty()
        || form.emirates_id.trim().is_empty()
        || form.phone.trim().is_empty()
    {
        return Err(OfficeError::validation(messages::CLIENT_FIELDS_REQUIRED));
    }

    Ok(Client {
        id: Uuid::new_v4(),
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        emirates_id: form.emirates_id.trim().to_string(),
        client_type: form.client_type,
        broker_name: form.broker_name.filter(|b| !b.trim().is_empty()),
        broker_commission: form.broker_commission,
        documents: Vec::new(),
        total_cases: 0,
        created_at: Utc::now(),
    })
}

pub struct ClientRegistry {
    store: Arc<dyn RecordStore>,
}

impl ClientRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Visible client profiles for `viewer`, with live case counts.
    pub async fn list(&self, viewer: &Role) -> Result<Vec<Client>, OfficeError> {
        let clients: Vec<Client> = store::fetch_all(&*self.store, Collection::Clients).await?;
        let cases: Vec<LegalCase> = store::fetch_all(&*self.store, Collection::Cases).await?;

        let mut visible = scoped(viewer, clients);
        for client in &mut visible {
            client.total_cases = cases.iter().filter(|c| c.client_id == client.id).count();
        }
        Ok(visible)
    }

    pub async fn get(&self, viewer: &Role, id: Uuid) -> Result<Client, OfficeError> {
        self.list(viewer)
            .await?
            .into_iter()
            .find(|client| client.id == id)
            .ok_or(OfficeError::NotFound { what: "client" })
    }

    /// Register a new client. Office roles only; rejects a duplicate
    /// (`email`, `emiratesId`) login pair so client identity resolution
    /// stays unambiguous.
    pub async fn add(&self, viewer: &Role, form: ClientForm) -> Result<Client, OfficeError> {
        require_office(viewer, "register clients")?;
        let client = new_client(form)?;
        self.ensure_unique_login_pair(&client, None).await?;

        let stored = store::save_record(&*self.store, Collection::Clients, &client).await?;
        audit::record(
            "client_created",
            serde_json::json!({ "clientId": stored.id }),
        );
        Ok(stored)
    }

    /// Full replace by id.
    pub async fn update(&self, viewer: &Role, client: Client) -> Result<Client, OfficeError> {
        require_office(viewer, "edit clients")?;
        if client.name.trim().is_empty()
            || client.emirates_id.trim().is_empty()
            || client.phone.trim().is_empty()
        {
            return Err(OfficeError::validation(messages::CLIENT_FIELDS_REQUIRED));
        }
        self.ensure_unique_login_pair(&client, Some(client.id)).await?;

        let stored = store::update_record(
            &*self.store,
            Collection::Clients,
            &client.id.to_string(),
            &client,
        )
        .await?;
        audit::record(
            "client_updated",
            serde_json::json!({ "clientId": stored.id }),
        );
        Ok(stored)
    }

    /// The subset of the case collection owned by `client_id`, in the case
    /// collection's own order. Derived on every call, never cached, so it
    /// always reflects the latest case mutations. Includes archived cases;
    /// the case desk's listing applies the archive filter.
    pub async fn client_cases(
        &self,
        viewer: &Role,
        client_id: Uuid,
    ) -> Result<Vec<LegalCase>, OfficeError> {
        if let Role::Client { client_id: own } = viewer
            && *own != client_id
        {
            return Err(OfficeError::NotFound { what: "client" });
        }
        if matches!(viewer, Role::Visitor) {
            return Err(OfficeError::NotFound { what: "client" });
        }

        let cases: Vec<LegalCase> = store::fetch_all(&*self.store, Collection::Cases).await?;
        Ok(cases
            .into_iter()
            .filter(|case| case.client_id == client_id)
            .collect())
    }

    async fn ensure_unique_login_pair(
        &self,
        candidate: &Client,
        excluding: Option<Uuid>,
    ) -> Result<(), OfficeError> {
        if candidate.email.is_empty() {
            // Without an email the pair can never resolve a login.
            return Ok(());
        }
        let clients: Vec<Client> = store::fetch_all(&*self.store, Collection::Clients).await?;
        let duplicate = clients.iter().any(|existing| {
            Some(existing.id) != excluding
                && existing.email == candidate.email
                && existing.emirates_id == candidate.emirates_id
        });
        if duplicate {
            return Err(OfficeError::DuplicateClient);
        }
        Ok(())
    }
}

fn scoped(viewer: &Role, clients: Vec<Client>) -> Vec<Client> {
    match viewer {
        Role::Administrator | Role::Staff => clients,
        Role::Client { client_id } => clients
            .into_iter()
            .filter(|client| client.id == *client_id)
            .collect(),
        Role::Visitor => Vec::new(),
    }
}
