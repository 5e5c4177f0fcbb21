//! Case lifecycle: intake, status transitions, comments, documents, detail
//! edits, and archival.
//!
//! Every mutation is expressed as a pure `with_*` function that returns one
//! new case value carrying both the changed field and the activity entry
//! describing it; the desk persists that value with a single `patch_by_id`.
//! Activities are append-only and newest first. Nothing here ever issues two
//! writes for one user action.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit;
use crate::error::OfficeError;
use crate::identity::{ResolvedIdentity, Role, RoleKind};
use crate::messages;
use crate::practice::clients::Client;
use crate::practice::{require_administrator, require_office};
use crate::store::{self, Collection, RecordStore};

/// Sub-category applied when intake leaves the field blank.
pub const DEFAULT_SUB_CATEGORY: &str = "عام";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Active,
    Pending,
    Closed,
    Appeal,
    Judgment,
    Litigation,
    Archived,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 7] = [
        Self::Active,
        Self::Pending,
        Self::Closed,
        Self::Appeal,
        Self::Judgment,
        Self::Litigation,
        Self::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Closed => "closed",
            Self::Appeal => "appeal",
            Self::Judgment => "judgment",
            Self::Litigation => "litigation",
            Self::Archived => "archived",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "closed" => Some(Self::Closed),
            "appeal" => Some(Self::Appeal),
            "judgment" => Some(Self::Judgment),
            "litigation" => Some(Self::Litigation),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "نشطة",
            Self::Pending => "قيد الانتظار",
            Self::Closed => "مغلقة",
            Self::Appeal => "استئناف",
            Self::Judgment => "صدر الحكم",
            Self::Litigation => "قيد التقاضي",
            Self::Archived => "مؤرشفة",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseCategory {
    Civil,
    Commercial,
    Criminal,
    Family,
    Labour,
    Rental,
}

impl CaseCategory {
    pub const ALL: [CaseCategory; 6] = [
        Self::Civil,
        Self::Commercial,
        Self::Criminal,
        Self::Family,
        Self::Labour,
        Self::Rental,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Civil => "civil",
            Self::Commercial => "commercial",
            Self::Criminal => "criminal",
            Self::Family => "family",
            Self::Labour => "labour",
            Self::Rental => "rental",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "civil" => Some(Self::Civil),
            "commercial" => Some(Self::Commercial),
            "criminal" => Some(Self::Criminal),
            "family" => Some(Self::Family),
            "labour" | "labor" => Some(Self::Labour),
            "rental" => Some(Self::Rental),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Civil => "مدني",
            Self::Commercial => "تجاري",
            Self::Criminal => "جنائي",
            Self::Family => "أحوال شخصية",
            Self::Labour => "عمالي",
            Self::Rental => "إيجاري",
        }
    }
}

/// The four activity shapes the record format knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    StatusChange,
    CommentAdded,
    DocumentAdded,
    InfoUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub actor_role: RoleKind,
    pub actor_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseComment {
    pub author_role: RoleKind,
    pub author_name: String,
    pub text: String,
    /// Locale-formatted day, `dd/mm/yyyy`.
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalCase {
    pub id: Uuid,
    pub case_number: String,
    pub title: String,
    pub category: CaseCategory,
    pub sub_category: String,
    pub client_id: Uuid,
    /// Denormalized at intake; not kept in sync with later client edits.
    pub client_name: String,
    pub opponent_name: String,
    pub court_name: String,
    pub status: CaseStatus,
    pub total_fee: Decimal,
    pub paid_amount: Decimal,
    pub is_archived: bool,
    pub documents: Vec<String>,
    pub comments: Vec<CaseComment>,
    /// Newest first. Entries are only ever prepended.
    pub activities: Vec<CaseActivity>,
    pub created_at: DateTime<Utc>,
}

/// Intake form for a new case.
#[derive(Debug, Clone)]
pub struct CaseForm {
    pub case_number: String,
    pub title: String,
    pub category: CaseCategory,
    pub sub_category: Option<String>,
    pub opponent_name: String,
    pub court_name: String,
    pub total_fee: Decimal,
    pub paid_amount: Decimal,
}

/// Detail edits; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct CaseChanges {
    pub title: Option<String>,
    pub opponent_name: Option<String>,
    pub court_name: Option<String>,
    pub sub_category: Option<String>,
    pub total_fee: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
}

/// Who performed a mutation, as recorded on comments and activities.
#[derive(Debug, Clone)]
pub struct Actor {
    pub role: RoleKind,
    pub name: String,
}

impl Actor {
    pub fn of(identity: &ResolvedIdentity) -> Self {
        Self {
            role: identity.role.kind(),
            name: identity.display_name.clone(),
        }
    }
}

fn activity(kind: ActivityKind, description: String, actor: &Actor) -> CaseActivity {
    CaseActivity {
        kind,
        description,
        actor_role: actor.role,
        actor_name: actor.name.clone(),
        timestamp: Utc::now(),
    }
}

/// Build a new case from an intake form, denormalizing the client's name.
pub fn new_case(form: CaseForm, client: &Client) -> Result<LegalCase, OfficeError> {
    if form.title.trim().is_empty() {
        return Err(OfficeError::validation(messages::CASE_TITLE_REQUIRED));
    }
    if form.paid_amount > form.total_fee {
        return Err(OfficeError::validation(messages::PAID_EXCEEDS_FEE));
    }

    let sub_category = form
        .sub_category
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SUB_CATEGORY.to_string());

    Ok(LegalCase {
        id: Uuid::new_v4(),
        case_number: form.case_number.trim().to_string(),
        title: form.title.trim().to_string(),
        category: form.category,
        sub_category,
        client_id: client.id,
        client_name: client.name.clone(),
        opponent_name: form.opponent_name.trim().to_string(),
        court_name: form.court_name.trim().to_string(),
        status: CaseStatus::Active,
        total_fee: form.total_fee,
        paid_amount: form.paid_amount,
        is_archived: false,
        documents: Vec::new(),
        comments: Vec::new(),
        activities: Vec::new(),
        created_at: Utc::now(),
    })
}

/// One new case value with the status changed and a `status_change` activity
/// at the front. `None` when the status is already `status`; the caller must
/// then skip the write entirely.
pub fn with_status(case: &LegalCase, status: CaseStatus, actor: &Actor) -> Option<LegalCase> {
    if case.status == status {
        return None;
    }

    let mut updated = case.clone();
    let description = format!(
        "تم تغيير حالة القضية من {} إلى {}",
        case.status.label(),
        status.label()
    );
    updated.status = status;
    updated
        .activities
        .insert(0, activity(ActivityKind::StatusChange, description, actor));
    Some(updated)
}

/// One new case value with the comment appended and a `comment_added`
/// activity at the front. Whitespace-only text is rejected before anything
/// is built.
pub fn with_comment(case: &LegalCase, text: &str, actor: &Actor) -> Result<LegalCase, OfficeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(OfficeError::validation(messages::COMMENT_EMPTY));
    }

    let mut updated = case.clone();
    updated.comments.push(CaseComment {
        author_role: actor.role,
        author_name: actor.name.clone(),
        text: text.to_string(),
        date: Utc::now().format("%d/%m/%Y").to_string(),
    });
    updated.activities.insert(
        0,
        activity(
            ActivityKind::CommentAdded,
            "تمت إضافة تعليق جديد على القضية".to_string(),
            actor,
        ),
    );
    Ok(updated)
}

/// One new case value with the document reference appended and a
/// `document_added` activity at the front.
pub fn with_document(
    case: &LegalCase,
    name: &str,
    actor: &Actor,
) -> Result<LegalCase, OfficeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OfficeError::validation(messages::DOCUMENT_NAME_REQUIRED));
    }

    let mut updated = case.clone();
    updated.documents.push(name.to_string());
    updated.activities.insert(
        0,
        activity(
            ActivityKind::DocumentAdded,
            format!("تمت إضافة مستند: {name}"),
            actor,
        ),
    );
    Ok(updated)
}

/// One new case value with the detail edits applied and a single
/// `info_update` activity at the front. Fee invariants are re-checked against
/// the edited values.
pub fn with_details(
    case: &LegalCase,
    changes: CaseChanges,
    actor: &Actor,
) -> Result<LegalCase, OfficeError> {
    let mut updated = case.clone();

    if let Some(title) = changes.title {
        if title.trim().is_empty() {
            return Err(OfficeError::validation(messages::CASE_TITLE_REQUIRED));
        }
        updated.title = title.trim().to_string();
    }
    if let Some(opponent) = changes.opponent_name {
        updated.opponent_name = opponent.trim().to_string();
    }
    if let Some(court) = changes.court_name {
        updated.court_name = court.trim().to_string();
    }
    if let Some(sub) = changes.sub_category {
        let sub = sub.trim();
        updated.sub_category = if sub.is_empty() {
            DEFAULT_SUB_CATEGORY.to_string()
        } else {
            sub.to_string()
        };
    }
    if let Some(fee) = changes.total_fee {
        updated.total_fee = fee;
    }
    if let Some(paid) = changes.paid_amount {
        updated.paid_amount = paid;
    }
    if updated.paid_amount > updated.total_fee {
        return Err(OfficeError::validation(messages::PAID_EXCEEDS_FEE));
    }

    updated.activities.insert(
        0,
        activity(
            ActivityKind::InfoUpdate,
            "تم تحديث بيانات القضية".to_string(),
            actor,
        ),
    );
    Ok(updated)
}

fn in_scope(viewer: &Role, case: &LegalCase) -> bool {
    match viewer {
        Role::Administrator | Role::Staff => true,
        Role::Client { client_id } => case.client_id == *client_id,
        Role::Visitor => false,
    }
}

pub struct CaseDesk {
    store: Arc<dyn RecordStore>,
}

impl CaseDesk {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Working set: visible, non-archived cases, newest first.
    pub async fn list(&self, viewer: &Role) -> Result<Vec<LegalCase>, OfficeError> {
        let cases: Vec<LegalCase> = store::fetch_all(&*self.store, Collection::Cases).await?;
        Ok(cases
            .into_iter()
            .filter(|case| !case.is_archived && in_scope(viewer, case))
            .collect())
    }

    /// Archived cases. Administrator only.
    pub async fn list_archive(&self, viewer: &Role) -> Result<Vec<LegalCase>, OfficeError> {
        require_administrator(viewer, "archive cases")?;
        let cases: Vec<LegalCase> = store::fetch_all(&*self.store, Collection::Cases).await?;
        Ok(cases.into_iter().filter(|case| case.is_archived).collect())
    }

    /// Case detail, archived or not, for anyone allowed to see it.
    pub async fn get(&self, viewer: &Role, id: Uuid) -> Result<LegalCase, OfficeError> {
        self.visible_case(viewer, id).await
    }

    pub async fn create(
        &self,
        viewer: &ResolvedIdentity,
        form: CaseForm,
        client: &Client,
    ) -> Result<LegalCase, OfficeError> {
        require_office(&viewer.role, "open cases")?;
        let case = new_case(form, client)?;

        let stored = store::save_record(&*self.store, Collection::Cases, &case).await?;
        audit::record(
            "case_created",
            serde_json::json!({
                "caseId": stored.id,
                "clientId": stored.client_id,
                "category": stored.category.as_str(),
                "title": audit::redact(&stored.title),
            }),
        );
        Ok(stored)
    }

    /// Transition a case's status. Re-selecting the current status is a
    /// no-op: the stored case is returned untouched and no write happens.
    pub async fn change_status(
        &self,
        viewer: &ResolvedIdentity,
        id: Uuid,
        status: CaseStatus,
    ) -> Result<LegalCase, OfficeError> {
        require_office(&viewer.role, "edit cases")?;
        let case = self.visible_case(&viewer.role, id).await?;

        let Some(updated) = with_status(&case, status, &Actor::of(viewer)) else {
            return Ok(case);
        };
        let stored = self.patch(updated).await?;
        audit::record(
            "case_status_changed",
            serde_json::json!({
                "caseId": stored.id,
                "from": case.status.as_str(),
                "to": stored.status.as_str(),
            }),
        );
        Ok(stored)
    }

    /// Comments are open to the office and to the case's own client.
    pub async fn add_comment(
        &self,
        viewer: &ResolvedIdentity,
        id: Uuid,
        text: &str,
    ) -> Result<LegalCase, OfficeError> {
        if !viewer.role.is_office() && viewer.role.client_id().is_none() {
            audit::inc_blocked_action();
            return Err(OfficeError::Forbidden {
                role: viewer.role.kind().as_str(),
                action: "comment on cases",
            });
        }
        let case = self.visible_case(&viewer.role, id).await?;

        let updated = with_comment(&case, text, &Actor::of(viewer))?;
        let stored = self.patch(updated).await?;
        audit::record(
            "case_comment_added",
            serde_json::json!({ "caseId": stored.id }),
        );
        Ok(stored)
    }

    pub async fn add_document(
        &self,
        viewer: &ResolvedIdentity,
        id: Uuid,
        name: &str,
    ) -> Result<LegalCase, OfficeError> {
        require_office(&viewer.role, "edit cases")?;
        let case = self.visible_case(&viewer.role, id).await?;

        let updated = with_document(&case, name, &Actor::of(viewer))?;
        let stored = self.patch(updated).await?;
        audit::record(
            "case_document_added",
            serde_json::json!({ "caseId": stored.id }),
        );
        Ok(stored)
    }

    pub async fn update_details(
        &self,
        viewer: &ResolvedIdentity,
        id: Uuid,
        changes: CaseChanges,
    ) -> Result<LegalCase, OfficeError> {
        require_office(&viewer.role, "edit cases")?;
        let case = self.visible_case(&viewer.role, id).await?;

        let updated = with_details(&case, changes, &Actor::of(viewer))?;
        let stored = self.patch(updated).await?;
        audit::record(
            "case_info_updated",
            serde_json::json!({ "caseId": stored.id }),
        );
        Ok(stored)
    }

    /// Move a case in or out of the archive. Administrator only; staff may
    /// edit case content but never cross this boundary.
    pub async fn set_archived(
        &self,
        viewer: &ResolvedIdentity,
        id: Uuid,
        archived: bool,
    ) -> Result<LegalCase, OfficeError> {
        require_administrator(&viewer.role, "archive cases")?;
        let case = self.visible_case(&viewer.role, id).await?;
        if case.is_archived == archived {
            return Ok(case);
        }

        let mut updated = case;
        updated.is_archived = archived;
        let stored = self.patch(updated).await?;
        audit::record(
            "case_archive_toggled",
            serde_json::json!({ "caseId": stored.id, "archived": archived }),
        );
        Ok(stored)
    }

    async fn visible_case(&self, viewer: &Role, id: Uuid) -> Result<LegalCase, OfficeError> {
        let cases: Vec<LegalCase> = store::fetch_all(&*self.store, Collection::Cases).await?;
        cases
            .into_iter()
            .filter(|case| in_scope(viewer, case))
            .find(|case| case.id == id)
            .ok_or(OfficeError::NotFound { what: "case" })
    }

    async fn patch(&self, case: LegalCase) -> Result<LegalCase, OfficeError> {
        let id = case.id.to_string();
        Ok(store::update_record(&*self.store, Collection::Cases, &id, &case).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::{
        ActivityKind, Actor, CaseCategory, CaseChanges, CaseDesk, CaseForm, CaseStatus,
        DEFAULT_SUB_CATEGORY, new_case, with_comment, with_details, with_document, with_status,
    };
    use crate::error::OfficeError;
    use crate::identity::{ResolvedIdentity, Role, RoleKind};
    use crate::practice::clients::{Client, ClientForm, new_client};
    use crate::store::MemoryStore;

    fn sample_client() -> Client {
        new_client(ClientForm {
            name: "شركة الاختبار".to_string(),
            email: "test@client.ae".to_string(),
            phone: "0501112222".to_string(),
            emirates_id: "784-1999-7654321-9".to_string(),
            ..ClientForm::default()
        })
        .expect("valid client form")
    }

    fn sample_form() -> CaseForm {
        CaseForm {
            case_number: "COM-2025-777".to_string(),
            title: "Contract Dispute".to_string(),
            category: CaseCategory::Commercial,
            sub_category: None,
            opponent_name: "الطرف الآخر".to_string(),
            court_name: "محكمة دبي التجارية".to_string(),
            total_fee: dec!(30000),
            paid_amount: dec!(10000),
        }
    }

    fn staff() -> Actor {
        Actor {
            role: RoleKind::Staff,
            name: "سمر العبد".to_string(),
        }
    }

    fn admin_identity() -> ResolvedIdentity {
        ResolvedIdentity {
            role: Role::Administrator,
            display_name: "مدير المكتب".to_string(),
        }
    }

    fn staff_identity() -> ResolvedIdentity {
        ResolvedIdentity {
            role: Role::Staff,
            display_name: "سمر العبد".to_string(),
        }
    }

    #[test]
    fn status_names_round_trip() {
        for status in CaseStatus::ALL {
            assert_eq!(CaseStatus::from_name(status.as_str()), Some(status));
        }
        assert_eq!(CaseStatus::from_name("LITIGATION"), Some(CaseStatus::Litigation));
        assert_eq!(CaseStatus::from_name("settled"), None);
    }

    #[test]
    fn category_names_round_trip() {
        for category in CaseCategory::ALL {
            assert_eq!(CaseCategory::from_name(category.as_str()), Some(category));
        }
        assert_eq!(CaseCategory::from_name("labor"), Some(CaseCategory::Labour));
    }

    #[test]
    fn new_case_denormalizes_client_and_starts_empty() {
        let client = sample_client();
        let case = new_case(sample_form(), &client).expect("valid form");

        assert_eq!(case.title, "Contract Dispute");
        assert_eq!(case.category, CaseCategory::Commercial);
        assert_eq!(case.client_id, client.id);
        assert_eq!(case.client_name, client.name);
        assert_eq!(case.sub_category, DEFAULT_SUB_CATEGORY);
        assert_eq!(case.status, CaseStatus::Active);
        assert!(!case.is_archived);
        assert!(case.documents.is_empty());
        assert!(case.comments.is_empty());
        assert!(case.activities.is_empty());

        let again = new_case(sample_form(), &client).expect("valid form");
        assert_ne!(case.id, again.id, "every intake mints a fresh id");
    }

    #[test]
    fn new_case_rejects_blank_title_and_overpayment() {
        let client = sample_client();

        let mut blank = sample_form();
        blank.title = "   ".to_string();
        assert!(matches!(
            new_case(blank, &client),
            Err(OfficeError::Validation { .. })
        ));

        let mut overpaid = sample_form();
        overpaid.paid_amount = dec!(30001);
        assert!(new_case(overpaid, &client).is_err());
    }

    #[test]
    fn same_status_is_a_no_op() {
        let case = new_case(sample_form(), &sample_client()).expect("valid form");
        assert!(with_status(&case, CaseStatus::Active, &staff()).is_none());
    }

    #[test]
    fn status_change_prepends_exactly_one_activity() {
        let case = new_case(sample_form(), &sample_client()).expect("valid form");

        let updated =
            with_status(&case, CaseStatus::Litigation, &staff()).expect("real transition");
        assert_eq!(updated.status, CaseStatus::Litigation);
        assert_eq!(updated.activities.len(), case.activities.len() + 1);

        let entry = &updated.activities[0];
        assert_eq!(entry.kind, ActivityKind::StatusChange);
        assert!(entry.description.contains(CaseStatus::Active.label()));
        assert!(entry.description.contains(CaseStatus::Litigation.label()));
        assert_eq!(entry.actor_name, "سمر العبد");

        // Nothing else moved.
        assert_eq!(updated.id, case.id);
        assert_eq!(updated.comments, case.comments);
        assert_eq!(updated.documents, case.documents);
    }

    #[test]
    fn whitespace_comment_is_rejected_outright() {
        let case = new_case(sample_form(), &sample_client()).expect("valid form");
        assert!(with_comment(&case, "   \n\t ", &staff()).is_err());
        assert!(with_comment(&case, "", &staff()).is_err());
    }

    #[test]
    fn comment_and_activity_land_in_one_value() {
        let case = new_case(sample_form(), &sample_client()).expect("valid form");

        let updated = with_comment(&case, "  تم الاطلاع على الملف  ", &staff())
            .expect("non-empty comment");
        assert_eq!(updated.comments.len(), 1);
        assert_eq!(updated.comments[0].text, "تم الاطلاع على الملف");
        assert_eq!(updated.comments[0].author_role, RoleKind::Staff);
        assert_eq!(updated.activities.len(), 1);
        assert_eq!(updated.activities[0].kind, ActivityKind::CommentAdded);
    }

    #[test]
    fn document_reference_requires_a_name() {
        let case = new_case(sample_form(), &sample_client()).expect("valid form");
        assert!(with_document(&case, "  ", &staff()).is_err());

        let updated = with_document(&case, "مذكرة جوابية", &staff()).expect("named document");
        assert_eq!(updated.documents, vec!["مذكرة جوابية".to_string()]);
        assert_eq!(updated.activities[0].kind, ActivityKind::DocumentAdded);
        assert!(updated.activities[0].description.contains("مذكرة جوابية"));
    }

    #[test]
    fn detail_edit_keeps_fee_invariant_and_logs_once() {
        let case = new_case(sample_form(), &sample_client()).expect("valid form");

        let overpaid = CaseChanges {
            paid_amount: Some(dec!(99999)),
            ..CaseChanges::default()
        };
        assert!(with_details(&case, overpaid, &staff()).is_err());

        let edit = CaseChanges {
            opponent_name: Some("خصم جديد".to_string()),
            total_fee: Some(dec!(35000)),
            ..CaseChanges::default()
        };
        let updated = with_details(&case, edit, &staff()).expect("valid edit");
        assert_eq!(updated.opponent_name, "خصم جديد");
        assert_eq!(updated.total_fee, dec!(35000));
        assert_eq!(updated.activities.len(), 1);
        assert_eq!(updated.activities[0].kind, ActivityKind::InfoUpdate);
    }

    #[tokio::test]
    async fn desk_skips_the_write_on_a_same_status_change() {
        let desk = CaseDesk::new(Arc::new(MemoryStore::blank()));
        let admin = admin_identity();
        let created = desk
            .create(&admin, sample_form(), &sample_client())
            .await
            .expect("create");

        let unchanged = desk
            .change_status(&admin, created.id, CaseStatus::Active)
            .await
            .expect("no-op change");
        assert_eq!(unchanged, created);

        let moved = desk
            .change_status(&admin, created.id, CaseStatus::Pending)
            .await
            .expect("real change");
        assert_eq!(moved.activities.len(), 1);

        let fetched = desk
            .get(&admin.role, created.id)
            .await
            .expect("fetch back");
        assert_eq!(fetched.status, CaseStatus::Pending);
        assert_eq!(fetched.activities.len(), 1);
    }

    #[tokio::test]
    async fn staff_cannot_archive_but_administrator_can() {
        let desk = CaseDesk::new(Arc::new(MemoryStore::blank()));
        let admin = admin_identity();
        let staff = staff_identity();
        let created = desk
            .create(&staff, sample_form(), &sample_client())
            .await
            .expect("create");

        let err = desk
            .set_archived(&staff, created.id, true)
            .await
            .expect_err("staff refused");
        assert!(matches!(
            err,
            OfficeError::Forbidden {
                role: "staff",
                action: "archive cases",
            }
        ));

        let archived = desk
            .set_archived(&admin, created.id, true)
            .await
            .expect("administrator may archive");
        assert!(archived.is_archived);
        // Archival never fabricates a case activity.
        assert!(archived.activities.is_empty());

        assert!(desk.list(&admin.role).await.expect("list").is_empty());
        let shelf = desk.list_archive(&admin.role).await.expect("archive list");
        assert_eq!(shelf.len(), 1);
        assert!(desk.list_archive(&staff.role).await.is_err());
    }

    #[tokio::test]
    async fn client_scope_covers_only_its_own_cases() {
        let desk = CaseDesk::new(Arc::new(MemoryStore::blank()));
        let staff = staff_identity();
        let mine = sample_client();
        let other = sample_client();

        let own_case = desk
            .create(&staff, sample_form(), &mine)
            .await
            .expect("create");
        desk.create(&staff, sample_form(), &other)
            .await
            .expect("create");

        let viewer = Role::Client { client_id: mine.id };
        let visible = desk.list(&viewer).await.expect("list");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, own_case.id);

        assert!(desk.list(&Role::Visitor).await.expect("list").is_empty());
        assert!(matches!(
            desk.get(&Role::Visitor, own_case.id).await,
            Err(OfficeError::NotFound { what: "case" })
        ));
    }

    #[tokio::test]
    async fn own_client_may_comment_with_its_own_attribution() {
        let desk = CaseDesk::new(Arc::new(MemoryStore::blank()));
        let staff = staff_identity();
        let client = sample_client();
        let case = desk
            .create(&staff, sample_form(), &client)
            .await
            .expect("create");

        let as_client = ResolvedIdentity {
            role: Role::Client {
                client_id: client.id,
            },
            display_name: client.name.clone(),
        };
        let updated = desk
            .add_comment(&as_client, case.id, "متى الجلسة القادمة؟")
            .await
            .expect("own client comments");
        assert_eq!(updated.comments[0].author_role, RoleKind::Client);
        assert_eq!(updated.comments[0].author_name, client.name);

        let stranger = ResolvedIdentity {
            role: Role::Client {
                client_id: Uuid::new_v4(),
            },
            display_name: "غريب".to_string(),
        };
        assert!(matches!(
            desk.add_comment(&stranger, case.id, "تعليق").await,
            Err(OfficeError::NotFound { what: "case" })
        ));

        let visitor = ResolvedIdentity {
            role: Role::Visitor,
            display_name: "زائر".to_string(),
        };
        assert!(matches!(
            desk.add_comment(&visitor, case.id, "تعليق").await,
            Err(OfficeError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn newest_case_lists_first() {
        let desk = CaseDesk::new(Arc::new(MemoryStore::blank()));
        let staff = staff_identity();
        let client = sample_client();

        let first = desk
            .create(&staff, sample_form(), &client)
            .await
            .expect("create");
        let mut second_form = sample_form();
        second_form.title = "قضية أحدث".to_string();
        let second = desk
            .create(&staff, second_form, &client)
            .await
            .expect("create");

        let listed = desk.list(&staff.role).await.expect("list");
        assert_eq!(
            listed.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }
}
