//! Document drafting: render bundled templates against a case and its client.

use chrono::Utc;
use tera::Context;

use crate::error::OfficeError;
use crate::practice::cases::LegalCase;
use crate::practice::clients::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    EngagementLetter,
    CaseSummary,
}

impl DraftKind {
    pub const ALL: [DraftKind; 2] = [Self::EngagementLetter, Self::CaseSummary];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EngagementLetter => "engagement-letter",
            Self::CaseSummary => "case-summary",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "engagement-letter" | "engagement" => Some(Self::EngagementLetter),
            "case-summary" | "summary" => Some(Self::CaseSummary),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EngagementLetter => "اتفاقية أتعاب",
            Self::CaseSummary => "ملخص قضية",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::EngagementLetter => include_str!("templates/engagement_letter.tera"),
            Self::CaseSummary => include_str!("templates/case_summary.tera"),
        }
    }
}

/// Template context from a case and its client. Labels are resolved to their
/// Arabic form here so templates stay free of status/category plumbing.
pub fn build_context(office_name: &str, case: &LegalCase, client: &Client) -> serde_json::Value {
    let now = Utc::now();
    serde_json::json!({
        "generated_at": now.to_rfc3339(),
        "date": now.format("%d/%m/%Y").to_string(),
        "office": { "name": office_name },
        "case": {
            "case_number": case.case_number,
            "title": case.title,
            "category": case.category.label(),
            "sub_category": case.sub_category,
            "client_name": case.client_name,
            "opponent_name": case.opponent_name,
            "court_name": case.court_name,
            "status": case.status.label(),
            "total_fee": case.total_fee,
            "paid_amount": case.paid_amount,
            "remaining_fee": case.total_fee - case.paid_amount,
            "opened_on": case.created_at.format("%d/%m/%Y").to_string(),
            "documents": case.documents,
            "activities": case.activities.iter().map(|entry| serde_json::json!({
                "date": entry.timestamp.format("%d/%m/%Y").to_string(),
                "description": entry.description,
            })).collect::<Vec<_>>(),
        },
        "client": {
            "name": client.name,
            "type": client.client_type.label(),
            "email": client.email,
            "phone": client.phone,
            "emirates_id": client.emirates_id,
        },
    })
}

pub fn render(kind: DraftKind, context: &serde_json::Value) -> Result<String, OfficeError> {
    let map = context
        .as_object()
        .ok_or_else(|| OfficeError::Template("context must be a JSON object".to_string()))?;
    let mut tera_context = Context::new();
    for (key, value) in map {
        tera_context.insert(key, value);
    }

    tera::Tera::one_off(kind.template(), &tera_context, false)
        .map_err(|err| OfficeError::Template(err.to_string()))
}

/// Build then render in one step.
pub fn draft(
    kind: DraftKind,
    office_name: &str,
    case: &LegalCase,
    client: &Client,
) -> Result<String, OfficeError> {
    render(kind, &build_context(office_name, case, client))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{DraftKind, build_context, draft, render};
    use crate::practice::cases::{CaseCategory, CaseForm, LegalCase, new_case};
    use crate::practice::clients::{Client, ClientForm, ClientKind, new_client};

    fn fixtures() -> (LegalCase, Client) {
        let client = new_client(ClientForm {
            name: "شركة النخيل للتجارة".to_string(),
            email: "legal@nakheel.example".to_string(),
            phone: "042345678".to_string(),
            emirates_id: "784-2001-7654321-2".to_string(),
            client_type: ClientKind::Corporate,
            broker_name: None,
            broker_commission: None,
        })
        .expect("valid client");
        let case = new_case(
            CaseForm {
                case_number: "COM-2025-042".to_string(),
                title: "مطالبة بقيمة شيكات مرتجعة".to_string(),
                category: CaseCategory::Commercial,
                sub_category: None,
                opponent_name: "مؤسسة الأفق".to_string(),
                court_name: "محكمة أبوظبي التجارية".to_string(),
                total_fee: dec!(40000),
                paid_amount: dec!(20000),
            },
            &client,
        )
        .expect("valid case");
        (case, client)
    }

    #[test]
    fn context_carries_resolved_labels_and_remaining_fee() {
        let (case, client) = fixtures();
        let context = build_context("مكتب المحاماة", &case, &client);

        assert_eq!(
            context["case"]["category"].as_str(),
            Some(CaseCategory::Commercial.label())
        );
        assert_eq!(context["case"]["remaining_fee"].as_str(), Some("20000"));
        assert_eq!(context["client"]["type"].as_str(), Some("شركة"));
    }

    #[test]
    fn engagement_letter_renders_both_parties() {
        let (case, client) = fixtures();
        let letter = draft(DraftKind::EngagementLetter, "مكتب الوكيل", &case, &client)
            .expect("render engagement letter");

        assert!(letter.contains("مكتب الوكيل"));
        assert!(letter.contains(&client.name));
        assert!(letter.contains(&case.title));
        assert!(letter.contains("40000"));
        assert!(letter.contains("20000"));
    }

    #[test]
    fn case_summary_renders_without_documents_or_activities() {
        let (case, client) = fixtures();
        let summary = draft(DraftKind::CaseSummary, "مكتب الوكيل", &case, &client)
            .expect("render case summary");

        assert!(summary.contains(&case.case_number));
        assert!(summary.contains(case.status.label()));
        // Fresh cases have no documents or activities; the template's empty
        // branches must carry the section instead of failing.
        assert!(summary.contains("لا توجد مستندات مرفقة"));
        assert!(summary.contains("لا توجد مستجدات مسجلة"));
    }

    #[test]
    fn render_rejects_a_non_object_context() {
        let err = render(DraftKind::CaseSummary, &serde_json::json!([1, 2, 3]))
            .expect_err("array context refused");
        assert!(err.to_string().contains("JSON object"));
    }
}
