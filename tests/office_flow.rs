//! End-to-end flows over a real JSON-file store: client intake, case work,
//! role boundaries, the accounting book, and persistence across a reopen.

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use uuid::Uuid;

use wakeel::error::OfficeError;
use wakeel::identity::{ResolvedIdentity, Role};
use wakeel::messages;
use wakeel::practice::cases::{CaseCategory, CaseDesk, CaseForm, CaseStatus};
use wakeel::practice::clients::{ClientForm, ClientKind, ClientRegistry};
use wakeel::practice::ledger::{ExpenseCategory, ExpenseForm, InvoiceForm, InvoiceStatus, Ledger};
use wakeel::store::{JsonStore, RecordStore};

const SEEDED_CLIENT_ID: &str = "6e2a72b5-8c6f-4f4e-9b3d-1a2f0c9d4e01";

fn administrator() -> ResolvedIdentity {
    ResolvedIdentity {
        role: Role::Administrator,
        display_name: "مدير المكتب".to_string(),
    }
}

fn staff() -> ResolvedIdentity {
    ResolvedIdentity {
        role: Role::Staff,
        display_name: "سمر العبد".to_string(),
    }
}

fn open_store(dir: &Path) -> Arc<dyn RecordStore> {
    Arc::new(JsonStore::open(dir).expect("open store"))
}

fn intake_form() -> ClientForm {
    ClientForm {
        name: "منصور خليفة الظاهري".to_string(),
        email: "mansour@example.com".to_string(),
        phone: "0559876543".to_string(),
        emirates_id: "784-1990-7070707-3".to_string(),
        client_type: ClientKind::Individual,
        broker_name: None,
        broker_commission: None,
    }
}

#[tokio::test]
async fn intake_to_archive_walks_every_role_boundary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let registry = ClientRegistry::new(store.clone());
    let desk = CaseDesk::new(store.clone());
    let admin = administrator();
    let lawyer = staff();

    let client = registry
        .add(&admin.role, intake_form())
        .await
        .expect("register client");

    let case = desk
        .create(
            &admin,
            CaseForm {
                case_number: "LAB-2025-311".to_string(),
                title: "مطالبة بمستحقات نهاية الخدمة".to_string(),
                category: CaseCategory::Labour,
                sub_category: None,
                opponent_name: "شركة البناء الحديث".to_string(),
                court_name: "محكمة دبي العمالية".to_string(),
                total_fee: dec!(12000),
                paid_amount: dec!(4000),
            },
            &client,
        )
        .await
        .expect("open case");

    // Staff handle the day-to-day work on the docket.
    desk.add_comment(&lawyer, case.id, "تم تجهيز مذكرة الدفاع.")
        .await
        .expect("comment");
    desk.add_document(&lawyer, case.id, "مذكرة الدفاع")
        .await
        .expect("attach document");
    let updated = desk
        .change_status(&lawyer, case.id, CaseStatus::Litigation)
        .await
        .expect("change status");
    assert_eq!(updated.status, CaseStatus::Litigation);

    // The client sees exactly their own docket.
    let me = Role::Client {
        client_id: client.id,
    };
    let mine = desk.list(&me).await.expect("client listing");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, case.id);
    assert_eq!(mine[0].documents, vec!["مذكرة الدفاع".to_string()]);
    assert_eq!(mine[0].comments.len(), 1);

    // A different client sees none of it; visitors see nothing at all.
    let stranger = Role::Client {
        client_id: Uuid::new_v4(),
    };
    assert!(desk.list(&stranger).await.expect("stranger listing").is_empty());
    assert!(desk.list(&Role::Visitor).await.expect("visitor listing").is_empty());

    // Only the administrator may cross the archive boundary.
    let denied = desk
        .set_archived(&lawyer, case.id, true)
        .await
        .expect_err("staff must be refused");
    assert!(matches!(denied, OfficeError::Forbidden { .. }));
    assert_eq!(denied.user_message(), messages::ARCHIVE_ADMIN_ONLY);

    desk.set_archived(&admin, case.id, true)
        .await
        .expect("administrator archives");
    let active = desk.list(&admin.role).await.expect("active listing");
    assert!(active.iter().all(|c| c.id != case.id));
    let archived = desk.list_archive(&admin.role).await.expect("archive listing");
    assert!(archived.iter().any(|c| c.id == case.id));

    // And back out again.
    desk.set_archived(&admin, case.id, false)
        .await
        .expect("administrator restores");
    let active = desk.list(&admin.role).await.expect("active listing again");
    assert!(active.iter().any(|c| c.id == case.id));
}

#[tokio::test]
async fn seeded_book_feeds_summary_and_csv_export() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let ledger = Ledger::new(store);
    let admin = administrator();

    let summary = ledger.summary(&admin.role).await.expect("summary");
    assert_eq!(summary.collected, dec!(5000));
    assert_eq!(summary.pending, dec!(20000));
    assert_eq!(summary.net_profit, dec!(1800));
    assert_eq!(summary.future_debt_total, dec!(10000));
    assert_eq!(
        summary.expenses_by_category.get(&ExpenseCategory::Office),
        Some(&dec!(3200))
    );
    assert_eq!(
        summary.expenses_by_category.get(&ExpenseCategory::Court),
        Some(&dec!(850))
    );

    let out = dir.path().join("exports");
    let files = ledger.export_csv(&admin.role, &out).await.expect("export");
    assert_eq!(files.len(), 3);
    for file in &files {
        assert!(file.exists(), "missing export {file:?}");
    }

    let invoices_csv =
        std::fs::read_to_string(out.join("invoices.csv")).expect("read invoices.csv");
    assert!(invoices_csv.contains("clientId"));
    assert!(invoices_csv.contains("5000"));
}

#[tokio::test]
async fn seeded_client_sees_only_their_own_invoices() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let ledger = Ledger::new(store);

    let ahmed = Role::Client {
        client_id: SEEDED_CLIENT_ID.parse().expect("seeded client id"),
    };
    let mine = ledger.invoices(&ahmed).await.expect("own invoices");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].amount, dec!(5000));
    assert_eq!(mine[0].status, InvoiceStatus::Paid);

    // Office books stay closed to the client role.
    assert!(matches!(
        ledger.expenses(&ahmed).await,
        Err(OfficeError::Forbidden { .. })
    ));
    let form = InvoiceForm {
        client_id: SEEDED_CLIENT_ID.parse().expect("seeded client id"),
        case_id: None,
        amount: dec!(100),
        status: InvoiceStatus::Unpaid,
        description: String::new(),
    };
    assert!(matches!(
        ledger.add_invoice(&ahmed, form).await,
        Err(OfficeError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn client_profile_lists_their_cases() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let registry = ClientRegistry::new(store);
    let admin = administrator();

    let ahmed: Uuid = SEEDED_CLIENT_ID.parse().expect("seeded client id");
    let cases = registry
        .client_cases(&admin.role, ahmed)
        .await
        .expect("client cases");
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].case_number, "RNT-2025-118");
}

#[tokio::test]
async fn reregistering_a_seeded_login_pair_is_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(dir.path());
    let registry = ClientRegistry::new(store);
    let admin = administrator();

    let mut form = intake_form();
    form.email = "ahmed.alhashimi@example.com".to_string();
    form.emirates_id = "784-1985-1234567-1".to_string();

    let err = registry
        .add(&admin.role, form)
        .await
        .expect_err("duplicate login pair refused");
    assert!(matches!(err, OfficeError::DuplicateClient));
}

#[tokio::test]
async fn records_survive_a_store_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = administrator();

    let expense_id;
    {
        let store = open_store(dir.path());
        let ledger = Ledger::new(store);
        let stored = ledger
            .add_expense(
                &admin.role,
                ExpenseForm {
                    category: ExpenseCategory::Transport,
                    amount: dec!(240),
                    description: "انتقالات جلسة أبوظبي".to_string(),
                },
            )
            .await
            .expect("record expense");
        expense_id = stored.id;
    }

    let store = open_store(dir.path());
    let ledger = Ledger::new(store);
    let expenses = ledger.expenses(&admin.role).await.expect("read back");
    assert_eq!(expenses[0].id, expense_id);
    assert_eq!(expenses[0].amount, dec!(240));
}
