//! Accounting book: invoices, office expenses, and future debts.
//!
//! Totals are recomputed from the live collections on every call. There is no
//! cached balance anywhere; the book can never disagree with the records it
//! is derived from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit;
use crate::error::OfficeError;
use crate::identity::Role;
use crate::messages;
use crate::practice::require_office;
use crate::store::{self, Collection, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
    Partial,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [Self::Paid, Self::Unpaid, Self::Partial];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Unpaid => "Unpaid",
            Self::Partial => "Partial",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paid" => Some(Self::Paid),
            "unpaid" => Some(Self::Unpaid),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Paid => "مدفوعة",
            Self::Unpaid => "غير مدفوعة",
            Self::Partial => "مدفوعة جزئياً",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Office,
    Court,
    Transport,
    Supplies,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        Self::Office,
        Self::Court,
        Self::Transport,
        Self::Supplies,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::Court => "court",
            Self::Transport => "transport",
            Self::Supplies => "supplies",
            Self::Other => "other",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "office" => Some(Self::Office),
            "court" => Some(Self::Court),
            "transport" => Some(Self::Transport),
            "supplies" => Some(Self::Supplies),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Office => "مصاريف المكتب",
            Self::Court => "رسوم المحاكم",
            Self::Transport => "مواصلات",
            Self::Supplies => "قرطاسية ولوازم",
            Self::Other => "أخرى",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub client_id: Uuid,
    pub case_id: Option<Uuid>,
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureDebt {
    pub id: Uuid,
    /// Denormalized display name, not a client id.
    pub client_name: String,
    pub category: String,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct InvoiceForm {
    pub client_id: Uuid,
    pub case_id: Option<Uuid>,
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ExpenseForm {
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct FutureDebtForm {
    pub client_name: String,
    pub category: String,
    pub amount: Decimal,
    pub description: String,
    pub due_date: NaiveDate,
}

fn require_positive(amount: Decimal) -> Result<(), OfficeError> {
    if amount <= Decimal::ZERO {
        return Err(OfficeError::validation(messages::AMOUNT_NOT_POSITIVE));
    }
    Ok(())
}

pub fn new_invoice(form: InvoiceForm) -> Result<Invoice, OfficeError> {
    require_positive(form.amount)?;
    Ok(Invoice {
        id: Uuid::new_v4(),
        client_id: form.client_id,
        case_id: form.case_id,
        amount: form.amount,
        status: form.status,
        date: Utc::now().date_naive(),
        description: form.description.trim().to_string(),
    })
}

pub fn new_expense(form: ExpenseForm) -> Result<Expense, OfficeError> {
    require_positive(form.amount)?;
    Ok(Expense {
        id: Uuid::new_v4(),
        category: form.category,
        amount: form.amount,
        description: form.description.trim().to_string(),
        date: Utc::now().date_naive(),
    })
}

pub fn new_future_debt(form: FutureDebtForm) -> Result<FutureDebt, OfficeError> {
    require_positive(form.amount)?;
    Ok(FutureDebt {
        id: Uuid::new_v4(),
        client_name: form.client_name.trim().to_string(),
        category: form.category.trim().to_string(),
        amount: form.amount,
        description: form.description.trim().to_string(),
        date: Utc::now().date_naive(),
        due_date: form.due_date,
    })
}

/// Sum of invoices already settled. Partial invoices count toward neither
/// collected nor pending; only a status change moves their amount.
pub fn total_collected(invoices: &[Invoice]) -> Decimal {
    invoices
        .iter()
        .filter(|invoice| invoice.status == InvoiceStatus::Paid)
        .map(|invoice| invoice.amount)
        .sum()
}

/// Sum of invoices still fully outstanding.
pub fn total_pending(invoices: &[Invoice]) -> Decimal {
    invoices
        .iter()
        .filter(|invoice| invoice.status == InvoiceStatus::Unpaid)
        .map(|invoice| invoice.amount)
        .sum()
}

pub fn expense_totals(expenses: &[Expense]) -> BTreeMap<ExpenseCategory, Decimal> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_insert(Decimal::ZERO) += expense.amount;
    }
    totals
}

/// Collected fees minus office-category running costs. Court fees, transport
/// and the rest are client-recoverable, so they stay out of this figure.
pub fn net_profit(invoices: &[Invoice], expenses: &[Expense]) -> Decimal {
    let office_costs = expenses
        .iter()
        .filter(|expense| expense.category == ExpenseCategory::Office)
        .map(|expense| expense.amount)
        .sum::<Decimal>();
    total_collected(invoices) - office_costs
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    pub collected: Decimal,
    pub pending: Decimal,
    pub expenses_by_category: BTreeMap<ExpenseCategory, Decimal>,
    pub net_profit: Decimal,
    pub future_debt_total: Decimal,
}

pub struct Ledger {
    store: Arc<dyn RecordStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Invoices visible to `viewer`; the client role sees only its own.
    pub async fn invoices(&self, viewer: &Role) -> Result<Vec<Invoice>, OfficeError> {
        let invoices: Vec<Invoice> = store::fetch_all(&*self.store, Collection::Invoices).await?;
        Ok(match viewer {
            Role::Administrator | Role::Staff => invoices,
            Role::Client { client_id } => invoices
                .into_iter()
                .filter(|invoice| invoice.client_id == *client_id)
                .collect(),
            Role::Visitor => Vec::new(),
        })
    }

    pub async fn expenses(&self, viewer: &Role) -> Result<Vec<Expense>, OfficeError> {
        require_office(viewer, "view office expenses")?;
        Ok(store::fetch_all(&*self.store, Collection::Expenses).await?)
    }

    pub async fn future_debts(&self, viewer: &Role) -> Result<Vec<FutureDebt>, OfficeError> {
        require_office(viewer, "view future debts")?;
        Ok(store::fetch_all(&*self.store, Collection::FutureDebts).await?)
    }

    pub async fn add_invoice(
        &self,
        viewer: &Role,
        form: InvoiceForm,
    ) -> Result<Invoice, OfficeError> {
        require_office(viewer, "record invoices")?;
        let invoice = new_invoice(form)?;
        let stored = store::save_record(&*self.store, Collection::Invoices, &invoice).await?;
        audit::record(
            "invoice_recorded",
            serde_json::json!({
                "invoiceId": stored.id,
                "clientId": stored.client_id,
                "status": stored.status.as_str(),
            }),
        );
        Ok(stored)
    }

    pub async fn set_invoice_status(
        &self,
        viewer: &Role,
        id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Invoice, OfficeError> {
        require_office(viewer, "record invoices")?;
        let invoices: Vec<Invoice> = store::fetch_all(&*self.store, Collection::Invoices).await?;
        let Some(mut invoice) = invoices.into_iter().find(|invoice| invoice.id == id) else {
            return Err(OfficeError::NotFound { what: "invoice" });
        };
        if invoice.status == status {
            return Ok(invoice);
        }

        let from = invoice.status;
        invoice.status = status;
        let stored = store::update_record(
            &*self.store,
            Collection::Invoices,
            &invoice.id.to_string(),
            &invoice,
        )
        .await?;
        audit::record(
            "invoice_status_changed",
            serde_json::json!({
                "invoiceId": stored.id,
                "from": from.as_str(),
                "to": stored.status.as_str(),
            }),
        );
        Ok(stored)
    }

    pub async fn add_expense(
        &self,
        viewer: &Role,
        form: ExpenseForm,
    ) -> Result<Expense, OfficeError> {
        require_office(viewer, "record expenses")?;
        let expense = new_expense(form)?;
        let stored = store::save_record(&*self.store, Collection::Expenses, &expense).await?;
        audit::record(
            "expense_recorded",
            serde_json::json!({
                "expenseId": stored.id,
                "category": stored.category.as_str(),
            }),
        );
        Ok(stored)
    }

    pub async fn add_future_debt(
        &self,
        viewer: &Role,
        form: FutureDebtForm,
    ) -> Result<FutureDebt, OfficeError> {
        require_office(viewer, "record future debts")?;
        let debt = new_future_debt(form)?;
        let stored = store::save_record(&*self.store, Collection::FutureDebts, &debt).await?;
        audit::record(
            "future_debt_recorded",
            serde_json::json!({ "debtId": stored.id }),
        );
        Ok(stored)
    }

    /// Office financial position, derived in full on every call.
    pub async fn summary(&self, viewer: &Role) -> Result<LedgerSummary, OfficeError> {
        require_office(viewer, "view the ledger summary")?;
        let invoices: Vec<Invoice> = store::fetch_all(&*self.store, Collection::Invoices).await?;
        let expenses: Vec<Expense> = store::fetch_all(&*self.store, Collection::Expenses).await?;
        let debts: Vec<FutureDebt> =
            store::fetch_all(&*self.store, Collection::FutureDebts).await?;

        Ok(LedgerSummary {
            collected: total_collected(&invoices).round_dp(2),
            pending: total_pending(&invoices).round_dp(2),
            expenses_by_category: expense_totals(&expenses),
            net_profit: net_profit(&invoices, &expenses).round_dp(2),
            future_debt_total: debts.iter().map(|d| d.amount).sum::<Decimal>().round_dp(2),
        })
    }

    /// Write `invoices.csv`, `expenses.csv`, and `future_debts.csv` under
    /// `dir`; returns the files written.
    pub async fn export_csv(&self, viewer: &Role, dir: &Path) -> Result<Vec<PathBuf>, OfficeError> {
        require_office(viewer, "export the ledger")?;
        let invoices: Vec<Invoice> = store::fetch_all(&*self.store, Collection::Invoices).await?;
        let expenses: Vec<Expense> = store::fetch_all(&*self.store, Collection::Expenses).await?;
        let debts: Vec<FutureDebt> =
            store::fetch_all(&*self.store, Collection::FutureDebts).await?;

        std::fs::create_dir_all(dir)
            .map_err(|e| OfficeError::Export(format!("create {dir:?}: {e}")))?;

        let mut written = Vec::with_capacity(3);
        written.push(write_csv(&dir.join("invoices.csv"), &invoices)?);
        written.push(write_csv(&dir.join("expenses.csv"), &expenses)?);
        written.push(write_csv(&dir.join("future_debts.csv"), &debts)?);

        audit::record(
            "ledger_exported",
            serde_json::json!({ "files": written.len() }),
        );
        Ok(written)
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<PathBuf, OfficeError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| OfficeError::Export(format!("open {path:?}: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| OfficeError::Export(format!("write {path:?}: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| OfficeError::Export(format!("flush {path:?}: {e}")))?;
    Ok(path.to_path_buf())
}
