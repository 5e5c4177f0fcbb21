//! Markdown builders for the console.
//!
//! Every listing and detail view is assembled here as a markdown string and
//! handed to one shared [`MadSkin`]; the REPL itself never concatenates
//! display text. Builders are pure so views can be asserted on in tests.

use rust_decimal::Decimal;
use termimad::MadSkin;
// Styling types must come from termimad's crossterm so they unify with the skin's.
use termimad::crossterm::style::{Color, Stylize};

use crate::advisory::Citation;
use crate::identity::RoleKind;
use crate::library::{SearchHit, StatuteSource};
use crate::practice::cases::{CaseStatus, LegalCase};
use crate::practice::clients::Client;
use crate::practice::ledger::{Expense, FutureDebt, Invoice, InvoiceStatus, LedgerSummary};

use super::menu::MenuItem;

pub fn skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.set_headers_fg(Color::AnsiValue(178));
    skin.bold.set_fg(Color::AnsiValue(222));
    skin.italic.set_fg(Color::AnsiValue(109));
    skin
}

pub fn status_badge(status: CaseStatus) -> String {
    let color = match status {
        CaseStatus::Active => Color::Green,
        CaseStatus::Pending => Color::Yellow,
        CaseStatus::Closed => Color::DarkGrey,
        CaseStatus::Appeal => Color::Magenta,
        CaseStatus::Judgment => Color::Blue,
        CaseStatus::Litigation => Color::Cyan,
        CaseStatus::Archived => Color::Grey,
    };
    status.label().with(color).bold().to_string()
}

pub fn invoice_badge(status: InvoiceStatus) -> String {
    let color = match status {
        InvoiceStatus::Paid => Color::Green,
        InvoiceStatus::Unpaid => Color::Red,
        InvoiceStatus::Partial => Color::Yellow,
    };
    status.label().with(color).to_string()
}

pub fn money(amount: Decimal) -> String {
    format!("{} د.إ", amount.round_dp(2))
}

/// Table cells may carry user text; pipes and newlines would break the row.
fn cell(text: &str) -> String {
    text.replace('|', "/").replace('\n', " ")
}

pub fn menu_block(items: &[&MenuItem], role: RoleKind) -> String {
    let mut md = String::from("# القائمة\n");
    for item in items {
        md.push_str(&format!("* {} **{}** `{}`\n", item.icon, item.label(role), item.id));
    }
    md
}

pub fn case_rows(cases: &[LegalCase]) -> String {
    if cases.is_empty() {
        return String::new();
    }
    let mut md = String::from(
        "|:-:|:-|:-|:-|:-:|\n|**#**|**العنوان**|**الموكل**|**النوع**|**الحالة**|\n|-\n",
    );
    for (index, case) in cases.iter().enumerate() {
        md.push_str(&format!(
            "|{}|{}|{}|{}|{}|\n",
            index + 1,
            cell(&case.title),
            cell(&case.client_name),
            case.category.label(),
            case.status.label(),
        ));
    }
    md
}

pub fn case_details(case: &LegalCase) -> String {
    let mut md = format!("# {}\n\n", cell(&case.title));
    md.push_str(&format!("* رقم القضية: **{}**\n", cell(&case.case_number)));
    md.push_str(&format!(
        "* النوع: {} / {}\n",
        case.category.label(),
        cell(&case.sub_category)
    ));
    md.push_str(&format!("* الموكل: {}\n", cell(&case.client_name)));
    md.push_str(&format!("* الخصم: {}\n", cell(&case.opponent_name)));
    md.push_str(&format!("* المحكمة: {}\n", cell(&case.court_name)));
    md.push_str(&format!(
        "* الأتعاب: {} (المدفوع {})\n",
        money(case.total_fee),
        money(case.paid_amount)
    ));
    md.push_str(&format!(
        "* فتحت في: {}\n",
        case.created_at.format("%d/%m/%Y")
    ));

    md.push_str("\n## المستندات\n");
    if case.documents.is_empty() {
        md.push_str("لا توجد مستندات مرفقة.\n");
    } else {
        for name in &case.documents {
            md.push_str(&format!("* {}\n", cell(name)));
        }
    }

    md.push_str("\n## التعليقات\n");
    if case.comments.is_empty() {
        md.push_str("لا توجد تعليقات.\n");
    } else {
        for comment in &case.comments {
            md.push_str(&format!(
                "* **{}** ({}): {}\n",
                cell(&comment.author_name),
                comment.date,
                cell(&comment.text),
            ));
        }
    }

    md.push_str("\n## المستجدات\n");
    if case.activities.is_empty() {
        md.push_str("لا توجد مستجدات مسجلة.\n");
    } else {
        for entry in &case.activities {
            md.push_str(&format!(
                "* {} — {}\n",
                entry.timestamp.format("%d/%m/%Y"),
                cell(&entry.description),
            ));
        }
    }
    md
}

pub fn client_rows(clients: &[Client]) -> String {
    if clients.is_empty() {
        return String::new();
    }
    let mut md = String::from(
        "|:-:|:-|:-|:-|:-:|\n|**#**|**الاسم**|**الهاتف**|**البريد**|**القضايا**|\n|-\n",
    );
    for (index, client) in clients.iter().enumerate() {
        md.push_str(&format!(
            "|{}|{}|{}|{}|{}|\n",
            index + 1,
            cell(&client.name),
            cell(&client.phone),
            cell(&client.email),
            client.total_cases,
        ));
    }
    md
}

pub fn client_details(client: &Client) -> String {
    let mut md = format!(
        "# {}\n\n* الصفة: {}\n* الهاتف: {}\n* البريد: {}\n* رقم الهوية: {}\n* مسجل منذ: {}\n",
        cell(&client.name),
        client.client_type.label(),
        cell(&client.phone),
        cell(&client.email),
        cell(&client.emirates_id),
        client.created_at.format("%d/%m/%Y"),
    );
    if let Some(broker) = &client.broker_name {
        md.push_str(&format!("* الوسيط: {}", cell(broker)));
        if let Some(commission) = client.broker_commission {
            md.push_str(&format!(" (عمولة {})", money(commission)));
        }
        md.push('\n');
    }
    md
}

pub fn invoice_rows(invoices: &[Invoice]) -> String {
    if invoices.is_empty() {
        return String::new();
    }
    let mut md = String::from(
        "|:-:|:-|:-:|:-:|:-|\n|**#**|**البيان**|**المبلغ**|**الحالة**|**التاريخ**|\n|-\n",
    );
    for (index, invoice) in invoices.iter().enumerate() {
        md.push_str(&format!(
            "|{}|{}|{}|{}|{}|\n",
            index + 1,
            cell(&invoice.description),
            money(invoice.amount),
            invoice.status.label(),
            invoice.date.format("%d/%m/%Y"),
        ));
    }
    md
}

pub fn expense_rows(expenses: &[Expense]) -> String {
    if expenses.is_empty() {
        return String::new();
    }
    let mut md = String::from(
        "|:-:|:-|:-:|:-:|:-|\n|**#**|**البيان**|**المبلغ**|**الفئة**|**التاريخ**|\n|-\n",
    );
    for (index, expense) in expenses.iter().enumerate() {
        md.push_str(&format!(
            "|{}|{}|{}|{}|{}|\n",
            index + 1,
            cell(&expense.description),
            money(expense.amount),
            expense.category.label(),
            expense.date.format("%d/%m/%Y"),
        ));
    }
    md
}

pub fn debt_rows(debts: &[FutureDebt]) -> String {
    if debts.is_empty() {
        return String::new();
    }
    let mut md = String::from(
        "|:-:|:-|:-|:-:|:-:|\n|**#**|**الموكل**|**البيان**|**المبلغ**|**الاستحقاق**|\n|-\n",
    );
    for (index, debt) in debts.iter().enumerate() {
        md.push_str(&format!(
            "|{}|{}|{}|{}|{}|\n",
            index + 1,
            cell(&debt.client_name),
            cell(&debt.description),
            money(debt.amount),
            debt.due_date.format("%d/%m/%Y"),
        ));
    }
    md
}

pub fn summary_block(summary: &LedgerSummary) -> String {
    let mut md = String::from("# الموقف المالي\n\n");
    md.push_str(&format!("* المحصّل: **{}**\n", money(summary.collected)));
    md.push_str(&format!("* المعلّق: **{}**\n", money(summary.pending)));
    md.push_str(&format!(
        "* صافي الربح: **{}**\n",
        money(summary.net_profit)
    ));
    md.push_str(&format!(
        "* ديون مستقبلية: {}\n",
        money(summary.future_debt_total)
    ));

    if !summary.expenses_by_category.is_empty() {
        md.push_str("\n## المصروفات حسب الفئة\n");
        for (category, total) in &summary.expenses_by_category {
            md.push_str(&format!("* {}: {}\n", category.label(), money(*total)));
        }
    }
    md
}

pub fn library_rows(sources: &[StatuteSource]) -> String {
    let mut md = String::from("# المكتبة القانونية\n\n");
    for source in sources {
        md.push_str(&format!(
            "* `{}` **{}** — {} ({} مادة)\n",
            source.id,
            cell(&source.title),
            cell(&source.citation),
            source.articles.len(),
        ));
    }
    md
}

pub fn article_rows(source: &StatuteSource) -> String {
    let mut md = format!("# {}\n{}\n\n", cell(&source.title), cell(&source.citation));
    for article in &source.articles {
        md.push_str(&format!(
            "## المادة {} — {}\n{}\n\n",
            article.number,
            cell(&article.title),
            cell(&article.summary),
        ));
    }
    md
}

pub fn search_rows(hits: &[SearchHit]) -> String {
    let mut md = String::new();
    for hit in hits {
        md.push_str(&format!(
            "* **{}** — المادة {} ({}): {}\n",
            cell(&hit.source_title),
            hit.article_number,
            cell(&hit.article_title),
            cell(&hit.summary),
        ));
    }
    md
}

pub fn citation_rows(citations: &[Citation]) -> String {
    let mut md = String::from("\n**المصادر:**\n");
    for (index, citation) in citations.iter().enumerate() {
        md.push_str(&format!(
            "* [{}] {} — {}\n",
            index + 1,
            cell(&citation.title),
            citation.url,
        ));
    }
    md
}
