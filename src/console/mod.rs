//! Interactive office console.
//!
//! One rustyline loop owns the whole session. Commands are typed in Latin,
//! output speaks the office's Arabic. Role rules live in the services; the
//! console renders what they return, keeps the advisory transcript, and maps
//! every failure to one localized line.

pub mod menu;
pub mod render;

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use crossterm::style::{Color, Stylize};
use futures::StreamExt;
use rust_decimal::Decimal;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use termimad::MadSkin;
use uuid::Uuid;

use crate::advisory::{AdvisoryClient, AdvisoryMode, Citation};
use crate::config::AppConfig;
use crate::error::{AuthError, OfficeError};
use crate::identity::{self, ResolvedIdentity, RoleClass, Session};
use crate::library;
use crate::messages;
use crate::practice::cases::{CaseCategory, CaseChanges, CaseDesk, CaseForm, CaseStatus, LegalCase};
use crate::practice::clients::{ClientForm, ClientKind, ClientRegistry};
use crate::practice::docgen::{self, DraftKind};
use crate::practice::ledger::{
    ExpenseCategory, ExpenseForm, FutureDebtForm, InvoiceForm, InvoiceStatus, Ledger,
};
use crate::store::RecordStore;

const HELP: &str = r#"# أوامر المكتب

## الدخول
* `login` تسجيل الدخول (admin / client / visitor) — `logout` الخروج — `menu` القائمة

## القضايا
* `cases` قائمة القضايا — `case <رقم>` تفاصيل قضية — `newcase` فتح قضية
* `status <رقم> <الحالة>` تغيير الحالة — `comment <رقم> <نص>` تعليق
* `attach <رقم> <اسم>` إرفاق مستند — `edit <رقم>` تعديل البيانات
* `archive` عرض الأرشيف — `archive <رقم>` أرشفة — `restore <رقم>` استعادة

## الموكلون
* `clients` قائمة الموكلين — `client <رقم>` ملف موكل وقضاياه
* `register` تسجيل موكل — `edit-client <رقم>` تعديل ملف

## الحسابات
* `ledger` الموقف المالي — `invoices` الفواتير — `expenses` المصروفات — `debts` الديون
* `bill` فاتورة جديدة — `mark <رقم> <paid|unpaid|partial>` تحديث فاتورة
* `expense` مصروف جديد — `debt` دين مستقبلي — `export [مجلد]` تصدير CSV

## المكتبة والمستندات
* `library` المصادر — `library <معرف>` مواد مصدر — `search <كلمات>` بحث
* `draft <engagement|summary> <رقم قضية>` تحرير مستند

## المستشار الذكي
* `ask <سؤال>` محادثة — `legal <مسألة>` تحليل قانوني موثق
* `image <وصف>` توليد صورة — `analyze <مسار ملف>` تحليل مستند
* `cite <رقم>` فتح مصدر من آخر رد

`quit` للخروج.
"#;

/// Who said what, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    User(String),
    Advisor(String),
}

enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    config: AppConfig,
    store: Arc<dyn RecordStore>,
    session: Session,
    clients: ClientRegistry,
    cases: CaseDesk,
    ledger: Ledger,
    advisory: AdvisoryClient,
    skin: MadSkin,
    transcript: Vec<TranscriptEntry>,
    last_citations: Vec<Citation>,
}

impl Console {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            clients: ClientRegistry::new(store.clone()),
            cases: CaseDesk::new(store.clone()),
            ledger: Ledger::new(store.clone()),
            advisory: AdvisoryClient::new(&config.advisory),
            skin: render::skin(),
            session: Session::new(),
            transcript: Vec::new(),
            last_citations: Vec::new(),
            store,
            config,
        }
    }

    /// Everything said to and by the advisory desk this session.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let history = self.config.data_dir.join("console_history.txt");
        let _ = rl.load_history(&history);

        self.skin.print_text(&format!(
            "# {}\n\nاكتب `login` للدخول أو `help` لعرض الأوامر.\n",
            self.config.office_name
        ));

        loop {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line.as_str());
                    match self.dispatch(&line, &mut rl).await {
                        Flow::Continue => {}
                        Flow::Quit => break,
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::warn!("Console input failed: {}", err);
                    break;
                }
            }
        }

        if let Err(e) = std::fs::create_dir_all(&self.config.data_dir) {
            tracing::warn!("Failed to prepare data dir for history: {}", e);
        } else if let Err(e) = rl.save_history(&history) {
            tracing::warn!("Failed to save console history: {}", e);
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        match self.session.identity() {
            Some(identity) => format!("{} ❯ ", identity.display_name),
            None => "wakeel ❯ ".to_string(),
        }
    }

    async fn dispatch(&mut self, line: &str, rl: &mut DefaultEditor) -> Flow {
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb {
            "quit" | "exit" => return Flow::Quit,
            "help" => self.skin.print_text(HELP),
            "login" => self.login(rest, rl).await,
            "logout" => {
                self.session.sign_out();
                self.notice(messages::LOGGED_OUT);
            }
            _ => {
                let Some(viewer) = self.session.identity().cloned() else {
                    self.notice(messages::LOGIN_REQUIRED);
                    return Flow::Continue;
                };
                if let Err(err) = self.run_command(&viewer, verb, rest, rl).await {
                    self.report(&err);
                }
            }
        }
        Flow::Continue
    }

    async fn run_command(
        &mut self,
        viewer: &ResolvedIdentity,
        verb: &str,
        rest: &str,
        rl: &mut DefaultEditor,
    ) -> Result<(), OfficeError> {
        match verb {
            "menu" => {
                let role = viewer.role.kind();
                let items = menu::visible(role);
                self.skin.print_text(&render::menu_block(&items, role));
                Ok(())
            }
            "cases" => self.show_cases(viewer).await,
            "archive" if rest.is_empty() => self.show_archive(viewer).await,
            "archive" => self.toggle_archive(viewer, rest, true).await,
            "restore" => self.toggle_archive(viewer, rest, false).await,
            "case" => self.show_case(viewer, rest).await,
            "newcase" => self.new_case_flow(viewer, rl).await,
            "status" => self.change_status(viewer, rest).await,
            "comment" => self.comment(viewer, rest).await,
            "attach" => self.attach(viewer, rest).await,
            "edit" => self.edit_case(viewer, rest, rl).await,
            "clients" => self.show_clients(viewer).await,
            "client" => self.show_client(viewer, rest).await,
            "register" => self.register_client(viewer, rl).await,
            "edit-client" => self.edit_client(viewer, rest, rl).await,
            "ledger" => self.show_ledger(viewer).await,
            "invoices" => self.show_invoices(viewer).await,
            "expenses" => self.show_expenses(viewer).await,
            "debts" => self.show_debts(viewer).await,
            "bill" => self.add_invoice_flow(viewer, rl).await,
            "mark" => self.mark_invoice(viewer, rest).await,
            "expense" => self.add_expense_flow(viewer, rl).await,
            "debt" => self.add_debt_flow(viewer, rl).await,
            "export" => self.export_ledger(viewer, rest).await,
            "library" => {
                self.show_library(rest);
                Ok(())
            }
            "search" => {
                self.search_library(rest);
                Ok(())
            }
            "draft" => self.draft_document(viewer, rest).await,
            "ask" => self.ask(rest, AdvisoryMode::Conversation).await,
            "legal" => self.ask(rest, AdvisoryMode::LegalAnalysis).await,
            "image" => self.render_image(rest).await,
            "analyze" => self.analyze_file(rest).await,
            "cite" => {
                self.open_citation(rest);
                Ok(())
            }
            _ => {
                self.notice(messages::UNKNOWN_COMMAND);
                Ok(())
            }
        }
    }

    // ---- session -------------------------------------------------------

    async fn login(&mut self, rest: &str, rl: &mut DefaultEditor) {
        let class_raw = if rest.is_empty() {
            self.notice("فئات الدخول: admin / client / visitor");
            match Self::prompt_line(rl, "الفئة") {
                Some(raw) => raw,
                None => return,
            }
        } else {
            rest.to_string()
        };
        let Some(class) = RoleClass::from_name(&class_raw) else {
            self.error_line(messages::LOGIN_FAILED);
            return;
        };

        let (identifier, secret) = match class {
            RoleClass::Visitor => (String::new(), String::new()),
            RoleClass::Administrative => {
                let identifier =
                    Self::prompt_line(rl, "بريد المحامي (اتركه فارغاً لدخول المدير)")
                        .unwrap_or_default();
                let Some(secret) = Self::prompt_line(rl, "كلمة المرور") else {
                    return;
                };
                (identifier, secret)
            }
            RoleClass::Client => {
                let Some(identifier) = Self::prompt_line(rl, "البريد الإلكتروني") else {
                    return;
                };
                let Some(secret) = Self::prompt_line(rl, "رقم الهوية الإماراتية") else {
                    return;
                };
                (identifier, secret)
            }
        };

        match identity::resolve_identity(
            &*self.store,
            &self.config.credentials,
            class,
            &identifier,
            &secret,
        )
        .await
        {
            Ok(identity) => {
                println!("{}", messages::welcome(&identity.display_name).green());
                self.session.sign_in(identity);
            }
            Err(err) => {
                if let AuthError::Store(inner) = &err {
                    tracing::warn!("Store failure during login: {}", inner);
                }
                self.error_line(err.user_message());
            }
        }
    }

    // ---- cases ---------------------------------------------------------

    async fn show_cases(&self, viewer: &ResolvedIdentity) -> Result<(), OfficeError> {
        let cases = self.cases.list(&viewer.role).await?;
        self.print_table(&render::case_rows(&cases));
        Ok(())
    }

    async fn show_archive(&self, viewer: &ResolvedIdentity) -> Result<(), OfficeError> {
        let cases = self.cases.list_archive(&viewer.role).await?;
        self.print_table(&render::case_rows(&cases));
        Ok(())
    }

    async fn show_case(&self, viewer: &ResolvedIdentity, rest: &str) -> Result<(), OfficeError> {
        let case = self.find_case(viewer, rest).await?;
        println!("{} {}", "الحالة:".bold(), render::status_badge(case.status));
        self.skin.print_text(&render::case_details(&case));
        Ok(())
    }

    async fn new_case_flow(
        &self,
        viewer: &ResolvedIdentity,
        rl: &mut DefaultEditor,
    ) -> Result<(), OfficeError> {
        let clients = self.clients.list(&viewer.role).await?;
        if clients.is_empty() {
            self.notice(messages::EMPTY_LIST);
            return Ok(());
        }
        self.skin.print_text(&render::client_rows(&clients));
        let Some(raw) = Self::prompt_line(rl, "رقم الموكل") else {
            return Ok(());
        };
        let client = Self::pick(&clients, &raw)
            .cloned()
            .ok_or(OfficeError::NotFound { what: "client" })?;

        let case_number = Self::prompt_line(rl, "رقم القضية").unwrap_or_default();
        let Some(title) = Self::prompt_line(rl, "عنوان القضية") else {
            return Ok(());
        };
        let categories = Self::join_names(CaseCategory::ALL.iter().map(|c| c.as_str()));
        let Some(category_raw) = Self::prompt_line(rl, &format!("النوع ({categories})")) else {
            return Ok(());
        };
        let Some(category) = CaseCategory::from_name(&category_raw) else {
            self.notice(&format!("الأنواع المتاحة: {categories}"));
            return Ok(());
        };
        let sub_category = Self::prompt_line(rl, "التصنيف الفرعي (اختياري)")
            .filter(|value| !value.is_empty());
        let opponent_name = Self::prompt_line(rl, "اسم الخصم").unwrap_or_default();
        let court_name = Self::prompt_line(rl, "المحكمة").unwrap_or_default();
        let total_fee = Self::prompt_decimal(rl, "إجمالي الأتعاب")?;
        let paid_amount = Self::prompt_decimal(rl, "المدفوع")?;

        let form = CaseForm {
            case_number,
            title,
            category,
            sub_category,
            opponent_name,
            court_name,
            total_fee,
            paid_amount,
        };
        let created = self.cases.create(viewer, form, &client).await?;
        println!("{}", messages::SAVED.green());
        self.skin.print_text(&render::case_details(&created));
        Ok(())
    }

    async fn change_status(
        &self,
        viewer: &ResolvedIdentity,
        rest: &str,
    ) -> Result<(), OfficeError> {
        let statuses = Self::join_names(CaseStatus::ALL.iter().map(|s| s.as_str()));
        let Some((index, name)) = rest.split_once(char::is_whitespace) else {
            self.notice(&format!("الصيغة: status <رقم> <{statuses}>"));
            return Ok(());
        };
        let Some(status) = CaseStatus::from_name(name) else {
            self.notice(&format!("الحالات المتاحة: {statuses}"));
            return Ok(());
        };

        let case = self.find_case(viewer, index.trim()).await?;
        let updated = self.cases.change_status(viewer, case.id, status).await?;
        println!(
            "{} {}",
            messages::SAVED.green(),
            render::status_badge(updated.status)
        );
        Ok(())
    }

    async fn comment(&self, viewer: &ResolvedIdentity, rest: &str) -> Result<(), OfficeError> {
        let Some((index, text)) = rest.split_once(char::is_whitespace) else {
            self.notice("الصيغة: comment <رقم> <النص>");
            return Ok(());
        };
        let case = self.find_case(viewer, index.trim()).await?;
        self.cases.add_comment(viewer, case.id, text).await?;
        println!("{}", messages::SAVED.green());
        Ok(())
    }

    async fn attach(&self, viewer: &ResolvedIdentity, rest: &str) -> Result<(), OfficeError> {
        let Some((index, name)) = rest.split_once(char::is_whitespace) else {
            self.notice("الصيغة: attach <رقم> <اسم المستند>");
            return Ok(());
        };
        let case = self.find_case(viewer, index.trim()).await?;
        self.cases.add_document(viewer, case.id, name).await?;
        println!("{}", messages::SAVED.green());
        Ok(())
    }

    async fn edit_case(
        &self,
        viewer: &ResolvedIdentity,
        rest: &str,
        rl: &mut DefaultEditor,
    ) -> Result<(), OfficeError> {
        let case = self.find_case(viewer, rest).await?;
        self.notice("اترك الحقل فارغاً للإبقاء على قيمته.");
        let changes = CaseChanges {
            title: Self::prompt_optional(rl, "العنوان", &case.title),
            opponent_name: Self::prompt_optional(rl, "الخصم", &case.opponent_name),
            court_name: Self::prompt_optional(rl, "المحكمة", &case.court_name),
            sub_category: Self::prompt_optional(rl, "التصنيف الفرعي", &case.sub_category),
            total_fee: Self::prompt_decimal_change(rl, "إجمالي الأتعاب", case.total_fee)?,
            paid_amount: Self::prompt_decimal_change(rl, "المدفوع", case.paid_amount)?,
        };
        let updated = self.cases.update_details(viewer, case.id, changes).await?;
        self.skin.print_text(&render::case_details(&updated));
        Ok(())
    }

    async fn toggle_archive(
        &self,
        viewer: &ResolvedIdentity,
        rest: &str,
        archived: bool,
    ) -> Result<(), OfficeError> {
        let cases = if archived {
            self.cases.list(&viewer.role).await?
        } else {
            self.cases.list_archive(&viewer.role).await?
        };
        let case = Self::pick(&cases, rest)
            .cloned()
            .ok_or(OfficeError::NotFound { what: "case" })?;
        self.cases.set_archived(viewer, case.id, archived).await?;
        let confirmation = if archived {
            messages::CASE_ARCHIVED
        } else {
            messages::CASE_RESTORED
        };
        println!("{}", confirmation.green());
        Ok(())
    }

    async fn find_case(
        &self,
        viewer: &ResolvedIdentity,
        raw: &str,
    ) -> Result<LegalCase, OfficeError> {
        if let Ok(id) = Uuid::parse_str(raw) {
            return self.cases.get(&viewer.role, id).await;
        }
        let cases = self.cases.list(&viewer.role).await?;
        Self::pick(&cases, raw)
            .cloned()
            .ok_or(OfficeError::NotFound { what: "case" })
    }

    // ---- clients -------------------------------------------------------

    async fn show_clients(&self, viewer: &ResolvedIdentity) -> Result<(), OfficeError> {
        let clients = self.clients.list(&viewer.role).await?;
        self.print_table(&render::client_rows(&clients));
        Ok(())
    }

    async fn show_client(&self, viewer: &ResolvedIdentity, rest: &str) -> Result<(), OfficeError> {
        let clients = self.clients.list(&viewer.role).await?;
        let client = Self::pick(&clients, rest)
            .cloned()
            .ok_or(OfficeError::NotFound { what: "client" })?;
        self.skin.print_text(&render::client_details(&client));

        let cases = self.clients.client_cases(&viewer.role, client.id).await?;
        self.print_table(&render::case_rows(&cases));
        Ok(())
    }

    async fn register_client(
        &self,
        viewer: &ResolvedIdentity,
        rl: &mut DefaultEditor,
    ) -> Result<(), OfficeError> {
        let Some(name) = Self::prompt_line(rl, "الاسم") else {
            return Ok(());
        };
        let email = Self::prompt_line(rl, "البريد الإلكتروني").unwrap_or_default();
        let Some(phone) = Self::prompt_line(rl, "الهاتف") else {
            return Ok(());
        };
        let Some(emirates_id) = Self::prompt_line(rl, "رقم الهوية") else {
            return Ok(());
        };
        let kind_raw = Self::prompt_line(rl, "الصفة (individual / corporate)").unwrap_or_default();
        let client_type = ClientKind::from_name(&kind_raw).unwrap_or_default();
        let broker_name =
            Self::prompt_line(rl, "الوسيط (اختياري)").filter(|value| !value.is_empty());
        let broker_commission = if broker_name.is_some() {
            Self::prompt_decimal_change(rl, "عمولة الوسيط", Decimal::ZERO)?
        } else {
            None
        };

        let form = ClientForm {
            name,
            email,
            phone,
            emirates_id,
            client_type,
            broker_name,
            broker_commission,
        };
        let stored = self.clients.add(&viewer.role, form).await?;
        println!("{}", messages::SAVED.green());
        self.skin.print_text(&render::client_details(&stored));
        Ok(())
    }

    async fn edit_client(
        &self,
        viewer: &ResolvedIdentity,
        rest: &str,
        rl: &mut DefaultEditor,
    ) -> Result<(), OfficeError> {
        let clients = self.clients.list(&viewer.role).await?;
        let mut client = Self::pick(&clients, rest)
            .cloned()
            .ok_or(OfficeError::NotFound { what: "client" })?;

        self.notice("اترك الحقل فارغاً للإبقاء على قيمته.");
        if let Some(name) = Self::prompt_optional(rl, "الاسم", &client.name) {
            client.name = name;
        }
        if let Some(email) = Self::prompt_optional(rl, "البريد الإلكتروني", &client.email) {
            client.email = email;
        }
        if let Some(phone) = Self::prompt_optional(rl, "الهاتف", &client.phone) {
            client.phone = phone;
        }
        if let Some(emirates_id) = Self::prompt_optional(rl, "رقم الهوية", &client.emirates_id) {
            client.emirates_id = emirates_id;
        }

        let updated = self.clients.update(&viewer.role, client).await?;
        println!("{}", messages::SAVED.green());
        self.skin.print_text(&render::client_details(&updated));
        Ok(())
    }

    // ---- ledger --------------------------------------------------------

    async fn show_ledger(&self, viewer: &ResolvedIdentity) -> Result<(), OfficeError> {
        if viewer.role.is_office() {
            let summary = self.ledger.summary(&viewer.role).await?;
            self.skin.print_text(&render::summary_block(&summary));
            return Ok(());
        }
        self.show_invoices(viewer).await
    }

    async fn show_invoices(&self, viewer: &ResolvedIdentity) -> Result<(), OfficeError> {
        let invoices = self.ledger.invoices(&viewer.role).await?;
        self.print_table(&render::invoice_rows(&invoices));
        Ok(())
    }

    async fn show_expenses(&self, viewer: &ResolvedIdentity) -> Result<(), OfficeError> {
        let expenses = self.ledger.expenses(&viewer.role).await?;
        self.print_table(&render::expense_rows(&expenses));
        Ok(())
    }

    async fn show_debts(&self, viewer: &ResolvedIdentity) -> Result<(), OfficeError> {
        let debts = self.ledger.future_debts(&viewer.role).await?;
        self.print_table(&render::debt_rows(&debts));
        Ok(())
    }

    async fn add_invoice_flow(
        &self,
        viewer: &ResolvedIdentity,
        rl: &mut DefaultEditor,
    ) -> Result<(), OfficeError> {
        let clients = self.clients.list(&viewer.role).await?;
        if clients.is_empty() {
            self.notice(messages::EMPTY_LIST);
            return Ok(());
        }
        self.skin.print_text(&render::client_rows(&clients));
        let Some(raw) = Self::prompt_line(rl, "رقم الموكل") else {
            return Ok(());
        };
        let client = Self::pick(&clients, &raw)
            .cloned()
            .ok_or(OfficeError::NotFound { what: "client" })?;

        let cases = self.clients.client_cases(&viewer.role, client.id).await?;
        let case_id = if cases.is_empty() {
            None
        } else {
            self.skin.print_text(&render::case_rows(&cases));
            Self::prompt_line(rl, "رقم القضية (اختياري)")
                .filter(|value| !value.is_empty())
                .and_then(|raw| Self::pick(&cases, &raw).map(|case| case.id))
        };

        let amount = Self::prompt_decimal(rl, "المبلغ")?;
        let status_raw =
            Self::prompt_line(rl, "الحالة (paid / unpaid / partial)").unwrap_or_default();
        let status = InvoiceStatus::from_name(&status_raw).unwrap_or(InvoiceStatus::Unpaid);
        let description = Self::prompt_line(rl, "البيان").unwrap_or_default();

        let form = InvoiceForm {
            client_id: client.id,
            case_id,
            amount,
            status,
            description,
        };
        let stored = self.ledger.add_invoice(&viewer.role, form).await?;
        println!(
            "{} {}",
            messages::SAVED.green(),
            render::invoice_badge(stored.status)
        );
        Ok(())
    }

    async fn mark_invoice(&self, viewer: &ResolvedIdentity, rest: &str) -> Result<(), OfficeError> {
        let Some((index, status_raw)) = rest.split_once(char::is_whitespace) else {
            self.notice("الصيغة: mark <رقم> <paid|unpaid|partial>");
            return Ok(());
        };
        let Some(status) = InvoiceStatus::from_name(status_raw) else {
            self.notice("الصيغة: mark <رقم> <paid|unpaid|partial>");
            return Ok(());
        };
        let invoices = self.ledger.invoices(&viewer.role).await?;
        let invoice = Self::pick(&invoices, index.trim())
            .cloned()
            .ok_or(OfficeError::NotFound { what: "invoice" })?;

        let stored = self
            .ledger
            .set_invoice_status(&viewer.role, invoice.id, status)
            .await?;
        println!(
            "{} {}",
            messages::SAVED.green(),
            render::invoice_badge(stored.status)
        );
        Ok(())
    }

    async fn add_expense_flow(
        &self,
        viewer: &ResolvedIdentity,
        rl: &mut DefaultEditor,
    ) -> Result<(), OfficeError> {
        let categories = Self::join_names(ExpenseCategory::ALL.iter().map(|c| c.as_str()));
        let Some(category_raw) = Self::prompt_line(rl, &format!("الفئة ({categories})")) else {
            return Ok(());
        };
        let Some(category) = ExpenseCategory::from_name(&category_raw) else {
            self.notice(&format!("الفئات المتاحة: {categories}"));
            return Ok(());
        };
        let amount = Self::prompt_decimal(rl, "المبلغ")?;
        let description = Self::prompt_line(rl, "البيان").unwrap_or_default();

        let form = ExpenseForm {
            category,
            amount,
            description,
        };
        self.ledger.add_expense(&viewer.role, form).await?;
        println!("{}", messages::SAVED.green());
        Ok(())
    }

    async fn add_debt_flow(
        &self,
        viewer: &ResolvedIdentity,
        rl: &mut DefaultEditor,
    ) -> Result<(), OfficeError> {
        let Some(client_name) = Self::prompt_line(rl, "اسم الموكل") else {
            return Ok(());
        };
        let category = Self::prompt_line(rl, "الفئة").unwrap_or_default();
        let amount = Self::prompt_decimal(rl, "المبلغ")?;
        let description = Self::prompt_line(rl, "البيان").unwrap_or_default();
        let Some(due_raw) = Self::prompt_line(rl, "تاريخ الاستحقاق (YYYY-MM-DD)") else {
            return Ok(());
        };
        let due_date = chrono::NaiveDate::parse_from_str(&due_raw, "%Y-%m-%d")
            .map_err(|_| OfficeError::validation(messages::DATE_INVALID))?;

        let form = FutureDebtForm {
            client_name,
            category,
            amount,
            description,
            due_date,
        };
        self.ledger.add_future_debt(&viewer.role, form).await?;
        println!("{}", messages::SAVED.green());
        Ok(())
    }

    async fn export_ledger(
        &self,
        viewer: &ResolvedIdentity,
        rest: &str,
    ) -> Result<(), OfficeError> {
        let dir = if rest.is_empty() {
            self.config.data_dir.join("exports")
        } else {
            PathBuf::from(rest)
        };
        let files = self.ledger.export_csv(&viewer.role, &dir).await?;
        for file in files {
            println!("{}", format!("✓ {}", file.display()).green());
        }
        Ok(())
    }

    // ---- library and drafting -----------------------------------------

    fn show_library(&self, rest: &str) {
        if rest.is_empty() {
            match library::sources() {
                Ok(sources) => self.skin.print_text(&render::library_rows(sources)),
                Err(err) => {
                    tracing::warn!("Statute library unavailable: {}", err);
                    self.error_line(messages::LIBRARY_UNAVAILABLE);
                }
            }
            return;
        }
        match library::source(rest) {
            Ok(Some(source)) => self.skin.print_text(&render::article_rows(source)),
            Ok(None) => self.notice(messages::RECORD_NOT_FOUND),
            Err(err) => {
                tracing::warn!("Statute library unavailable: {}", err);
                self.error_line(messages::LIBRARY_UNAVAILABLE);
            }
        }
    }

    fn search_library(&self, rest: &str) {
        match library::search(rest) {
            Ok(hits) if hits.is_empty() => self.notice(messages::SEARCH_NO_RESULTS),
            Ok(hits) => self.skin.print_text(&render::search_rows(&hits)),
            Err(err) => {
                tracing::warn!("Statute library unavailable: {}", err);
                self.error_line(messages::LIBRARY_UNAVAILABLE);
            }
        }
    }

    async fn draft_document(
        &self,
        viewer: &ResolvedIdentity,
        rest: &str,
    ) -> Result<(), OfficeError> {
        let Some((kind_raw, index)) = rest.split_once(char::is_whitespace) else {
            self.notice("الصيغة: draft <engagement|summary> <رقم القضية>");
            return Ok(());
        };
        let Some(kind) = DraftKind::from_name(kind_raw) else {
            self.notice("الصيغة: draft <engagement|summary> <رقم القضية>");
            return Ok(());
        };
        if !menu::allows("drafts", viewer.role.kind()) {
            return Err(OfficeError::Forbidden {
                role: viewer.role.kind().as_str(),
                action: "draft documents",
            });
        }

        let case = self.find_case(viewer, index.trim()).await?;
        let client = self.clients.get(&viewer.role, case.client_id).await?;
        let text = docgen::draft(kind, &self.config.office_name, &case, &client)?;
        println!("{text}");
        Ok(())
    }

    // ---- advisory ------------------------------------------------------

    async fn ask(&mut self, rest: &str, mode: AdvisoryMode) -> Result<(), OfficeError> {
        if rest.is_empty() {
            self.notice("اكتب سؤالك بعد الأمر.");
            return Ok(());
        }
        if !self.advisory.enabled() {
            self.error_line(messages::ADVISORY_DISABLED);
            return Ok(());
        }
        self.transcript.push(TranscriptEntry::User(rest.to_string()));

        match mode {
            AdvisoryMode::Conversation => self.ask_streaming(rest).await,
            AdvisoryMode::LegalAnalysis => self.ask_grounded(rest).await,
        }
        Ok(())
    }

    /// Conversation mode streams; deltas print as they arrive and join the
    /// transcript as one entry once the stream ends.
    async fn ask_streaming(&mut self, prompt: &str) {
        let request = self.advisory.advise_stream(prompt, AdvisoryMode::Conversation).await;
        let mut stream = match request {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!("Advisory request failed: {}", err);
                self.error_line(messages::ADVISORY_UNAVAILABLE);
                return;
            }
        };

        let mut reply = String::new();
        while let Some(delta) = stream.next().await {
            match delta {
                Ok(text) => {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                    reply.push_str(&text);
                }
                Err(err) => {
                    tracing::warn!("Advisory stream broke: {}", err);
                    break;
                }
            }
        }
        println!();

        if reply.trim().is_empty() {
            self.error_line(messages::ADVISORY_UNAVAILABLE);
        } else {
            self.transcript.push(TranscriptEntry::Advisor(reply));
        }
    }

    /// Legal analysis uses the full response so grounding citations arrive
    /// with the text.
    async fn ask_grounded(&mut self, prompt: &str) {
        match self.advisory.advise(prompt, AdvisoryMode::LegalAnalysis).await {
            Ok(reply) => {
                self.skin.print_text(&reply.text);
                if !reply.citations.is_empty() {
                    self.skin.print_text(&render::citation_rows(&reply.citations));
                    self.notice("افتح مصدراً بالأمر: cite <رقم>");
                }
                self.transcript
                    .push(TranscriptEntry::Advisor(reply.text.clone()));
                self.last_citations = reply.citations;
            }
            Err(err) => {
                tracing::warn!("Advisory request failed: {}", err);
                self.error_line(messages::ADVISORY_UNAVAILABLE);
            }
        }
    }

    async fn render_image(&self, rest: &str) -> Result<(), OfficeError> {
        if rest.is_empty() {
            self.notice("الصيغة: image <وصف الصورة>");
            return Ok(());
        }
        if !self.advisory.enabled() {
            self.error_line(messages::ADVISORY_DISABLED);
            return Ok(());
        }

        match self.advisory.generate_image(rest, "1:1").await {
            Ok(Some(image)) => {
                let dir = self.config.data_dir.join("exports");
                std::fs::create_dir_all(&dir)
                    .map_err(|e| OfficeError::Export(format!("create {dir:?}: {e}")))?;
                let extension = match image.mime.as_str() {
                    "image/jpeg" => "jpg",
                    _ => "png",
                };
                let stamp = Utc::now().format("%Y%m%d-%H%M%S");
                let path = dir.join(format!("advisory-{stamp}.{extension}"));
                std::fs::write(&path, &image.bytes)
                    .map_err(|e| OfficeError::Export(format!("write {path:?}: {e}")))?;
                println!("{}", format!("حُفظت الصورة في {}", path.display()).green());
            }
            Ok(None) => self.notice(messages::ADVISORY_NO_IMAGE),
            Err(err) => {
                tracing::warn!("Image generation failed: {}", err);
                self.error_line(messages::ADVISORY_UNAVAILABLE);
            }
        }
        Ok(())
    }

    async fn analyze_file(&mut self, rest: &str) -> Result<(), OfficeError> {
        if rest.is_empty() {
            self.notice("الصيغة: analyze <مسار الملف>");
            return Ok(());
        }
        if !self.advisory.enabled() {
            self.error_line(messages::ADVISORY_DISABLED);
            return Ok(());
        }

        let path = PathBuf::from(rest);
        let Ok(bytes) = std::fs::read(&path) else {
            self.error_line(messages::FILE_UNREADABLE);
            return Ok(());
        };
        let mime = mime_guess::from_path(&path).first_or_octet_stream().to_string();

        match self.advisory.analyze_document(&bytes, &mime).await {
            Ok(text) => {
                self.skin.print_text(&text);
                self.transcript.push(TranscriptEntry::Advisor(text));
            }
            Err(err) => {
                tracing::warn!("Document analysis failed: {}", err);
                self.error_line(messages::ADVISORY_UNAVAILABLE);
            }
        }
        Ok(())
    }

    fn open_citation(&self, rest: &str) {
        let Some(citation) = Self::pick(&self.last_citations, rest) else {
            self.notice(messages::NO_CITATION);
            return;
        };
        if let Err(err) = open::that(&citation.url) {
            tracing::warn!("Failed to open citation link: {}", err);
            self.notice(&citation.url);
        }
    }

    // ---- small helpers -------------------------------------------------

    fn print_table(&self, markdown: &str) {
        if markdown.is_empty() {
            self.notice(messages::EMPTY_LIST);
        } else {
            self.skin.print_text(markdown);
        }
    }

    fn report(&self, err: &OfficeError) {
        if let OfficeError::Store(inner) = err {
            tracing::warn!("Store failure behind a console command: {}", inner);
        }
        self.error_line(&err.user_message());
    }

    fn notice(&self, text: &str) {
        println!("{}", text.with(Color::AnsiValue(109)));
    }

    fn error_line(&self, text: &str) {
        println!("{}", text.with(Color::Red));
    }

    fn prompt_line(rl: &mut DefaultEditor, label: &str) -> Option<String> {
        match rl.readline(&format!("{label}: ")) {
            Ok(line) => Some(line.trim().to_string()),
            Err(_) => None,
        }
    }

    /// Empty keeps the current value.
    fn prompt_optional(rl: &mut DefaultEditor, label: &str, current: &str) -> Option<String> {
        let line = rl.readline(&format!("{label} [{current}]: ")).ok()?;
        let trimmed = line.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn prompt_decimal(rl: &mut DefaultEditor, label: &str) -> Result<Decimal, OfficeError> {
        let raw = rl.readline(&format!("{label}: ")).unwrap_or_default();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Decimal::ZERO);
        }
        trimmed
            .parse()
            .map_err(|_| OfficeError::validation(messages::AMOUNT_INVALID))
    }

    /// Empty keeps the current value; anything else must parse.
    fn prompt_decimal_change(
        rl: &mut DefaultEditor,
        label: &str,
        current: Decimal,
    ) -> Result<Option<Decimal>, OfficeError> {
        let Ok(raw) = rl.readline(&format!("{label} [{current}]: ")) else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse()
            .map(Some)
            .map_err(|_| OfficeError::validation(messages::AMOUNT_INVALID))
    }

    fn pick<'a, T>(rows: &'a [T], raw: &str) -> Option<&'a T> {
        raw.trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| rows.get(index))
    }

    fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
        names.collect::<Vec<_>>().join(" / ")
    }
}
