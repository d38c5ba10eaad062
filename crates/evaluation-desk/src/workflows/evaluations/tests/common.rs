use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::evaluations::compliance::{ComplianceConfig, HistoryFailurePolicy};
use crate::workflows::evaluations::domain::{
    Account, AccountContact, AccountContactUpdate, AccountId, AnatomyFocus, ContactBlock,
    DateRange, EvaluationHistoryEntry, EvaluationId, EvaluationRecord, FacilityClassification,
    LineItem, NewAccount, NewEvaluation, ShippingBlock, Sku, SkuCategory, SkuCode, SurgeonEntry,
    UploadedFile,
};
use crate::workflows::evaluations::draft::EvaluationDraft;
use crate::workflows::evaluations::repository::{
    EntityReader, EntityWriter, FileUploader, RepositoryError, UploadError,
};
use crate::workflows::evaluations::{evaluation_router, EvaluationRequestService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub(super) fn account(id: &str, is_government: bool) -> Account {
    Account {
        id: AccountId(id.to_string()),
        name: format!("{id} Medical Center"),
        classification: if is_government {
            FacilityClassification::VeteransAffairs
        } else {
            FacilityClassification::Hospital
        },
        contact: AccountContact {
            person: "Dana Whitfield".to_string(),
            email: "dana.whitfield@example.org".to_string(),
            phone: Some("555-0142".to_string()),
        },
        is_government,
    }
}

pub(super) fn new_account() -> NewAccount {
    NewAccount {
        name: "Lakeside Orthopedic ASC".to_string(),
        classification: FacilityClassification::AmbulatorySurgeryCenter,
        contact: AccountContact {
            person: "Morgan Reyes".to_string(),
            email: "mreyes@lakeside.example".to_string(),
            phone: None,
        },
        is_government: false,
    }
}

pub(super) fn disposable(code: &str) -> Sku {
    Sku {
        code: SkuCode(code.to_string()),
        name: format!("Shaver Blade {code}"),
        category: SkuCategory::Disposable,
        product_family: "Resection".to_string(),
        reprocessable: false,
    }
}

pub(super) fn capital(code: &str) -> Sku {
    Sku {
        code: SkuCode(code.to_string()),
        name: format!("Tower Console {code}"),
        category: SkuCategory::CapitalEquipment,
        product_family: "Visualization".to_string(),
        reprocessable: true,
    }
}

pub(super) fn line(sku: &Sku, quantity: u32) -> LineItem {
    LineItem::from_sku(sku, quantity)
}

pub(super) fn surgeon(name: &str, focuses: &[AnatomyFocus]) -> SurgeonEntry {
    SurgeonEntry::new(name, focuses.iter().copied())
}

pub(super) fn history(
    id: &str,
    number: Option<&str>,
    account_id: &str,
    created_at: DateTime<Utc>,
    skus: &[&str],
) -> EvaluationHistoryEntry {
    EvaluationHistoryEntry {
        id: EvaluationId(id.to_string()),
        number: number.map(str::to_string),
        account_id: AccountId(account_id.to_string()),
        created_at,
        requested_skus: skus.iter().map(|code| SkuCode(code.to_string())).collect(),
    }
}

pub(super) fn contact(name: &str, email: &str) -> ContactBlock {
    ContactBlock {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        title: None,
    }
}

pub(super) fn approval_file() -> UploadedFile {
    UploadedFile {
        url: "https://files.example.com/approvals/va-approval.pdf".to_string(),
        name: "va-approval.pdf".to_string(),
    }
}

/// Draft that passes validation for a commercial account.
pub(super) fn complete_draft() -> EvaluationDraft {
    EvaluationDraft {
        account: Some(account("acct-x", false)),
        shipping: ShippingBlock {
            contact_name: "Receiving Dock".to_string(),
            address_line1: "100 Hospital Way".to_string(),
            address_line2: None,
            city: "Des Moines".to_string(),
            state: "IA".to_string(),
            postal_code: "50309".to_string(),
            phone: None,
        },
        sales_contact: contact("Jordan Patel", "jordan.patel@example.com"),
        signature_contact: Some(contact("Dr. Alex Kim", "akim@hospital.example.org")),
        surgeons: vec![surgeon("Dr. Alex Kim", &[AnatomyFocus::Knee, AnatomyFocus::Hip])],
        items: vec![line(&disposable("D1"), 20), line(&capital("CAP-1"), 1)],
        date_range: Some(DateRange {
            start: NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2026, 4, 10).expect("valid date"),
        }),
        government_acknowledged: false,
        government_approval: None,
    }
}

pub(super) fn government_draft() -> EvaluationDraft {
    let mut draft = complete_draft();
    draft.account = Some(account("acct-va", true));
    draft.government_acknowledged = true;
    draft.government_approval = Some(approval_file());
    draft
}

pub(super) fn allow_config() -> ComplianceConfig {
    ComplianceConfig::default()
}

pub(super) fn block_config() -> ComplianceConfig {
    ComplianceConfig {
        history_failure_policy: HistoryFailurePolicy::Block,
        ..ComplianceConfig::default()
    }
}

/// Reader and writer backed by the same store, so created evaluations feed
/// later cooldown checks. [`build_service`] registers `acct-x` and the
/// government account `acct-va` when no accounts were seeded.
#[derive(Default)]
pub(super) struct MemoryPlatform {
    accounts: Mutex<Vec<Account>>,
    skus: Mutex<Vec<Sku>>,
    history: Mutex<Vec<EvaluationHistoryEntry>>,
    records: Mutex<Vec<EvaluationRecord>>,
    history_calls: AtomicUsize,
    pub(super) history_unavailable: bool,
}

impl MemoryPlatform {
    pub(super) fn with_history(entries: Vec<EvaluationHistoryEntry>) -> Self {
        let platform = Self::default();
        *platform.history.lock().expect("history mutex poisoned") = entries;
        platform
    }

    pub(super) fn offline_history() -> Self {
        Self {
            history_unavailable: true,
            ..Self::default()
        }
    }

    pub(super) fn seed(&self, accounts: Vec<Account>, skus: Vec<Sku>) {
        *self.accounts.lock().expect("accounts mutex poisoned") = accounts;
        *self.skus.lock().expect("sku mutex poisoned") = skus;
    }

    pub(super) fn seed_accounts(&self, accounts: Vec<Account>) {
        *self.accounts.lock().expect("accounts mutex poisoned") = accounts;
    }

    pub(super) fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub(super) fn records(&self) -> Vec<EvaluationRecord> {
        self.records.lock().expect("records mutex poisoned").clone()
    }
}

impl EntityReader for MemoryPlatform {
    fn accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        Ok(self.accounts.lock().expect("accounts mutex poisoned").clone())
    }

    fn skus(&self) -> Result<Vec<Sku>, RepositoryError> {
        Ok(self.skus.lock().expect("sku mutex poisoned").clone())
    }

    fn evaluation_history(
        &self,
        _account_id: &AccountId,
    ) -> Result<Vec<EvaluationHistoryEntry>, RepositoryError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.history_unavailable {
            return Err(RepositoryError::Unavailable("history timeout".to_string()));
        }
        Ok(self.history.lock().expect("history mutex poisoned").clone())
    }
}

impl EntityWriter for MemoryPlatform {
    fn create_evaluation(
        &self,
        evaluation: NewEvaluation,
    ) -> Result<EvaluationRecord, RepositoryError> {
        let mut records = self.records.lock().expect("records mutex poisoned");
        let sequence = records.len() + 1;
        let record = EvaluationRecord {
            id: EvaluationId(format!("eval-{sequence:04}-0000-aaaa")),
            number: Some(format!("EV-{sequence:05}")),
            created_at: now(),
            evaluation,
        };
        self.history
            .lock()
            .expect("history mutex poisoned")
            .insert(0, record.history_entry());
        records.push(record.clone());
        Ok(record)
    }

    fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.lock().expect("accounts mutex poisoned");
        if accounts.iter().any(|existing| existing.name == account.name) {
            return Err(RepositoryError::Conflict);
        }
        let created = Account {
            id: AccountId(format!("acct-{}", accounts.len() + 1)),
            name: account.name,
            classification: account.classification,
            contact: account.contact,
            is_government: account.is_government,
        };
        accounts.push(created.clone());
        Ok(created)
    }

    fn update_account_contact(
        &self,
        account_id: &AccountId,
        update: AccountContactUpdate,
    ) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.lock().expect("accounts mutex poisoned");
        let account = accounts
            .iter_mut()
            .find(|account| &account.id == account_id)
            .ok_or(RepositoryError::NotFound)?;
        account.contact = update.contact;
        Ok(account.clone())
    }
}

/// Reader whose every call fails, for empty-state handling.
pub(super) struct OfflinePlatform;

impl EntityReader for OfflinePlatform {
    fn accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        Err(RepositoryError::Unavailable("platform offline".to_string()))
    }

    fn skus(&self) -> Result<Vec<Sku>, RepositoryError> {
        Err(RepositoryError::Unavailable("platform offline".to_string()))
    }

    fn evaluation_history(
        &self,
        _account_id: &AccountId,
    ) -> Result<Vec<EvaluationHistoryEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("platform offline".to_string()))
    }
}

impl EntityWriter for OfflinePlatform {
    fn create_evaluation(
        &self,
        _evaluation: NewEvaluation,
    ) -> Result<EvaluationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("platform offline".to_string()))
    }

    fn create_account(&self, _account: NewAccount) -> Result<Account, RepositoryError> {
        Err(RepositoryError::Unavailable("platform offline".to_string()))
    }

    fn update_account_contact(
        &self,
        _account_id: &AccountId,
        _update: AccountContactUpdate,
    ) -> Result<Account, RepositoryError> {
        Err(RepositoryError::Unavailable("platform offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryUploader {
    uploads: Mutex<Vec<(String, usize)>>,
    pub(super) fail: bool,
}

impl MemoryUploader {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().expect("upload mutex poisoned").clone()
    }
}

fn stored_url(filename: &str) -> String {
    format!("https://files.example.com/approvals/{filename}")
}

impl FileUploader for MemoryUploader {
    fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadedFile, UploadError> {
        if self.fail {
            return Err(UploadError::Transport("bucket unreachable".to_string()));
        }
        self.uploads
            .lock()
            .expect("upload mutex poisoned")
            .push((filename.to_string(), bytes.len()));
        Ok(UploadedFile {
            url: stored_url(filename),
            name: filename.to_string(),
        })
    }

    fn exists(&self, url: &str) -> Result<bool, UploadError> {
        if self.fail {
            return Err(UploadError::Transport("bucket unreachable".to_string()));
        }
        Ok(self
            .uploads
            .lock()
            .expect("upload mutex poisoned")
            .iter()
            .any(|(filename, _)| stored_url(filename) == url))
    }
}

pub(super) type MemoryService = EvaluationRequestService<MemoryPlatform, MemoryPlatform, MemoryUploader>;

pub(super) fn build_service(
    platform: MemoryPlatform,
    config: ComplianceConfig,
) -> (MemoryService, Arc<MemoryPlatform>, Arc<MemoryUploader>) {
    let no_accounts = platform
        .accounts()
        .map(|accounts| accounts.is_empty())
        .unwrap_or(false);
    if no_accounts {
        platform.seed_accounts(vec![account("acct-x", false), account("acct-va", true)]);
    }
    let platform = Arc::new(platform);
    let uploader = Arc::new(MemoryUploader::default());
    let service =
        EvaluationRequestService::new(platform.clone(), platform.clone(), uploader.clone(), config);
    (service, platform, uploader)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    evaluation_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
