use chrono::Utc;
use evaluation_desk::workflows::evaluations::{
    Account, AccountContactUpdate, AccountId, EntityReader, EntityWriter, EvaluationHistoryEntry,
    EvaluationId, EvaluationRecord, FileUploader, NewAccount, NewEvaluation, RepositoryError, Sku,
    UploadError, UploadedFile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

/// Largest approval document accepted by the in-memory store.
pub(crate) const MAX_APPROVAL_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local stand-in for the CRM data platform.
#[derive(Default)]
pub(crate) struct InMemoryPlatform {
    accounts: Mutex<Vec<Account>>,
    skus: Mutex<Vec<Sku>>,
    records: Mutex<Vec<EvaluationRecord>>,
}

impl InMemoryPlatform {
    pub(crate) fn replace_skus(&self, skus: Vec<Sku>) {
        *self.skus.lock().expect("sku mutex poisoned") = skus;
    }
}

impl EntityReader for InMemoryPlatform {
    fn accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        let mut accounts = self.accounts.lock().expect("account mutex poisoned").clone();
        accounts.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(accounts)
    }

    fn skus(&self) -> Result<Vec<Sku>, RepositoryError> {
        Ok(self.skus.lock().expect("sku mutex poisoned").clone())
    }

    fn evaluation_history(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<EvaluationHistoryEntry>, RepositoryError> {
        let guard = self.records.lock().expect("record mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.evaluation.account_id == account_id)
            .map(EvaluationRecord::history_entry)
            .collect())
    }
}

impl EntityWriter for InMemoryPlatform {
    fn create_evaluation(
        &self,
        evaluation: NewEvaluation,
    ) -> Result<EvaluationRecord, RepositoryError> {
        let known_account = self
            .accounts
            .lock()
            .expect("account mutex poisoned")
            .iter()
            .any(|account| account.id == evaluation.account_id);
        if !known_account {
            return Err(RepositoryError::NotFound);
        }

        let mut guard = self.records.lock().expect("record mutex poisoned");
        let sequence = guard.len() + 1;
        let record = EvaluationRecord {
            id: EvaluationId(format!("{sequence:08x}-eval")),
            number: Some(format!("EV-{sequence:05}")),
            created_at: Utc::now(),
            evaluation,
        };
        guard.push(record.clone());
        Ok(record)
    }

    fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut guard = self.accounts.lock().expect("account mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.name.eq_ignore_ascii_case(account.name.trim()))
        {
            return Err(RepositoryError::Conflict);
        }

        let created = Account {
            id: AccountId(format!("ACC-{:05}", guard.len() + 1)),
            name: account.name.trim().to_string(),
            classification: account.classification,
            contact: account.contact,
            is_government: account.is_government,
        };
        guard.push(created.clone());
        Ok(created)
    }

    fn update_account_contact(
        &self,
        account_id: &AccountId,
        update: AccountContactUpdate,
    ) -> Result<Account, RepositoryError> {
        let mut guard = self.accounts.lock().expect("account mutex poisoned");
        let account = guard
            .iter_mut()
            .find(|account| &account.id == account_id)
            .ok_or(RepositoryError::NotFound)?;
        account.contact = update.contact;
        Ok(account.clone())
    }
}

/// Keeps uploaded approval documents in memory, keyed by their URL.
#[derive(Default)]
pub(crate) struct InMemoryUploader {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl FileUploader for InMemoryUploader {
    fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadedFile, UploadError> {
        if bytes.len() > MAX_APPROVAL_BYTES {
            return Err(UploadError::TooLarge {
                limit: MAX_APPROVAL_BYTES,
            });
        }

        let mut guard = self.files.lock().expect("upload mutex poisoned");
        let url = format!(
            "memory://government-approvals/{}/{}",
            guard.len() + 1,
            filename
        );
        guard.insert(url.clone(), bytes.to_vec());
        Ok(UploadedFile {
            url,
            name: filename.to_string(),
        })
    }

    fn exists(&self, url: &str) -> Result<bool, UploadError> {
        Ok(self
            .files
            .lock()
            .expect("upload mutex poisoned")
            .contains_key(url))
    }
}
