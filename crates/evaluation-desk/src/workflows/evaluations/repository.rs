use super::domain::{
    Account, AccountContactUpdate, AccountId, EvaluationHistoryEntry, EvaluationRecord,
    NewAccount, NewEvaluation, Sku, UploadedFile,
};

/// Read side of the hosted data platform.
pub trait EntityReader: Send + Sync {
    fn accounts(&self) -> Result<Vec<Account>, RepositoryError>;
    /// Stored copy of one account. The default scans [`EntityReader::accounts`].
    fn account(&self, account_id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .accounts()?
            .into_iter()
            .find(|account| &account.id == account_id))
    }
    fn skus(&self) -> Result<Vec<Sku>, RepositoryError>;
    /// Prior evaluations for cooldown purposes. Implementations may return
    /// records for other accounts; the checker filters by account itself.
    fn evaluation_history(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<EvaluationHistoryEntry>, RepositoryError>;
}

/// Write side of the hosted data platform.
pub trait EntityWriter: Send + Sync {
    fn create_evaluation(&self, evaluation: NewEvaluation)
        -> Result<EvaluationRecord, RepositoryError>;
    fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError>;
    fn update_account_contact(
        &self,
        account_id: &AccountId,
        update: AccountContactUpdate,
    ) -> Result<Account, RepositoryError>;
}

/// Error enumeration for entity read/write failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("data platform unavailable: {0}")]
    Unavailable(String),
}

/// Storage for binary attachments such as government approval letters.
pub trait FileUploader: Send + Sync {
    fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadedFile, UploadError>;
    /// Whether `url` refers to a file this store accepted.
    fn exists(&self, url: &str) -> Result<bool, UploadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("attachment is empty")]
    Empty,
    #[error("attachment exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("file storage unavailable: {0}")]
    Transport(String),
}
