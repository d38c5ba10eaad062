use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::compliance::{
    ComplianceBlock, ComplianceConfig, ComplianceEvaluator, ComplianceReport, ComplianceWarning,
    CooldownStatus, HistorySnapshot,
};
use super::domain::{
    Account, AccountContactUpdate, AccountId, EvaluationId, EvaluationStatus, NewAccount, Sku,
    UploadedFile,
};
use super::draft::{DraftAction, DraftError, EvaluationDraft};
use super::repository::{EntityReader, EntityWriter, FileUploader, RepositoryError, UploadError};
use super::validation::{
    validate_account_contact, validate_draft, validate_new_account, ValidationError,
};

/// Service composing validation, the compliance evaluator, and the platform collaborators.
pub struct EvaluationRequestService<R, W, U> {
    evaluator: Arc<ComplianceEvaluator>,
    reader: Arc<R>,
    writer: Arc<W>,
    uploader: Arc<U>,
}

/// Confirmation returned after the writer accepted a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub evaluation_id: EvaluationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_number: Option<String>,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub status: &'static str,
    pub warnings: Vec<ComplianceWarning>,
}

impl<R, W, U> EvaluationRequestService<R, W, U>
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    pub fn new(reader: Arc<R>, writer: Arc<W>, uploader: Arc<U>, config: ComplianceConfig) -> Self {
        Self {
            evaluator: Arc::new(ComplianceEvaluator::from_config(&config)),
            reader,
            writer,
            uploader,
        }
    }

    pub fn evaluator(&self) -> &ComplianceEvaluator {
        &self.evaluator
    }

    pub fn accounts(&self) -> Result<Vec<Account>, EvaluationServiceError> {
        Ok(self.reader.accounts()?)
    }

    pub fn skus(&self) -> Result<Vec<Sku>, EvaluationServiceError> {
        Ok(self.reader.skus()?)
    }

    pub fn create_account(&self, account: NewAccount) -> Result<Account, EvaluationServiceError> {
        validate_new_account(&account)?;
        let created = self.writer.create_account(account)?;
        info!(account = %created.id.0, government = created.is_government, "account created");
        Ok(created)
    }

    pub fn update_account_contact(
        &self,
        account_id: &AccountId,
        update: AccountContactUpdate,
    ) -> Result<Account, EvaluationServiceError> {
        validate_account_contact(&update.contact)?;
        Ok(self.writer.update_account_contact(account_id, update)?)
    }

    /// Apply one user mutation to a draft using the configured allowance.
    pub fn apply(
        &self,
        draft: &EvaluationDraft,
        action: DraftAction,
    ) -> Result<EvaluationDraft, EvaluationServiceError> {
        Ok(draft.apply(action, self.evaluator.policy())?)
    }

    /// Fetch history for the draft's account and run both checkers.
    pub fn check(&self, draft: &EvaluationDraft, now: DateTime<Utc>) -> ComplianceReport {
        let Some(account) = draft.account.as_ref() else {
            return self
                .evaluator
                .evaluate(draft, HistorySnapshot::Loaded(&[]), now);
        };

        match self.reader.evaluation_history(&account.id) {
            Ok(history) => self
                .evaluator
                .evaluate(draft, HistorySnapshot::Loaded(&history), now),
            Err(err) => {
                let reason = err.to_string();
                self.evaluator
                    .evaluate(draft, HistorySnapshot::Unavailable(&reason), now)
            }
        }
    }

    /// Validate, re-check compliance against freshly fetched history, and
    /// create the evaluation. Nothing is written unless the latest check passes.
    ///
    /// Local validation runs first. The draft is then validated again against
    /// the stored account, and a government approval must resolve to a file
    /// the uploader accepted.
    pub fn submit(
        &self,
        draft: &EvaluationDraft,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, EvaluationServiceError> {
        validate_draft(draft)?;

        let draft = self.with_stored_account(draft)?;
        let evaluation = validate_draft(&draft)?;
        if let Some(file) = evaluation.government_approval.as_ref() {
            if !self.uploader.exists(&file.url)? {
                return Err(ValidationError::GovernmentApprovalNotFound(file.name.clone()).into());
            }
        }

        let report = self.check(&draft, now);
        if let CooldownStatus::Unavailable { reason } = &report.cooldown.status {
            return Err(EvaluationServiceError::HistoryUnavailable(reason.clone()));
        }
        if let Some(block) = report.block() {
            warn!(
                account = %evaluation.account_id.0,
                cooldown = block.cooldown.len(),
                quantity = block.quantity.len(),
                "submission rejected by compliance rules"
            );
            return Err(EvaluationServiceError::Compliance(block));
        }

        let record = self.writer.create_evaluation(evaluation)?;
        info!(
            evaluation = %record.id.0,
            account = %record.evaluation.account_id.0,
            items = record.evaluation.items.len(),
            warnings = report.warnings.len(),
            "evaluation submitted"
        );

        Ok(SubmissionReceipt {
            evaluation_id: record.id,
            evaluation_number: record.number,
            account_id: record.evaluation.account_id,
            created_at: record.created_at,
            status: EvaluationStatus::Submitted.label(),
            warnings: report.warnings,
        })
    }

    /// Store a government approval document. The returned reference is
    /// attached to the draft with [`DraftAction::AttachGovernmentApproval`].
    pub fn upload_government_approval(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadedFile, EvaluationServiceError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::MissingField("approval file name").into());
        }
        if bytes.is_empty() {
            return Err(UploadError::Empty.into());
        }

        let uploaded = self.uploader.upload(filename.trim(), bytes)?;
        info!(file = %uploaded.name, "government approval uploaded");
        Ok(uploaded)
    }
}

impl<R, W, U> EvaluationRequestService<R, W, U>
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    /// Replace the client's copy of the account with the stored record.
    fn with_stored_account(
        &self,
        draft: &EvaluationDraft,
    ) -> Result<EvaluationDraft, EvaluationServiceError> {
        let claimed = draft
            .account
            .as_ref()
            .ok_or(ValidationError::MissingAccount)?;
        let stored = self
            .reader
            .account(&claimed.id)?
            .ok_or_else(|| ValidationError::UnknownAccount(claimed.id.0.clone()))?;

        if stored.is_government != claimed.is_government {
            warn!(
                account = %stored.id.0,
                stored_government = stored.is_government,
                "draft account differs from the stored account"
            );
        }

        let mut resolved = draft.clone();
        resolved.account = Some(stored);
        Ok(resolved)
    }
}

/// Error raised by the evaluation request service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("{0}")]
    Compliance(ComplianceBlock),
    #[error("evaluation history unavailable: {0}")]
    HistoryUnavailable(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}
