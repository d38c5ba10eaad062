//! Evaluation request drafting, compliance checks, and submission.

pub mod compliance;
pub mod domain;
pub mod draft;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use compliance::{
    ComplianceBlock, ComplianceConfig, ComplianceEvaluator, CompliancePolicy, ComplianceReport,
    ComplianceWarning, CooldownOutcome, CooldownStatus, CooldownViolation, HistoryFailurePolicy,
    HistorySnapshot, QuantityCapLine, QuantityCapReport, QuantityCapStatus,
};
pub use domain::{
    Account, AccountContact, AccountContactUpdate, AccountId, AnatomyFocus, ContactBlock,
    DateRange, EvaluationHistoryEntry, EvaluationId, EvaluationRecord, EvaluationStatus,
    FacilityClassification, LineItem, NewAccount, NewEvaluation, RequestedItem, ShippingBlock,
    Sku, SkuCategory, SkuCode, SurgeonEntry, UploadedFile,
};
pub use draft::{DraftAction, DraftError, EvaluationDraft};
pub use repository::{EntityReader, EntityWriter, FileUploader, RepositoryError, UploadError};
pub use router::evaluation_router;
pub use service::{EvaluationRequestService, EvaluationServiceError, SubmissionReceipt};
pub use validation::ValidationError;
