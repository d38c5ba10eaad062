use std::sync::Arc;

use super::common::*;
use crate::workflows::evaluations::compliance::ComplianceWarning;
use crate::workflows::evaluations::domain::{
    AccountContact, AccountContactUpdate, AccountId, AnatomyFocus, SkuCode,
};
use crate::workflows::evaluations::draft::{DraftAction, DraftError};
use crate::workflows::evaluations::repository::{EntityReader, RepositoryError, UploadError};
use crate::workflows::evaluations::service::{EvaluationRequestService, EvaluationServiceError};
use crate::workflows::evaluations::validation::ValidationError;
use crate::workflows::evaluations::ComplianceConfig;

#[test]
fn successful_submission_persists_and_returns_receipt() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());

    let receipt = service
        .submit(&complete_draft(), now())
        .expect("submission accepted");

    assert_eq!(receipt.evaluation_number.as_deref(), Some("EV-00001"));
    assert_eq!(receipt.account_id, AccountId("acct-x".to_string()));
    assert_eq!(receipt.status, "submitted");
    assert!(receipt.warnings.is_empty());
    assert_eq!(platform.history_calls(), 1);

    let records = platform.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].evaluation.items.len(), 2);
}

#[test]
fn validation_failure_skips_collaborators() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());
    let mut draft = government_draft();
    draft.government_approval = None;

    let result = service.submit(&draft, now());

    assert!(matches!(
        result,
        Err(EvaluationServiceError::Validation(
            ValidationError::GovernmentApprovalMissing
        ))
    ));
    assert_eq!(platform.history_calls(), 0);
    assert!(platform.records().is_empty());
}

#[test]
fn recent_evaluation_blocks_submission() {
    let platform = MemoryPlatform::with_history(vec![history(
        "prior-1",
        Some("EV-0042"),
        "acct-x",
        days_ago(100),
        &["D1"],
    )]);
    let (service, platform, _) = build_service(platform, allow_config());

    match service.submit(&complete_draft(), now()) {
        Err(EvaluationServiceError::Compliance(block)) => {
            assert_eq!(block.cooldown.len(), 1);
            assert_eq!(block.cooldown[0].sku, SkuCode("D1".to_string()));
            assert_eq!(block.cooldown[0].days_until_eligible, 266);
            assert_eq!(block.cooldown[0].evaluation_reference, "EV-0042");
            assert!(block.quantity.is_empty());
        }
        other => panic!("expected compliance block, got {other:?}"),
    }
    assert!(platform.records().is_empty());
}

#[test]
fn resubmitting_the_same_request_is_blocked_by_its_own_record() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());
    let draft = complete_draft();

    service.submit(&draft, now()).expect("first submission");

    match service.submit(&draft, now()) {
        Err(EvaluationServiceError::Compliance(block)) => {
            assert_eq!(block.cooldown.len(), 2);
            assert!(block
                .cooldown
                .iter()
                .all(|violation| violation.days_until_eligible == 366));
            assert_eq!(block.cooldown[0].evaluation_reference, "EV-00001");
        }
        other => panic!("expected compliance block, got {other:?}"),
    }
    assert_eq!(platform.records().len(), 1);
}

#[test]
fn quantity_over_allowance_blocks_submission() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());
    let mut draft = complete_draft();
    draft.items[0].quantity = 21;

    match service.submit(&draft, now()) {
        Err(EvaluationServiceError::Compliance(block)) => {
            assert!(block.cooldown.is_empty());
            assert_eq!(block.quantity.len(), 1);
            assert_eq!(block.quantity[0].requested, 21);
            assert_eq!(block.quantity[0].limit, 20);
        }
        other => panic!("expected compliance block, got {other:?}"),
    }
    assert!(platform.records().is_empty());
}

#[test]
fn unavailable_history_warns_under_permissive_policy() {
    let (service, platform, _) = build_service(MemoryPlatform::offline_history(), allow_config());

    let receipt = service
        .submit(&complete_draft(), now())
        .expect("submission allowed with warning");

    assert_eq!(receipt.warnings.len(), 1);
    assert!(matches!(
        &receipt.warnings[0],
        ComplianceWarning::CooldownNotVerified { reason } if reason.contains("history timeout")
    ));
    assert_eq!(platform.records().len(), 1);
}

#[test]
fn unavailable_history_blocks_under_strict_policy() {
    let (service, platform, _) = build_service(MemoryPlatform::offline_history(), block_config());

    let result = service.submit(&complete_draft(), now());

    assert!(matches!(
        result,
        Err(EvaluationServiceError::HistoryUnavailable(_))
    ));
    assert!(platform.records().is_empty());
}

#[test]
fn check_reports_without_writing() {
    let platform = MemoryPlatform::with_history(vec![history(
        "prior-1",
        None,
        "acct-x",
        days_ago(30),
        &["CAP-1"],
    )]);
    let (service, platform, _) = build_service(platform, allow_config());

    let report = service.check(&complete_draft(), now());

    assert!(report.is_blocking());
    assert_eq!(report.cooldown.violations.len(), 1);
    assert_eq!(report.cooldown.violations[0].evaluation_reference, "prior-1");
    assert!(platform.records().is_empty());
}

#[test]
fn uploads_government_approval() {
    let (service, _, uploader) = build_service(MemoryPlatform::default(), allow_config());

    let file = service
        .upload_government_approval(" va-approval.pdf ", b"%PDF-1.7")
        .expect("upload succeeds");

    assert_eq!(file.name, "va-approval.pdf");
    assert_eq!(uploader.uploads(), vec![("va-approval.pdf".to_string(), 8)]);

    assert!(matches!(
        service.upload_government_approval("empty.pdf", b""),
        Err(EvaluationServiceError::Upload(UploadError::Empty))
    ));
    assert!(matches!(
        service.upload_government_approval("  ", b"data"),
        Err(EvaluationServiceError::Validation(
            ValidationError::MissingField(_)
        ))
    ));
}

#[test]
fn upload_transport_failure_is_reported() {
    let platform = Arc::new(MemoryPlatform::default());
    let service = EvaluationRequestService::new(
        platform.clone(),
        platform,
        Arc::new(MemoryUploader::failing()),
        allow_config(),
    );

    assert!(matches!(
        service.upload_government_approval("va.pdf", b"data"),
        Err(EvaluationServiceError::Upload(UploadError::Transport(_)))
    ));
}

#[test]
fn creates_accounts_and_updates_contacts() {
    let (service, _, _) = build_service(MemoryPlatform::default(), allow_config());

    let created = service
        .create_account(new_account())
        .expect("account created");
    assert_eq!(created.id, AccountId("acct-3".to_string()));

    assert!(matches!(
        service.create_account(new_account()),
        Err(EvaluationServiceError::Repository(RepositoryError::Conflict))
    ));

    let updated = service
        .update_account_contact(
            &created.id,
            AccountContactUpdate {
                contact: AccountContact {
                    person: "Casey Lin".to_string(),
                    email: "casey.lin@lakeside.example".to_string(),
                    phone: None,
                },
            },
        )
        .expect("contact updated");
    assert_eq!(updated.contact.person, "Casey Lin");

    assert!(matches!(
        service.update_account_contact(
            &AccountId("acct-missing".to_string()),
            AccountContactUpdate {
                contact: AccountContact {
                    person: "Casey Lin".to_string(),
                    email: "casey.lin@lakeside.example".to_string(),
                    phone: None,
                },
            },
        ),
        Err(EvaluationServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn invalid_account_is_rejected_before_writing() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());
    let mut account = new_account();
    account.contact.email = "nobody".to_string();

    assert!(matches!(
        service.create_account(account),
        Err(EvaluationServiceError::Validation(
            ValidationError::InvalidEmail(_)
        ))
    ));
    assert_eq!(platform.accounts().map(|list| list.len()).unwrap_or(0), 2);
}

#[test]
fn apply_uses_configured_allowance() {
    let config = ComplianceConfig {
        disposable_units_per_anatomy: 3,
        ..allow_config()
    };
    let (service, _, _) = build_service(MemoryPlatform::default(), config);
    let mut draft = complete_draft();
    draft.surgeons = vec![surgeon("Dr. Kim", &[AnatomyFocus::Shoulder])];
    draft.items = vec![line(&disposable("D1"), 3)];

    let result = service.apply(
        &draft,
        DraftAction::AddItem {
            sku: disposable("D1"),
        },
    );

    assert!(matches!(
        result,
        Err(EvaluationServiceError::Draft(DraftError::QuantityCap {
            requested: 4,
            limit: 3,
            ..
        }))
    ));
}

#[test]
fn stored_government_flag_overrides_the_draft() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());
    let mut draft = complete_draft();
    draft.account = Some(account("acct-va", false));

    let result = service.submit(&draft, now());

    assert!(matches!(
        result,
        Err(EvaluationServiceError::Validation(
            ValidationError::GovernmentAcknowledgmentRequired
        ))
    ));
    assert!(platform.records().is_empty());
}

#[test]
fn unknown_account_is_rejected() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());
    let mut draft = complete_draft();
    draft.account = Some(account("acct-ghost", false));

    match service.submit(&draft, now()) {
        Err(EvaluationServiceError::Validation(ValidationError::UnknownAccount(id))) => {
            assert_eq!(id, "acct-ghost")
        }
        other => panic!("expected unknown account, got {other:?}"),
    }
    assert_eq!(platform.history_calls(), 0);
    assert!(platform.records().is_empty());
}

#[test]
fn government_approval_must_come_from_the_uploader() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());

    assert!(matches!(
        service.submit(&government_draft(), now()),
        Err(EvaluationServiceError::Validation(
            ValidationError::GovernmentApprovalNotFound(_)
        ))
    ));
    assert!(platform.records().is_empty());

    let uploaded = service
        .upload_government_approval("va-approval.pdf", b"%PDF-1.7")
        .expect("upload succeeds");
    let mut draft = government_draft();
    draft.government_approval = Some(uploaded);

    let receipt = service.submit(&draft, now()).expect("submission accepted");
    assert_eq!(receipt.account_id, AccountId("acct-va".to_string()));
    let records = platform.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].evaluation.government_approval.is_some());
}

#[test]
fn duplicate_sku_lines_are_rejected_before_submission() {
    let (service, platform, _) = build_service(MemoryPlatform::default(), allow_config());
    let mut draft = complete_draft();
    draft.items = vec![line(&disposable("D1"), 20), line(&disposable("D1"), 20)];

    assert!(matches!(
        service.submit(&draft, now()),
        Err(EvaluationServiceError::Validation(
            ValidationError::DuplicateItem(_)
        ))
    ));
    assert_eq!(platform.history_calls(), 0);
    assert!(platform.records().is_empty());
}
