use std::collections::BTreeSet;

use super::domain::{
    AccountContact, ContactBlock, EvaluationStatus, NewAccount, NewEvaluation, RequestedItem,
};
use super::draft::EvaluationDraft;

/// Local checks that run before any collaborator is contacted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("select an account before submitting")]
    MissingAccount,
    #[error("account {0} is not on file")]
    UnknownAccount(String),
    #[error("add at least one product to the request")]
    EmptyCart,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} must be a valid email address")]
    InvalidEmail(&'static str),
    #[error("customer e-signature contact is required")]
    MissingSignatureContact,
    #[error("evaluation dates are required")]
    MissingDateRange,
    #[error("evaluation end date must not precede the start date")]
    InvalidDateRange,
    #[error("government accounts require acknowledgment of the approval policy")]
    GovernmentAcknowledgmentRequired,
    #[error("government accounts require an uploaded approval document")]
    GovernmentApprovalMissing,
    #[error("government approval document {0} was not uploaded through this service")]
    GovernmentApprovalNotFound(String),
    #[error("quantity for {0} must be at least 1")]
    InvalidQuantity(String),
    #[error("{0} appears on more than one line")]
    DuplicateItem(String),
}

/// Assemble the record handed to the entity writer, reporting the first
/// missing or inconsistent field.
pub fn validate_draft(draft: &EvaluationDraft) -> Result<NewEvaluation, ValidationError> {
    let account = draft.account.as_ref().ok_or(ValidationError::MissingAccount)?;

    if draft.items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    if let Some(item) = draft.items.iter().find(|item| item.quantity == 0) {
        return Err(ValidationError::InvalidQuantity(item.sku.0.clone()));
    }
    let mut listed = BTreeSet::new();
    if let Some(item) = draft.items.iter().find(|item| !listed.insert(&item.sku)) {
        return Err(ValidationError::DuplicateItem(item.sku.0.clone()));
    }

    let shipping = &draft.shipping;
    require(&shipping.contact_name, "shipping contact name")?;
    require(&shipping.address_line1, "shipping address")?;
    require(&shipping.city, "shipping city")?;
    require(&shipping.state, "shipping state")?;
    require(&shipping.postal_code, "shipping postal code")?;

    require_contact(&draft.sales_contact, "sales contact name", "sales contact email")?;

    let signature = draft
        .signature_contact
        .as_ref()
        .filter(|contact| !contact.name.trim().is_empty() || !contact.email.trim().is_empty())
        .ok_or(ValidationError::MissingSignatureContact)?;
    require_contact(
        signature,
        "e-signature contact name",
        "e-signature contact email",
    )?;

    let date_range = draft.date_range.ok_or(ValidationError::MissingDateRange)?;
    if !date_range.is_ordered() {
        return Err(ValidationError::InvalidDateRange);
    }

    if account.is_government {
        if !draft.government_acknowledged {
            return Err(ValidationError::GovernmentAcknowledgmentRequired);
        }
        if draft.government_approval.is_none() {
            return Err(ValidationError::GovernmentApprovalMissing);
        }
    }

    Ok(NewEvaluation {
        account_id: account.id.clone(),
        status: EvaluationStatus::Submitted,
        shipping: shipping.clone(),
        sales_contact: draft.sales_contact.clone(),
        signature_contact: signature.clone(),
        surgeons: draft.surgeons.clone(),
        items: draft
            .items
            .iter()
            .map(|item| RequestedItem {
                sku: item.sku.clone(),
                quantity: item.quantity,
                note: item.note.clone(),
            })
            .collect(),
        date_range,
        government_approval: if account.is_government {
            draft.government_approval.clone()
        } else {
            None
        },
        government_acknowledged: account.is_government && draft.government_acknowledged,
    })
}

pub fn validate_new_account(account: &NewAccount) -> Result<(), ValidationError> {
    require(&account.name, "account name")?;
    validate_account_contact(&account.contact)
}

pub fn validate_account_contact(contact: &AccountContact) -> Result<(), ValidationError> {
    require(&contact.person, "account contact person")?;
    require_email(&contact.email, "account contact email")
}

fn require_contact(
    contact: &ContactBlock,
    name_field: &'static str,
    email_field: &'static str,
) -> Result<(), ValidationError> {
    require(&contact.name, name_field)?;
    require_email(&contact.email, email_field)
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

fn require_email(value: &str, field: &'static str) -> Result<(), ValidationError> {
    require(value, field)?;
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidEmail(field)),
    }
}
