use serde::{Deserialize, Serialize};

use super::compliance::{anatomy_count, CompliancePolicy};
use super::domain::{
    Account, AnatomyFocus, ContactBlock, DateRange, LineItem, ShippingBlock, Sku, SkuCode,
    SurgeonEntry, UploadedFile,
};

/// In-progress evaluation request.
///
/// Drafts are values: [`EvaluationDraft::apply`] returns a new revision and
/// leaves `self` untouched, so checkers can run against any snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationDraft {
    #[serde(default)]
    pub account: Option<Account>,
    #[serde(default)]
    pub shipping: ShippingBlock,
    #[serde(default)]
    pub sales_contact: ContactBlock,
    #[serde(default)]
    pub signature_contact: Option<ContactBlock>,
    #[serde(default)]
    pub surgeons: Vec<SurgeonEntry>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub government_acknowledged: bool,
    #[serde(default)]
    pub government_approval: Option<UploadedFile>,
}

/// Mutations a user can make to a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DraftAction {
    SelectAccount { account: Account },
    ClearAccount,
    AddItem { sku: Sku },
    SetQuantity { sku: SkuCode, quantity: u32 },
    SetItemNote { sku: SkuCode, note: Option<String> },
    RemoveItem { sku: SkuCode },
    AddSurgeon { name: String },
    RenameSurgeon { index: usize, name: String },
    ToggleAnatomy { index: usize, focus: AnatomyFocus },
    RemoveSurgeon { index: usize },
    SetShipping { shipping: ShippingBlock },
    SetSalesContact { contact: ContactBlock },
    SetSignatureContact { contact: ContactBlock },
    SetDateRange { range: DateRange },
    AcknowledgeGovernment { acknowledged: bool },
    AttachGovernmentApproval { file: UploadedFile },
    RemoveGovernmentApproval,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("quantity for {sku} must be at least 1")]
    InvalidQuantity { sku: SkuCode },
    #[error("{sku} is not in the requested items")]
    UnknownItem { sku: SkuCode },
    #[error("no surgeon at position {index}")]
    UnknownSurgeon { index: usize },
    #[error("{name} ({sku}) limited to {limit} units for the selected anatomy focuses (requested {requested})")]
    QuantityCap {
        sku: SkuCode,
        name: String,
        requested: u32,
        limit: u32,
    },
}

impl EvaluationDraft {
    pub fn anatomy_count(&self) -> u32 {
        anatomy_count(&self.surgeons)
    }

    pub fn item(&self, sku: &SkuCode) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.sku == sku)
    }

    pub fn is_government(&self) -> bool {
        self.account
            .as_ref()
            .map(|account| account.is_government)
            .unwrap_or(false)
    }

    /// Produce the next draft revision. Increments that would push a
    /// disposable over its allowance are rejected before they land.
    pub fn apply(
        &self,
        action: DraftAction,
        policy: &CompliancePolicy,
    ) -> Result<EvaluationDraft, DraftError> {
        let mut next = self.clone();

        match action {
            DraftAction::SelectAccount { account } => {
                let changed = next
                    .account
                    .as_ref()
                    .map(|current| current.id != account.id)
                    .unwrap_or(true);
                if changed {
                    next.government_acknowledged = false;
                    next.government_approval = None;
                }
                next.account = Some(account);
            }
            DraftAction::ClearAccount => {
                next.account = None;
                next.government_acknowledged = false;
                next.government_approval = None;
            }
            DraftAction::AddItem { sku } => {
                let anatomy = next.anatomy_count();
                match next.items.iter().position(|item| item.sku == sku.code) {
                    Some(index) => {
                        let item = &mut next.items[index];
                        let requested = item.quantity.saturating_add(1);
                        guard_increment(policy, item, requested, anatomy)?;
                        item.quantity = requested;
                    }
                    None => {
                        let item = LineItem::from_sku(&sku, 1);
                        guard_increment(policy, &item, 1, anatomy)?;
                        next.items.push(item);
                    }
                }
            }
            DraftAction::SetQuantity { sku, quantity } => {
                if quantity == 0 {
                    return Err(DraftError::InvalidQuantity { sku });
                }
                let anatomy = next.anatomy_count();
                let item = next
                    .items
                    .iter_mut()
                    .find(|item| item.sku == sku)
                    .ok_or(DraftError::UnknownItem { sku })?;
                if quantity > item.quantity {
                    guard_increment(policy, item, quantity, anatomy)?;
                }
                item.quantity = quantity;
            }
            DraftAction::SetItemNote { sku, note } => {
                let item = next
                    .items
                    .iter_mut()
                    .find(|item| item.sku == sku)
                    .ok_or(DraftError::UnknownItem { sku })?;
                item.note = note.filter(|text| !text.trim().is_empty());
            }
            DraftAction::RemoveItem { sku } => {
                let before = next.items.len();
                next.items.retain(|item| item.sku != sku);
                if next.items.len() == before {
                    return Err(DraftError::UnknownItem { sku });
                }
            }
            DraftAction::AddSurgeon { name } => {
                next.surgeons.push(SurgeonEntry::new(name, []));
            }
            DraftAction::RenameSurgeon { index, name } => {
                surgeon_mut(&mut next, index)?.name = name;
            }
            DraftAction::ToggleAnatomy { index, focus } => {
                let surgeon = surgeon_mut(&mut next, index)?;
                if !surgeon.anatomy_focus.remove(&focus) {
                    surgeon.anatomy_focus.insert(focus);
                }
            }
            DraftAction::RemoveSurgeon { index } => {
                if index >= next.surgeons.len() {
                    return Err(DraftError::UnknownSurgeon { index });
                }
                next.surgeons.remove(index);
            }
            DraftAction::SetShipping { shipping } => next.shipping = shipping,
            DraftAction::SetSalesContact { contact } => next.sales_contact = contact,
            DraftAction::SetSignatureContact { contact } => next.signature_contact = Some(contact),
            DraftAction::SetDateRange { range } => next.date_range = Some(range),
            DraftAction::AcknowledgeGovernment { acknowledged } => {
                next.government_acknowledged = acknowledged;
            }
            DraftAction::AttachGovernmentApproval { file } => {
                next.government_approval = Some(file);
            }
            DraftAction::RemoveGovernmentApproval => next.government_approval = None,
        }

        Ok(next)
    }
}

fn guard_increment(
    policy: &CompliancePolicy,
    item: &LineItem,
    requested: u32,
    anatomy_count: u32,
) -> Result<(), DraftError> {
    if !item.is_disposable() || !policy.exceeds_disposable_limit(requested, anatomy_count) {
        return Ok(());
    }

    Err(DraftError::QuantityCap {
        sku: item.sku.clone(),
        name: item.name.clone(),
        requested,
        limit: policy.disposable_limit(anatomy_count).unwrap_or(0),
    })
}

fn surgeon_mut(draft: &mut EvaluationDraft, index: usize) -> Result<&mut SurgeonEntry, DraftError> {
    draft
        .surgeons
        .get_mut(index)
        .ok_or(DraftError::UnknownSurgeon { index })
}
