use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for customer accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

/// Identifier wrapper for submitted evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

/// Product code as carried on line items and evaluation history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkuCode(pub String);

impl SkuCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SkuCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Facility types an account can be registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityClassification {
    Hospital,
    AmbulatorySurgeryCenter,
    PhysicianOffice,
    VeteransAffairs,
    MilitaryTreatmentFacility,
    Other,
}

impl FacilityClassification {
    pub const fn label(self) -> &'static str {
        match self {
            FacilityClassification::Hospital => "Hospital",
            FacilityClassification::AmbulatorySurgeryCenter => "Ambulatory Surgery Center",
            FacilityClassification::PhysicianOffice => "Physician Office",
            FacilityClassification::VeteransAffairs => "Veterans Affairs",
            FacilityClassification::MilitaryTreatmentFacility => "Military Treatment Facility",
            FacilityClassification::Other => "Other",
        }
    }
}

/// Customer facility that evaluations are shipped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub classification: FacilityClassification,
    pub contact: AccountContact,
    pub is_government: bool,
}

/// Contact fields are the only part of an account that may change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContact {
    pub person: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Staff-entered form used to register a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub classification: FacilityClassification,
    pub contact: AccountContact,
    #[serde(default)]
    pub is_government: bool,
}

/// Replacement contact block for an existing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContactUpdate {
    pub contact: AccountContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuCategory {
    CapitalEquipment,
    Disposable,
}

impl SkuCategory {
    pub const fn label(self) -> &'static str {
        match self {
            SkuCategory::CapitalEquipment => "capital_equipment",
            SkuCategory::Disposable => "disposable",
        }
    }
}

/// Catalog entry for an orderable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub code: SkuCode,
    pub name: String,
    pub category: SkuCategory,
    pub product_family: String,
    #[serde(default)]
    pub reprocessable: bool,
}

/// Surgical specialty tags that scale the disposable allowance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AnatomyFocus {
    Shoulder,
    Knee,
    Hip,
    Ankle,
    Elbow,
    Wrist,
    Spine,
    SportsMedicine,
    GeneralSurgery,
}

impl AnatomyFocus {
    pub const ALL: [AnatomyFocus; 9] = [
        AnatomyFocus::Shoulder,
        AnatomyFocus::Knee,
        AnatomyFocus::Hip,
        AnatomyFocus::Ankle,
        AnatomyFocus::Elbow,
        AnatomyFocus::Wrist,
        AnatomyFocus::Spine,
        AnatomyFocus::SportsMedicine,
        AnatomyFocus::GeneralSurgery,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AnatomyFocus::Shoulder => "Shoulder",
            AnatomyFocus::Knee => "Knee",
            AnatomyFocus::Hip => "Hip",
            AnatomyFocus::Ankle => "Ankle",
            AnatomyFocus::Elbow => "Elbow",
            AnatomyFocus::Wrist => "Wrist",
            AnatomyFocus::Spine => "Spine",
            AnatomyFocus::SportsMedicine => "Sports Medicine",
            AnatomyFocus::GeneralSurgery => "General Surgery",
        }
    }
}

/// Surgeon participating in the evaluation. Anatomy focuses are a set, so a
/// tag can only be counted once per surgeon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeonEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub anatomy_focus: BTreeSet<AnatomyFocus>,
}

impl SurgeonEntry {
    pub fn new(name: impl Into<String>, focuses: impl IntoIterator<Item = AnatomyFocus>) -> Self {
        Self {
            name: name.into(),
            anatomy_focus: focuses.into_iter().collect(),
        }
    }
}

/// Line item in an in-progress draft. Attributes are copied from the catalog
/// at selection time so later catalog edits do not alter the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: SkuCode,
    pub name: String,
    pub category: SkuCategory,
    pub quantity: u32,
    pub product_family: String,
    #[serde(default)]
    pub reprocessable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LineItem {
    pub fn from_sku(sku: &Sku, quantity: u32) -> Self {
        Self {
            sku: sku.code.clone(),
            name: sku.name.clone(),
            category: sku.category,
            quantity,
            product_family: sku.product_family.clone(),
            reprocessable: sku.reprocessable,
            note: None,
        }
    }

    pub fn is_disposable(&self) -> bool {
        self.category == SkuCategory::Disposable
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingBlock {
    pub contact_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Person block used for both the sales/territory-manager contact and the
/// customer e-signature contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactBlock {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// Reference returned by the file-upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Draft,
    Submitted,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Draft => "draft",
            EvaluationStatus::Submitted => "submitted",
        }
    }
}

/// Item as persisted on a submitted evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    pub sku: SkuCode,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Fully assembled record handed to the entity writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvaluation {
    pub account_id: AccountId,
    pub status: EvaluationStatus,
    pub shipping: ShippingBlock,
    pub sales_contact: ContactBlock,
    pub signature_contact: ContactBlock,
    pub surgeons: Vec<SurgeonEntry>,
    pub items: Vec<RequestedItem>,
    pub date_range: DateRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub government_approval: Option<UploadedFile>,
    #[serde(default)]
    pub government_acknowledged: bool,
}

/// Immutable historical record returned once the writer has persisted a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: EvaluationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub evaluation: NewEvaluation,
}

impl EvaluationRecord {
    pub fn history_entry(&self) -> EvaluationHistoryEntry {
        EvaluationHistoryEntry {
            id: self.id.clone(),
            number: self.number.clone(),
            account_id: self.evaluation.account_id.clone(),
            created_at: self.created_at,
            requested_skus: self
                .evaluation
                .items
                .iter()
                .map(|item| item.sku.clone())
                .collect(),
        }
    }
}

/// Slice of a prior evaluation needed by the cooldown checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationHistoryEntry {
    pub id: EvaluationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub requested_skus: Vec<SkuCode>,
}

impl EvaluationHistoryEntry {
    /// Human reference for a prior evaluation: its number, or the first eight
    /// characters of the identifier.
    pub fn reference_label(&self) -> String {
        match self.number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => number.to_string(),
            _ => self.id.0.chars().take(8).collect(),
        }
    }

    pub fn lists(&self, sku: &SkuCode) -> bool {
        self.requested_skus.iter().any(|code| code == sku)
    }
}
