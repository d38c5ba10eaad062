use serde::{Deserialize, Serialize};

use super::super::domain::{LineItem, SkuCode, SurgeonEntry};
use super::policy::CompliancePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityCapStatus {
    Applicable,
    /// No surgeon has an anatomy focus yet, so the form is incomplete rather
    /// than non-compliant.
    AwaitingAnatomy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityCapLine {
    pub sku: SkuCode,
    pub name: String,
    pub requested: u32,
    pub limit: u32,
    pub over_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityCapReport {
    pub status: QuantityCapStatus,
    pub anatomy_count: u32,
    pub per_sku_limit: u32,
    pub lines: Vec<QuantityCapLine>,
    pub over_limit: bool,
    pub total_disposable_units: u32,
}

impl QuantityCapReport {
    pub fn violations(&self) -> impl Iterator<Item = &QuantityCapLine> {
        self.lines.iter().filter(|line| line.over_limit)
    }
}

/// Anatomy focuses summed across surgeons; each tag counts once per surgeon.
pub fn anatomy_count(surgeons: &[SurgeonEntry]) -> u32 {
    surgeons
        .iter()
        .map(|surgeon| surgeon.anatomy_focus.len() as u32)
        .sum()
}

pub(crate) fn check_quantity_caps(
    items: &[LineItem],
    surgeons: &[SurgeonEntry],
    policy: &CompliancePolicy,
) -> QuantityCapReport {
    let anatomy_count = anatomy_count(surgeons);
    let limit = policy.disposable_limit(anatomy_count);

    // one line per SKU; repeated lines for the same code count together
    let mut lines: Vec<QuantityCapLine> = Vec::new();
    for item in items.iter().filter(|item| item.is_disposable()) {
        match lines.iter_mut().find(|line| line.sku == item.sku) {
            Some(line) => line.requested = line.requested.saturating_add(item.quantity),
            None => lines.push(QuantityCapLine {
                sku: item.sku.clone(),
                name: item.name.clone(),
                requested: item.quantity,
                limit: limit.unwrap_or(0),
                over_limit: false,
            }),
        }
    }
    for line in &mut lines {
        line.over_limit = policy.exceeds_disposable_limit(line.requested, anatomy_count);
    }

    let total_disposable_units = lines
        .iter()
        .fold(0u32, |total, line| total.saturating_add(line.requested));
    let over_limit = lines.iter().any(|line| line.over_limit);

    QuantityCapReport {
        status: if limit.is_some() {
            QuantityCapStatus::Applicable
        } else {
            QuantityCapStatus::AwaitingAnatomy
        },
        anatomy_count,
        per_sku_limit: limit.unwrap_or(0),
        lines,
        over_limit,
        total_disposable_units,
    }
}
