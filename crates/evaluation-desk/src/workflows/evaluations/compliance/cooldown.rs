use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{AccountId, EvaluationHistoryEntry, EvaluationId, LineItem, SkuCode};
use super::policy::CompliancePolicy;

/// A proposed SKU that the account already evaluated inside the cooldown window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownViolation {
    pub sku: SkuCode,
    pub name: String,
    pub evaluated_at: DateTime<Utc>,
    pub eligible_at: DateTime<Utc>,
    pub days_until_eligible: i64,
    pub evaluation_id: EvaluationId,
    pub evaluation_reference: String,
}

impl CooldownViolation {
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) was evaluated on {} under {}; eligible again on {} ({} day(s))",
            self.name,
            self.sku,
            self.evaluated_at.date_naive(),
            self.evaluation_reference,
            self.eligible_at.date_naive(),
            self.days_until_eligible
        )
    }
}

/// Flags every proposed SKU the account evaluated within the lookback window.
///
/// History may contain other accounts and may arrive in any order. When
/// several records disqualify the same SKU the most recent one is reported.
pub(crate) fn check_cooldown(
    account_id: &AccountId,
    items: &[LineItem],
    history: &[EvaluationHistoryEntry],
    policy: &CompliancePolicy,
    now: DateTime<Utc>,
) -> Vec<CooldownViolation> {
    let window_start = policy.lookback_start(now);
    let recent: Vec<&EvaluationHistoryEntry> = history
        .iter()
        .filter(|entry| &entry.account_id == account_id && entry.created_at > window_start)
        .collect();

    let mut seen = BTreeSet::new();
    let mut violations = Vec::new();

    for item in items {
        if !seen.insert(&item.sku) {
            continue;
        }

        let disqualifying = recent
            .iter()
            .copied()
            .filter(|entry| entry.lists(&item.sku))
            .fold(
                None,
                |latest: Option<&EvaluationHistoryEntry>, entry| match latest {
                    Some(current) if current.created_at >= entry.created_at => Some(current),
                    _ => Some(entry),
                },
            );

        if let Some(entry) = disqualifying {
            let eligible_at = policy.eligible_at(entry.created_at);
            violations.push(CooldownViolation {
                sku: item.sku.clone(),
                name: item.name.clone(),
                evaluated_at: entry.created_at,
                eligible_at,
                days_until_eligible: policy.days_until(eligible_at, now),
                evaluation_id: entry.id.clone(),
                evaluation_reference: entry.reference_label(),
            });
        }
    }

    violations
}
