//! Cooldown and disposable-cap rules evaluated against an evaluation draft.
//!
//! Both checkers are pure: they read a draft snapshot plus already-fetched
//! history and return itemised results. Fetching, and deciding what a failed
//! fetch means, happens at the edges through [`HistorySnapshot`] and the
//! configured [`HistoryFailurePolicy`].

mod config;
mod cooldown;
mod policy;
mod quantity;

pub use config::{
    ComplianceConfig, HistoryFailurePolicy, DEFAULT_COOLDOWN_ELIGIBILITY_DAYS,
    DEFAULT_COOLDOWN_LOOKBACK_DAYS, DEFAULT_DISPOSABLE_UNITS_PER_ANATOMY,
};
pub use cooldown::CooldownViolation;
pub use policy::CompliancePolicy;
pub use quantity::{anatomy_count, QuantityCapLine, QuantityCapReport, QuantityCapStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{AccountId, EvaluationHistoryEntry, LineItem, SurgeonEntry};
use super::draft::EvaluationDraft;

/// Result of asking the entity reader for an account's prior evaluations.
#[derive(Debug, Clone, Copy)]
pub enum HistorySnapshot<'a> {
    Loaded(&'a [EvaluationHistoryEntry]),
    Unavailable(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CooldownStatus {
    /// History was loaded and every proposed SKU was checked.
    Checked,
    /// No account selected yet; nothing to check against.
    AwaitingAccount,
    /// History could not be loaded and the policy allows submitting anyway.
    Degraded { reason: String },
    /// History could not be loaded and the policy refuses to submit.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownOutcome {
    pub status: CooldownStatus,
    pub violations: Vec<CooldownViolation>,
}

/// Non-blocking conditions the caller must surface alongside a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComplianceWarning {
    CooldownNotVerified { reason: String },
    AnatomyFocusPending,
}

impl ComplianceWarning {
    pub fn message(&self) -> String {
        match self {
            ComplianceWarning::CooldownNotVerified { reason } => format!(
                "evaluation history unavailable ({reason}); 12-month re-evaluation rule was not verified"
            ),
            ComplianceWarning::AnatomyFocusPending => {
                "no anatomy focus selected; disposable quantity limits not yet applied".to_string()
            }
        }
    }
}

/// Combined view of both checkers for one draft snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub cooldown: CooldownOutcome,
    pub quantity: QuantityCapReport,
    pub warnings: Vec<ComplianceWarning>,
}

impl ComplianceReport {
    pub fn has_violations(&self) -> bool {
        !self.cooldown.violations.is_empty() || self.quantity.over_limit
    }

    pub fn history_blocked(&self) -> bool {
        matches!(self.cooldown.status, CooldownStatus::Unavailable { .. })
    }

    pub fn is_blocking(&self) -> bool {
        self.has_violations() || self.history_blocked()
    }

    pub fn block(&self) -> Option<ComplianceBlock> {
        if !self.has_violations() {
            return None;
        }

        Some(ComplianceBlock {
            cooldown: self.cooldown.violations.clone(),
            quantity: self.quantity.violations().cloned().collect(),
        })
    }
}

/// Itemised violations that stop a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceBlock {
    pub cooldown: Vec<CooldownViolation>,
    pub quantity: Vec<QuantityCapLine>,
}

impl ComplianceBlock {
    pub fn violation_count(&self) -> usize {
        self.cooldown.len() + self.quantity.len()
    }

    pub fn details(&self) -> Vec<String> {
        let cooldown = self.cooldown.iter().map(CooldownViolation::summary);
        let quantity = self.quantity.iter().map(|line| {
            format!(
                "{} ({}) requests {} units; limit is {}",
                line.name, line.sku, line.requested, line.limit
            )
        });
        cooldown.chain(quantity).collect()
    }
}

impl std::fmt::Display for ComplianceBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "submission blocked by {} compliance violation(s): {}",
            self.violation_count(),
            self.details().join("; ")
        )
    }
}

/// Stateless evaluator applying a [`CompliancePolicy`] to draft snapshots.
#[derive(Debug, Clone, Default)]
pub struct ComplianceEvaluator {
    policy: CompliancePolicy,
}

impl ComplianceEvaluator {
    pub fn with_policy(policy: CompliancePolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &ComplianceConfig) -> Self {
        Self::with_policy(CompliancePolicy::from(config))
    }

    pub fn policy(&self) -> &CompliancePolicy {
        &self.policy
    }

    pub fn cooldown(
        &self,
        account_id: &AccountId,
        items: &[LineItem],
        history: &[EvaluationHistoryEntry],
        now: DateTime<Utc>,
    ) -> Vec<CooldownViolation> {
        cooldown::check_cooldown(account_id, items, history, &self.policy, now)
    }

    pub fn quantity_caps(&self, items: &[LineItem], surgeons: &[SurgeonEntry]) -> QuantityCapReport {
        quantity::check_quantity_caps(items, surgeons, &self.policy)
    }

    /// Run both checkers over a draft. `history` is ignored when no account is selected.
    pub fn evaluate(
        &self,
        draft: &EvaluationDraft,
        history: HistorySnapshot<'_>,
        now: DateTime<Utc>,
    ) -> ComplianceReport {
        let mut warnings = Vec::new();

        let cooldown = match (&draft.account, history) {
            (None, _) => CooldownOutcome {
                status: CooldownStatus::AwaitingAccount,
                violations: Vec::new(),
            },
            (Some(account), HistorySnapshot::Loaded(entries)) => {
                let violations = self.cooldown(&account.id, &draft.items, entries, now);
                debug!(
                    account = %account.id.0,
                    history = entries.len(),
                    violations = violations.len(),
                    "cooldown check completed"
                );
                CooldownOutcome {
                    status: CooldownStatus::Checked,
                    violations,
                }
            }
            (Some(account), HistorySnapshot::Unavailable(reason)) => {
                match self.policy.history_failure() {
                    HistoryFailurePolicy::AllowWithWarning => {
                        warn!(
                            account = %account.id.0,
                            reason,
                            policy = HistoryFailurePolicy::AllowWithWarning.label(),
                            "evaluation history unavailable; cooldown check skipped"
                        );
                        warnings.push(ComplianceWarning::CooldownNotVerified {
                            reason: reason.to_string(),
                        });
                        CooldownOutcome {
                            status: CooldownStatus::Degraded {
                                reason: reason.to_string(),
                            },
                            violations: Vec::new(),
                        }
                    }
                    HistoryFailurePolicy::Block => {
                        warn!(
                            account = %account.id.0,
                            reason,
                            policy = HistoryFailurePolicy::Block.label(),
                            "evaluation history unavailable; submission held"
                        );
                        CooldownOutcome {
                            status: CooldownStatus::Unavailable {
                                reason: reason.to_string(),
                            },
                            violations: Vec::new(),
                        }
                    }
                }
            }
        };

        let quantity = self.quantity_caps(&draft.items, &draft.surgeons);
        if quantity.status == QuantityCapStatus::AwaitingAnatomy && !quantity.lines.is_empty() {
            warnings.push(ComplianceWarning::AnatomyFocusPending);
        }

        ComplianceReport {
            cooldown,
            quantity,
            warnings,
        }
    }
}
