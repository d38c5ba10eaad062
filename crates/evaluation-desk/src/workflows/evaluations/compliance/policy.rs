use chrono::{DateTime, Duration, Utc};

use super::config::{
    ComplianceConfig, HistoryFailurePolicy, DEFAULT_COOLDOWN_ELIGIBILITY_DAYS,
    DEFAULT_COOLDOWN_LOOKBACK_DAYS, DEFAULT_DISPOSABLE_UNITS_PER_ANATOMY,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Policy dial backing the cooldown window and the disposable allowance.
///
/// The draft reducer and the retrospective report both size the allowance
/// with [`CompliancePolicy::disposable_limit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompliancePolicy {
    lookback_days: u32,
    eligibility_days: u32,
    units_per_anatomy: u32,
    history_failure: HistoryFailurePolicy,
}

impl CompliancePolicy {
    pub fn new(
        lookback_days: u32,
        eligibility_days: u32,
        units_per_anatomy: u32,
        history_failure: HistoryFailurePolicy,
    ) -> Self {
        Self {
            lookback_days: non_zero_or(lookback_days, DEFAULT_COOLDOWN_LOOKBACK_DAYS),
            eligibility_days: non_zero_or(eligibility_days, DEFAULT_COOLDOWN_ELIGIBILITY_DAYS),
            units_per_anatomy: non_zero_or(units_per_anatomy, DEFAULT_DISPOSABLE_UNITS_PER_ANATOMY),
            history_failure,
        }
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    pub fn eligibility_days(&self) -> u32 {
        self.eligibility_days
    }

    pub fn units_per_anatomy(&self) -> u32 {
        self.units_per_anatomy
    }

    pub fn history_failure(&self) -> HistoryFailurePolicy {
        self.history_failure
    }

    /// Records created strictly after this instant are inside the cooldown window.
    pub fn lookback_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.lookback_days))
    }

    pub fn eligible_at(&self, evaluated_at: DateTime<Utc>) -> DateTime<Utc> {
        evaluated_at + Duration::days(i64::from(self.eligibility_days))
    }

    /// Whole days from `now` until `eligible_at`, rounding partial days up.
    pub fn days_until(&self, eligible_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let seconds = (eligible_at - now).num_seconds();
        let days = seconds / SECONDS_PER_DAY;
        if seconds % SECONDS_PER_DAY > 0 {
            days + 1
        } else {
            days
        }
    }

    /// Per-SKU ceiling for disposables. `None` while no anatomy focus has been
    /// chosen, which means the cap does not apply yet.
    pub fn disposable_limit(&self, anatomy_count: u32) -> Option<u32> {
        if anatomy_count == 0 {
            return None;
        }

        Some(anatomy_count.saturating_mul(self.units_per_anatomy))
    }

    pub fn exceeds_disposable_limit(&self, quantity: u32, anatomy_count: u32) -> bool {
        self.disposable_limit(anatomy_count)
            .map(|limit| quantity > limit)
            .unwrap_or(false)
    }
}

impl Default for CompliancePolicy {
    fn default() -> Self {
        Self::from(&ComplianceConfig::default())
    }
}

impl From<&ComplianceConfig> for CompliancePolicy {
    fn from(config: &ComplianceConfig) -> Self {
        Self::new(
            config.cooldown_lookback_days,
            config.cooldown_eligibility_days,
            config.disposable_units_per_anatomy,
            config.history_failure_policy,
        )
    }
}

fn non_zero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 {
        fallback
    } else {
        value
    }
}
