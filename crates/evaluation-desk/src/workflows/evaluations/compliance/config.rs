use serde::{Deserialize, Serialize};

pub const DEFAULT_COOLDOWN_LOOKBACK_DAYS: u32 = 365;
pub const DEFAULT_COOLDOWN_ELIGIBILITY_DAYS: u32 = 366;
pub const DEFAULT_DISPOSABLE_UNITS_PER_ANATOMY: u32 = 10;

/// What the submission path does when prior evaluations cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFailurePolicy {
    /// Fail open: skip the cooldown check and attach a warning to the result.
    #[default]
    AllowWithWarning,
    /// Fail closed: refuse the submission until history is reachable.
    Block,
}

impl HistoryFailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allow_with_warning" | "allow" | "fail_open" => Some(Self::AllowWithWarning),
            "block" | "fail_closed" => Some(Self::Block),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            HistoryFailurePolicy::AllowWithWarning => "allow_with_warning",
            HistoryFailurePolicy::Block => "block",
        }
    }
}

/// Tunables for the cooldown and disposable-cap rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    pub cooldown_lookback_days: u32,
    pub cooldown_eligibility_days: u32,
    pub disposable_units_per_anatomy: u32,
    pub history_failure_policy: HistoryFailurePolicy,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            cooldown_lookback_days: DEFAULT_COOLDOWN_LOOKBACK_DAYS,
            cooldown_eligibility_days: DEFAULT_COOLDOWN_ELIGIBILITY_DAYS,
            disposable_units_per_anatomy: DEFAULT_DISPOSABLE_UNITS_PER_ANATOMY,
            history_failure_policy: HistoryFailurePolicy::default(),
        }
    }
}
