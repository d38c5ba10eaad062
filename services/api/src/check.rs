use chrono::{DateTime, Utc};
use clap::Args;
use evaluation_desk::config::AppConfig;
use evaluation_desk::error::AppError;
use evaluation_desk::workflows::evaluations::{
    ComplianceEvaluator, ComplianceReport, CooldownStatus, EvaluationDraft,
    EvaluationHistoryEntry, HistorySnapshot, QuantityCapStatus,
};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Draft evaluation request (JSON)
    #[arg(long)]
    pub(crate) draft: PathBuf,
    /// Prior evaluations for the account (JSON array)
    #[arg(long)]
    pub(crate) history: PathBuf,
    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let evaluator = ComplianceEvaluator::from_config(&config.compliance);

    let draft: EvaluationDraft = serde_json::from_slice(&std::fs::read(&args.draft)?)?;
    let now = args.now.unwrap_or_else(Utc::now);

    let report = match load_history(&args.history) {
        Ok(history) => evaluator.evaluate(&draft, HistorySnapshot::Loaded(&history), now),
        Err(reason) => evaluator.evaluate(&draft, HistorySnapshot::Unavailable(&reason), now),
    };

    print!("{}", CheckReport(&report));
    Ok(())
}

fn load_history(path: &Path) -> Result<Vec<EvaluationHistoryEntry>, String> {
    let bytes = std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))?;
    serde_json::from_slice(&bytes).map_err(|err| format!("{}: {err}", path.display()))
}

/// Plain-text rendering of a compliance report for the terminal.
pub(crate) struct CheckReport<'a>(pub(crate) &'a ComplianceReport);

impl fmt::Display for CheckReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let verdict = if report.is_blocking() {
            "BLOCKED"
        } else {
            "CLEAR"
        };
        writeln!(f, "Compliance check: {verdict}")?;

        writeln!(f, "\nRe-evaluation cooldown")?;
        match &report.cooldown.status {
            CooldownStatus::Checked if report.cooldown.violations.is_empty() => {
                writeln!(f, "  No products evaluated in the last 12 months")?;
            }
            CooldownStatus::Checked => {
                for violation in &report.cooldown.violations {
                    writeln!(f, "  - {}", violation.summary())?;
                }
            }
            CooldownStatus::AwaitingAccount => {
                writeln!(f, "  Select an account to check prior evaluations")?;
            }
            CooldownStatus::Degraded { reason } => writeln!(f, "  Not verified: {reason}")?,
            CooldownStatus::Unavailable { reason } => {
                writeln!(f, "  History unavailable, submission held: {reason}")?;
            }
        }

        let quantity = &report.quantity;
        writeln!(f, "\nDisposable quantity limits")?;
        match quantity.status {
            QuantityCapStatus::AwaitingAnatomy => {
                writeln!(f, "  Select anatomy focus to apply limits")?;
            }
            QuantityCapStatus::Applicable => {
                writeln!(
                    f,
                    "  {} anatomy focus selection(s), {} units per SKU",
                    quantity.anatomy_count, quantity.per_sku_limit
                )?;
                for line in &quantity.lines {
                    let marker = if line.over_limit { "!" } else { "-" };
                    writeln!(
                        f,
                        "  {marker} {} ({}): {}/{}",
                        line.name, line.sku, line.requested, line.limit
                    )?;
                }
            }
        }

        if !report.warnings.is_empty() {
            writeln!(f, "\nWarnings")?;
            for warning in &report.warnings {
                writeln!(f, "  - {}", warning.message())?;
            }
        }

        Ok(())
    }
}
