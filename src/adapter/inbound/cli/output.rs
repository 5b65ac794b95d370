//! CLI output formatting.
//!
//! Human-readable colored lines by default, one JSON object per line with
//! `--json`. Handlers call these helpers instead of printing directly so the
//! two modes stay in sync.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::OwoColorize;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;

use crate::domain::{AcceptedProposal, PipelineStats, RefreshResult, Rejection};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = per-leg detail).
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    *config_cell().read()
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    *config_cell().write() = config;
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

fn regular_output_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

fn emit_json_line(kind: &str, payload: serde_json::Value) {
    println!(
        "{}",
        json!({
            "type": kind,
            "payload": payload,
        })
    );
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    let config = read_config();
    if config.json || regular_output_suppressed(config) {
        return;
    }
    println!("{} {}", "quote-refresh".bold(), version.dimmed());
    println!();
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let config = read_config();
    let value = value.to_string();

    if config.json {
        emit_json_line("field", json!({ "label": label, "value": value }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }
    println!("  {:<12} {}", label.dimmed(), value);
}

/// Print a section header.
pub fn section(title: &str) {
    let config = read_config();
    if config.json || regular_output_suppressed(config) {
        return;
    }
    println!();
    println!("{}", title.bold());
}

/// Print a warning line.
pub fn warning(message: &str) {
    if is_json() {
        emit_json_line("warning", json!({ "message": message }));
        return;
    }
    println!("  {} {}", "⚠".yellow(), message);
}

/// Print a serializable document: pretty JSON in either mode.
pub fn document<T: Serialize>(kind: &str, value: &T) -> serde_json::Result<()> {
    if is_json() {
        emit_json_line(kind, serde_json::to_value(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Print the outcome of a refresh run.
pub fn refresh_result(result: &RefreshResult) -> serde_json::Result<()> {
    let config = read_config();
    if config.json {
        emit_json_line("refresh_result", serde_json::to_value(result)?);
        return Ok(());
    }

    stats(&result.stats);
    if !result.accepted.is_empty() {
        section("Accepted");
        for accepted in &result.accepted {
            accepted_line(accepted, config.verbose);
        }
    }
    if !result.rejections.is_empty() {
        section("Rejected");
        for rejection in &result.rejections {
            rejection_line(rejection, config.verbose);
        }
    }
    Ok(())
}

fn stats(stats: &PipelineStats) {
    field("total", stats.total);
    field("accepted", stats.accepted.green());
    field("rejected", stats.rejected.yellow());
    field("failed", stats.failed.red());
    field("attempts", stats.attempts);
    field("retries", stats.retries);
    field("duration", format!("{:.2?}", stats.duration));
}

fn accepted_line(accepted: &AcceptedProposal, verbose: u8) {
    let proposal = &accepted.proposal;
    let score = proposal
        .metrics
        .score
        .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
    println!(
        "  {} #{} {} {} score {} {}",
        "✓".green(),
        accepted.source.index,
        proposal.symbol.bold(),
        proposal.strategy,
        score.cyan(),
        format!("({} attempt(s))", accepted.attempts).dimmed()
    );
    if verbose > 0 {
        for leg in &proposal.legs {
            let mid = leg.mid.map_or_else(|| "-".to_string(), |m| format!("{m:.2}"));
            let source = leg.mid_source.map_or("none", |s| s.as_str());
            println!("      {} mid {} {}", leg.label(), mid, source.dimmed());
        }
    }
}

fn rejection_line(rejection: &Rejection, verbose: u8) {
    let strategy = rejection
        .proposal
        .as_ref()
        .map_or("?", |p| p.strategy.as_str());
    let detail = rejection
        .error
        .as_ref()
        .map_or_else(|| rejection.reasons.join("; "), ToString::to_string);
    println!(
        "  {} #{} {} {} {}",
        "×".red(),
        rejection.source.index,
        rejection.source.symbol.bold(),
        strategy,
        detail.dimmed()
    );
    if verbose > 0 && rejection.error.is_some() {
        for reason in &rejection.reasons {
            println!("      {}", reason.dimmed());
        }
    }
}
