//! Command-line interface definitions.
//!
//! Defines the CLI structure for the quote-refresh tool using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Refresh option-strategy proposals against live or recorded quotes
#[derive(Parser, Debug)]
#[command(name = "quote-refresh")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh rejected proposals and report what qualifies now
    Refresh(RefreshArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for `refresh`.
#[derive(Args, Debug, Clone)]
pub struct RefreshArgs {
    /// JSON file holding an array of rejected proposal entries
    #[arg(long, short = 'e')]
    pub entries: PathBuf,

    /// JSON file of recorded quotes served by the replay gateway
    #[arg(long)]
    pub quotes: PathBuf,

    /// Configuration file (defaults plus environment when omitted)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Underlying spot price used for parity and spread context
    #[arg(long)]
    pub spot: Option<f64>,

    /// Annual risk-free rate used for parity
    #[arg(long)]
    pub rate: Option<f64>,

    /// Refresh entries concurrently
    #[arg(long, conflicts_with = "sequential")]
    pub parallel: bool,

    /// Refresh entries one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Worker cap for parallel runs
    #[arg(long)]
    pub workers: Option<usize>,

    /// Fetch attempts per entry
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Label recorded in logs for this run
    #[arg(long)]
    pub trigger: Option<String>,
}

impl RefreshArgs {
    /// Explicit parallel/sequential choice, if any.
    #[must_use]
    pub const fn parallel_override(&self) -> Option<bool> {
        match (self.parallel, self.sequential) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Subcommands for `config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for `config show`.
#[derive(Args, Debug, Clone)]
pub struct ConfigShowArgs {
    /// Configuration file (defaults plus environment when omitted)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_refresh_flags() {
        let cli = Cli::parse_from([
            "quote-refresh",
            "--json",
            "refresh",
            "--entries",
            "entries.json",
            "--quotes",
            "quotes.json",
            "--parallel",
            "--attempts",
            "3",
            "--timeout",
            "2.5",
        ]);
        assert!(cli.json);
        let Commands::Refresh(args) = cli.command else {
            panic!("expected refresh");
        };
        assert_eq!(args.parallel_override(), Some(true));
        assert_eq!(args.attempts, Some(3));
        assert_eq!(args.timeout, Some(2.5));
    }

    #[test]
    fn parallel_and_sequential_conflict() {
        let parsed = Cli::try_parse_from([
            "quote-refresh",
            "refresh",
            "-e",
            "e.json",
            "--quotes",
            "q.json",
            "--parallel",
            "--sequential",
        ]);
        assert!(parsed.is_err());
    }
}
