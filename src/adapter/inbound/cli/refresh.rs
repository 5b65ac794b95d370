//! Handler for the `refresh` command.

use crate::adapter::inbound::cli::command::RefreshArgs;
use crate::adapter::inbound::cli::diagnostic::CliError;
use crate::adapter::inbound::cli::{operator, output};
use crate::error::Error;
use crate::port::RefreshRequest;

/// Execute `refresh`.
pub async fn execute(args: &RefreshArgs) -> Result<(), CliError> {
    let config_toml = args
        .config
        .as_deref()
        .map(|p| operator::read_document(p, Some("pass an existing TOML file to --config")))
        .transpose()?;
    let request = RefreshRequest {
        config_toml,
        entries_json: operator::read_document(&args.entries, None)?,
        quotes_json: operator::read_document(&args.quotes, None)?,
        spot_price: args.spot,
        interest_rate: args.rate,
        parallel: args.parallel_override(),
        max_workers: args.workers,
        max_attempts: args.attempts,
        timeout_secs: args.timeout,
        trigger: args.trigger.clone(),
    };

    let result = operator::operator()?
        .refresh(request)
        .await
        .map_err(|e| match e {
            Error::Json(e) => CliError::input(
                "input",
                e,
                Some("entries and quotes must both be JSON arrays of objects"),
            ),
            other => other.into(),
        })?;

    output::header(env!("CARGO_PKG_VERSION"));
    output::refresh_result(&result)?;
    if result.stats.total > 0 && result.accepted.is_empty() && !output::is_json() {
        output::warning("no proposal qualified after refresh");
    }
    Ok(())
}
