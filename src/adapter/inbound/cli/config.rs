//! Handler for the `config` command group.

use std::path::Path;

use crate::adapter::inbound::cli::diagnostic::CliError;
use crate::adapter::inbound::cli::{operator, output};

/// Execute `config show`.
pub fn execute_show(path: Option<&Path>) -> Result<(), CliError> {
    let config_toml = path
        .map(|p| operator::read_document(p, Some("pass an existing TOML file to --config")))
        .transpose()?;
    let view = operator::operator()?.show_config(config_toml.as_deref())?;

    if !output::is_json() {
        output::section("Effective Configuration");
        output::field(
            "Source",
            path.map_or_else(
                || "defaults + environment".to_string(),
                |p| p.display().to_string(),
            ),
        );
        output::field("Gateway", &view.gateway_endpoint);
        output::field("Snapshot", view.use_snapshot_data);
        output::field("Parallel", view.parallel);
        output::field("Attempts", view.max_attempts);
        println!();
    }
    output::document("config", &view.document)?;
    Ok(())
}
