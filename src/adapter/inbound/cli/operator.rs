//! Inbound operator accessor for CLI handlers.

use std::path::Path;
use std::sync::OnceLock;

use crate::adapter::inbound::cli::diagnostic::CliError;
use crate::port::OperatorPort;

static OPERATOR: OnceLock<Box<dyn OperatorPort>> = OnceLock::new();

/// Installs the operator implementation used by CLI handlers.
pub fn install(operator: Box<dyn OperatorPort>) -> Result<(), Box<dyn OperatorPort>> {
    OPERATOR.set(operator)
}

/// Returns the configured operator capability surface for CLI handlers.
pub fn operator() -> Result<&'static dyn OperatorPort, CliError> {
    OPERATOR
        .get()
        .map(|operator| &**operator)
        .ok_or_else(|| CliError::Runtime("CLI operator not installed".to_string()))
}

/// Read an input document from disk.
pub fn read_document(path: &Path, help: Option<&str>) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::input(path.display().to_string(), e, help))
}
