use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SealbootError};
use crate::platform::shell::run_script_with_timeout;

/// Hands a reconstructed bootstrap document to whatever consumes it on the
/// node (typically by re-triggering cloud-init).
pub trait Applier {
    fn apply(&self, document: &Path) -> Result<()>;
}

/// Runs a shell command and treats a zero exit status as success.
pub struct CommandApplier {
    command: String,
    timeout: Duration,
}

impl CommandApplier {
    pub fn new(command: &str, timeout: Duration) -> Self {
        Self {
            command: command.to_string(),
            timeout,
        }
    }
}

impl Applier for CommandApplier {
    fn apply(&self, document: &Path) -> Result<()> {
        tracing::info!("applying {} via: {}", document.display(), self.command);
        let status = run_script_with_timeout(&self.command, self.timeout)
            .map_err(|e| SealbootError::Apply(format!("'{}': {e}", self.command)))?;
        if !status.success() {
            return Err(SealbootError::Apply(format!(
                "'{}' exited with {status}",
                self.command
            )));
        }
        Ok(())
    }
}
