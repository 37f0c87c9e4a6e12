use std::path::PathBuf;
use std::time::Duration;

use sealboot_store::{RetryConfig, StoreConfig};
use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::error::{Result, SealbootError};
use crate::prefix::normalize_prefix;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SealbootConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub writer: WriterConfig,
    #[serde(default)]
    pub reconstruct: ReconstructConfig,
}

impl SealbootConfig {
    pub fn validate(&self) -> Result<()> {
        self.writer.validate()?;
        self.reconstruct.validate()?;
        Ok(())
    }
}

/// Control-plane chunk writer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriterConfig {
    /// Namespace under which fresh prefixes are generated.
    #[serde(default = "default_namespace_root")]
    pub namespace_root: String,
    /// Maximum characters of encoded payload per store entry.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    /// Store entries encrypted at rest.
    #[serde(default = "default_secure")]
    pub secure: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            namespace_root: default_namespace_root(),
            max_chunk_chars: default_max_chunk_chars(),
            secure: default_secure(),
        }
    }
}

impl WriterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_chars == 0 {
            return Err(SealbootError::Config(
                "writer.max_chunk_chars must be greater than zero".into(),
            ));
        }
        normalize_prefix(&self.namespace_root).map_err(|_| {
            SealbootError::Config(format!(
                "writer.namespace_root '{}' is not a usable prefix",
                self.namespace_root
            ))
        })?;
        Ok(())
    }
}

/// When the node deletes its chunks relative to decoding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    /// Delete right after fetching. A later decode failure cannot be retried.
    BeforeDecode,
    /// Keep chunks until the apply step succeeds so a reboot can retry.
    AfterApply,
}

impl std::str::FromStr for CleanupMode {
    type Err = SealbootError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "before_decode" | "before-decode" => Ok(CleanupMode::BeforeDecode),
            "after_apply" | "after-apply" => Ok(CleanupMode::AfterApply),
            other => Err(SealbootError::Config(format!(
                "unknown cleanup mode '{other}' (expected before-decode or after-apply)"
            ))),
        }
    }
}

/// Node-side reconstructor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconstructConfig {
    /// Where the decoded bootstrap document is written.
    #[serde(default = "default_final_path")]
    pub final_path: String,
    /// Shell command that hands the document to the node's config agent.
    #[serde(default = "default_apply_command")]
    pub apply_command: String,
    #[serde(default = "default_apply_timeout_seconds")]
    pub apply_timeout_seconds: u64,
    #[serde(default = "default_cleanup")]
    pub cleanup: CleanupMode,
    /// Path of the sealboot binary on the node image, used by the stub.
    #[serde(default = "default_binary")]
    pub binary: String,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            final_path: default_final_path(),
            apply_command: default_apply_command(),
            apply_timeout_seconds: default_apply_timeout_seconds(),
            cleanup: default_cleanup(),
            binary: default_binary(),
        }
    }
}

impl ReconstructConfig {
    pub fn validate(&self) -> Result<()> {
        if self.final_path.trim().is_empty() {
            return Err(SealbootError::Config(
                "reconstruct.final_path must not be empty".into(),
            ));
        }
        if self.apply_timeout_seconds == 0 {
            return Err(SealbootError::Config(
                "reconstruct.apply_timeout_seconds must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn final_path(&self) -> PathBuf {
        PathBuf::from(&self.final_path)
    }

    pub fn apply_timeout(&self) -> Duration {
        Duration::from_secs(self.apply_timeout_seconds)
    }
}
