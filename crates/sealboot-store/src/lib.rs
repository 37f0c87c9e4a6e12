pub mod error;
pub mod local_store;
pub mod memory_store;
pub mod retry;
mod runtime;
pub mod ssm_store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use error::{ErrorKind, Result, StoreError};
pub use local_store::LocalStore;
pub use memory_store::{MemoryStore, StoreCall};
pub use ssm_store::SsmStore;

/// Ownership tags attached to every entry of a chunk group.
pub type Tags = BTreeMap<String, String>;

/// Synchronous client for an encrypted-at-rest secret key-value store.
///
/// Failures come back already classified (see [`ErrorKind`]); callers never
/// inspect backend error codes themselves. `put` creates or replaces the
/// entry, so a chunk group can be rewritten under the same prefix. `delete`
/// of an absent entry returns [`StoreError::NotFound`], which callers treat
/// as success.
pub trait SecretStore: Send + Sync {
    fn put(&self, name: &str, value: &str, tags: &Tags, secure: bool) -> Result<()>;
    fn get(&self, name: &str, decrypt: bool) -> Result<String>;
    fn delete(&self, name: &str) -> Result<()>;
}

impl<S: SecretStore + ?Sized> SecretStore for Box<S> {
    fn put(&self, name: &str, value: &str, tags: &Tags, secure: bool) -> Result<()> {
        (**self).put(name, value, tags, secure)
    }

    fn get(&self, name: &str, decrypt: bool) -> Result<String> {
        (**self).get(name, decrypt)
    }

    fn delete(&self, name: &str) -> Result<()> {
        (**self).delete(name)
    }
}

impl<S: SecretStore + ?Sized> SecretStore for &S {
    fn put(&self, name: &str, value: &str, tags: &Tags, secure: bool) -> Result<()> {
        (**self).put(name, value, tags, secure)
    }

    fn get(&self, name: &str, decrypt: bool) -> Result<String> {
        (**self).get(name, decrypt)
    }

    fn delete(&self, name: &str) -> Result<()> {
        (**self).delete(name)
    }
}

/// Backoff settings for store writes that hit throttling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Total time budget spent sleeping between attempts, in milliseconds.
    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: u64,
}

fn default_max_retries() -> usize {
    20
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_max_elapsed_ms() -> u64 {
    5 * 60 * 1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            max_elapsed_ms: default_max_elapsed_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Ssm,
    Local,
}

/// Connection settings for building a store client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// AWS region of the parameter store (ssm backend).
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override, e.g. a VPC endpoint (ssm backend).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Root directory (local backend).
    #[serde(default)]
    pub path: Option<String>,
}

/// Build a store client from its configuration.
pub fn store_from_config(cfg: &StoreConfig) -> Result<Box<dyn SecretStore>> {
    match cfg.backend {
        StoreBackend::Ssm => {
            let region = cfg.region.as_deref().ok_or_else(|| {
                StoreError::Config("ssm backend requires 'region'".into())
            })?;
            if cfg.access_key_id.is_some() != cfg.secret_access_key.is_some() {
                return Err(StoreError::Config(
                    "ssm backend requires both access_key_id and secret_access_key when either is set"
                        .into(),
                ));
            }
            let credentials = cfg
                .access_key_id
                .as_deref()
                .zip(cfg.secret_access_key.as_deref());
            Ok(Box::new(SsmStore::new(
                region,
                cfg.endpoint.as_deref(),
                credentials,
            )?))
        }
        StoreBackend::Local => {
            let path = cfg.path.as_deref().ok_or_else(|| {
                StoreError::Config("local backend requires 'path'".into())
            })?;
            Ok(Box::new(LocalStore::new(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_defaults_allow_five_minutes_of_backoff() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_elapsed_ms, 300_000);
        assert!(cfg.retry_delay_ms <= cfg.retry_max_delay_ms);
    }

    #[test]
    fn ssm_backend_requires_region() {
        let cfg = StoreConfig::default();
        match store_from_config(&cfg) {
            Err(StoreError::Config(msg)) => assert!(msg.contains("region")),
            Err(other) => panic!("expected config error, got: {other}"),
            Ok(_) => panic!("expected config error"),
        }
    }

    #[test]
    fn ssm_backend_rejects_half_credentials() {
        let cfg = StoreConfig {
            region: Some("eu-west-1".into()),
            access_key_id: Some("AKIA".into()),
            ..StoreConfig::default()
        };
        assert!(matches!(
            store_from_config(&cfg),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn local_backend_builds_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig {
            backend: StoreBackend::Local,
            path: Some(dir.path().to_string_lossy().to_string()),
            ..StoreConfig::default()
        };
        let store = store_from_config(&cfg).unwrap();
        store.put("/group/0", "abc", &Tags::new(), true).unwrap();
        assert_eq!(store.get("/group/0", true).unwrap(), "abc");
    }

    #[test]
    fn store_config_parses_from_yaml() {
        let cfg: StoreConfig = serde_yaml::from_str(
            "backend: ssm\nregion: us-west-2\nendpoint: https://ssm.example.internal\n",
        )
        .unwrap();
        assert_eq!(cfg.backend, StoreBackend::Ssm);
        assert_eq!(cfg.region.as_deref(), Some("us-west-2"));
    }
}
