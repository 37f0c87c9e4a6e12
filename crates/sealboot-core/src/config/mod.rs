mod defaults;
mod resolve;
mod types;

pub use self::resolve::{
    CONFIG_ENV_VAR, ConfigSource, default_config_search_paths, load_config, load_or_default,
    minimal_config_template, resolve_config_path,
};
pub use self::types::*;
pub use sealboot_store::{RetryConfig, StoreBackend, StoreConfig};

#[cfg(test)]
pub(crate) use self::resolve::parse_config;
