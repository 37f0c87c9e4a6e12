use std::fmt;
use std::path::{Path, PathBuf};

use super::types::SealbootConfig;
use crate::error::{Result, SealbootError};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SEALBOOT_CONFIG";

/// Where the active config file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CliArg(PathBuf),
    EnvVar(PathBuf),
    SearchPath { path: PathBuf, level: &'static str },
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::CliArg(p) | ConfigSource::EnvVar(p) => p,
            ConfigSource::SearchPath { path, .. } => path,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CliArg(p) => write!(f, "{} (--config)", p.display()),
            ConfigSource::EnvVar(p) => write!(f, "{} (${CONFIG_ENV_VAR})", p.display()),
            ConfigSource::SearchPath { path, level } => {
                write!(f, "{} ({level})", path.display())
            }
        }
    }
}

/// Candidate config locations, most specific first.
pub fn default_config_search_paths() -> Vec<(PathBuf, &'static str)> {
    vec![
        (PathBuf::from("sealboot.yaml"), "project"),
        (PathBuf::from("/etc/sealboot/config.yaml"), "system"),
    ]
}

/// Pick the config file: `--config`, then `$SEALBOOT_CONFIG`, then the
/// first existing search path. `None` means run on built-in defaults.
pub fn resolve_config_path(cli_config: Option<&str>) -> Option<ConfigSource> {
    if let Some(path) = cli_config {
        return Some(ConfigSource::CliArg(PathBuf::from(path)));
    }

    if let Ok(val) = std::env::var(CONFIG_ENV_VAR) {
        if !val.is_empty() {
            return Some(ConfigSource::EnvVar(PathBuf::from(val)));
        }
    }

    default_config_search_paths()
        .into_iter()
        .find(|(path, _)| path.exists())
        .map(|(path, level)| ConfigSource::SearchPath { path, level })
}

/// Read, expand and parse a config file.
pub fn load_config(path: &Path) -> Result<SealbootConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SealbootError::Config(format!("cannot read '{}': {e}", path.display()))
    })?;
    parse_config(&contents, path)
}

/// Load the config chosen by [`resolve_config_path`], or defaults when none.
pub fn load_or_default(source: Option<&ConfigSource>) -> Result<SealbootConfig> {
    match source {
        Some(src) => load_config(src.path()),
        None => Ok(SealbootConfig::default()),
    }
}

pub(crate) fn parse_config(contents: &str, path: &Path) -> Result<SealbootConfig> {
    let expanded = expand_env_placeholders(contents, path)?;
    if expanded.trim().is_empty() {
        return Ok(SealbootConfig::default());
    }
    let cfg: SealbootConfig = serde_yaml::from_str(&expanded).map_err(|e| {
        SealbootError::Config(format!("invalid config '{}': {e}", path.display()))
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Expand `${VAR}` and `${VAR:-default}` placeholders in raw config text.
fn expand_env_placeholders(input: &str, path: &Path) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some((literal, after)) = rest.split_once("${") {
        out.push_str(literal);
        // Byte offset of the `${`, for line numbers in errors.
        let at = input.len() - rest.len() + literal.len();
        let (token, tail) = after.split_once('}').ok_or_else(|| {
            expand_error(path, input, at, "unterminated environment placeholder")
        })?;
        out.push_str(&resolve_env_token(token, path, input, at)?);
        rest = tail;
    }

    out.push_str(rest);
    Ok(out)
}

fn resolve_env_token(token: &str, path: &Path, input: &str, start: usize) -> Result<String> {
    let (name, default) = match token.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (token, None),
    };
    if !is_valid_env_var_name(name) {
        return Err(expand_error(
            path,
            input,
            start,
            format!("invalid environment placeholder '{token}'"),
        ));
    }

    match (std::env::var(name), default) {
        (Ok(value), Some(default)) if value.is_empty() => Ok(default.to_string()),
        (Ok(value), _) => Ok(value),
        (Err(std::env::VarError::NotPresent), Some(default)) => Ok(default.to_string()),
        (Err(std::env::VarError::NotPresent), None) => Err(expand_error(
            path,
            input,
            start,
            format!("environment variable '{name}' is not set"),
        )),
        (Err(std::env::VarError::NotUnicode(_)), _) => Err(expand_error(
            path,
            input,
            start,
            format!("environment variable '{name}' is not valid UTF-8"),
        )),
    }
}

fn is_valid_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn expand_error(
    path: &Path,
    input: &str,
    start: usize,
    message: impl fmt::Display,
) -> SealbootError {
    let line = input[..start].matches('\n').count() + 1;
    SealbootError::Config(format!(
        "invalid config '{}': {message} at line {line}",
        path.display()
    ))
}

/// Starter config written by `sealboot config`.
pub fn minimal_config_template() -> &'static str {
    r#"# sealboot configuration
store:
  backend: ssm
  region: ${AWS_REGION:-us-east-1}
  # endpoint: https://vpce-0123.ssm.us-east-1.vpce.amazonaws.com

retry:
  retry_delay_ms: 1000
  retry_max_delay_ms: 30000
  max_elapsed_ms: 300000

writer:
  namespace_root: /cluster.x-k8s.io
  max_chunk_chars: 4000
  secure: true

reconstruct:
  final_path: /etc/secret-userdata.txt
  apply_command: systemctl restart cloud-init
  apply_timeout_seconds: 600
  # before_decode deletes chunks as soon as they are fetched;
  # after_apply keeps them until the document has been applied.
  cleanup: before_decode
  binary: /usr/local/bin/sealboot
"#
}
