use uuid::Uuid;

use crate::error::{Result, SealbootError};

/// Default namespace under which fresh chunk groups are created.
pub const DEFAULT_NAMESPACE_ROOT: &str = "/cluster.x-k8s.io";

/// Leading name tokens the parameter store reserves for itself.
const RESERVED_TOKENS: &[&str] = &["aws", "ssm"];

/// Normalize a chunk-group prefix: drop leading slashes, strip one reserved
/// namespace token (case-insensitive) followed by `/` or `.`, and re-root the
/// result at `/`.
///
/// `aws/foo`, `/ssm.foo` and `SSM/foo` all become `/foo`; `bar` becomes `/bar`.
pub fn normalize_prefix(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_start_matches('/');
    let stripped = strip_reserved_token(trimmed);
    let body = stripped.trim_start_matches('/').trim_end_matches('/');
    if body.is_empty() {
        return Err(SealbootError::InvalidPrefix(raw.to_string()));
    }
    Ok(format!("/{body}"))
}

fn strip_reserved_token(name: &str) -> &str {
    for token in RESERVED_TOKENS {
        let Some(head) = name.get(..token.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(token) {
            continue;
        }
        let rest = &name[token.len()..];
        if let Some(after) = rest.strip_prefix('/').or_else(|| rest.strip_prefix('.')) {
            return after;
        }
    }
    name
}

/// A fresh, globally unique prefix under `namespace_root`.
pub fn generate_prefix(namespace_root: &str) -> Result<String> {
    let root = normalize_prefix(namespace_root)?;
    Ok(format!("{root}/{}", Uuid::new_v4()))
}

/// Store entry name of chunk `index` within a group.
pub fn chunk_name(prefix: &str, index: u32) -> String {
    format!("{prefix}/{index}")
}
