use std::fmt::Write as _;

use crate::error::{Result, SealbootError};

/// Upper bound on instance launch metadata.
pub const MAX_STUB_BYTES: usize = 16 * 1024;

/// Values baked into a bootstrap stub. Nothing is read from the node's
/// environment at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubParams {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub prefix: String,
    pub chunks: u32,
    /// Path of the sealboot binary on the node image.
    pub binary: String,
    pub final_path: String,
}

/// Render the `#!/bin/bash` launch-metadata script that runs the
/// reconstructor with the chunk group's coordinates.
pub fn render_stub(params: &StubParams) -> Result<String> {
    let mut args = vec![
        shell_quote(&params.binary),
        "reconstruct".to_string(),
        "--prefix".to_string(),
        shell_quote(&params.prefix),
        "--chunks".to_string(),
        params.chunks.to_string(),
        "--final-path".to_string(),
        shell_quote(&params.final_path),
    ];
    if let Some(region) = params.region.as_deref().filter(|r| !r.is_empty()) {
        args.push("--region".to_string());
        args.push(shell_quote(region));
    }
    if let Some(endpoint) = params.endpoint.as_deref().filter(|e| !e.is_empty()) {
        args.push("--endpoint".to_string());
        args.push(shell_quote(endpoint));
    }

    let mut script = String::from("#!/bin/bash\nset -o errexit\nset -o nounset\nset -o pipefail\n\n");
    // Writing into a String cannot fail.
    let _ = writeln!(script, "exec {}", args.join(" "));

    if script.len() > MAX_STUB_BYTES {
        return Err(SealbootError::StubTooLarge {
            size: script.len(),
            limit: MAX_STUB_BYTES,
        });
    }
    Ok(script)
}

/// Single-quote a value for POSIX shells. Embedded quotes become `'\''`.
pub fn shell_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}
