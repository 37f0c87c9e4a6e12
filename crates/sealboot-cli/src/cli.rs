use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sealboot",
    version,
    about = "Deliver oversized bootstrap documents through an encrypted parameter store",
    after_help = "\
Configuration file lookup order:
  1. --config <path>             (explicit flag)
  2. $SEALBOOT_CONFIG            (environment variable)
  3. ./sealboot.yaml             (project)
  4. /etc/sealboot/config.yaml   (system)
Without a config file built-in defaults are used.

Reconstruct exit codes:
  0 done, 1 usage/config, 2 fetch, 3 base64 decode, 4 decompress, 5 apply"
)]
pub(crate) struct Cli {
    /// Path to configuration file (overrides SEALBOOT_CONFIG and default search)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Compress, encode and store a bootstrap document as a chunk group
    Write {
        /// Cluster that owns the machine
        #[arg(long)]
        cluster: String,

        /// Machine name (used for the Name tag)
        #[arg(long)]
        machine: String,

        /// Machine role tag
        #[arg(long, default_value = "node")]
        role: String,

        /// Reuse an existing prefix instead of generating one
        #[arg(long)]
        prefix: Option<String>,

        /// Additional tag as KEY=VALUE (repeatable)
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,

        /// Bootstrap document to store ("-" reads stdin)
        file: String,
    },

    /// Delete the chunks of a group
    Delete {
        #[arg(long)]
        prefix: String,

        /// Number of chunks in the group
        #[arg(long)]
        count: u32,
    },

    /// Fetch, decode and apply a chunk group on the node
    Reconstruct {
        #[arg(long)]
        prefix: String,

        /// Number of chunks in the group
        #[arg(long)]
        chunks: u32,

        /// Store region (overrides config)
        #[arg(long)]
        region: Option<String>,

        /// Store endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Where to write the decoded document (overrides config)
        #[arg(long)]
        final_path: Option<String>,

        /// Command run once the document is in place (overrides config)
        #[arg(long)]
        apply_command: Option<String>,

        /// When to delete chunks: before-decode or after-apply (overrides config)
        #[arg(long)]
        cleanup: Option<String>,
    },

    /// Print the launch-metadata stub for a chunk group
    Stub {
        #[arg(long)]
        prefix: String,

        /// Number of chunks in the group
        #[arg(long)]
        chunks: u32,

        /// Store region baked into the stub (overrides config)
        #[arg(long)]
        region: Option<String>,

        /// Store endpoint baked into the stub (overrides config)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Generate a starter configuration file
    Config {
        /// Destination path (skips interactive prompt)
        dest: Option<String>,
    },
}

impl Commands {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Write { .. } => "write",
            Self::Delete { .. } => "delete",
            Self::Reconstruct { .. } => "reconstruct",
            Self::Stub { .. } => "stub",
            Self::Config { .. } => "config",
        }
    }
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tag_splits_on_first_equals() {
        assert_eq!(
            parse_tag("team=infra=core").unwrap(),
            ("team".to_string(), "infra=core".to_string())
        );
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=x").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
