mod cli;
mod cmd;
mod config_gen;

use clap::Parser;

use sealboot_core::config::{self, CleanupMode, SealbootConfig};
use sealboot_core::reconstruct::EXIT_USAGE;

use cli::{Cli, Commands};
use cmd::write::WriteArgs;
use config_gen::run_config_generate;

fn main() {
    let cli = Cli::parse();

    // The reconstructor runs unattended at boot; keep its log useful by default.
    let filter = match cli.verbose {
        0 if matches!(&cli.command, Commands::Reconstruct { .. }) => "info",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // `config` needs no config file
    if let Commands::Config { dest } = &cli.command {
        if let Err(e) = run_config_generate(dest.as_deref()) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let source = config::resolve_config_path(cli.config.as_deref());
    match &source {
        Some(s) => tracing::info!("Using config: {s}"),
        None => tracing::debug!("no config file found; using defaults"),
    }
    let mut cfg = match config::load_or_default(source.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_USAGE);
        }
    };

    tracing::debug!("running {}", cli.command.name());
    let code = match &cli.command {
        Commands::Write {
            cluster,
            machine,
            role,
            prefix,
            tags,
            file,
        } => report(cmd::write::run_write(
            &cfg,
            WriteArgs {
                cluster,
                machine,
                role,
                prefix: prefix.as_deref(),
                tags,
                file,
            },
        )),
        Commands::Delete { prefix, count } => {
            report(cmd::delete::run_delete(&cfg, prefix, *count))
        }
        Commands::Reconstruct {
            prefix,
            chunks,
            region,
            endpoint,
            final_path,
            apply_command,
            cleanup,
        } => {
            override_store(&mut cfg, region, endpoint);
            if let Some(path) = final_path {
                cfg.reconstruct.final_path = path.clone();
            }
            if let Some(command) = apply_command {
                cfg.reconstruct.apply_command = command.clone();
            }
            match cleanup.as_deref().map(str::parse::<CleanupMode>).transpose() {
                Ok(Some(mode)) => cfg.reconstruct.cleanup = mode,
                Ok(None) => {}
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(EXIT_USAGE);
                }
            }
            match cfg.reconstruct.validate() {
                Ok(()) => cmd::reconstruct::run_reconstruct(&cfg, prefix, *chunks),
                Err(e) => {
                    eprintln!("Error: {e}");
                    EXIT_USAGE
                }
            }
        }
        Commands::Stub {
            prefix,
            chunks,
            region,
            endpoint,
        } => {
            override_store(&mut cfg, region, endpoint);
            report(cmd::stub::run_stub(&cfg, prefix, *chunks))
        }
        // Handled before config loading.
        Commands::Config { .. } => 0,
    };

    std::process::exit(code);
}

fn override_store(cfg: &mut SealbootConfig, region: &Option<String>, endpoint: &Option<String>) {
    if let Some(region) = region {
        cfg.store.region = Some(region.clone());
    }
    if let Some(endpoint) = endpoint {
        cfg.store.endpoint = Some(endpoint.clone());
    }
}

fn report(result: Result<(), Box<dyn std::error::Error>>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}
