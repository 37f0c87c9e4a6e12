use sealboot_core::config::SealbootConfig;
use sealboot_core::reconstruct::{EXIT_OK, EXIT_USAGE, Outcome, run_from_config};

/// Run the node-side state machine and map the result to a process exit code.
pub(crate) fn run_reconstruct(config: &SealbootConfig, prefix: &str, chunks: u32) -> i32 {
    let store = match sealboot_store::store_from_config(&config.store) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("cannot open secret store: {e}");
            eprintln!("Error: {e}");
            return EXIT_USAGE;
        }
    };

    match run_from_config(&store, &config.reconstruct, prefix, chunks) {
        Ok(Outcome::AlreadyPresent) => {
            tracing::info!("nothing to do");
            EXIT_OK
        }
        Ok(Outcome::Applied) => EXIT_OK,
        Err(failure) => {
            eprintln!("Error: {failure}");
            failure.exit_code()
        }
    }
}
