use sealboot_core::config::SealbootConfig;
use sealboot_core::prefix::normalize_prefix;
use sealboot_core::stub::{StubParams, render_stub};

pub(crate) fn run_stub(
    config: &SealbootConfig,
    prefix: &str,
    chunks: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let script = render_stub(&StubParams {
        region: config.store.region.clone(),
        endpoint: config.store.endpoint.clone(),
        prefix: normalize_prefix(prefix)?,
        chunks,
        binary: config.reconstruct.binary.clone(),
        final_path: config.reconstruct.final_path.clone(),
    })?;
    print!("{script}");
    Ok(())
}
