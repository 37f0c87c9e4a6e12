use sealboot_core::config::SealbootConfig;
use sealboot_core::deleter::delete_chunks;
use sealboot_core::prefix::normalize_prefix;

pub(crate) fn run_delete(
    config: &SealbootConfig,
    prefix: &str,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let prefix = normalize_prefix(prefix)?;
    let store = sealboot_store::store_from_config(&config.store)?;
    delete_chunks(&store, &prefix, count)?;
    println!("Deleted {count} chunk(s) under {prefix}");
    Ok(())
}
