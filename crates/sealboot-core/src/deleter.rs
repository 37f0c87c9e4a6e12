use sealboot_store::SecretStore;

use crate::error::{Result, SealbootError};
use crate::prefix::chunk_name;

/// Delete chunks `0..count` under `prefix`, best-effort.
///
/// Entries that are already gone count as deleted. Any other failure is
/// recorded and the loop keeps going so no chunk is skipped; all recorded
/// failures come back together as [`SealbootError::Cleanup`].
pub fn delete_chunks(store: &dyn SecretStore, prefix: &str, count: u32) -> Result<()> {
    let mut failures = Vec::new();
    for index in 0..count {
        let name = chunk_name(prefix, index);
        match store.delete(&name) {
            Ok(()) => tracing::debug!("deleted {name}"),
            Err(e) if e.is_not_found() => tracing::debug!("{name} already deleted"),
            Err(e) => {
                tracing::warn!("failed to delete {name}: {e}");
                failures.push(e);
            }
        }
    }

    if failures.is_empty() {
        tracing::info!("deleted {count} chunk(s) under {prefix}");
        Ok(())
    } else {
        Err(SealbootError::Cleanup {
            prefix: prefix.to_string(),
            failures,
        })
    }
}
