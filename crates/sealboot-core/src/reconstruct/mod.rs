//! Node-side reconstruction of a chunked bootstrap document.
//!
//! Runs once per boot as an explicit state machine:
//!
//! ```text
//! Check ──(final exists)──────────────────────────────▶ Done
//!   │
//!   ▼
//! Fetch(0..count) ──(error)──▶ Cleanup ──▶ Fail(fetch)
//!   │
//!   ├─ before_decode: Cleanup ─▶ Decode ─▶ Apply ─▶ Done
//!   └─ after_apply:   Decode ─▶ Apply ─▶ Cleanup ─▶ Done
//! ```
//!
//! Decode and Apply failures go straight to Fail. With `before_decode` the
//! chunks are already gone at that point and the machine has to be
//! reprovisioned; `after_apply` keeps them and removes the final artifact
//! after a failed Apply, so a reboot fetches and applies again.

mod apply;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use sealboot_store::SecretStore;
use thiserror::Error;

pub use self::apply::{Applier, CommandApplier};

use crate::codec;
use crate::config::{CleanupMode, ReconstructConfig};
use crate::error::SealbootError;
use crate::platform::fs::{create_private, remove_if_exists};
use crate::prefix::chunk_name;

pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 1;
pub const EXIT_FETCH: i32 = 2;
pub const EXIT_DECODE: i32 = 3;
pub const EXIT_DECOMPRESS: i32 = 4;
pub const EXIT_APPLY: i32 = 5;

/// Which phase a failed run died in. Each maps to its own exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Usage,
    Fetch,
    Decode,
    Decompress,
    Apply,
}

impl FailureKind {
    pub fn exit_code(self) -> i32 {
        match self {
            FailureKind::Usage => EXIT_USAGE,
            FailureKind::Fetch => EXIT_FETCH,
            FailureKind::Decode => EXIT_DECODE,
            FailureKind::Decompress => EXIT_DECOMPRESS,
            FailureKind::Apply => EXIT_APPLY,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Usage => "usage",
            FailureKind::Fetch => "fetch",
            FailureKind::Decode => "decode",
            FailureKind::Decompress => "decompress",
            FailureKind::Apply => "apply",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("reconstruction failed during {kind}: {error}")]
pub struct ReconstructFailure {
    pub kind: FailureKind,
    #[source]
    pub error: SealbootError,
}

impl ReconstructFailure {
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The final artifact was already on disk; nothing was fetched.
    AlreadyPresent,
    Applied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Check,
    Fetch(u32),
    Cleanup,
    Decode,
    Apply,
    Done(Outcome),
    Fail(FailureKind),
}

/// Files the reconstructor works with, all derived from the final path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub final_path: PathBuf,
    /// Appended base64 chunk text: `{FINAL}.b64.gz`.
    pub accumulator: PathBuf,
    /// Decoded gzip stream: `{FINAL}.gz`.
    pub compressed: PathBuf,
    staging: PathBuf,
}

impl ArtifactPaths {
    pub fn new(final_path: &Path) -> Self {
        let with_suffix = |suffix: &str| {
            let mut s = final_path.as_os_str().to_os_string();
            s.push(suffix);
            PathBuf::from(s)
        };
        Self {
            final_path: final_path.to_path_buf(),
            accumulator: with_suffix(".b64.gz"),
            compressed: with_suffix(".gz"),
            staging: with_suffix(".partial"),
        }
    }
}

pub struct Reconstructor<'a> {
    store: &'a dyn SecretStore,
    applier: &'a dyn Applier,
    prefix: String,
    count: u32,
    paths: ArtifactPaths,
    cleanup: CleanupMode,
}

impl<'a> Reconstructor<'a> {
    pub fn new(
        store: &'a dyn SecretStore,
        applier: &'a dyn Applier,
        prefix: &str,
        count: u32,
        final_path: &Path,
    ) -> Self {
        Self {
            store,
            applier,
            prefix: prefix.trim_end_matches('/').to_string(),
            count,
            paths: ArtifactPaths::new(final_path),
            cleanup: CleanupMode::BeforeDecode,
        }
    }

    pub fn with_cleanup(mut self, mode: CleanupMode) -> Self {
        self.cleanup = mode;
        self
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Drive the state machine to a terminal state.
    pub fn run(&self) -> Result<Outcome, ReconstructFailure> {
        let mut state = State::Check;
        let mut failure: Option<SealbootError> = None;
        let mut applied = false;

        loop {
            tracing::debug!("reconstruct state: {state:?}");
            state = match state {
                State::Check => self.check(&mut failure),
                State::Fetch(index) if index >= self.count => match self.cleanup {
                    CleanupMode::BeforeDecode => State::Cleanup,
                    CleanupMode::AfterApply => State::Decode,
                },
                State::Fetch(index) => match self.fetch(index) {
                    Ok(()) => State::Fetch(index + 1),
                    Err(e) => {
                        tracing::error!("failed to fetch chunk {index}: {e}");
                        failure = Some(e);
                        State::Cleanup
                    }
                },
                State::Cleanup => {
                    self.delete_chunks();
                    if failure.is_some() {
                        State::Fail(FailureKind::Fetch)
                    } else if applied {
                        State::Done(Outcome::Applied)
                    } else {
                        State::Decode
                    }
                }
                State::Decode => match self.decode() {
                    Ok(()) => State::Apply,
                    Err((kind, e)) => {
                        tracing::error!("{kind} failed: {e}");
                        failure = Some(e);
                        State::Fail(kind)
                    }
                },
                State::Apply => match self.applier.apply(&self.paths.final_path) {
                    Ok(()) => {
                        applied = true;
                        match self.cleanup {
                            CleanupMode::BeforeDecode => State::Done(Outcome::Applied),
                            CleanupMode::AfterApply => State::Cleanup,
                        }
                    }
                    Err(e) => {
                        tracing::error!("apply failed: {e}");
                        if self.cleanup == CleanupMode::AfterApply {
                            self.unpublish();
                        }
                        failure = Some(e);
                        State::Fail(FailureKind::Apply)
                    }
                },
                State::Done(outcome) => {
                    tracing::info!("bootstrap data ready at {}", self.paths.final_path.display());
                    return Ok(outcome);
                }
                State::Fail(kind) => {
                    let error = failure
                        .take()
                        .unwrap_or_else(|| SealbootError::Config("unknown failure".into()));
                    return Err(ReconstructFailure { kind, error });
                }
            };
        }
    }

    fn check(&self, failure: &mut Option<SealbootError>) -> State {
        if self.paths.final_path.exists() {
            tracing::info!(
                "{} already exists; skipping fetch",
                self.paths.final_path.display()
            );
            return State::Done(Outcome::AlreadyPresent);
        }
        if self.count == 0 {
            *failure = Some(SealbootError::Config(format!(
                "chunk count for '{}' must be at least 1",
                self.prefix
            )));
            return State::Fail(FailureKind::Usage);
        }
        // A previous interrupted boot may have left partial text behind.
        if let Err(e) = create_private(&self.paths.accumulator, false) {
            *failure = Some(e.into());
            return State::Fail(FailureKind::Fetch);
        }
        tracing::info!("fetching {} chunk(s) from {}", self.count, self.prefix);
        State::Fetch(0)
    }

    fn fetch(&self, index: u32) -> Result<(), SealbootError> {
        let name = chunk_name(&self.prefix, index);
        tracing::info!("fetching chunk {}/{} ({name})", index + 1, self.count);
        let value = self.store.get(&name, true)?;
        let mut acc = create_private(&self.paths.accumulator, true)?;
        acc.write_all(value.trim().as_bytes())?;
        Ok(())
    }

    /// Best-effort removal of every chunk; failures are logged, not fatal.
    fn delete_chunks(&self) {
        tracing::info!("deleting {} chunk(s) under {}", self.count, self.prefix);
        if let Err(e) = crate::deleter::delete_chunks(self.store, &self.prefix, self.count) {
            tracing::warn!("chunk cleanup incomplete: {e}");
        }
    }

    /// Remove the final artifact so the next boot's Check does not skip the
    /// chunks that are still in the store.
    fn unpublish(&self) {
        match remove_if_exists(&self.paths.final_path) {
            Ok(()) => tracing::info!(
                "removed {}; chunks kept for the next boot",
                self.paths.final_path.display()
            ),
            Err(e) => tracing::warn!(
                "failed to remove {}: {e}",
                self.paths.final_path.display()
            ),
        }
    }

    fn decode(&self) -> Result<(), (FailureKind, SealbootError)> {
        let paths = &self.paths;
        codec::decode_file(&paths.accumulator, &paths.compressed)
            .map_err(|e| (FailureKind::Decode, e))?;
        if let Err(e) = codec::gunzip_file(&paths.compressed, &paths.staging) {
            let _ = remove_if_exists(&paths.staging);
            return Err((FailureKind::Decompress, e));
        }
        std::fs::rename(&paths.staging, &paths.final_path)
            .map_err(|e| (FailureKind::Decompress, e.into()))?;

        for path in [&paths.accumulator, &paths.compressed] {
            if let Err(e) = remove_if_exists(path) {
                tracing::warn!("failed to remove {}: {e}", path.display());
            }
        }
        tracing::info!("decoded bootstrap data into {}", paths.final_path.display());
        Ok(())
    }
}

/// Build a [`Reconstructor`] from configuration and run it with a
/// [`CommandApplier`].
pub fn run_from_config(
    store: &dyn SecretStore,
    config: &ReconstructConfig,
    prefix: &str,
    count: u32,
) -> Result<Outcome, ReconstructFailure> {
    let applier = CommandApplier::new(&config.apply_command, config.apply_timeout());
    Reconstructor::new(store, &applier, prefix, count, &config.final_path())
        .with_cleanup(config.cleanup)
        .run()
}
