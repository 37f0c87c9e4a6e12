use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sealboot_store::{MemoryStore, RetryConfig, SecretStore, StoreError, Tags};

use crate::error::{Result, SealbootError};
use crate::reconstruct::Applier;

/// Which operation a [`FlakyStore`] fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Put,
    Get,
    Delete,
}

/// How an injected fault fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Throttle,
    Denied,
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    op: Op,
    /// 1-based call number within `op` calls.
    call: usize,
    kind: FaultKind,
    /// Number of consecutive calls (starting at `call`) that fail.
    times: usize,
}

/// Wraps a [`MemoryStore`] and fails selected calls with classified errors.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    faults: Mutex<Vec<Fault>>,
    counters: Mutex<[usize; 3]>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `call`-th (1-based) `op` call once with `kind`.
    pub fn fail_nth(self, op: Op, call: usize, kind: FaultKind) -> Self {
        self.fail_nth_times(op, call, kind, 1)
    }

    pub fn fail_nth_times(self, op: Op, call: usize, kind: FaultKind, times: usize) -> Self {
        self.faults.lock().unwrap().push(Fault {
            op,
            call,
            kind,
            times,
        });
        self
    }

    fn check(&self, op: Op, name: &str) -> sealboot_store::Result<()> {
        let n = {
            let mut counters = self.counters.lock().unwrap();
            let slot = &mut counters[op as usize];
            *slot += 1;
            *slot
        };
        let faults = self.faults.lock().unwrap();
        let hit = faults
            .iter()
            .find(|f| f.op == op && n >= f.call && n < f.call + f.times);
        match hit.map(|f| f.kind) {
            None => Ok(()),
            Some(FaultKind::Throttle) => Err(StoreError::from_code(
                op_name(op),
                name,
                Some("ThrottlingException"),
                "Rate exceeded",
            )),
            Some(FaultKind::Denied) => Err(StoreError::from_code(
                op_name(op),
                name,
                Some("AccessDeniedException"),
                "not authorized",
            )),
        }
    }
}

fn op_name(op: Op) -> &'static str {
    match op {
        Op::Put => "put",
        Op::Get => "get",
        Op::Delete => "delete",
    }
}

impl SecretStore for FlakyStore {
    fn put(&self, name: &str, value: &str, tags: &Tags, secure: bool) -> sealboot_store::Result<()> {
        self.check(Op::Put, name)?;
        self.inner.put(name, value, tags, secure)
    }

    fn get(&self, name: &str, decrypt: bool) -> sealboot_store::Result<String> {
        self.check(Op::Get, name)?;
        self.inner.get(name, decrypt)
    }

    fn delete(&self, name: &str) -> sealboot_store::Result<()> {
        self.check(Op::Delete, name)?;
        self.inner.delete(name)
    }
}

/// Retry settings that never sleep.
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 5,
        retry_delay_ms: 0,
        retry_max_delay_ms: 0,
        max_elapsed_ms: 0,
    }
}

/// Applier that records the documents it was handed and optionally fails.
#[derive(Default)]
pub struct RecordingApplier {
    pub applied: RefCell<Vec<(PathBuf, Vec<u8>)>>,
    pub fail: bool,
}

impl RecordingApplier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.applied.borrow().len()
    }
}

impl Applier for RecordingApplier {
    fn apply(&self, document: &Path) -> Result<()> {
        let contents = std::fs::read(document)?;
        self.applied
            .borrow_mut()
            .push((document.to_path_buf(), contents));
        if self.fail {
            return Err(SealbootError::Apply("injected failure".into()));
        }
        Ok(())
    }
}

/// Deterministic pseudo-random bytes that gzip poorly, for multi-chunk payloads.
pub fn noisy_payload(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect()
}
