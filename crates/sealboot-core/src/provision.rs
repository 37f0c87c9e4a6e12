//! Orchestrator-facing glue: write a machine's bootstrap document, launch
//! the instance with a stub, and clean up on teardown.

use sealboot_store::{SecretStore, Tags};

use crate::codec;
use crate::config::SealbootConfig;
use crate::deleter::delete_chunks;
use crate::error::{Result, SealbootError};
use crate::stub::{StubParams, render_stub};
use crate::tags::MachineIdentity;
use crate::writer::{ChunkWriter, RetryPolicy};

/// What the orchestrator tracks for one machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineRecord {
    pub name: String,
    pub cluster: String,
    pub role: String,
    pub additional_tags: Tags,
    /// Uncompressed bootstrap document.
    pub payload: Vec<u8>,
    pub secret_prefix: Option<String>,
    pub secret_count: u32,
}

impl MachineRecord {
    pub fn new(name: &str, cluster: &str, role: &str, payload: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            cluster: cluster.to_string(),
            role: role.to_string(),
            payload,
            ..Self::default()
        }
    }

    pub fn identity(&self) -> MachineIdentity {
        MachineIdentity {
            cluster: self.cluster.clone(),
            machine: self.name.clone(),
            role: self.role.clone(),
            additional: self.additional_tags.clone(),
        }
    }
}

/// Creates a compute instance whose launch metadata is `stub`.
pub trait InstanceLauncher {
    fn launch(&self, machine_name: &str, stub: &str) -> Result<()>;
}

pub struct Provisioner<'a> {
    store: &'a dyn SecretStore,
    config: &'a SealbootConfig,
    policy: RetryPolicy,
}

impl<'a> Provisioner<'a> {
    pub fn new(store: &'a dyn SecretStore, config: &'a SealbootConfig) -> Self {
        Self {
            store,
            config,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Store the machine's payload and launch it with a bootstrap stub.
    ///
    /// The prefix and count are recorded on `machine` as soon as any chunk
    /// is committed, even if the write then fails, so [`teardown`] can
    /// remove exactly what was written.
    ///
    /// [`teardown`]: Provisioner::teardown
    pub fn provision(
        &self,
        machine: &mut MachineRecord,
        launcher: &dyn InstanceLauncher,
    ) -> Result<()> {
        let compressed = codec::gzip(&machine.payload)?;
        let writer = ChunkWriter::new(self.store, &self.config.writer, &self.config.retry)
            .with_policy(self.policy.clone());

        let receipt = match writer.write(
            &machine.identity(),
            &compressed,
            machine.secret_prefix.as_deref(),
        ) {
            Ok(receipt) => receipt,
            Err(err) => {
                if let SealbootError::PartialWrite {
                    prefix, committed, ..
                } = &err
                {
                    if *committed > 0 {
                        record(machine, prefix, *committed);
                    }
                }
                return Err(err);
            }
        };
        record(machine, &receipt.prefix, receipt.committed);

        let stub = render_stub(&StubParams {
            region: self.config.store.region.clone(),
            endpoint: self.config.store.endpoint.clone(),
            prefix: receipt.prefix.clone(),
            chunks: receipt.committed,
            binary: self.config.reconstruct.binary.clone(),
            final_path: self.config.reconstruct.final_path.clone(),
        })?;

        tracing::info!(
            "launching machine '{}' with {} chunk(s) under {}",
            machine.name,
            receipt.committed,
            receipt.prefix
        );
        launcher.launch(&machine.name, &stub)
    }

    /// Delete the machine's recorded chunks and forget them.
    ///
    /// The record is left untouched when deletion fails so the call can be
    /// repeated.
    pub fn teardown(&self, machine: &mut MachineRecord) -> Result<()> {
        let Some(prefix) = machine.secret_prefix.clone() else {
            tracing::debug!("machine '{}' has no stored bootstrap data", machine.name);
            return Ok(());
        };
        if machine.secret_count == 0 {
            return Err(SealbootError::MissingSecretCount(prefix));
        }

        delete_chunks(self.store, &prefix, machine.secret_count)?;
        machine.secret_prefix = None;
        machine.secret_count = 0;
        Ok(())
    }
}

// A rewrite under a reused prefix may be shorter than the previous one;
// keep the larger count so teardown still covers every chunk.
fn record(machine: &mut MachineRecord, prefix: &str, committed: u32) {
    let reused = machine.secret_prefix.as_deref() == Some(prefix);
    machine.secret_count = if reused {
        machine.secret_count.max(committed)
    } else {
        committed
    };
    machine.secret_prefix = Some(prefix.to_string());
}
