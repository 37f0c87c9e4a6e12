use sealboot_store::retry::retry_with_backoff;
use sealboot_store::{RetryConfig, SecretStore, StoreError};

use crate::codec;
use crate::config::WriterConfig;
use crate::error::{Result, SealbootError};
use crate::prefix::{chunk_name, generate_prefix, normalize_prefix};
use crate::tags::MachineIdentity;

/// Decides whether a failed put is worth retrying.
pub type RetryPredicate = fn(&StoreError) -> bool;

/// Closed set of predicates selecting which store errors the writer retries.
/// An error is retried when any predicate accepts it.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    predicates: Vec<RetryPredicate>,
}

impl RetryPolicy {
    pub fn new(predicates: Vec<RetryPredicate>) -> Self {
        Self { predicates }
    }

    /// Retry nothing; every error aborts the write.
    pub fn never() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_retryable(&self, err: &StoreError) -> bool {
        self.predicates.iter().any(|p| p(err))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(vec![StoreError::is_retryable])
    }
}

/// Where a payload was written and how many chunks made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub prefix: String,
    pub committed: u32,
}

/// Control-plane writer: encodes a compressed payload, splits it and stores
/// the chunks in order under one prefix.
pub struct ChunkWriter<'a> {
    store: &'a dyn SecretStore,
    config: WriterConfig,
    retry: RetryConfig,
    policy: RetryPolicy,
}

impl<'a> ChunkWriter<'a> {
    pub fn new(store: &'a dyn SecretStore, config: &WriterConfig, retry: &RetryConfig) -> Self {
        Self {
            store,
            config: config.clone(),
            retry: retry.clone(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Write `compressed` (already gzipped) as a chunk group.
    ///
    /// Reuses `prefix` when given, otherwise generates one under the
    /// configured namespace root. On failure the error is
    /// [`SealbootError::PartialWrite`] carrying the prefix and the number of
    /// chunks committed before the abort; nothing is cleaned up here.
    pub fn write(
        &self,
        identity: &MachineIdentity,
        compressed: &[u8],
        prefix: Option<&str>,
    ) -> Result<WriteReceipt> {
        self.config.validate()?;
        let prefix = match prefix {
            Some(p) => normalize_prefix(p)?,
            None => generate_prefix(&self.config.namespace_root)?,
        };
        if compressed.is_empty() {
            return Err(SealbootError::EmptyPayload);
        }

        let encoded = codec::encode(compressed);
        let chunks = codec::split_chunks(&encoded, self.config.max_chunk_chars);
        let total = u32::try_from(chunks.len()).map_err(|_| {
            SealbootError::Config(format!("payload needs {} chunks", chunks.len()))
        })?;
        let tags = identity.tags();

        tracing::info!(
            "writing {total} chunk(s) ({} encoded chars) for machine '{}' under {prefix}",
            encoded.len(),
            identity.machine,
        );

        for (index, chunk) in (0..total).zip(chunks.iter()) {
            let name = chunk_name(&prefix, index);
            let put = retry_with_backoff(
                &self.retry,
                &format!("put {name}"),
                |e| self.policy.is_retryable(e),
                || self.store.put(&name, chunk, &tags, self.config.secure),
            );
            if let Err(source) = put {
                tracing::error!("aborting write under {prefix} at chunk {index}/{total}: {source}");
                return Err(SealbootError::PartialWrite {
                    prefix,
                    committed: index,
                    source,
                });
            }
            tracing::debug!("committed {name} ({} chars)", chunk.len());
        }

        Ok(WriteReceipt {
            prefix,
            committed: total,
        })
    }
}
