use std::sync::LazyLock;

/// Tokio runtime used by the async AWS SDK client to bridge into the
/// synchronous `SecretStore` call sites. Created lazily on first use.
pub(crate) static ASYNC_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime for secret store client")
});
