use thiserror::Error;

/// Errors raised while assembling or running the work service.
///
/// The race itself never fails; these only surface from construction,
/// configuration and metrics rendering.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] powrace_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] powrace_store_lmdb::LmdbError),

    #[error("peer client error: {0}")]
    Peer(#[from] powrace_peers::PeerError),

    #[error("distributed work error: {0}")]
    Dpow(#[from] powrace_dpow::DpowError),

    #[error("local work error: {0}")]
    Work(#[from] powrace_work::WorkError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
