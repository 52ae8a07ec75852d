use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("work difficulty {actual:016x} below minimum {minimum:016x}")]
    InsufficientDifficulty { actual: u64, minimum: u64 },

    #[error("nonce space exhausted without a solution")]
    Exhausted,

    #[error("worker pool error: {0}")]
    Pool(String),
}
