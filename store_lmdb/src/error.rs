use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted entry for key '{0}'")]
    Corrupted(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for powrace_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Corrupted(key) => powrace_store::StoreError::Corruption(key),
            other => powrace_store::StoreError::Backend(other.to_string()),
        }
    }
}
