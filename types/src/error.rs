use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid block hash: {0}")]
    InvalidHash(String),

    #[error("invalid difficulty: {0}")]
    InvalidDifficulty(String),

    #[error("invalid work value: {0}")]
    InvalidWork(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
