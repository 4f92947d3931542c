//! Translog Retention Error Hierarchy
//!
//! Defines the error types surfaced by the deletion policy, categorized by the
//! subsystem that rejected the request.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generation lease requests rejected by the registry
    #[error(transparent)]
    Lease(#[from] LeaseError),

    /// Translog bookkeeping violations (recovery/commit generations)
    #[error(transparent)]
    Translog(#[from] TranslogError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LeaseError {
    /// The requested generation has not been created yet
    #[error("Cannot pin translog generation {requested}: newest known generation is {newest}")]
    GenerationAhead { requested: u64, newest: u64 },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TranslogError {
    /// Committed generation can't go backwards
    #[error("Min translog generation for recovery can't go backwards: {current} -> {requested}")]
    RecoveryGenerationRegression { current: u64, requested: u64 },

    #[error("Translog generation of last commit can't go backwards: {current} -> {requested}")]
    LastCommitGenerationRegression { current: u64, requested: u64 },

    /// Recovery must not require generations newer than the last commit
    #[error(
        "Min translog generation for recovery {recovery} is above the generation of last commit {last_commit}"
    )]
    RecoveryAheadOfLastCommit { recovery: u64, last_commit: u64 },
}
