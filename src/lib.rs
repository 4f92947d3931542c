//! # translog-retention
//!
//! Deletion policy for a generation-based write-ahead log (translog).
//!
//! The storage layer rolls the translog into numbered generations: sealed
//! readers plus one active writer. This crate decides the lowest generation
//! that must survive, balancing:
//!
//! - **Retention caps** - cumulative size, age of the oldest generation and
//!   number of files, each switchable at runtime
//! - **Generation leases** - recovery, snapshot and peer-recovery consumers
//!   pinning a generation and everything newer
//! - **Commit bookkeeping** - the generation needed to recover from the last
//!   commit
//!
//! Deleting files and appending operations stay with the storage layer.
//!
//! ```ignore
//! let config = TranslogConfig::new()?.validate()?;
//! let policy = TranslogDeletionPolicy::from_config(&config.retention, writer.generation());
//!
//! let lease = policy.acquire_translog_gen(start_gen)?; // pinned until dropped
//! let floor = policy.min_translog_gen_required(&readers, &writer);
//! for reader in policy.deletable_readers(&readers, &writer) { /* delete */ }
//! ```

mod config;
mod constants;
mod errors;
pub mod metrics;
mod translog;
pub mod utils;

pub use config::*;
pub use errors::*;
pub use translog::*;
pub use utils::time::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
