//! Translog generation retention.
//!
//! Decides which generations of the write-ahead log may be deleted. The
//! storage layer owns the files; this module only sees their metadata and
//! the leases held by recovery, snapshot and peer-recovery consumers.

mod deletion_policy;
mod generation_leases;
mod segment;
pub use deletion_policy::*;
pub use generation_leases::*;
pub use segment::*;
