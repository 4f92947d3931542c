//! Reference-counted translog generation leases.
//!
//! A lease (historically a "view") is an external consumer's claim that a
//! generation and every newer one must stay on disk, e.g. a peer recovery
//! replaying operations from generation `n` onwards.
//!
//! Leases are handed out as [`TranslogGenLease`] guards (RAII mode): the
//! reference is released when the guard is dropped, so a consumer that
//! returns early, fails or panics can't leak its pin. Releasing twice is
//! impossible because releasing consumes the guard.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

use crate::metrics::TRANSLOG_GEN_LEASES;
use crate::metrics::TRANSLOG_LEASE_REJECTED;
use crate::LeaseError;
use crate::Result;

/// Registry of outstanding generation leases.
///
/// The table and the newest-generation bound share one lock so that
/// acquire, release and the floor query are linearizable.
#[derive(Debug, Default)]
pub struct GenerationLeases {
    inner: Mutex<LeaseTable>,
}

#[derive(Debug, Default)]
struct LeaseTable {
    /// generation -> number of outstanding leases
    ref_counts: BTreeMap<u64, usize>,
    /// Newest generation known to exist; upper bound for new leases
    newest_generation: u64,
}

impl GenerationLeases {
    pub fn new(newest_generation: u64) -> Self {
        Self {
            inner: Mutex::new(LeaseTable {
                ref_counts: BTreeMap::new(),
                newest_generation,
            }),
        }
    }

    /// Pins `generation` and everything newer until the returned guard is dropped.
    ///
    /// # Errors
    /// `LeaseError::GenerationAhead` if `generation` is newer than the newest
    /// generation the registry has observed. Nothing is recorded in that case.
    pub fn acquire(
        self: &Arc<Self>,
        generation: u64,
    ) -> Result<TranslogGenLease> {
        let mut table = self.inner.lock();
        if generation > table.newest_generation {
            TRANSLOG_LEASE_REJECTED.inc();
            warn!(
                "rejecting lease on translog generation {}, newest is {}",
                generation, table.newest_generation
            );
            return Err(LeaseError::GenerationAhead {
                requested: generation,
                newest: table.newest_generation,
            }
            .into());
        }

        let count = table.ref_counts.entry(generation).or_insert(0);
        *count += 1;
        debug!("acquired translog generation {} (refs: {})", generation, count);
        TRANSLOG_GEN_LEASES.inc();

        Ok(TranslogGenLease {
            registry: Arc::clone(self),
            generation,
        })
    }

    fn release(
        &self,
        generation: u64,
    ) {
        let mut table = self.inner.lock();
        debug_assert!(
            table.ref_counts.contains_key(&generation),
            "released translog generation {generation} was never acquired"
        );
        let Some(count) = table.ref_counts.get_mut(&generation) else {
            return;
        };
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            table.ref_counts.remove(&generation);
        }
        debug!(
            "released translog generation {} (refs: {})",
            generation, remaining
        );
        TRANSLOG_GEN_LEASES.dec();
    }

    /// Minimum generation pinned by any outstanding lease, `None` when no lease is held.
    pub fn min_generation(&self) -> Option<u64> {
        self.inner.lock().ref_counts.keys().next().copied()
    }

    /// Raises the newest known generation; lower values are ignored.
    pub fn observe_generation(
        &self,
        generation: u64,
    ) {
        let mut table = self.inner.lock();
        if generation > table.newest_generation {
            table.newest_generation = generation;
        }
    }

    pub fn newest_generation(&self) -> u64 {
        self.inner.lock().newest_generation
    }

    /// Outstanding leases on exactly `generation`.
    pub fn ref_count(
        &self,
        generation: u64,
    ) -> usize {
        self.inner.lock().ref_counts.get(&generation).copied().unwrap_or(0)
    }

    /// Number of distinct generations currently pinned.
    pub fn pending_ref_count(&self) -> usize {
        self.inner.lock().ref_counts.len()
    }
}

/// Scoped pin on a translog generation. Dropping it releases the pin.
#[must_use = "dropping the lease releases the pinned generation immediately"]
pub struct TranslogGenLease {
    registry: Arc<GenerationLeases>,
    generation: u64,
}

impl TranslogGenLease {
    /// The pinned generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Releases the pin. Equivalent to dropping the guard.
    pub fn release(self) {}
}

impl fmt::Debug for TranslogGenLease {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TranslogGenLease")
            .field("generation", &self.generation)
            .finish()
    }
}

impl Drop for TranslogGenLease {
    fn drop(&mut self) {
        self.registry.release(self.generation);
    }
}
