//! Metadata views over translog generations.
//!
//! The deletion policy never touches file contents; it only needs the
//! generation number, persisted size and last write time of every segment.
//! Sealed readers and the active writer expose the same surface through
//! [`LogSegment`] so the policy can walk them as one generation-ordered list.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait LogSegment {
    /// Generation number, unique within a translog and never reused
    fn generation(&self) -> u64;

    /// Bytes persisted for this generation at the time of the call
    fn size_in_bytes(&self) -> u64;

    /// Wall-clock time of the last write, in milliseconds since epoch
    fn last_modified_time(&self) -> u64;
}

/// A sealed, immutable translog generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslogReader {
    generation: u64,
    size_in_bytes: u64,
    last_modified_time: u64,
}

impl TranslogReader {
    pub fn new(
        generation: u64,
        size_in_bytes: u64,
        last_modified_time: u64,
    ) -> Self {
        Self {
            generation,
            size_in_bytes,
            last_modified_time,
        }
    }
}

impl LogSegment for TranslogReader {
    #[inline]
    fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    #[inline]
    fn last_modified_time(&self) -> u64 {
        self.last_modified_time
    }
}

/// The generation currently being appended to.
///
/// Size and last-modified time only move forward. Appends happen on the
/// storage layer's thread while the policy may read concurrently, so both
/// are atomics.
#[derive(Debug)]
pub struct TranslogWriter {
    generation: u64,
    size_in_bytes: AtomicU64,
    last_modified_time: AtomicU64,
}

impl TranslogWriter {
    pub fn new(
        generation: u64,
        created_at: u64,
    ) -> Self {
        Self {
            generation,
            size_in_bytes: AtomicU64::new(0),
            last_modified_time: AtomicU64::new(created_at),
        }
    }

    /// Records that `bytes` were persisted at `at_millis`.
    pub fn record_append(
        &self,
        bytes: u64,
        at_millis: u64,
    ) {
        self.size_in_bytes.fetch_add(bytes, Ordering::AcqRel);
        self.last_modified_time.fetch_max(at_millis, Ordering::AcqRel);
    }

    /// Freezes the writer's metadata into a read-only generation.
    pub fn seal(self) -> TranslogReader {
        TranslogReader::new(
            self.generation,
            self.size_in_bytes.into_inner(),
            self.last_modified_time.into_inner(),
        )
    }
}

impl LogSegment for TranslogWriter {
    #[inline]
    fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes.load(Ordering::Acquire)
    }

    #[inline]
    fn last_modified_time(&self) -> u64 {
        self.last_modified_time.load(Ordering::Acquire)
    }
}

impl<S: LogSegment + ?Sized> LogSegment for &S {
    fn generation(&self) -> u64 {
        (**self).generation()
    }

    fn size_in_bytes(&self) -> u64 {
        (**self).size_in_bytes()
    }

    fn last_modified_time(&self) -> u64 {
        (**self).last_modified_time()
    }
}

impl<S: LogSegment + ?Sized> LogSegment for std::sync::Arc<S> {
    fn generation(&self) -> u64 {
        (**self).generation()
    }

    fn size_in_bytes(&self) -> u64 {
        (**self).size_in_bytes()
    }

    fn last_modified_time(&self) -> u64 {
        (**self).last_modified_time()
    }
}
