//! Translog deletion policy.
//!
//! Decides the lowest translog generation that must be kept. The storage layer
//! deletes every sealed generation strictly below that floor; the active writer
//! is never deleted.
//!
//! The floor combines:
//! - retention caps (size, age, file count), where the most aggressive enabled
//!   cap wins (`max` of their floors)
//! - generation leases and the recovery generation of the last commit, which
//!   can only pull the floor further back (`min`)
//!
//! ```text
//! floor = min(leases, recovery, max(by_size, by_age, by_total_files), writer)
//! ```

use std::sync::atomic::AtomicI32;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::trace;

use super::GenerationLeases;
use super::LogSegment;
use super::TranslogGenLease;
use crate::config::age_limit;
use crate::config::size_limit;
use crate::config::total_files_limit;
use crate::config::RetentionConfig;
use crate::constants::DEFAULT_METRICS_LABEL;
use crate::metrics::TRANSLOG_MIN_GEN_REQUIRED;
use crate::utils::time::Clock;
use crate::utils::time::SystemClock;
use crate::Result;
use crate::TranslogError;

/// Sentinel for "no generation recorded yet".
const UNSET_GENERATION: u64 = u64::MAX;

/// Snapshot of the retention thresholds taken at the start of a computation.
///
/// Each field is read independently; a concurrent settings update may be
/// observed partially, which is fine since every computation starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionThresholds {
    pub size_in_bytes: Option<u64>,
    pub age: Option<Duration>,
    pub total_files: Option<u32>,
}

pub struct TranslogDeletionPolicy {
    retention_size_in_bytes: AtomicI64,
    retention_age_in_millis: AtomicI64,
    retention_total_files: AtomicI32,

    /// Oldest generation needed to recover from the last commit
    min_translog_generation_for_recovery: AtomicU64,
    translog_generation_of_last_commit: AtomicU64,

    leases: Arc<GenerationLeases>,
    clock: Arc<dyn Clock>,
    /// Label value of this policy's series in `TRANSLOG_MIN_GEN_REQUIRED`
    metrics_label: String,
}

impl std::fmt::Debug for TranslogDeletionPolicy {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TranslogDeletionPolicy")
            .field("thresholds", &self.thresholds())
            .field("leases", &self.leases)
            .field("metrics_label", &self.metrics_label)
            .finish()
    }
}

impl TranslogDeletionPolicy {
    /// Creates a policy using the legacy `-1 disables` threshold encoding.
    ///
    /// `current_generation` is the generation of the translog's writer when the
    /// policy is opened; leases up to it are accepted right away.
    pub fn new(
        retention_size_in_bytes: i64,
        retention_age_in_millis: i64,
        retention_total_files: i32,
        current_generation: u64,
    ) -> Self {
        Self::with_clock(
            retention_size_in_bytes,
            retention_age_in_millis,
            retention_total_files,
            current_generation,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        retention_size_in_bytes: i64,
        retention_age_in_millis: i64,
        retention_total_files: i32,
        current_generation: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            retention_size_in_bytes: AtomicI64::new(retention_size_in_bytes),
            retention_age_in_millis: AtomicI64::new(retention_age_in_millis),
            retention_total_files: AtomicI32::new(retention_total_files),
            min_translog_generation_for_recovery: AtomicU64::new(UNSET_GENERATION),
            translog_generation_of_last_commit: AtomicU64::new(UNSET_GENERATION),
            leases: Arc::new(GenerationLeases::new(current_generation)),
            clock,
            metrics_label: DEFAULT_METRICS_LABEL.to_string(),
        }
    }

    pub fn from_config(
        config: &RetentionConfig,
        current_generation: u64,
    ) -> Self {
        Self::new(
            config.size_in_bytes,
            config.age_in_ms,
            config.total_files,
            current_generation,
        )
    }

    /// Reports this policy's floor under `label` (e.g. a shard id) so that
    /// several translogs in one process don't overwrite each other's gauge.
    pub fn with_metrics_label(
        mut self,
        label: impl Into<String>,
    ) -> Self {
        self.metrics_label = label.into();
        self
    }

    pub fn metrics_label(&self) -> &str {
        &self.metrics_label
    }

    //---
    // Dynamic settings

    pub fn set_retention_size_in_bytes(
        &self,
        bytes: i64,
    ) {
        debug!("translog retention size set to {}", bytes);
        self.retention_size_in_bytes.store(bytes, Ordering::Release);
    }

    pub fn set_retention_age_in_millis(
        &self,
        age_in_millis: i64,
    ) {
        debug!("translog retention age set to {}ms", age_in_millis);
        self.retention_age_in_millis.store(age_in_millis, Ordering::Release);
    }

    pub fn set_retention_total_files(
        &self,
        total_files: i32,
    ) {
        debug!("translog retention total files set to {}", total_files);
        self.retention_total_files.store(total_files, Ordering::Release);
    }

    /// Settings-update listener: applies every threshold of `config`.
    pub fn apply_retention_config(
        &self,
        config: &RetentionConfig,
    ) {
        self.set_retention_size_in_bytes(config.size_in_bytes);
        self.set_retention_age_in_millis(config.age_in_ms);
        self.set_retention_total_files(config.total_files);
    }

    pub fn thresholds(&self) -> RetentionThresholds {
        RetentionThresholds {
            size_in_bytes: size_limit(self.retention_size_in_bytes.load(Ordering::Acquire)),
            age: age_limit(self.retention_age_in_millis.load(Ordering::Acquire)),
            total_files: total_files_limit(self.retention_total_files.load(Ordering::Acquire)),
        }
    }

    //---
    // Commit bookkeeping

    /// Records the oldest generation needed to recover from the latest commit.
    ///
    /// # Errors
    /// - `RecoveryGenerationRegression` if the generation moves backwards
    /// - `RecoveryAheadOfLastCommit` if it is newer than the last commit's generation
    pub fn set_min_translog_generation_for_recovery(
        &self,
        generation: u64,
    ) -> Result<()> {
        let last_commit = self.translog_generation_of_last_commit.load(Ordering::Acquire);
        if last_commit != UNSET_GENERATION && generation > last_commit {
            return Err(TranslogError::RecoveryAheadOfLastCommit {
                recovery: generation,
                last_commit,
            }
            .into());
        }

        self.min_translog_generation_for_recovery
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current == UNSET_GENERATION || generation >= current).then_some(generation)
            })
            .map_err(|current| TranslogError::RecoveryGenerationRegression {
                current,
                requested: generation,
            })?;
        debug!("min translog generation for recovery: {}", generation);
        Ok(())
    }

    pub fn min_translog_generation_for_recovery(&self) -> Option<u64> {
        loaded(&self.min_translog_generation_for_recovery)
    }

    /// Records the translog generation referenced by the latest commit.
    pub fn set_translog_generation_of_last_commit(
        &self,
        generation: u64,
    ) -> Result<()> {
        self.translog_generation_of_last_commit
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current == UNSET_GENERATION || generation >= current).then_some(generation)
            })
            .map_err(|current| TranslogError::LastCommitGenerationRegression {
                current,
                requested: generation,
            })?;
        Ok(())
    }

    pub fn translog_generation_of_last_commit(&self) -> Option<u64> {
        loaded(&self.translog_generation_of_last_commit)
    }

    //---
    // Leases

    /// Pins `generation` and all newer generations until the lease is dropped.
    pub fn acquire_translog_gen(
        &self,
        generation: u64,
    ) -> Result<TranslogGenLease> {
        self.leases.acquire(generation)
    }

    /// Tells the policy a new writer generation was rolled.
    pub fn on_new_generation(
        &self,
        generation: u64,
    ) {
        self.leases.observe_generation(generation);
    }

    pub fn min_generation_required_by_leases(&self) -> Option<u64> {
        self.leases.min_generation()
    }

    pub fn translog_ref_count(
        &self,
        generation: u64,
    ) -> usize {
        self.leases.ref_count(generation)
    }

    pub fn pending_translog_ref_count(&self) -> usize {
        self.leases.pending_ref_count()
    }

    //---
    // Floor computation

    /// Lowest generation that must be retained. `readers` must be sorted by
    /// ascending generation, all older than `writer`.
    pub fn min_translog_gen_required<R: LogSegment, W: LogSegment>(
        &self,
        readers: &[R],
        writer: &W,
    ) -> u64 {
        debug_assert!(
            readers.windows(2).all(|w| w[0].generation() < w[1].generation()),
            "translog readers must be ordered by generation"
        );
        debug_assert!(readers.last().map_or(true, |r| r.generation() < writer.generation()));

        let writer_gen = writer.generation();
        self.leases.observe_generation(writer_gen);

        let thresholds = self.thresholds();
        let now = self.clock.now_millis();

        let by_size = thresholds.size_in_bytes.map(|b| min_gen_by_size(readers, writer, b));
        let by_age = thresholds.age.map(|a| min_gen_by_age(readers, writer, a, now));
        let by_total_files = thresholds.total_files.map(|n| min_gen_by_total_files(readers, writer, n));
        let by_retention = [by_size, by_age, by_total_files]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(writer_gen);

        let by_leases = self.leases.min_generation().unwrap_or(u64::MAX);
        let by_recovery = self.min_translog_generation_for_recovery.load(Ordering::Acquire);

        let floor = by_retention.min(by_leases).min(by_recovery).min(writer_gen);
        trace!(
            ?by_size,
            ?by_age,
            ?by_total_files,
            by_leases,
            by_recovery,
            floor,
            "min translog generation required"
        );
        TRANSLOG_MIN_GEN_REQUIRED
            .with_label_values(&[self.metrics_label.as_str()])
            .set(i64::try_from(floor).unwrap_or(i64::MAX));
        floor
    }

    /// Oldest readers that may be deleted: those strictly below the floor.
    pub fn deletable_readers<'a, R: LogSegment, W: LogSegment>(
        &self,
        readers: &'a [R],
        writer: &W,
    ) -> &'a [R] {
        let floor = self.min_translog_gen_required(readers, writer);
        let end = readers.partition_point(|r| r.generation() < floor);
        if end > 0 {
            debug!(
                "{} translog generation(s) below {} are deletable",
                end, floor
            );
        }
        &readers[..end]
    }
}

fn loaded(generation: &AtomicU64) -> Option<u64> {
    match generation.load(Ordering::Acquire) {
        UNSET_GENERATION => None,
        g => Some(g),
    }
}

/// Walks from the writer towards older readers, keeping segments while the
/// accumulated size stays within `retention_size_in_bytes`.
///
/// The writer is always kept, even when it alone exceeds the budget.
pub(crate) fn min_gen_by_size<R: LogSegment, W: LogSegment>(
    readers: &[R],
    writer: &W,
    retention_size_in_bytes: u64,
) -> u64 {
    let mut total_size = writer.size_in_bytes();
    let mut min_gen = writer.generation();
    for reader in readers.iter().rev() {
        total_size = total_size.saturating_add(reader.size_in_bytes());
        if total_size > retention_size_in_bytes {
            break;
        }
        min_gen = reader.generation();
    }
    min_gen
}

/// Generation of the oldest segment not older than `max_age` at `now`.
pub(crate) fn min_gen_by_age<R: LogSegment, W: LogSegment>(
    readers: &[R],
    writer: &W,
    max_age: Duration,
    now: u64,
) -> u64 {
    let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
    readers
        .iter()
        .find(|r| now.saturating_sub(r.last_modified_time()) <= max_age_ms)
        .map(|r| r.generation())
        .unwrap_or_else(|| writer.generation())
}

/// Keeps at most `max_total_files` newest segments; the writer counts as one
/// and is kept even when `max_total_files` is 0.
pub(crate) fn min_gen_by_total_files<R: LogSegment, W: LogSegment>(
    readers: &[R],
    writer: &W,
    max_total_files: u32,
) -> u64 {
    let kept_readers = (max_total_files as usize).saturating_sub(1).min(readers.len());
    readers[readers.len() - kept_readers..]
        .first()
        .map(|r| r.generation())
        .unwrap_or_else(|| writer.generation())
}
