use std::sync::Arc;

use crate::utils::time::MockClock;
use crate::TranslogDeletionPolicy;
use crate::TranslogReader;
use crate::TranslogWriter;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = env_logger::builder().is_test(true).try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Clock pinned at `now` milliseconds.
pub fn pinned_clock(now: u64) -> Arc<MockClock> {
    let mut clock = MockClock::new();
    clock.expect_now_millis().return_const(now);
    Arc::new(clock)
}

/// Builds a translog from `(size_in_bytes, last_modified_time)` pairs, one per
/// generation starting at 1. The last pair becomes the active writer.
pub fn build_translog(segments: &[(u64, u64)]) -> (Vec<TranslogReader>, TranslogWriter) {
    assert!(!segments.is_empty(), "a translog always has a writer");
    let (sealed, active) = segments.split_at(segments.len() - 1);

    let readers = sealed
        .iter()
        .enumerate()
        .map(|(i, &(size, modified))| TranslogReader::new(i as u64 + 1, size, modified))
        .collect();

    let (size, modified) = active[0];
    let writer = TranslogWriter::new(segments.len() as u64, modified);
    writer.record_append(size, modified);

    (readers, writer)
}

/// Policy with the legacy threshold encoding and a pinned clock, opened over
/// an empty translog.
pub fn policy_at(
    now: u64,
    retention_size_in_bytes: i64,
    retention_age_in_millis: i64,
    retention_total_files: i32,
) -> TranslogDeletionPolicy {
    TranslogDeletionPolicy::with_clock(
        retention_size_in_bytes,
        retention_age_in_millis,
        retention_total_files,
        0,
        pinned_clock(now),
    )
}
