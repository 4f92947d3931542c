//! Drives the deletion policy the way a storage layer would: rolling
//! generations, trimming in the background and pinning generations for
//! recoveries running on other threads.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;
use translog_retention::Clock;
use translog_retention::LogSegment;
use translog_retention::RetentionConfig;
use translog_retention::TranslogDeletionPolicy;
use translog_retention::TranslogReader;
use translog_retention::TranslogWriter;

struct ManualClock(AtomicU64);

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

struct Translog {
    readers: Vec<TranslogReader>,
    writer: TranslogWriter,
}

impl Translog {
    fn new(now: u64) -> Self {
        Self {
            readers: Vec::new(),
            writer: TranslogWriter::new(1, now),
        }
    }

    fn roll(
        &mut self,
        policy: &TranslogDeletionPolicy,
        now: u64,
    ) {
        let next = TranslogWriter::new(self.writer.generation() + 1, now);
        let sealed = std::mem::replace(&mut self.writer, next);
        self.readers.push(sealed.seal());
        policy.on_new_generation(self.writer.generation());
    }

    fn trim(
        &mut self,
        policy: &TranslogDeletionPolicy,
    ) -> usize {
        let deletable = policy.deletable_readers(&self.readers, &self.writer).len();
        self.readers.drain(..deletable);
        deletable
    }
}

#[test]
fn rolling_and_trimming_honours_size_retention() {
    let clock = Arc::new(ManualClock(AtomicU64::new(1_000)));
    let policy = TranslogDeletionPolicy::with_clock(300, -1, -1, 1, clock.clone());
    let mut translog = Translog::new(1_000);

    for i in 0..10u64 {
        translog.writer.record_append(100, 1_000 + i);
        translog.roll(&policy, 1_000 + i);
    }
    // 10 sealed generations of 100 bytes, empty writer at generation 11
    assert_eq!(translog.trim(&policy), 7);
    let kept: Vec<_> = translog.readers.iter().map(|r| r.generation()).collect();
    assert_eq!(kept, vec![8, 9, 10]);

    // Dynamic settings update shrinks retention on the next pass
    policy.apply_retention_config(&RetentionConfig {
        size_in_bytes: 100,
        age_in_ms: -1,
        total_files: -1,
    });
    assert_eq!(translog.trim(&policy), 2);
    assert_eq!(translog.readers.len(), 1);
}

#[test]
fn recovery_lease_blocks_trimming_until_released() {
    let clock = Arc::new(ManualClock(AtomicU64::new(0)));
    let policy = TranslogDeletionPolicy::with_clock(0, 0, 0, 1, clock.clone());
    let mut translog = Translog::new(0);

    for _ in 0..4 {
        translog.writer.record_append(10, 0);
        translog.roll(&policy, 0);
    }

    let lease = policy.acquire_translog_gen(2).unwrap();
    assert_eq!(translog.trim(&policy), 1);
    assert_eq!(translog.readers[0].generation(), 2);

    drop(lease);
    assert_eq!(translog.trim(&policy), 3);
    assert!(translog.readers.is_empty());
    assert_eq!(policy.min_translog_gen_required(&translog.readers, &translog.writer), 5);
}

#[test]
fn age_retention_follows_the_clock() {
    let clock = Arc::new(ManualClock(AtomicU64::new(0)));
    let policy = TranslogDeletionPolicy::with_clock(-1, 1_000, -1, 1, clock.clone());
    let mut translog = Translog::new(0);

    for t in [0u64, 500, 1_000, 1_500] {
        translog.writer.record_append(1, t);
        translog.roll(&policy, t);
    }

    clock.0.store(1_500, Ordering::Release);
    // generations 2, 3 and 4 are within a second of "now"
    assert_eq!(translog.trim(&policy), 1);

    clock.0.store(10_000, Ordering::Release);
    assert_eq!(translog.trim(&policy), 3);
}

#[test]
fn concurrent_recoveries_never_lose_pinned_generations() {
    let clock = Arc::new(ManualClock(AtomicU64::new(0)));
    let policy = Arc::new(TranslogDeletionPolicy::with_clock(0, 0, 0, 1, clock));
    let translog = Arc::new(RwLock::new(Translog::new(0)));
    {
        let mut log = translog.write();
        for _ in 0..32 {
            log.writer.record_append(1, 0);
            log.roll(&policy, 0);
        }
    }

    let recoveries: Vec<_> = (0..4u64)
        .map(|i| {
            let policy = policy.clone();
            let translog = translog.clone();
            thread::spawn(move || {
                for round in 0..50u64 {
                    let log = translog.read();
                    let oldest = log.readers.first().map_or(log.writer.generation(), |r| r.generation());
                    let start = oldest + (i + round) % 3;
                    let start = start.min(log.writer.generation());
                    let lease = policy.acquire_translog_gen(start).unwrap();
                    drop(log);

                    // Every generation from `start` onwards must still be present
                    let log = translog.read();
                    let oldest = log.readers.first().map_or(log.writer.generation(), |r| r.generation());
                    assert!(oldest <= lease.generation());
                }
            })
        })
        .collect();

    let trimmer = {
        let policy = policy.clone();
        let translog = translog.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let mut log = translog.write();
                log.trim(&policy);
                log.writer.record_append(1, 0);
                log.roll(&policy, 0);
            }
        })
    };

    for r in recoveries {
        r.join().unwrap();
    }
    trimmer.join().unwrap();

    assert_eq!(policy.pending_translog_ref_count(), 0);
    let mut log = translog.write();
    log.trim(&policy);
    assert!(log.readers.is_empty());
}
