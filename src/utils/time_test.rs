use std::thread::sleep;
use std::time::Duration;

use super::time::*;

#[test]
fn test_timestamp_millis() {
    let t1 = timestamp_millis();
    sleep(Duration::from_millis(10));
    let t2 = timestamp_millis();

    // Ensure time is moving forward
    assert!(t2 > t1);
    // Should be a reasonable value (greater than 2021-01-01)
    assert!(t1 > 1_609_459_200_000);
}

#[test]
fn test_system_clock_tracks_timestamp_millis() {
    let clock = SystemClock;
    let before = timestamp_millis();
    let now = clock.now_millis();
    let after = timestamp_millis();

    assert!(before <= now && now <= after);
}

#[test]
fn test_mock_clock_returns_pinned_time() {
    let mut clock = MockClock::new();
    clock.expect_now_millis().return_const(42u64);

    assert_eq!(clock.now_millis(), 42);
}
