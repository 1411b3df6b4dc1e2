use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use chrono::{TimeZone, Utc};

use crate::{config::Config, http_server::AppState, services::clock::MockClock};

pub const TEST_NOW: i64 = 1_700_000_000;

/// App state whose clock reads from the returned counter, so tests can move time.
pub fn create_test_app_state() -> (AppState, Arc<AtomicI64>) {
    create_test_app_state_with(Config::for_tests())
}

pub fn create_test_app_state_with(config: Config) -> (AppState, Arc<AtomicI64>) {
    let now = Arc::new(AtomicI64::new(TEST_NOW));
    let clock_now = now.clone();

    let mut clock = MockClock::new();
    clock
        .expect_now()
        .returning(move || Utc.timestamp_opt(clock_now.load(Ordering::SeqCst), 0).unwrap());

    let state = AppState::new(config, Arc::new(clock)).expect("Failed to build test app state");
    (state, now)
}

pub fn advance(now: &AtomicI64, seconds: i64) {
    now.fetch_add(seconds, Ordering::SeqCst);
}
