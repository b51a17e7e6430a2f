use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use gympro_auth::ticker::{Repeating, SecondsCounter};

#[tokio::test(start_paused = true)]
async fn counter_counts_elapsed_seconds() {
    let counter = SecondsCounter::start();
    assert_eq!(counter.get(), 0);

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(counter.get(), 3);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_counter_stops_the_timer() {
    let counter = SecondsCounter::start();
    let reader = counter.reader();

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(reader.get(), 3);

    drop(counter);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(reader.get(), 3);
}

#[tokio::test(start_paused = true)]
async fn first_call_waits_one_period() {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&calls);
    let timer = Repeating::spawn(Duration::from_millis(250), move || {
        seen.fetch_add(1, Ordering::Relaxed);
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::Relaxed), 0);

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(calls.load(Ordering::Relaxed), 4);
    assert!(timer.is_running());
}
