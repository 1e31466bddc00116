// Common test utilities for integration tests
// Builds messengers wired to in-memory storage, scripted randomness and a
// clock that follows tokio's (paused) time.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::{DateTime, TimeZone, Utc};
use log::LevelFilter;
use tokio::sync::mpsc::UnboundedReceiver;

use retro_messenger::auth::{DEMO_EMAIL, DEMO_PASSWORD};
use retro_messenger::notifications::RecordingSink;
use retro_messenger::{Clock, Config, KeyValueStore, MemoryStore, Messenger, MessengerEvent, ScriptedRandom};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

/// Wall time that advances with `tokio::time`, so paused tests get
/// timestamps matching their timers.
pub struct TokioClock {
    base: DateTime<Utc>,
    start: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        TokioClock {
            base: Utc.with_ymd_and_hms(2005, 6, 1, 18, 0, 0).unwrap(),
            start: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.start.elapsed()).unwrap();
        self.base + elapsed
    }
}

pub struct Harness {
    pub messenger: Messenger,
    pub events: UnboundedReceiver<MessengerEvent>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    /// Everything the messenger published since the last drain.
    pub fn drain(&mut self) -> Vec<MessengerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// A signed-out messenger over `store`, replaying `random` for every draw.
pub fn harness_with_store(store: Arc<dyn KeyValueStore>, random: &[f64]) -> Harness {
    setup_logging();
    let sink = Arc::new(RecordingSink::new());
    let (messenger, events) = Messenger::new(
        Config::default(),
        store,
        Arc::new(TokioClock::new()),
        Box::new(ScriptedRandom::new(random.to_vec())),
        sink.clone(),
    );
    Harness { messenger, events, sink }
}

pub fn harness(random: &[f64]) -> Harness {
    harness_with_store(Arc::new(MemoryStore::new()), random)
}

/// A messenger signed in with the demo account. Events from the login are
/// already drained.
pub async fn logged_in(store: Arc<dyn KeyValueStore>, random: &[f64]) -> Harness {
    let mut h = harness_with_store(store, random);
    h.messenger.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
    h.drain();
    h
}
