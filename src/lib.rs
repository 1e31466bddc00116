// Retro messenger simulation core
// Contacts with drifting presence, chat windows, emoticons and a simulated
// remote party that types back.

pub mod auth;
pub mod clock;
pub mod config;
pub mod conversation;
pub mod emoticons;
pub mod events;
pub mod messenger;
pub mod models;
pub mod notifications;
pub mod presence;
pub mod random;
pub mod roster;
pub mod scheduler;
pub mod storage;
pub mod utils;
pub mod windows;

// Re-export main types for convenience
pub use auth::AuthError;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use events::MessengerEvent;
pub use messenger::Messenger;
pub use models::*;
pub use notifications::{NotificationEvent, NotificationSink};
pub use random::{DelayRange, RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
