// Notification events for the sound sink
// The core emits these and never depends on whether a sink exists or succeeds.

use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    MessageReceived,
    ContactOnline,
    ContactOffline,
    Nudge,
    Login,
    Logout,
}

impl NotificationEvent {
    /// Display name of the sound bound to this event.
    pub fn sound_name(self) -> &'static str {
        match self {
            NotificationEvent::MessageReceived => "Nuevo mensaje",
            NotificationEvent::ContactOnline => "Contacto conectado",
            NotificationEvent::ContactOffline => "Contacto desconectado",
            NotificationEvent::Nudge => "Zumbido",
            NotificationEvent::Login => "Inicio de sesión",
            NotificationEvent::Logout => "Cerrar sesión",
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: NotificationEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl NotificationSink for SilentSink {
    fn notify(&self, _event: NotificationEvent) {}
}

/// Writes each event to the debug log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, event: NotificationEvent) {
        debug!("Notification: {:?} ({})", event, event.sound_name());
    }
}

/// Keeps every event it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: NotificationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_sinks_behind_the_trait() {
        let recording = Arc::new(RecordingSink::new());
        let sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(SilentSink), Arc::new(LogSink), recording.clone()];
        for sink in &sinks {
            sink.notify(NotificationEvent::Login);
            sink.notify(NotificationEvent::Nudge);
        }
        assert_eq!(recording.events(), vec![NotificationEvent::Login, NotificationEvent::Nudge]);
    }

    #[test]
    fn test_sound_names() {
        assert_eq!(NotificationEvent::Nudge.sound_name(), "Zumbido");
        assert_eq!(NotificationEvent::MessageReceived.sound_name(), "Nuevo mensaje");
    }
}
