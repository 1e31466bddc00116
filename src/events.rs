// Observer events published by a running session

use crate::models::{ContactStatus, Message};

#[derive(Debug, Clone, PartialEq)]
pub enum MessengerEvent {
    SessionStarted,
    SessionEnded,
    /// A message the user sent, or a system notice, joined the log.
    MessageAppended { contact_id: String, message: Message },
    TypingChanged { contact_id: String, typing: bool },
    /// A reply from the contact. Its typing mark is already cleared.
    MessageReceived { contact_id: String, message: Message },
    PresenceChanged {
        contact_id: String,
        from: ContactStatus,
        to: ContactStatus,
    },
    WindowsChanged,
}

impl MessengerEvent {
    pub fn contact_id(&self) -> Option<&str> {
        match self {
            MessengerEvent::MessageAppended { contact_id, .. }
            | MessengerEvent::TypingChanged { contact_id, .. }
            | MessengerEvent::MessageReceived { contact_id, .. }
            | MessengerEvent::PresenceChanged { contact_id, .. } => Some(contact_id),
            MessengerEvent::SessionStarted
            | MessengerEvent::SessionEnded
            | MessengerEvent::WindowsChanged => None,
        }
    }
}
