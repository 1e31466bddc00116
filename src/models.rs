use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Id used for the signed-in user in every message it sends or receives.
pub const CURRENT_USER_ID: &str = "current-user";

/// Presence of a contact or of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Online,
    Away,
    Busy,
    AppearOffline,
    Offline,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 5] = [
        ContactStatus::Online,
        ContactStatus::Away,
        ContactStatus::Busy,
        ContactStatus::AppearOffline,
        ContactStatus::Offline,
    ];

    /// Position in the contact list, lower sorts first.
    pub fn display_rank(self) -> u8 {
        match self {
            ContactStatus::Online => 0,
            ContactStatus::Away => 1,
            ContactStatus::Busy => 2,
            ContactStatus::AppearOffline => 3,
            ContactStatus::Offline => 4,
        }
    }

    /// Online, away and busy contacts count as connected in the list header.
    pub fn is_available(self) -> bool {
        match self {
            ContactStatus::Online | ContactStatus::Away | ContactStatus::Busy => true,
            ContactStatus::AppearOffline | ContactStatus::Offline => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContactStatus::Online => "En línea",
            ContactStatus::Away => "Ausente",
            ContactStatus::Busy => "Ocupado",
            ContactStatus::AppearOffline => "No aparecer conectado",
            ContactStatus::Offline => "Sin conexión",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ContactStatus::Online => "Disponible para chatear",
            ContactStatus::Away => "No estoy en la computadora",
            ContactStatus::Busy => "No me molesten",
            ContactStatus::AppearOffline => "Invisible para otros contactos",
            ContactStatus::Offline => "No disponible",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ContactStatus::Online => "🟢",
            ContactStatus::Away => "🟡",
            ContactStatus::Busy => "🔴",
            ContactStatus::AppearOffline => "⚪",
            ContactStatus::Offline => "⚫",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ContactStatus::Online => "#00CC00",
            ContactStatus::Away => "#FF9900",
            ContactStatus::Busy => "#CC0000",
            ContactStatus::AppearOffline | ContactStatus::Offline => "#808080",
        }
    }

    /// Parses the wire name (`online`, `appear_offline`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "online" => Some(ContactStatus::Online),
            "away" => Some(ContactStatus::Away),
            "busy" => Some(ContactStatus::Busy),
            "appear_offline" | "invisible" => Some(ContactStatus::AppearOffline),
            "offline" => Some(ContactStatus::Offline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub status: ContactStatus,
    #[serde(default)]
    pub personal_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub is_blocked: bool,
}

impl Contact {
    /// Nickname when one is set, otherwise the display name.
    pub fn shown_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.display_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactGroup {
    pub id: String,
    pub name: String,
    pub is_expanded: bool,
    pub contact_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    System,
    Typing,
}

/// A catalog shortcut found in message text, at a character offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoticonOccurrence {
    pub shortcut: String,
    #[serde(rename = "position")]
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoticons: Option<Vec<EmoticonOccurrence>>,
}

impl Message {
    /// True when `contact_id` sent or received this message.
    pub fn involves(&self, contact_id: &str) -> bool {
        self.sender_id == contact_id || self.recipient_id == contact_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatWindow {
    pub id: String,
    pub contact_id: String,
    pub is_open: bool,
    pub is_minimized: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub position: Position,
}

impl ChatWindow {
    pub fn is_visible(&self) -> bool {
        self.is_open && !self.is_minimized
    }
}

/// The signed-in user's profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub personal_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub status: ContactStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}
