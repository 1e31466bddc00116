// Chat window manager
// Owns the open chat windows: at most one per contact, cascaded on screen,
// persisted to the session store after every change.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::WindowSettings;
use crate::models::{ChatWindow, Message, Position};
use crate::storage::{self, KeyValueStore, WINDOWS_KEY};

pub struct WindowManager {
    windows: Vec<ChatWindow>,
    settings: WindowSettings,
    store: Arc<dyn KeyValueStore>,
}

impl WindowManager {
    pub fn new(settings: WindowSettings, store: Arc<dyn KeyValueStore>) -> Self {
        WindowManager {
            windows: Vec::new(),
            settings,
            store,
        }
    }

    /// Reloads the persisted window set. Corrupt data leaves the set empty.
    /// Returns the number of windows restored.
    pub fn restore(&mut self) -> usize {
        let stored: Vec<ChatWindow> = storage::load_json(self.store.as_ref(), WINDOWS_KEY).unwrap_or_default();

        let mut seen = HashSet::new();
        let mut windows = Vec::with_capacity(stored.len());
        for window in stored {
            if seen.insert(window.contact_id.clone()) {
                windows.push(window);
            } else {
                warn!("Dropping duplicate stored window {} for {}", window.id, window.contact_id);
            }
        }

        info!("Restored {} chat windows", windows.len());
        self.windows = windows;
        self.windows.len()
    }

    pub fn windows(&self) -> &[ChatWindow] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, window_id: &str) -> Option<&ChatWindow> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn for_contact(&self, contact_id: &str) -> Option<&ChatWindow> {
        self.windows.iter().find(|w| w.contact_id == contact_id)
    }

    /// Position for the next new window: the origin shifted once per window
    /// currently visible.
    pub fn next_position(&self) -> Position {
        let visible = self.windows.iter().filter(|w| w.is_visible()).count() as i32;
        let shift = visible * self.settings.cascade_offset;
        Position {
            x: self.settings.origin.x + shift,
            y: self.settings.origin.y + shift,
        }
    }

    /// Opens the contact's window, or brings an existing one back open and
    /// un-minimized. `history` seeds a newly created window only.
    pub fn open(&mut self, contact_id: &str, history: Vec<Message>, now: DateTime<Utc>) -> String {
        if let Some(window) = self.windows.iter_mut().find(|w| w.contact_id == contact_id) {
            window.is_open = true;
            window.is_minimized = false;
            let id = window.id.clone();
            debug!("Refocused chat window {}", id);
            self.persist();
            return id;
        }

        let window = ChatWindow {
            id: format!("chat-{}-{}", contact_id, now.timestamp_millis()),
            contact_id: contact_id.to_string(),
            is_open: true,
            is_minimized: false,
            messages: history,
            position: self.next_position(),
        };
        let id = window.id.clone();
        info!("Opened chat window {} at ({}, {})", id, window.position.x, window.position.y);
        self.windows.push(window);
        self.persist();
        id
    }

    /// Removes a window. The conversation log is untouched.
    pub fn close(&mut self, window_id: &str) -> Option<ChatWindow> {
        let idx = self.windows.iter().position(|w| w.id == window_id)?;
        let window = self.windows.remove(idx);
        info!("Closed chat window {}", window_id);
        self.persist();
        Some(window)
    }

    pub fn close_for_contact(&mut self, contact_id: &str) -> Option<ChatWindow> {
        let id = self.for_contact(contact_id)?.id.clone();
        self.close(&id)
    }

    pub fn minimize(&mut self, window_id: &str) -> bool {
        self.set_minimized(window_id, true)
    }

    pub fn restore_window(&mut self, window_id: &str) -> bool {
        self.set_minimized(window_id, false)
    }

    /// Appends a copy of `message` to the contact's window, if one exists.
    /// Returns the window id.
    pub fn append(&mut self, contact_id: &str, mut message: Message) -> Option<String> {
        let window = self.windows.iter_mut().find(|w| w.contact_id == contact_id)?;
        // Keep the window's timeline non-decreasing even if the clock stepped back
        if let Some(last) = window.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        window.messages.push(message);
        let id = window.id.clone();
        self.persist();
        Some(id)
    }

    /// Drops every window and the window count, without touching storage.
    pub fn clear(&mut self) {
        self.windows.clear();
    }

    fn set_minimized(&mut self, window_id: &str, minimized: bool) -> bool {
        let Some(window) = self.windows.iter_mut().find(|w| w.id == window_id) else {
            return false;
        };
        window.is_minimized = minimized;
        debug!("Window {} minimized: {}", window_id, minimized);
        self.persist();
        true
    }

    fn persist(&self) {
        storage::persist(self.store.as_ref(), WINDOWS_KEY, &self.windows);
    }
}
