//! Session orchestrator
//!
//! `Messenger` owns every piece of session state: identity, roster, the
//! conversation log, chat windows and the timer scheduler. All mutation
//! happens on the caller's task. Timers only post jobs; [`Messenger::step`]
//! applies them one at a time, so there is a single writer throughout.
//!
//! Observers get a [`MessengerEvent`] stream from [`Messenger::new`]; sounds
//! go to the injected [`NotificationSink`].

use log::{debug, info};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::auth::{AuthError, IdentityStore};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::conversation::{ConversationSimulator, Outcome};
use crate::events::MessengerEvent;
use crate::models::{ChatWindow, Contact, ContactStatus, Message, UserProfile};
use crate::notifications::{LogSink, NotificationEvent, NotificationSink};
use crate::presence::{PresenceChange, PresenceEngine};
use crate::random::{RandomSource, ThreadRandom};
use crate::roster::Roster;
use crate::scheduler::{Job, Scheduled, Scheduler, Slot};
use crate::storage::{self, KeyValueStore, CONTACTS_KEY};
use crate::windows::WindowManager;

pub struct Messenger {
    config: Config,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RandomSource>,
    sink: Arc<dyn NotificationSink>,
    identity: IdentityStore,
    roster: Roster,
    presence: PresenceEngine,
    conversation: ConversationSimulator,
    windows: WindowManager,
    scheduler: Scheduler,
    jobs: mpsc::UnboundedReceiver<Scheduled>,
    events: mpsc::UnboundedSender<MessengerEvent>,
    active: bool,
}

impl Messenger {
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
        sink: Arc<dyn NotificationSink>,
    ) -> (Self, mpsc::UnboundedReceiver<MessengerEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (scheduler, jobs) = Scheduler::new();

        let messenger = Messenger {
            identity: IdentityStore::new(store.clone()),
            roster: Roster::default(),
            presence: PresenceEngine::new(config.presence_interval()),
            conversation: ConversationSimulator::new(&config),
            windows: WindowManager::new(config.windows, store.clone()),
            scheduler,
            jobs,
            events,
            active: false,
            config,
            store,
            clock,
            rng,
            sink,
        };
        (messenger, events_rx)
    }

    /// Wall clock, thread randomness and log-only notifications.
    pub fn with_defaults(
        config: Config,
        store: Arc<dyn KeyValueStore>,
    ) -> (Self, mpsc::UnboundedReceiver<MessengerEvent>) {
        Self::new(
            config,
            store,
            Arc::new(SystemClock),
            Box::new(ThreadRandom::new()),
            Arc::new(LogSink),
        )
    }

    // ---- session lifecycle ----

    /// Waits out the login delay, then checks the credentials. On success the
    /// session is activated.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        tokio::time::sleep(self.config.login_delay()).await;

        if self.active {
            self.deactivate();
        }
        let profile = self.identity.sign_in(email, password, self.clock.now())?;
        self.sink.notify(NotificationEvent::Login);
        self.activate();
        Ok(profile)
    }

    /// Reactivates a session stored by an earlier run, if there is one.
    pub fn resume(&mut self) -> Option<UserProfile> {
        if self.active {
            return self.identity.current().cloned();
        }
        let profile = self.identity.resume()?;
        self.activate();
        Some(profile)
    }

    /// Ends the session and wipes everything it stored. Returns false when
    /// nobody was signed in.
    pub fn logout(&mut self) -> bool {
        if !self.active && !self.identity.is_authenticated() {
            return false;
        }
        self.sink.notify(NotificationEvent::Logout);
        self.deactivate();
        self.identity.sign_out();
        true
    }

    /// Stops every timer without touching stored state, so the session can
    /// be resumed later.
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.scheduler.cancel_all();
        while self.jobs.try_recv().is_ok() {}
        self.clear_typing();
        self.active = false;
        info!("Session shut down");
        self.emit(MessengerEvent::SessionEnded);
    }

    fn activate(&mut self) {
        let now = self.clock.now();
        self.roster = match storage::load_json::<Roster>(self.store.as_ref(), CONTACTS_KEY) {
            Some(roster) if !roster.is_empty() => roster,
            _ => Roster::seeded(now),
        };
        self.save_roster();

        // No timer survives a shutdown, so no typing mark may either
        self.clear_typing();
        self.windows.restore();
        for window in self.windows.windows() {
            self.conversation.import(window.messages.iter().cloned());
        }

        self.scheduler.start_ticker(self.presence.interval());
        self.active = true;
        info!(
            "Session active: {} contacts, {} windows",
            self.roster.len(),
            self.windows.len()
        );
        self.emit(MessengerEvent::SessionStarted);
        self.emit(MessengerEvent::WindowsChanged);
    }

    fn clear_typing(&mut self) {
        for contact_id in self.conversation.clear_typing() {
            self.emit(MessengerEvent::TypingChanged { contact_id, typing: false });
        }
    }

    fn deactivate(&mut self) {
        self.scheduler.cancel_all();
        // Drop jobs that fired before the cancel
        while self.jobs.try_recv().is_ok() {}

        self.windows.clear();
        self.conversation.reset();
        self.roster.clear();
        self.active = false;
        info!("Session reset");
        self.emit(MessengerEvent::WindowsChanged);
        self.emit(MessengerEvent::SessionEnded);
    }

    // ---- windows ----

    /// Opens (or refocuses) the chat window for a contact in the roster.
    pub fn open_chat_window(&mut self, contact_id: &str) -> Option<String> {
        if !self.active || self.roster.get(contact_id).is_none() {
            debug!("Not opening a window for unknown contact {}", contact_id);
            return None;
        }
        let history = self.conversation.history(contact_id);
        let id = self.windows.open(contact_id, history, self.clock.now());
        self.emit(MessengerEvent::WindowsChanged);
        Some(id)
    }

    pub fn close_chat_window(&mut self, window_id: &str) -> bool {
        if !self.active {
            return false;
        }
        let closed = self.windows.close(window_id).is_some();
        if closed {
            self.emit(MessengerEvent::WindowsChanged);
        }
        closed
    }

    pub fn minimize_window(&mut self, window_id: &str) -> bool {
        if !self.active {
            return false;
        }
        let changed = self.windows.minimize(window_id);
        if changed {
            self.emit(MessengerEvent::WindowsChanged);
        }
        changed
    }

    pub fn restore_window(&mut self, window_id: &str) -> bool {
        if !self.active {
            return false;
        }
        let changed = self.windows.restore_window(window_id);
        if changed {
            self.emit(MessengerEvent::WindowsChanged);
        }
        changed
    }

    // ---- conversation ----

    /// Sends a text message through a window. An inactive session, unknown
    /// windows, vanished contacts, offline contacts and blank text are all
    /// silent no-ops.
    pub fn send_message(&mut self, window_id: &str, content: &str) -> Option<Message> {
        if !self.active {
            return None;
        }
        let contact_id = self.windows.get(window_id)?.contact_id.clone();
        let contact = self.roster.get(&contact_id)?;
        let message = self.conversation.send(
            content,
            contact,
            self.clock.now(),
            self.rng.as_mut(),
            &mut self.scheduler,
        )?;

        self.windows.append(&contact_id, message.clone());
        self.emit(MessengerEvent::MessageAppended { contact_id, message: message.clone() });
        Some(message)
    }

    pub fn send_nudge(&mut self, window_id: &str) -> Option<Message> {
        if !self.active {
            return None;
        }
        let contact_id = self.windows.get(window_id)?.contact_id.clone();
        let contact = self.roster.get(&contact_id)?;
        let message = self.conversation.send_nudge(
            contact,
            self.clock.now(),
            self.rng.as_mut(),
            &mut self.scheduler,
        );

        self.sink.notify(NotificationEvent::Nudge);
        self.windows.append(&contact_id, message.clone());
        self.emit(MessengerEvent::MessageAppended { contact_id, message: message.clone() });
        Some(message)
    }

    pub fn clear_history(&mut self, contact_id: &str) -> usize {
        if !self.active {
            return 0;
        }
        self.conversation.clear_history(contact_id)
    }

    // ---- roster ----

    pub fn toggle_group(&mut self, group_id: &str) -> Option<bool> {
        if !self.active {
            return None;
        }
        let expanded = self.roster.toggle_group(group_id)?;
        self.save_roster();
        Some(expanded)
    }

    pub fn add_contact(&mut self, contact: Contact) -> bool {
        if !self.active || !self.roster.add_contact(contact) {
            return false;
        }
        self.save_roster();
        true
    }

    /// Removes a contact, closing its window and stopping its timers. The
    /// conversation log is kept.
    pub fn remove_contact(&mut self, contact_id: &str) -> Option<Contact> {
        if !self.active {
            return None;
        }
        let contact = self.roster.remove_contact(contact_id)?;
        if self.conversation.forget_contact(contact_id, &mut self.scheduler) {
            self.emit(MessengerEvent::TypingChanged {
                contact_id: contact_id.to_string(),
                typing: false,
            });
        }
        if self.windows.close_for_contact(contact_id).is_some() {
            self.emit(MessengerEvent::WindowsChanged);
        }
        self.save_roster();
        Some(contact)
    }

    /// Forces a contact's status through the presence engine.
    pub fn set_contact_status(&mut self, contact_id: &str, status: ContactStatus) -> Option<PresenceChange> {
        if !self.active {
            return None;
        }
        let change = self
            .presence
            .apply(&mut self.roster, contact_id, status, self.clock.now())?;
        self.on_presence_change(&change);
        Some(change)
    }

    // ---- profile ----

    pub fn set_user_status(&mut self, status: ContactStatus) -> bool {
        self.identity.set_status(status, self.clock.now())
    }

    pub fn set_personal_message(&mut self, message: &str) -> bool {
        self.identity.set_personal_message(message)
    }

    pub fn set_display_name(&mut self, name: &str) -> bool {
        self.identity.set_display_name(name)
    }

    // ---- timers ----

    /// Waits for the next timer and applies it. Returns false once the job
    /// channel is closed.
    pub async fn step(&mut self) -> bool {
        match self.jobs.recv().await {
            Some(scheduled) => {
                self.dispatch(scheduled);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, scheduled: Scheduled) {
        if !self.active || !self.scheduler.claim(&scheduled) {
            return;
        }
        let now = self.clock.now();

        if scheduled.job == Job::PresenceTick {
            if let Some(change) = self.presence.tick(&mut self.roster, self.rng.as_mut(), now) {
                self.on_presence_change(&change);
            }
            return;
        }

        let outcome = self.conversation.handle(
            &scheduled.job,
            &self.roster,
            now,
            self.rng.as_mut(),
            &mut self.scheduler,
        );
        match outcome {
            Some(Outcome::TypingStarted { contact_id }) => {
                self.emit(MessengerEvent::TypingChanged { contact_id, typing: true });
            }
            Some(Outcome::Delivered { contact_id, message }) => {
                self.windows.append(&contact_id, message.clone());
                self.sink.notify(NotificationEvent::MessageReceived);
                self.emit(MessengerEvent::MessageReceived { contact_id, message });
            }
            Some(Outcome::NudgeReturned { contact_id, message }) => {
                self.windows.append(&contact_id, message.clone());
                self.sink.notify(NotificationEvent::Nudge);
                self.emit(MessengerEvent::MessageAppended { contact_id, message });
            }
            Some(Outcome::Dropped { contact_id, typing_cleared: true }) => {
                self.emit(MessengerEvent::TypingChanged { contact_id, typing: false });
            }
            Some(Outcome::Dropped { .. }) | None => {}
        }
    }

    fn on_presence_change(&mut self, change: &PresenceChange) {
        if let Some(event) = change.notification() {
            self.sink.notify(event);
        }
        self.save_roster();
        self.emit(MessengerEvent::PresenceChanged {
            contact_id: change.contact_id.clone(),
            from: change.from,
            to: change.to,
        });
    }

    // ---- accessors ----

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.identity.current()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn contact(&self, contact_id: &str) -> Option<&Contact> {
        self.roster.get(contact_id)
    }

    pub fn windows(&self) -> &[ChatWindow] {
        self.windows.windows()
    }

    pub fn window(&self, window_id: &str) -> Option<&ChatWindow> {
        self.windows.get(window_id)
    }

    pub fn window_for_contact(&self, contact_id: &str) -> Option<&ChatWindow> {
        self.windows.for_contact(contact_id)
    }

    pub fn history(&self, contact_id: &str) -> Vec<Message> {
        self.conversation.history(contact_id)
    }

    pub fn is_typing(&self, contact_id: &str) -> bool {
        self.conversation.is_typing(contact_id)
    }

    pub fn typing_contacts(&self) -> BTreeSet<String> {
        self.conversation.typing_contacts()
    }

    pub fn has_pending_response(&self, contact_id: &str) -> bool {
        self.scheduler.is_pending(contact_id, Slot::Response)
    }

    pub fn has_pending_nudge(&self, contact_id: &str) -> bool {
        self.scheduler.is_pending(contact_id, Slot::Nudge)
    }

    /// Per-contact response and nudge timers still outstanding.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    pub fn presence_running(&self) -> bool {
        self.scheduler.ticker_running()
    }

    fn save_roster(&self) {
        storage::persist(self.store.as_ref(), CONTACTS_KEY, &self.roster);
    }

    fn emit(&self, event: MessengerEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}
