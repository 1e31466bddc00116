//! Conversation simulator
//!
//! Owns the authoritative message log and drives the simulated remote party:
//! auto-responses with a typing indicator, and return nudges. Delays come
//! from the injected randomness source and are armed on the session
//! scheduler; nothing here blocks.
//!
//! Auto-response cycle for one contact:
//!
//! 1. `send` appends the user's message and arms the response slot.
//! 2. `StartTyping` fires after the response delay. If the contact is offline
//!    by then the cycle ends silently; otherwise the contact is marked typing
//!    and the slot is re-armed with the typing hold.
//! 3. `DeliverResponse` clears the typing mark and appends the reply in the
//!    same step.
//!
//! A new send while a cycle is pending replaces it; at most one cycle per
//! contact is ever in flight.

pub mod responses;

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use crate::config::Config;
use crate::emoticons::extract_occurrences;
use crate::models::{Contact, ContactStatus, Message, MessageType, CURRENT_USER_ID};
use crate::random::{DelayRange, RandomSource};
use crate::roster::Roster;
use crate::scheduler::{Job, Scheduler, Slot};

pub use responses::{pick_response, response_pool, Interest};

pub const NUDGE_SENT_TEXT: &str = "Has enviado un zumbido";

pub fn nudge_received_text(display_name: &str) -> String {
    format!("{} te ha enviado un zumbido", display_name)
}

/// What handling a fired job produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    TypingStarted { contact_id: String },
    /// Reply appended. The typing mark was cleared in the same step.
    Delivered { contact_id: String, message: Message },
    NudgeReturned { contact_id: String, message: Message },
    /// The contact went offline or disappeared before the job fired.
    Dropped { contact_id: String, typing_cleared: bool },
}

pub struct ConversationSimulator {
    user_id: String,
    history: Vec<Message>,
    typing: HashSet<String>,
    response_delay: DelayRange,
    typing_delay: DelayRange,
    nudge_delay: DelayRange,
}

impl ConversationSimulator {
    pub fn new(config: &Config) -> Self {
        ConversationSimulator {
            user_id: CURRENT_USER_ID.to_string(),
            history: Vec::new(),
            typing: HashSet::new(),
            response_delay: config.response_delay,
            typing_delay: config.typing_delay,
            nudge_delay: config.nudge_delay,
        }
    }

    /// Appends a text message from the user to `target` and arms the
    /// auto-response. Blank content or an offline target is a no-op.
    pub fn send(
        &mut self,
        content: &str,
        target: &Contact,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
        scheduler: &mut Scheduler,
    ) -> Option<Message> {
        if content.trim().is_empty() {
            debug!("Ignoring blank message to {}", target.id);
            return None;
        }
        if target.status == ContactStatus::Offline {
            debug!("Ignoring message to offline contact {}", target.id);
            return None;
        }

        let message = self.text_message(&self.user_id, &target.id, content, now);
        self.history.push(message.clone());

        let delay = self.response_delay.sample(rng);
        scheduler.arm(
            &target.id,
            Slot::Response,
            delay,
            Job::StartTyping { contact_id: target.id.clone() },
        );
        info!("Sent message {} to {}, reply due in {:?}", message.id, target.id, delay);
        Some(message)
    }

    /// Appends the "you sent a nudge" notice and, unless the contact is
    /// offline, arms the return nudge.
    pub fn send_nudge(
        &mut self,
        target: &Contact,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
        scheduler: &mut Scheduler,
    ) -> Message {
        let message = Message {
            id: message_id("nudge", now),
            sender_id: self.user_id.clone(),
            recipient_id: target.id.clone(),
            content: NUDGE_SENT_TEXT.to_string(),
            timestamp: now,
            message_type: MessageType::System,
            emoticons: None,
        };
        self.history.push(message.clone());

        if target.status != ContactStatus::Offline {
            let delay = self.nudge_delay.sample(rng);
            scheduler.arm(
                &target.id,
                Slot::Nudge,
                delay,
                Job::ReturnNudge { contact_id: target.id.clone() },
            );
            debug!("Return nudge from {} due in {:?}", target.id, delay);
        }
        message
    }

    /// Applies a job the scheduler has already claimed. Presence ticks are
    /// not handled here and return `None`.
    pub fn handle(
        &mut self,
        job: &Job,
        roster: &Roster,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
        scheduler: &mut Scheduler,
    ) -> Option<Outcome> {
        match job {
            Job::StartTyping { contact_id } => {
                let Some(contact) = reachable(roster, contact_id) else {
                    return Some(self.drop_cycle(contact_id));
                };
                self.typing.insert(contact.id.clone());
                let hold = self.typing_delay.sample(rng);
                scheduler.arm(
                    contact_id,
                    Slot::Response,
                    hold,
                    Job::DeliverResponse { contact_id: contact_id.clone() },
                );
                debug!("{} is typing for {:?}", contact_id, hold);
                Some(Outcome::TypingStarted { contact_id: contact_id.clone() })
            }
            Job::DeliverResponse { contact_id } => {
                let Some(contact) = reachable(roster, contact_id) else {
                    return Some(self.drop_cycle(contact_id));
                };
                let reply = pick_response(contact, rng);
                let message = self.text_message(contact_id, &self.user_id, reply, now);

                self.typing.remove(contact_id);
                self.history.push(message.clone());
                info!("{} replied with {}", contact_id, message.id);
                Some(Outcome::Delivered { contact_id: contact_id.clone(), message })
            }
            Job::ReturnNudge { contact_id } => {
                let Some(contact) = reachable(roster, contact_id) else {
                    debug!("Dropping return nudge, {} is unavailable", contact_id);
                    return Some(Outcome::Dropped {
                        contact_id: contact_id.clone(),
                        typing_cleared: false,
                    });
                };
                let message = Message {
                    id: message_id("nudge-response", now),
                    sender_id: contact.id.clone(),
                    recipient_id: self.user_id.clone(),
                    content: nudge_received_text(&contact.display_name),
                    timestamp: now,
                    message_type: MessageType::System,
                    emoticons: None,
                };
                self.history.push(message.clone());
                Some(Outcome::NudgeReturned { contact_id: contact_id.clone(), message })
            }
            Job::PresenceTick => None,
        }
    }

    /// Messages sent to or received from `contact_id`, in insertion order.
    pub fn history(&self, contact_id: &str) -> Vec<Message> {
        self.history
            .iter()
            .filter(|m| m.involves(contact_id))
            .cloned()
            .collect()
    }

    /// Purges every message involving `contact_id`. Returns how many went.
    pub fn clear_history(&mut self, contact_id: &str) -> usize {
        let before = self.history.len();
        self.history.retain(|m| !m.involves(contact_id));
        before - self.history.len()
    }

    pub fn is_typing(&self, contact_id: &str) -> bool {
        self.typing.contains(contact_id)
    }

    pub fn typing_contacts(&self) -> BTreeSet<String> {
        self.typing.iter().cloned().collect()
    }

    /// Stops everything in flight for a contact. Returns true when a typing
    /// mark was cleared.
    pub fn forget_contact(&mut self, contact_id: &str, scheduler: &mut Scheduler) -> bool {
        scheduler.cancel_contact(contact_id);
        self.typing.remove(contact_id)
    }

    /// Seeds the log from previously persisted messages. Known ids are
    /// skipped. The new batch is appended in timestamp order; messages
    /// already in the log keep their place.
    pub fn import(&mut self, messages: impl IntoIterator<Item = Message>) {
        let mut known: HashSet<String> = self.history.iter().map(|m| m.id.clone()).collect();
        let mut batch: Vec<Message> = messages
            .into_iter()
            .filter(|m| known.insert(m.id.clone()))
            .collect();
        batch.sort_by_key(|m| m.timestamp);
        debug!("Imported {} stored messages", batch.len());
        self.history.extend(batch);
    }

    /// Clears every typing mark, returning the contacts that were typing.
    pub fn clear_typing(&mut self) -> Vec<String> {
        let mut cleared: Vec<String> = self.typing.drain().collect();
        cleared.sort();
        cleared
    }

    /// Drops the whole log and every typing mark.
    pub fn reset(&mut self) {
        self.history.clear();
        self.typing.clear();
    }

    fn drop_cycle(&mut self, contact_id: &str) -> Outcome {
        let typing_cleared = self.typing.remove(contact_id);
        debug!("Dropping auto-response, {} is unavailable", contact_id);
        Outcome::Dropped { contact_id: contact_id.to_string(), typing_cleared }
    }

    fn text_message(&self, sender: &str, recipient: &str, content: &str, now: DateTime<Utc>) -> Message {
        let emoticons = extract_occurrences(content);
        Message {
            id: message_id("msg", now),
            sender_id: sender.to_string(),
            recipient_id: recipient.to_string(),
            content: content.to_string(),
            timestamp: now,
            message_type: MessageType::Text,
            emoticons: Some(emoticons),
        }
    }
}

fn reachable<'a>(roster: &'a Roster, contact_id: &str) -> Option<&'a Contact> {
    roster.get(contact_id).filter(|c| c.status != ContactStatus::Offline)
}

// Timestamp plus a random suffix, unique even within one millisecond
fn message_id(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, now.timestamp_millis(), &suffix[..12])
}
