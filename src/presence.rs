// Presence engine
// Randomized status transitions over the roster. This is the only writer of
// `Contact::status` and `Contact::last_seen`.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::time::Duration;

use crate::models::ContactStatus;
use crate::notifications::NotificationEvent;
use crate::random::RandomSource;
use crate::roster::Roster;

/// Statuses a contact may drift into on its own. Contacts never pick
/// "appear offline" by themselves.
pub const DEFAULT_TRANSITION_POOL: [ContactStatus; 4] = [
    ContactStatus::Online,
    ContactStatus::Away,
    ContactStatus::Busy,
    ContactStatus::Offline,
];

/// A status change that actually happened.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceChange {
    pub contact_id: String,
    pub from: ContactStatus,
    pub to: ContactStatus,
    pub last_seen: Option<DateTime<Utc>>,
}

impl PresenceChange {
    /// Sound-worthy event for this change, if any.
    pub fn notification(&self) -> Option<NotificationEvent> {
        match (self.from, self.to) {
            (ContactStatus::Offline, ContactStatus::Online) => Some(NotificationEvent::ContactOnline),
            (from, ContactStatus::Offline) if from != ContactStatus::Offline => {
                Some(NotificationEvent::ContactOffline)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PresenceEngine {
    interval: Duration,
    pool: Vec<ContactStatus>,
}

impl PresenceEngine {
    pub fn new(interval: Duration) -> Self {
        PresenceEngine {
            interval,
            pool: DEFAULT_TRANSITION_POOL.to_vec(),
        }
    }

    /// Replaces the set of statuses drawn on each tick. An empty pool is ignored.
    pub fn with_pool(mut self, pool: Vec<ContactStatus>) -> Self {
        if !pool.is_empty() {
            self.pool = pool;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pool(&self) -> &[ContactStatus] {
        &self.pool
    }

    /// One transition: a uniformly chosen contact gets a uniformly chosen
    /// status. Drawing the current status is a no-op.
    pub fn tick(
        &self,
        roster: &mut Roster,
        rng: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Option<PresenceChange> {
        if roster.is_empty() {
            return None;
        }
        let index = rng.pick_index(roster.len());
        let status = self.pool[rng.pick_index(self.pool.len())];
        let contact_id = roster.contacts().get(index)?.id.clone();

        debug!("Presence tick picked {} -> {:?}", contact_id, status);
        self.apply(roster, &contact_id, status, now)
    }

    /// Sets a contact's status. Entering offline stamps lastSeen; leaving it
    /// keeps the old stamp. Same-status writes change nothing.
    pub fn apply(
        &self,
        roster: &mut Roster,
        contact_id: &str,
        status: ContactStatus,
        now: DateTime<Utc>,
    ) -> Option<PresenceChange> {
        let contact = roster.get_mut(contact_id)?;
        if contact.status == status {
            return None;
        }

        let from = contact.status;
        contact.status = status;
        if status == ContactStatus::Offline {
            contact.last_seen = Some(now);
        }
        info!("{} is now {:?} (was {:?})", contact_id, status, from);

        Some(PresenceChange {
            contact_id: contact_id.to_string(),
            from,
            to: status,
            last_seen: contact.last_seen,
        })
    }
}
