// Timer scheduling for one session
//
// Timer tasks never touch session state. They sleep, then post a job back
// through the job channel; the session applies it on its own turn. Each job
// carries a ticket, and only the ticket currently held by its slot is
// honored, so a replaced timer that already fired is ignored.

use log::debug;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Per-contact timer slot. Each slot holds at most one pending job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The auto-response cycle: response delay, then typing hold.
    Response,
    /// The simulated return nudge.
    Nudge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Response delay elapsed; the contact starts typing.
    StartTyping { contact_id: String },
    /// Typing hold elapsed; the reply is delivered.
    DeliverResponse { contact_id: String },
    ReturnNudge { contact_id: String },
    PresenceTick,
}

impl Job {
    pub fn contact_id(&self) -> Option<&str> {
        match self {
            Job::StartTyping { contact_id }
            | Job::DeliverResponse { contact_id }
            | Job::ReturnNudge { contact_id } => Some(contact_id),
            Job::PresenceTick => None,
        }
    }

    pub fn slot(&self) -> Option<Slot> {
        match self {
            Job::StartTyping { .. } | Job::DeliverResponse { .. } => Some(Slot::Response),
            Job::ReturnNudge { .. } => Some(Slot::Nudge),
            Job::PresenceTick => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub ticket: u64,
    pub job: Job,
}

struct Pending {
    ticket: u64,
    handle: AbortHandle,
}

pub struct Scheduler {
    tx: mpsc::UnboundedSender<Scheduled>,
    pending: HashMap<(String, Slot), Pending>,
    ticker: Option<AbortHandle>,
    next_ticket: u64,
}

impl Scheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Scheduled>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Scheduler {
                tx,
                pending: HashMap::new(),
                ticker: None,
                next_ticket: 1,
            },
            rx,
        )
    }

    /// Arms `slot` for `contact_id`, replacing whatever it held.
    pub fn arm(&mut self, contact_id: &str, slot: Slot, delay: Duration, job: Job) -> u64 {
        let key = (contact_id.to_string(), slot);
        if let Some(previous) = self.pending.remove(&key) {
            debug!("Replacing pending {:?} timer for {}", slot, contact_id);
            previous.handle.abort();
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone once the session is torn down
            let _ = tx.send(Scheduled { ticket, job });
        })
        .abort_handle();

        debug!("Armed {:?} timer #{} for {} in {:?}", slot, ticket, contact_id, delay);
        self.pending.insert(key, Pending { ticket, handle });
        ticket
    }

    /// Accepts a fired job if its ticket still owns the slot, releasing the
    /// slot. Stale tickets are rejected.
    pub fn claim(&mut self, scheduled: &Scheduled) -> bool {
        let (Some(contact_id), Some(slot)) = (scheduled.job.contact_id(), scheduled.job.slot()) else {
            return self.ticker.is_some();
        };

        let key = (contact_id.to_string(), slot);
        match self.pending.get(&key) {
            Some(p) if p.ticket == scheduled.ticket => {
                self.pending.remove(&key);
                true
            }
            _ => {
                debug!("Ignoring stale timer #{} for {}", scheduled.ticket, contact_id);
                false
            }
        }
    }

    pub fn is_pending(&self, contact_id: &str, slot: Slot) -> bool {
        self.pending.contains_key(&(contact_id.to_string(), slot))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn cancel(&mut self, contact_id: &str, slot: Slot) -> bool {
        match self.pending.remove(&(contact_id.to_string(), slot)) {
            Some(p) => {
                p.handle.abort();
                debug!("Cancelled {:?} timer for {}", slot, contact_id);
                true
            }
            None => false,
        }
    }

    pub fn cancel_contact(&mut self, contact_id: &str) {
        self.cancel(contact_id, Slot::Response);
        self.cancel(contact_id, Slot::Nudge);
    }

    /// Starts the repeating presence tick. The first tick fires one full
    /// period after the call.
    pub fn start_ticker(&mut self, period: Duration) {
        self.stop_ticker();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if tx.send(Scheduled { ticket: 0, job: Job::PresenceTick }).is_err() {
                    break;
                }
            }
        })
        .abort_handle();
        debug!("Presence ticker started every {:?}", period);
        self.ticker = Some(handle);
    }

    pub fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            debug!("Presence ticker stopped");
        }
    }

    pub fn ticker_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Aborts every outstanding timer.
    pub fn cancel_all(&mut self) {
        self.stop_ticker();
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing(contact: &str) -> Job {
        Job::StartTyping { contact_id: contact.to_string() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_job_arrives_after_delay() {
        let (mut scheduler, mut rx) = Scheduler::new();
        let start = tokio::time::Instant::now();
        let ticket = scheduler.arm("contact-1", Slot::Response, Duration::from_millis(2500), typing("contact-1"));

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.ticket, ticket);
        assert!(start.elapsed() >= Duration::from_millis(2500));
        assert!(scheduler.claim(&fired));
        assert!(!scheduler.is_pending("contact-1", Slot::Response));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_replaces_previous_timer() {
        let (mut scheduler, mut rx) = Scheduler::new();
        scheduler.arm("contact-1", Slot::Response, Duration::from_millis(1000), typing("contact-1"));
        let second = scheduler.arm("contact-1", Slot::Response, Duration::from_millis(3000), typing("contact-1"));
        assert_eq!(scheduler.pending_count(), 1);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.ticket, second);
        assert!(scheduler.claim(&fired));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_ticket_is_rejected() {
        let (mut scheduler, _rx) = Scheduler::new();
        let first = scheduler.arm("contact-2", Slot::Nudge, Duration::from_millis(10), Job::ReturnNudge {
            contact_id: "contact-2".to_string(),
        });
        scheduler.arm("contact-2", Slot::Nudge, Duration::from_millis(10), Job::ReturnNudge {
            contact_id: "contact-2".to_string(),
        });

        let stale = Scheduled { ticket: first, job: Job::ReturnNudge { contact_id: "contact-2".to_string() } };
        assert!(!scheduler.claim(&stale));
        assert!(scheduler.is_pending("contact-2", Slot::Nudge));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slots_are_independent_per_contact() {
        let (mut scheduler, _rx) = Scheduler::new();
        scheduler.arm("contact-1", Slot::Response, Duration::from_secs(2), typing("contact-1"));
        scheduler.arm("contact-2", Slot::Response, Duration::from_secs(2), typing("contact-2"));
        scheduler.arm("contact-1", Slot::Nudge, Duration::from_secs(1), Job::ReturnNudge {
            contact_id: "contact-1".to_string(),
        });
        assert_eq!(scheduler.pending_count(), 3);

        scheduler.cancel_contact("contact-1");
        assert_eq!(scheduler.pending_count(), 1);
        assert!(scheduler.is_pending("contact-2", Slot::Response));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_and_cancel_all() {
        let (mut scheduler, mut rx) = Scheduler::new();
        let start = tokio::time::Instant::now();
        scheduler.start_ticker(Duration::from_secs(30));

        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.job, Job::PresenceTick);
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(scheduler.claim(&tick));

        scheduler.arm("contact-1", Slot::Response, Duration::from_secs(2), typing("contact-1"));
        scheduler.cancel_all();
        assert!(!scheduler.ticker_running());
        assert_eq!(scheduler.pending_count(), 0);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
    }
}
