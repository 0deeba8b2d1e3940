//! Per-session save serialization.
//!
//! At most one save per session id is in flight. A save requested while another
//! is running replaces whatever was queued behind it, so intermediate transcript
//! states are collapsed. Each request carries the store revision it was taken at,
//! and a save's response is folded back into the roster only if no newer request
//! for that session has been made since and the identity context is unchanged.
//!
//! Slot bookkeeping is scoped to the identity context: when a request from a newer
//! context arrives, idle slots left by older contexts are dropped.

use freya_core::identity::IdentityContext;
use freya_core::persistence::ChatDataService;
use freya_core::session::Session;
use freya_core::state::ChatAction;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::store::{ChatStore, Dispatched};

#[derive(Debug, Clone)]
struct SaveRequest {
    session: Session,
    identity: IdentityContext,
    epoch: u64,
    revision: u64,
}

#[derive(Default)]
struct Slot {
    in_flight: bool,
    pending: Option<SaveRequest>,
    latest_revision: u64,
}

#[derive(Default)]
struct Slots {
    epoch: u64,
    by_session: HashMap<String, Slot>,
}

impl Slots {
    /// Moves to `epoch`, keeping only the slots whose worker is still running.
    fn advance_to(&mut self, epoch: u64) {
        if epoch <= self.epoch {
            return;
        }
        self.by_session.retain(|_, slot| slot.in_flight);
        self.epoch = epoch;
    }
}

struct QueueInner {
    store: Arc<ChatStore>,
    service: Arc<dyn ChatDataService>,
    slots: Mutex<Slots>,
    active_workers: AtomicUsize,
    idle: Notify,
}

#[derive(Clone)]
pub struct SessionSaveQueue {
    inner: Arc<QueueInner>,
}

impl SessionSaveQueue {
    pub fn new(store: Arc<ChatStore>, service: Arc<dyn ChatDataService>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store,
                service,
                slots: Mutex::new(Slots::default()),
                active_workers: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Queues a save of the active session if `dispatched` changed its transcript.
    pub async fn schedule(&self, dispatched: &Dispatched) {
        let Some(session) = dispatched.saveable_session() else {
            return;
        };
        let request = SaveRequest {
            session,
            identity: dispatched.context.identity().clone(),
            epoch: dispatched.context.epoch(),
            revision: dispatched.revision,
        };
        let session_id = request.session.id.clone();

        let mut slots = self.inner.slots.lock().await;
        slots.advance_to(request.epoch);
        let slot = slots.by_session.entry(session_id.clone()).or_default();
        if request.revision <= slot.latest_revision {
            debug!(
                target: "freya::save_queue",
                session_id = %session_id,
                revision = request.revision,
                "Ignoring save older than the latest request"
            );
            return;
        }
        slot.latest_revision = request.revision;

        if slot.in_flight {
            if let Some(superseded) = slot.pending.replace(request) {
                debug!(
                    target: "freya::save_queue",
                    session_id = %session_id,
                    revision = superseded.revision,
                    "Queued save superseded"
                );
            }
            return;
        }

        slot.in_flight = true;
        self.inner.active_workers.fetch_add(1, Ordering::SeqCst);
        drop(slots);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.drain(request).await;
            if inner.active_workers.fetch_sub(1, Ordering::SeqCst) == 1 {
                inner.idle.notify_waiters();
            }
        });
    }

    #[cfg(test)]
    async fn slot_count(&self) -> usize {
        self.inner.slots.lock().await.by_session.len()
    }

    /// Waits until no save is in flight or queued.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.active_workers.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl QueueInner {
    /// Runs `request`, then whatever was queued behind it, until the slot is empty.
    async fn drain(&self, mut request: SaveRequest) {
        let session_id = request.session.id.clone();
        loop {
            debug!(
                target: "freya::save_queue",
                session_id = %session_id,
                revision = request.revision,
                messages = request.session.messages.len(),
                "Saving session"
            );
            match self
                .service
                .save_session(&request.session, &request.identity)
                .await
            {
                Ok(Some(saved)) => self.reconcile(saved, &request).await,
                Ok(None) => {}
                Err(e) => {
                    // The optimistic local state stays authoritative until a later save lands.
                    warn!(
                        target: "freya::save_queue",
                        session_id = %session_id,
                        revision = request.revision,
                        error = %e,
                        "Failed to save session"
                    );
                }
            }

            let mut slots = self.slots.lock().await;
            let Some(slot) = slots.by_session.get_mut(&session_id) else {
                return;
            };
            match slot.pending.take() {
                Some(next) => request = next,
                None => {
                    slot.in_flight = false;
                    return;
                }
            }
        }
    }

    async fn reconcile(&self, saved: Session, request: &SaveRequest) {
        // Held across the dispatch so no newer request can slip in between the check
        // and the roster update.
        let slots = self.slots.lock().await;
        let latest = slots
            .by_session
            .get(&request.session.id)
            .map(|slot| slot.latest_revision)
            .unwrap_or_default();
        if latest != request.revision {
            debug!(
                target: "freya::save_queue",
                session_id = %request.session.id,
                revision = request.revision,
                latest,
                "Skipping reconciliation; a newer save is pending"
            );
            return;
        }

        let applied = self
            .store
            .dispatch_in_epoch(request.epoch, ChatAction::UpdateSessionInAllSessions(saved))
            .await;
        if applied.is_none() {
            debug!(
                target: "freya::save_queue",
                session_id = %request.session.id,
                "Skipping reconciliation; identity context changed"
            );
        }
    }
}
