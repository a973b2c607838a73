//! Change notifications for leave data.
//!
//! Listeners are plain callbacks registered on the service. They run on the
//! task that performed the mutation, after the write succeeded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveEventKind {
    Submitted,
    Approved,
    Rejected,
    Withdrawn,
    /// the periodic refresh saw changes made elsewhere
    Refreshed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeaveEvent {
    pub kind: LeaveEventKind,
    pub request_id: Option<u64>,
    pub requester_id: Option<u64>,
}

impl LeaveEvent {
    pub fn for_request(kind: LeaveEventKind, request_id: u64, requester_id: u64) -> Self {
        Self {
            kind,
            request_id: Some(request_id),
            requester_id: Some(requester_id),
        }
    }

    pub fn refreshed() -> Self {
        Self {
            kind: LeaveEventKind::Refreshed,
            request_id: None,
            requester_id: None,
        }
    }
}

pub type LeaveListener = Arc<dyn Fn(&LeaveEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct LeaveNotifier {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, LeaveListener)>>,
}

impl LeaveNotifier {
    pub fn subscribe(&self, listener: LeaveListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push((id, listener)),
            Err(poisoned) => poisoned.into_inner().push((id, listener)),
        }
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = match self.listeners.write() {
            Ok(listeners) => listeners,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn publish(&self, event: &LeaveEvent) {
        // listeners may subscribe from inside a callback
        let snapshot: Vec<LeaveListener> = match self.listeners.read() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect(),
        };
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }
}
