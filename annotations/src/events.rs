// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Change notification bus
//!
//! Services publish an event after every effective mutation, once the
//! project lock has been released. Listeners run on the publishing thread.
//! A listener that returns an error or panics is logged and skipped; the
//! remaining listeners still run.

use log::{debug, error};
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationEvent {
    /// The tag catalog itself changed (tags added, edited, reordered, reloaded).
    TagsChanged { project: String },
    /// Tags attached to one object changed.
    AssignmentsChanged { project: String, fqn: String },
    GroupsChanged { project: String },
}

impl AnnotationEvent {
    pub fn project(&self) -> &str {
        match self {
            AnnotationEvent::TagsChanged { project }
            | AnnotationEvent::AssignmentsChanged { project, .. }
            | AnnotationEvent::GroupsChanged { project } => project,
        }
    }
}

pub type ListenerResult = Result<(), Box<dyn Error + Send + Sync>>;

pub trait AnnotationListener: Send + Sync {
    fn on_event(&self, event: &AnnotationEvent) -> ListenerResult;
}

impl<F> AnnotationListener for F
where
    F: Fn(&AnnotationEvent) -> ListenerResult + Send + Sync,
{
    fn on_event(&self, event: &AnnotationEvent) -> ListenerResult {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct ChangeBus {
    next_id: AtomicU64,
    closed: AtomicBool,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn AnnotationListener>)>>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn AnnotationListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push((id, listener)),
            Err(_) => error!("🚨 CRITICAL: change bus lock poisoned in subscribe"),
        }
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        match self.listeners.write() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(listener_id, _)| *listener_id != id);
                listeners.len() != before
            }
            Err(_) => {
                error!("🚨 CRITICAL: change bus lock poisoned in unsubscribe");
                false
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    /// Stop delivering events and drop all listeners.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        match self.listeners.write() {
            Ok(mut listeners) => listeners.clear(),
            Err(_) => error!("🚨 CRITICAL: change bus lock poisoned in close"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Deliver `event` to a snapshot of the current listeners. Returns the
    /// number of listeners that handled it without failing.
    pub fn publish(&self, event: &AnnotationEvent) -> usize {
        if self.is_closed() {
            debug!("Change bus closed, dropping {:?}", event);
            return 0;
        }
        let snapshot: Vec<Arc<dyn AnnotationListener>> = match self.listeners.read() {
            Ok(listeners) => listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect(),
            Err(_) => {
                error!("🚨 CRITICAL: change bus lock poisoned in publish");
                return 0;
            }
        };

        let mut delivered = 0;
        for listener in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => error!("Annotation listener failed on {:?}: {}", event, err),
                Err(panic) => error!(
                    "Annotation listener panicked on {:?}: {}",
                    event,
                    panic_message(panic.as_ref())
                ),
            }
        }
        delivered
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
