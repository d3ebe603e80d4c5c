//! Customer notifications derived from order events.
//!
//! A background worker thread subscribes to the order event bus and turns
//! each event into a notification for the order's owner. The HTTP layer
//! reads and acknowledges them through [`NotificationCenter`].

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use shopfront_core::{NotificationId, UserId};
use shopfront_events::{EventBus, Subscription};
use shopfront_orders::OrderEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub owner_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    /// Notification an order event produces for the order's owner.
    pub fn from_order_event(event: &OrderEvent) -> Self {
        let (kind, title, message, at) = match event {
            OrderEvent::Placed(e) => (
                NotificationKind::Success,
                "Order placed".to_string(),
                format!("Your order {} has been placed.", e.order_id),
                e.occurred_at,
            ),
            OrderEvent::StatusChanged(e) => (
                NotificationKind::Info,
                "Order update".to_string(),
                format!("Order {} is now {}", e.order_id, e.to),
                e.occurred_at,
            ),
        };
        Self {
            id: NotificationId::new(),
            owner_id: event.owner_id(),
            kind,
            title,
            message,
            created_at: at,
            read: false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("notification store lock poisoned")]
    Poisoned,
}

/// Owner-scoped notification inbox.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    inner: RwLock<HashMap<UserId, Vec<Notification>>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut map = self.inner.write().map_err(|_| NotificationError::Poisoned)?;
        map.entry(notification.owner_id).or_default().push(notification);
        Ok(())
    }

    /// The owner's notifications, newest first.
    pub fn list(&self, owner_id: UserId) -> Result<Vec<Notification>, NotificationError> {
        let map = self.inner.read().map_err(|_| NotificationError::Poisoned)?;
        let mut list = map.get(&owner_id).cloned().unwrap_or_default();
        list.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(list)
    }

    /// `None` when the id is unknown or belongs to someone else.
    pub fn mark_read(&self, owner_id: UserId, id: NotificationId) -> Result<Option<Notification>, NotificationError> {
        let mut map = self.inner.write().map_err(|_| NotificationError::Poisoned)?;
        Ok(map
            .get_mut(&owner_id)
            .and_then(|list| list.iter_mut().find(|n| n.id == id))
            .map(|n| {
                n.read = true;
                n.clone()
            }))
    }
}

/// Handle to stop and join the notification worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

#[derive(Debug)]
pub struct NotificationWorker;

impl NotificationWorker {
    /// Subscribe to `bus` and deliver every order event to `center` on a
    /// dedicated thread.
    pub fn spawn<B>(bus: &B, center: Arc<NotificationCenter>) -> std::io::Result<WorkerHandle>
    where
        B: EventBus<OrderEvent> + ?Sized,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();

        let join = thread::Builder::new()
            .name("notifications".to_string())
            .spawn(move || worker_loop(sub, shutdown_rx, &center))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop(sub: Subscription<OrderEvent>, shutdown_rx: mpsc::Receiver<()>, center: &NotificationCenter) {
    let tick = Duration::from_millis(250);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(event) => {
                let notification = Notification::from_order_event(&event);
                debug!(owner_id = %notification.owner_id, title = %notification.title, "notification created");
                if let Err(err) = center.push(notification) {
                    warn!(error = %err, "dropping notification");
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
