//! The notification list as a reducer over feed events.

use std::collections::HashSet;

use crate::model::Notification;
use crate::model::NotificationStatus;

/// Something that changes the notification list.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A fetched batch, in server order.
    Loaded(Vec<Notification>),
    /// A new notification from the socket.
    Pushed(Notification),
    /// A notification was deleted, locally or by a peer.
    Removed(String),
    /// A notification was marked read, locally or by a peer.
    MarkedRead(String),
}

/// Derived counts, always computed from the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedCounts {
    pub unread: usize,
    pub read: usize,
    pub total: usize,
}

/// The client-held notification list.
///
/// Pushed items are prepended. A loaded batch replaces the list in server
/// order, except that items pushed since the previous load and missing from
/// the batch stay at the front, so a push that races the fetch is not lost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    items: Vec<Notification>,
    pushed_since_load: HashSet<String>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event and returns the next state.
    pub fn apply(mut self, event: FeedEvent) -> Self {
        match event {
            FeedEvent::Loaded(batch) => {
                let loaded: HashSet<&str> = batch.iter().map(|n| n.id.as_str()).collect();
                let mut items: Vec<Notification> = self
                    .items
                    .into_iter()
                    .filter(|n| {
                        self.pushed_since_load.contains(&n.id) && !loaded.contains(n.id.as_str())
                    })
                    .collect();
                items.extend(batch);
                self.items = items;
                self.pushed_since_load.clear();
            }
            FeedEvent::Pushed(notification) => {
                self.pushed_since_load.insert(notification.id.clone());
                self.items.insert(0, notification);
            }
            FeedEvent::Removed(id) => {
                self.items.retain(|n| n.id != id);
                self.pushed_since_load.remove(&id);
            }
            FeedEvent::MarkedRead(id) => {
                for item in self.items.iter_mut().filter(|n| n.id == id) {
                    item.status = NotificationStatus::Read;
                }
            }
        }
        self
    }

    /// Replays events from an empty list.
    pub fn replay(events: impl IntoIterator<Item = FeedEvent>) -> Self {
        events.into_iter().fold(Self::new(), Self::apply)
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| n.is_unread()).count()
    }

    pub fn read_count(&self) -> usize {
        self.total() - self.unread_count()
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn counts(&self) -> FeedCounts {
        FeedCounts {
            unread: self.unread_count(),
            read: self.read_count(),
            total: self.total(),
        }
    }
}
