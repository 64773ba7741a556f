//! The mounted notification feed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::warn;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::FeedCounts;
use super::FeedEvent;
use super::FeedState;
use super::SocketConnector;
use super::SocketEvent;
use crate::api::ListQuery;
use crate::api::NotificationApi;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::model::Notification;

const FLUSH_POLL: Duration = Duration::from_millis(10);

/// Asks the user to confirm a deletion.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm_delete(&self, notification: &Notification) -> bool;
}

/// Plays the audible alert for a pushed notification.
pub trait AlertSink: Send + Sync {
    fn alert(&self, notification: &Notification);
}

/// An [`AlertSink`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlert;

impl AlertSink for NoAlert {
    fn alert(&self, _notification: &Notification) {}
}

/// Options of a mounted feed.
#[derive(Clone)]
pub struct FeedOptions {
    /// Page size of the initial fetch.
    pub page_size: usize,
    pub alert: Arc<dyn AlertSink>,
}

impl FeedOptions {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            alert: Arc::new(NoAlert),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.feed_page_size)
    }

    pub fn alert(mut self, alert: Arc<dyn AlertSink>) -> Self {
        self.alert = alert;
        self
    }
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::new(20)
    }
}

/// Live, client-held list of notifications.
///
/// Mounting subscribes to the socket once and fetches the first page.
/// Socket events and local mutations all go through [`FeedState::apply`].
/// Unmounting (or dropping the feed) closes the socket and stops the event
/// task.
///
/// Mutations are optimistic. If the server call fails, the feed reloads the
/// first page to converge on server state and returns the error; no peer
/// event is emitted in that case.
///
/// # Example
///
/// ```ignore
/// let feed = NotificationFeed::mount(
///     Arc::new(client.clone()),
///     &WsConnector::from_config(client.config())?,
///     Arc::new(PromptConfirm),
///     FeedOptions::from_config(client.config()),
/// )
/// .await;
///
/// let mut updates = feed.subscribe();
/// while updates.changed().await.is_ok() {
///     println!("{} unread", updates.borrow().unread_count());
/// }
/// ```
pub struct NotificationFeed {
    api: Arc<dyn NotificationApi>,
    confirm: Arc<dyn Confirm>,
    state: Arc<watch::Sender<FeedState>>,
    outbound: mpsc::Sender<SocketEvent>,
    page_size: usize,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl NotificationFeed {
    /// Opens the socket subscription, then fetches the first page.
    ///
    /// A failed initial fetch is logged and leaves the list empty; socket
    /// events still arrive and [`reload`](Self::reload) can retry.
    pub async fn mount(
        api: Arc<dyn NotificationApi>,
        connector: &dyn SocketConnector,
        confirm: Arc<dyn Confirm>,
        options: FeedOptions,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let channel = connector.open(shutdown.clone());
        let (state, _) = watch::channel(FeedState::new());
        let state = Arc::new(state);

        let task = tokio::spawn(inbound_task(
            channel.inbound,
            Arc::clone(&state),
            options.alert,
            shutdown.clone(),
        ));

        let feed = Self {
            api,
            confirm,
            state,
            outbound: channel.outbound,
            page_size: options.page_size,
            shutdown,
            task: Some(task),
        };

        if let Err(e) = feed.reload().await {
            warn!("Initial notification fetch failed: {}", e);
        }
        feed
    }

    /// Fetches the first page again and merges it into the list.
    pub async fn reload(&self) -> Result<(), Error> {
        let page = self
            .api
            .fetch_notifications(&ListQuery::new(0, self.page_size))
            .await?;
        debug!("Loaded {} notification(s)", page.len());
        self.apply(FeedEvent::Loaded(page.into_records()));
        Ok(())
    }

    /// Snapshot of the list.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state.borrow().items().to_vec()
    }

    /// Snapshot of the whole state.
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn counts(&self) -> FeedCounts {
        self.state.borrow().counts()
    }

    pub fn unread_count(&self) -> usize {
        self.state.borrow().unread_count()
    }

    /// Receiver notified on every change to the list.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Marks a notification read: locally first, then on the server, then
    /// tells peers.
    ///
    /// Ids the list does not hold, such as ones older than the first page,
    /// still go to the server.
    pub async fn mark_as_read(&self, id: &str) -> Result<(), Error> {
        self.apply(FeedEvent::MarkedRead(id.to_string()));

        match self.api.mark_notification_read(id).await {
            Ok(()) => {
                self.emit(SocketEvent::MarkAsRead { id: id.to_string() });
                Ok(())
            }
            Err(e) => {
                warn!("Failed to mark notification {} read: {}", id, e);
                self.reconcile().await;
                Err(e)
            }
        }
    }

    /// Deletes a notification after confirmation.
    ///
    /// Returns `Ok(false)` if the user declined. An id the list does not
    /// hold is confirmed with a bare record carrying only the id.
    pub async fn delete_notification(&self, id: &str) -> Result<bool, Error> {
        let held = self.state.borrow().get(id).cloned();
        let notification = held.unwrap_or_else(|| Notification::new(id, String::new()));
        if !self.confirm.confirm_delete(&notification).await {
            debug!("Deletion of notification {} declined", id);
            return Ok(false);
        }

        self.apply(FeedEvent::Removed(id.to_string()));

        match self.api.delete_notification(id).await {
            Ok(()) => {
                self.emit(SocketEvent::DeleteNotify(id.to_string()));
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to delete notification {}: {}", id, e);
                self.reconcile().await;
                Err(e)
            }
        }
    }

    /// Waits up to `timeout` for queued peer events to reach the socket.
    ///
    /// Returns `false` if any were still waiting, which happens while the
    /// socket cannot connect.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let drained = async {
            while !self.outbound.is_closed()
                && self.outbound.capacity() < self.outbound.max_capacity()
            {
                tokio::time::sleep(FLUSH_POLL).await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok() && !self.outbound.is_closed()
    }

    /// Closes the socket and waits for the event task to finish.
    pub async fn unmount(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Notification event task failed: {}", e);
        }
    }

    fn apply(&self, event: FeedEvent) {
        apply_event(&self.state, event);
    }

    fn emit(&self, event: SocketEvent) {
        if let Err(e) = self.outbound.try_send(event) {
            warn!("Peer sync event not sent: {}", e);
        }
    }

    async fn reconcile(&self) {
        if let Err(e) = self.reload().await {
            warn!("Failed to reload notifications: {}", e);
        }
    }
}

impl Drop for NotificationFeed {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn apply_event(state: &watch::Sender<FeedState>, event: FeedEvent) {
    state.send_modify(|current| {
        *current = std::mem::take(current).apply(event);
    });
}

async fn inbound_task(
    mut inbound: mpsc::Receiver<SocketEvent>,
    state: Arc<watch::Sender<FeedState>>,
    alert: Arc<dyn AlertSink>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = inbound.recv() => {
                let Some(event) = event else { break };
                debug!("Socket event: {:?}", event);
                if let SocketEvent::Notify(notification) = &event {
                    alert.alert(notification);
                }
                apply_event(&state, event.into());
            }
        }
    }
}
