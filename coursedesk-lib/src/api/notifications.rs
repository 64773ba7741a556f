//! Notification endpoints

use async_trait::async_trait;

use super::ListQuery;
use super::Page;
use super::Resource;
use crate::AdminClient;
use crate::error::Error;
use crate::model::Notification;

/// Server operations the notification feed depends on.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// `GET /api/notifications?page&limit`
    async fn fetch_notifications(&self, query: &ListQuery) -> Result<Page<Notification>, Error>;

    /// `PATCH /api/notifications/:id/read`
    async fn mark_notification_read(&self, id: &str) -> Result<(), Error>;

    /// `DELETE /api/notifications/:id`
    async fn delete_notification(&self, id: &str) -> Result<(), Error>;
}

#[async_trait]
impl NotificationApi for AdminClient {
    async fn fetch_notifications(&self, query: &ListQuery) -> Result<Page<Notification>, Error> {
        self.list(Resource::Notifications, query).await
    }

    async fn mark_notification_read(&self, id: &str) -> Result<(), Error> {
        let path = format!("{}/{}/read", Resource::Notifications.path(), id);
        self.patch::<serde_json::Value>(&path, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn delete_notification(&self, id: &str) -> Result<(), Error> {
        let path = format!("{}/{}", Resource::Notifications.path(), id);
        self.delete::<serde_json::Value>(&path).await?;
        Ok(())
    }
}
