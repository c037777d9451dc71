use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::notification::Notification;

/// The surface pinned notifications are posted to.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show_notification(&self, notification: &Notification) -> Result<()>;

    async fn dismiss_notification(&self, notification: &Notification) -> Result<()>;

    async fn has_permission_to_post_notifications(&self) -> Result<bool>;

    /// Brings the surface in line with `pinned`: missing entries are posted
    /// again and entries that are no longer pinned are dismissed.
    async fn check_notifications_visibility(&self, pinned: &[Notification]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedNotification {
    pub title: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
}

/// In-process notification tray. Entries are ongoing until dismissed.
#[derive(Clone)]
pub struct NotificationTray {
    posted: Arc<DashMap<Uuid, PostedNotification>>,
    permitted: Arc<AtomicBool>,
}

impl NotificationTray {
    pub fn new(permitted: bool) -> Self {
        Self {
            posted: Arc::new(DashMap::new()),
            permitted: Arc::new(AtomicBool::new(permitted)),
        }
    }

    pub fn is_posted(&self, uuid: &Uuid) -> bool {
        self.posted.contains_key(uuid)
    }

    pub fn posted(&self, uuid: &Uuid) -> Option<PostedNotification> {
        self.posted.get(uuid).map(|entry| entry.value().clone())
    }

    pub fn posted_count(&self) -> usize {
        self.posted.len()
    }

    fn post(&self, notification: &Notification) -> Result<()> {
        if !self.permitted.load(Ordering::SeqCst) {
            return Err(AppError::PermissionDenied(
                "posting notifications is not allowed".to_string(),
            ));
        }

        let entry = PostedNotification {
            title: notification.title.clone().unwrap_or_default(),
            content: notification.content.clone().unwrap_or_default(),
            posted_at: Utc::now(),
        };
        self.posted.insert(notification.uuid, entry);
        tracing::info!("Posted notification {} to tray", notification.uuid);
        Ok(())
    }
}

impl Default for NotificationTray {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Notifier for NotificationTray {
    async fn show_notification(&self, notification: &Notification) -> Result<()> {
        self.post(notification)
    }

    async fn dismiss_notification(&self, notification: &Notification) -> Result<()> {
        if self.posted.remove(&notification.uuid).is_some() {
            tracing::info!("Dismissed notification {} from tray", notification.uuid);
        }
        Ok(())
    }

    async fn has_permission_to_post_notifications(&self) -> Result<bool> {
        Ok(self.permitted.load(Ordering::SeqCst))
    }

    async fn check_notifications_visibility(&self, pinned: &[Notification]) -> Result<()> {
        let pinned_ids: HashSet<Uuid> = pinned.iter().map(|n| n.uuid).collect();

        let stale: Vec<Uuid> = self
            .posted
            .iter()
            .map(|entry| *entry.key())
            .filter(|uuid| !pinned_ids.contains(uuid))
            .collect();
        for uuid in stale {
            self.posted.remove(&uuid);
            tracing::debug!("Dismissed stale tray entry {}", uuid);
        }

        for notification in pinned.iter().filter(|n| !self.is_posted(&n.uuid)) {
            self.post(notification)?;
        }

        Ok(())
    }
}
