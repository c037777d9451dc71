use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use super::notification_models::{Notification, NotificationRow, Schedule};
use crate::error::{AppError, Result};

/// Full-list snapshots of the live notifications. Never ends on its own;
/// dropping it unsubscribes.
pub type NotificationsStream = BoxStream<'static, Result<Vec<Notification>>>;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Direct lookup by uuid. Soft-deleted notifications are returned too.
    async fn notification(&self, uuid: Uuid) -> Result<Option<Notification>>;

    /// Subscribes to the live collection. Each call starts a fresh
    /// subscription that emits the current snapshot first.
    fn notifications(&self) -> NotificationsStream;

    async fn pinned_notifications(&self) -> Result<Vec<Notification>>;

    async fn save(
        &self,
        uuid: Uuid,
        title: Option<String>,
        content: Option<String>,
        is_pinned: bool,
        schedule: Option<Schedule>,
    ) -> Result<Notification>;

    async fn update_notification(&self, notification: Notification) -> Result<Notification>;

    async fn update_pin_status(&self, uuid: Uuid, is_pinned: bool) -> Result<()>;

    /// Soft-deletes the notification and returns the removed copy.
    async fn delete_notification(&self, notification: &Notification) -> Result<Notification>;

    async fn undo_notification_delete(&self, notification: &Notification) -> Result<()>;

    async fn remove_schedule(&self, uuid: Uuid) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteNotificationRepository {
    pool: SqlitePool,
    changes: Arc<watch::Sender<u64>>,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            pool,
            changes: Arc::new(changes),
        }
    }

    async fn find_active(&self) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE deleted = FALSE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    fn notify_changed(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn notification(&self, uuid: Uuid) -> Result<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Notification::from))
    }

    fn notifications(&self) -> NotificationsStream {
        let repository = self.clone();

        WatchStream::new(self.changes.subscribe())
            .then(move |_| {
                let repository = repository.clone();
                async move { repository.find_active().await }
            })
            .boxed()
    }

    async fn pinned_notifications(&self) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications
             WHERE is_pinned = TRUE AND deleted = FALSE
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn save(
        &self,
        uuid: Uuid,
        title: Option<String>,
        content: Option<String>,
        is_pinned: bool,
        schedule: Option<Schedule>,
    ) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "INSERT INTO notifications
                (uuid, title, content, is_pinned, schedule_date, schedule_time, schedule_type, deleted, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, FALSE, ?)
             RETURNING *",
        )
        .bind(uuid)
        .bind(title)
        .bind(content)
        .bind(is_pinned)
        .bind(schedule.map(|s| s.date))
        .bind(schedule.map(|s| s.time))
        .bind(schedule.map(|s| s.schedule_type.as_str()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Saved notification {}", uuid);
        self.notify_changed();
        Ok(row.into())
    }

    async fn update_notification(&self, notification: Notification) -> Result<Notification> {
        let schedule = notification.schedule;
        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET
                title = ?,
                content = ?,
                is_pinned = ?,
                schedule_date = ?,
                schedule_time = ?,
                schedule_type = ?,
                deleted = ?
             WHERE uuid = ?
             RETURNING *",
        )
        .bind(&notification.title)
        .bind(&notification.content)
        .bind(notification.is_pinned)
        .bind(schedule.map(|s| s.date))
        .bind(schedule.map(|s| s.time))
        .bind(schedule.map(|s| s.schedule_type.as_str()))
        .bind(notification.deleted)
        .bind(notification.uuid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {}", notification.uuid)))?;

        self.notify_changed();
        Ok(row.into())
    }

    async fn update_pin_status(&self, uuid: Uuid, is_pinned: bool) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_pinned = ? WHERE uuid = ?")
            .bind(is_pinned)
            .bind(uuid)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Notification {} pinned = {}", uuid, is_pinned);
        self.notify_changed();
        Ok(())
    }

    async fn delete_notification(&self, notification: &Notification) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET deleted = TRUE WHERE uuid = ? RETURNING *",
        )
        .bind(notification.uuid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {}", notification.uuid)))?;

        tracing::info!("Deleted notification {}", notification.uuid);
        self.notify_changed();
        Ok(row.into())
    }

    async fn undo_notification_delete(&self, notification: &Notification) -> Result<()> {
        sqlx::query("UPDATE notifications SET deleted = FALSE WHERE uuid = ?")
            .bind(notification.uuid)
            .execute(&self.pool)
            .await?;

        tracing::info!("Restored notification {}", notification.uuid);
        self.notify_changed();
        Ok(())
    }

    async fn remove_schedule(&self, uuid: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE notifications
             SET schedule_date = NULL, schedule_time = NULL, schedule_type = NULL
             WHERE uuid = ?",
        )
        .bind(uuid)
        .execute(&self.pool)
        .await?;

        self.notify_changed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, run_migrations};
    use crate::notification::notification_models::ScheduleType;
    use chrono::{NaiveDate, NaiveTime};

    async fn repository() -> SqliteNotificationRepository {
        let pool = create_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteNotificationRepository::new(pool)
    }

    fn daily_at_nine() -> Schedule {
        Schedule::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ScheduleType::Daily,
        )
    }

    async fn save(repo: &SqliteNotificationRepository, title: &str, pinned: bool) -> Notification {
        repo.save(Uuid::new_v4(), Some(title.to_string()), None, pinned, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let repo = repository().await;
        let uuid = Uuid::new_v4();

        let saved = repo
            .save(
                uuid,
                Some("Call mom".to_string()),
                Some("Sunday".to_string()),
                true,
                Some(daily_at_nine()),
            )
            .await
            .unwrap();

        assert_eq!(saved.uuid, uuid);
        assert_eq!(saved.schedule, Some(daily_at_nine()));
        assert!(!saved.deleted);
        assert_eq!(repo.notification(uuid).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_missing_notification_is_none() {
        let repo = repository().await;
        assert_eq!(repo.notification(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let repo = repository().await;
        let saved = save(&repo, "Old", false).await;

        let updated = repo
            .update_notification(Notification {
                title: Some("New".to_string()),
                content: None,
                schedule: Some(daily_at_nine()),
                ..saved.clone()
            })
            .await
            .unwrap();

        assert_eq!(updated.title.as_deref(), Some("New"));
        assert_eq!(updated.schedule, Some(daily_at_nine()));
        assert_eq!(updated.created_at, saved.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_notification_fails() {
        let repo = repository().await;
        let saved = save(&repo, "Ghost", false).await;
        let ghost = Notification {
            uuid: Uuid::new_v4(),
            ..saved
        };

        let result = repo.update_notification(ghost).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pinned_notifications_excludes_unpinned_and_deleted() {
        let repo = repository().await;
        let pinned = save(&repo, "Pinned", true).await;
        let _unpinned = save(&repo, "Unpinned", false).await;
        let deleted = save(&repo, "Deleted", true).await;
        repo.delete_notification(&deleted).await.unwrap();

        let result = repo.pinned_notifications().await.unwrap();
        assert_eq!(result, vec![pinned]);
    }

    #[tokio::test]
    async fn test_delete_then_undo_round_trip() {
        let repo = repository().await;
        let saved = save(&repo, "Water plants", true).await;

        let removed = repo.delete_notification(&saved).await.unwrap();
        assert!(removed.deleted);
        assert_eq!(repo.pinned_notifications().await.unwrap(), vec![]);

        repo.undo_notification_delete(&removed).await.unwrap();
        assert_eq!(repo.notification(saved.uuid).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_update_pin_status_and_remove_schedule() {
        let repo = repository().await;
        let uuid = Uuid::new_v4();
        repo.save(uuid, None, None, false, Some(daily_at_nine()))
            .await
            .unwrap();

        repo.update_pin_status(uuid, true).await.unwrap();
        repo.remove_schedule(uuid).await.unwrap();

        let loaded = repo.notification(uuid).await.unwrap().unwrap();
        assert!(loaded.is_pinned);
        assert_eq!(loaded.schedule, None);
    }

    #[tokio::test]
    async fn test_notifications_stream_emits_snapshot_per_change() {
        let repo = repository().await;
        let mut stream = repo.notifications();

        assert!(stream.next().await.unwrap().unwrap().is_empty());

        let first = save(&repo, "First", false).await;
        assert_eq!(stream.next().await.unwrap().unwrap(), vec![first.clone()]);

        repo.delete_notification(&first).await.unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notifications_stream_is_restartable() {
        let repo = repository().await;
        let saved = save(&repo, "Standup", false).await;

        let mut first = repo.notifications();
        assert_eq!(first.next().await.unwrap().unwrap(), vec![saved.clone()]);
        drop(first);

        let mut second = repo.notifications();
        assert_eq!(second.next().await.unwrap().unwrap(), vec![saved]);
    }
}
