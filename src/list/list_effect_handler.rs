use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use uuid::Uuid;

use super::list_models::{ListEffect, ListEvent, ListViewEffect};
use crate::effects::{EffectHandler, EffectOutput, Tier};
use crate::error::{AppError, Result};
use crate::notification::{Notification, NotificationRepository};
use crate::state::AppState;
use crate::system::{NotificationScheduler, Notifier};

type Output = EffectOutput<ListEvent, ListViewEffect>;

/// Side effects of the notifications list screen.
pub struct ListEffectHandler {
    repository: Arc<dyn NotificationRepository>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn NotificationScheduler>,
}

impl ListEffectHandler {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn NotificationScheduler>,
    ) -> Self {
        Self {
            repository,
            notifier,
            scheduler,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.repository.clone(),
            state.notifier.clone(),
            state.scheduler.clone(),
        )
    }

    /// Forwards every snapshot until the owning session drops this future.
    async fn load_notifications(&self, output: &Output) -> Result<()> {
        let mut notifications = self.repository.notifications();
        while let Some(snapshot) = notifications.next().await {
            output.dispatch_event(ListEvent::NotificationsLoaded(snapshot?));
        }
        Ok(())
    }

    /// Only run once at startup, so a one-shot read is enough.
    async fn check_notifications_visibility(&self) -> Result<()> {
        let pinned = self.repository.pinned_notifications().await?;
        self.notifier.check_notifications_visibility(&pinned).await
    }

    // The tray changes before the pin flag is committed. Unpinning leaves a
    // short window where the row still says pinned.
    async fn toggle_notification_pin_status(&self, notification: Notification) -> Result<()> {
        if notification.is_pinned {
            self.notifier.dismiss_notification(&notification).await?;
        } else {
            self.notifier.show_notification(&notification).await?;
        }

        self.repository
            .update_pin_status(notification.uuid, !notification.is_pinned)
            .await
    }

    async fn delete_notification(&self, notification: Notification, output: &Output) -> Result<()> {
        let deleted = self.repository.delete_notification(&notification).await?;
        output.dispatch_event(ListEvent::NotificationDeleted(deleted));
        Ok(())
    }

    async fn undo_deleted_notification(&self, uuid: Uuid, output: &Output) -> Result<()> {
        let notification = self
            .repository
            .notification(uuid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {}", uuid)))?;
        self.repository.undo_notification_delete(&notification).await?;

        output.dispatch_event(ListEvent::RestoredDeletedNotification(notification.restored()));
        Ok(())
    }

    async fn remove_schedule(&self, uuid: Uuid, output: &Output) -> Result<()> {
        self.repository.remove_schedule(uuid).await?;
        output.dispatch_event(ListEvent::RemovedNotificationSchedule(uuid));
        Ok(())
    }

    async fn check_permission_to_post_notification(&self, output: &Output) -> Result<()> {
        let permitted = self.notifier.has_permission_to_post_notifications().await?;
        output.dispatch_event(ListEvent::HasPermissionToPostNotifications(permitted));
        Ok(())
    }
}

#[async_trait]
impl EffectHandler for ListEffectHandler {
    type Effect = ListEffect;
    type Event = ListEvent;
    type ViewEffect = ListViewEffect;

    fn tier(effect: &ListEffect) -> Tier {
        match effect {
            ListEffect::LoadNotifications => Tier::Subscription,

            ListEffect::CheckNotificationsVisibility
            | ListEffect::ToggleNotificationPinStatus(_)
            | ListEffect::DeleteNotification(_)
            | ListEffect::UndoDeletedNotification(_)
            | ListEffect::RemoveSchedule(_) => Tier::Io,

            ListEffect::CancelNotificationSchedule(_)
            | ListEffect::ScheduleNotification(_)
            | ListEffect::CheckPermissionToPostNotification => Tier::Background,

            ListEffect::ShowUndoDeleteNotification(_)
            | ListEffect::RequestNotificationPermission => Tier::Ui,
        }
    }

    async fn handle(&self, effect: ListEffect, output: &Output) -> Result<()> {
        match effect {
            ListEffect::LoadNotifications => self.load_notifications(output).await,

            ListEffect::CheckNotificationsVisibility => self.check_notifications_visibility().await,

            ListEffect::ToggleNotificationPinStatus(notification) => {
                self.toggle_notification_pin_status(notification).await
            }

            ListEffect::DeleteNotification(notification) => {
                self.delete_notification(notification, output).await
            }

            ListEffect::UndoDeletedNotification(uuid) => {
                self.undo_deleted_notification(uuid, output).await
            }

            ListEffect::ShowUndoDeleteNotification(notification) => {
                output.emit_view_effect(ListViewEffect::UndoNotificationDeleteViewEffect(
                    notification.uuid,
                ));
                Ok(())
            }

            ListEffect::CancelNotificationSchedule(uuid) => self.scheduler.cancel(uuid).await,

            ListEffect::RemoveSchedule(uuid) => self.remove_schedule(uuid, output).await,

            ListEffect::ScheduleNotification(notification) => {
                self.scheduler.schedule_notification(&notification).await
            }

            ListEffect::CheckPermissionToPostNotification => {
                self.check_permission_to_post_notification(output).await
            }

            ListEffect::RequestNotificationPermission => {
                output.emit_view_effect(ListViewEffect::RequestNotificationPermissionViewEffect);
                Ok(())
            }
        }
    }
}
