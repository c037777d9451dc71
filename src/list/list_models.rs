use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notification::Notification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ListEffect {
    LoadNotifications,
    CheckNotificationsVisibility,
    ToggleNotificationPinStatus(Notification),
    DeleteNotification(Notification),
    UndoDeletedNotification(Uuid),
    ShowUndoDeleteNotification(Notification),
    CancelNotificationSchedule(Uuid),
    RemoveSchedule(Uuid),
    ScheduleNotification(Notification),
    CheckPermissionToPostNotification,
    RequestNotificationPermission,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ListEvent {
    NotificationsLoaded(Vec<Notification>),
    NotificationDeleted(Notification),
    RestoredDeletedNotification(Notification),
    RemovedNotificationSchedule(Uuid),
    HasPermissionToPostNotifications(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ListViewEffect {
    UndoNotificationDeleteViewEffect(Uuid),
    RequestNotificationPermissionViewEffect,
}
