use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schedule_validator::ValidationResult;
use crate::notification::{Notification, Schedule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EditorEffect {
    LoadNotification {
        uuid: Uuid,
    },
    SetTitleAndContent {
        title: Option<String>,
        content: Option<String>,
    },
    SaveNotification {
        title: Option<String>,
        content: Option<String>,
        schedule: Option<Schedule>,
        can_pin_notification: bool,
    },
    UpdateNotification {
        uuid: Uuid,
        title: Option<String>,
        content: Option<String>,
        schedule: Option<Schedule>,
    },
    ShowConfirmExitEditor,
    CloseEditor,
    ShowConfirmDelete,
    DeleteNotification(Notification),
    ShowDatePicker(NaiveDate),
    ShowTimePicker(NaiveTime),
    ShowNotification(Notification),
    ScheduleNotification(Notification),
    CancelNotificationSchedule(Uuid),
    ValidateSchedule {
        date: NaiveDate,
        time: NaiveTime,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EditorEvent {
    NotificationLoaded(Option<Notification>),
    NotificationSaved(Notification),
    NotificationUpdated(Notification),
    ScheduleValidated(ValidationResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EditorViewEffect {
    SetTitle(Option<String>),
    SetContent(Option<String>),
    CloseEditorView,
    ShowConfirmExitEditorDialog,
    ShowConfirmDeleteDialog,
    ShowDatePickerDialog(NaiveDate),
    ShowTimePickerDialog(NaiveTime),
}
