use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleType {
    OneTime,
    Daily,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::OneTime => "OneTime",
            ScheduleType::Daily => "Daily",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OneTime" => Some(ScheduleType::OneTime),
            "Daily" => Some(ScheduleType::Daily),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub schedule_type: ScheduleType,
}

impl Schedule {
    pub fn new(date: NaiveDate, time: NaiveTime, schedule_type: ScheduleType) -> Self {
        Self {
            date,
            time,
            schedule_type,
        }
    }

    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// A reminder that can be pinned to the notification tray.
///
/// `uuid` is assigned once when the notification is first saved and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub uuid: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_pinned: bool,
    pub schedule: Option<Schedule>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Copy of this notification with the soft-delete flag cleared.
    pub fn restored(self) -> Self {
        Self {
            deleted: false,
            ..self
        }
    }
}

/// Flat row shape of the `notifications` table.
#[derive(Debug, FromRow)]
pub(crate) struct NotificationRow {
    pub uuid: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_pinned: bool,
    pub schedule_date: Option<NaiveDate>,
    pub schedule_time: Option<NaiveTime>,
    pub schedule_type: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        let schedule = match (row.schedule_date, row.schedule_time, row.schedule_type) {
            (Some(date), Some(time), Some(schedule_type)) => ScheduleType::parse(&schedule_type)
                .map(|schedule_type| Schedule::new(date, time, schedule_type)),
            _ => None,
        };

        Self {
            uuid: row.uuid,
            title: row.title,
            content: row.content,
            is_pinned: row.is_pinned,
            schedule,
            deleted: row.deleted,
            created_at: row.created_at,
        }
    }
}
