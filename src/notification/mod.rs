// Declare submodules
pub mod notification_models;
pub mod notification_repository;

// Re-export public items
pub use notification_models::{Notification, Schedule, ScheduleType};
pub use notification_repository::{
    NotificationRepository, NotificationsStream, SqliteNotificationRepository,
};
