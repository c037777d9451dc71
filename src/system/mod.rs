pub mod notifier;
pub mod scheduler;

pub use notifier::{NotificationTray, Notifier, PostedNotification};
pub use scheduler::{next_trigger, CronNotificationScheduler, NotificationScheduler};
