use std::str::FromStr;
use std::sync::Arc;

use crate::editor::ScheduleValidator;
use crate::effects::ExecutionTiers;
use crate::error::{AppError, Result};
use crate::notification::NotificationRepository;
use crate::preferences::Theme;
use crate::system::{NotificationScheduler, Notifier};

/// Shared collaborators handed to every effect handler.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn NotificationRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub scheduler: Arc<dyn NotificationScheduler>,
    pub validator: ScheduleValidator,
    pub tiers: ExecutionTiers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub io_concurrency: usize,
    pub background_concurrency: usize,
    pub notifications_permitted: bool,
    pub theme: Theme,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://pin_reminders.db?mode=rwc".to_string()),
            io_concurrency: parse_or(&lookup, "IO_CONCURRENCY", 64)?,
            background_concurrency: parse_or(&lookup, "BACKGROUND_CONCURRENCY", default_parallelism)?,
            notifications_permitted: parse_or(&lookup, "NOTIFICATIONS_PERMITTED", true)?,
            theme: parse_or(&lookup, "THEME", Theme::Auto)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, value))),
        None => Ok(default),
    }
}
