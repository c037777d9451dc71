use thiserror::Error;
use tokio::sync::AcquireError;
use tokio_cron_scheduler::JobSchedulerError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),

    #[error("Execution tier closed")]
    TierClosed(#[from] AcquireError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
