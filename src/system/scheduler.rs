use async_trait::async_trait;
use chrono::{Days, NaiveDateTime};
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::notifier::Notifier;
use crate::clock::Clock;
use crate::error::Result;
use crate::notification::{Notification, NotificationRepository, Schedule, ScheduleType};

/// Arms and cancels the future trigger of a notification, keyed by uuid.
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    async fn schedule_notification(&self, notification: &Notification) -> Result<()>;

    async fn cancel(&self, uuid: Uuid) -> Result<()>;
}

/// Next instant strictly after `now` at which `schedule` should fire.
pub fn next_trigger(schedule: &Schedule, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let scheduled_at = schedule.scheduled_at();
    if scheduled_at > now {
        return Some(scheduled_at);
    }

    match schedule.schedule_type {
        ScheduleType::OneTime => None,
        ScheduleType::Daily => {
            let today = now.date().and_time(schedule.time);
            if today > now {
                Some(today)
            } else {
                today.checked_add_days(Days::new(1))
            }
        }
    }
}

/// Scheduler backed by one-shot `tokio-cron-scheduler` jobs.
///
/// When a job fires the notification is posted and pinned. One-time
/// schedules are then cleared from the row; daily ones are re-armed.
#[derive(Clone)]
pub struct CronNotificationScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    jobs: JobScheduler,
    armed: DashMap<Uuid, Uuid>,
    repository: Arc<dyn NotificationRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl CronNotificationScheduler {
    pub async fn start(
        repository: Arc<dyn NotificationRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let jobs = JobScheduler::new().await?;
        jobs.start().await?;

        info!("Notification scheduler started");
        Ok(Self {
            inner: Arc::new(SchedulerInner {
                jobs,
                armed: DashMap::new(),
                repository,
                notifier,
                clock,
            }),
        })
    }

    pub fn is_armed(&self, uuid: &Uuid) -> bool {
        self.inner.armed.contains_key(uuid)
    }

    pub async fn shutdown(&self) -> Result<()> {
        let mut jobs = self.inner.jobs.clone();
        jobs.shutdown().await?;
        info!("Notification scheduler stopped");
        Ok(())
    }
}

#[async_trait]
impl NotificationScheduler for CronNotificationScheduler {
    async fn schedule_notification(&self, notification: &Notification) -> Result<()> {
        let now = self.inner.clock.now();
        SchedulerInner::arm(&self.inner, notification, now).await
    }

    async fn cancel(&self, uuid: Uuid) -> Result<()> {
        self.inner.disarm(uuid).await
    }
}

impl SchedulerInner {
    /// Replaces any job armed for `notification` with one for its next
    /// trigger after `after`.
    async fn arm(this: &Arc<Self>, notification: &Notification, after: NaiveDateTime) -> Result<()> {
        let uuid = notification.uuid;
        this.disarm(uuid).await?;

        let Some(schedule) = notification.schedule else {
            return Ok(());
        };

        let now = this.clock.now();
        let Some(trigger) = next_trigger(&schedule, after.max(now)) else {
            warn!("Schedule for notification {} is in the past, not arming", uuid);
            return Ok(());
        };
        let delay = (trigger - now).to_std().unwrap_or(Duration::ZERO);

        let weak: Weak<SchedulerInner> = Arc::downgrade(this);
        let job = Job::new_one_shot_async(delay, move |job_id, _l| {
            let weak = weak.clone();
            Box::pin(async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if let Err(e) = fire(inner, uuid, job_id, trigger).await {
                    error!("Error firing scheduled notification {}: {:?}", uuid, e);
                }
            })
        })?;

        let job_id = this.jobs.add(job).await?;
        this.armed.insert(uuid, job_id);
        info!("Armed notification {} for {}", uuid, trigger);
        Ok(())
    }

    async fn disarm(&self, uuid: Uuid) -> Result<()> {
        if let Some((_, job_id)) = self.armed.remove(&uuid) {
            // A job that already fired is gone from the scheduler.
            if let Err(e) = self.jobs.remove(&job_id).await {
                debug!("Job {} for notification {} already gone: {:?}", job_id, uuid, e);
            }
            info!("Cancelled schedule for notification {}", uuid);
        }
        Ok(())
    }
}

fn fire(
    inner: Arc<SchedulerInner>,
    uuid: Uuid,
    job_id: Uuid,
    trigger: NaiveDateTime,
) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        inner.armed.remove_if(&uuid, |_, armed_job| *armed_job == job_id);

        let notification = match inner.repository.notification(uuid).await? {
            Some(notification) if !notification.deleted => notification,
            _ => {
                debug!("Scheduled notification {} no longer exists", uuid);
                return Ok(());
            }
        };

        inner.notifier.show_notification(&notification).await?;
        inner.repository.update_pin_status(uuid, true).await?;

        match notification.schedule.map(|s| s.schedule_type) {
            Some(ScheduleType::OneTime) => inner.repository.remove_schedule(uuid).await?,
            Some(ScheduleType::Daily) => SchedulerInner::arm(&inner, &notification, trigger).await?,
            None => {}
        }

        info!("Fired scheduled notification {}", uuid);
        Ok(())
    })
}
