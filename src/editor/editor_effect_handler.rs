use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use uuid::Uuid;

use super::editor_models::{EditorEffect, EditorEvent, EditorViewEffect};
use super::schedule_validator::ScheduleValidator;
use crate::effects::{EffectHandler, EffectOutput, Tier};
use crate::error::{AppError, Result};
use crate::notification::{Notification, NotificationRepository, Schedule};
use crate::state::AppState;
use crate::system::{NotificationScheduler, Notifier};

type Output = EffectOutput<EditorEvent, EditorViewEffect>;

/// Side effects of the notification editor screen.
pub struct EditorEffectHandler {
    repository: Arc<dyn NotificationRepository>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn NotificationScheduler>,
    validator: ScheduleValidator,
}

impl EditorEffectHandler {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn NotificationScheduler>,
        validator: ScheduleValidator,
    ) -> Self {
        Self {
            repository,
            notifier,
            scheduler,
            validator,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.repository.clone(),
            state.notifier.clone(),
            state.scheduler.clone(),
            state.validator.clone(),
        )
    }

    async fn load_notification(&self, uuid: Uuid, output: &Output) -> Result<()> {
        let notification = self.repository.notification(uuid).await?;
        output.dispatch_event(EditorEvent::NotificationLoaded(notification));
        Ok(())
    }

    fn set_title_and_content(&self, title: Option<String>, content: Option<String>, output: &Output) {
        output.emit_view_effect(EditorViewEffect::SetTitle(title));
        output.emit_view_effect(EditorViewEffect::SetContent(content));
    }

    async fn save_notification(
        &self,
        title: Option<String>,
        content: Option<String>,
        schedule: Option<Schedule>,
        can_pin_notification: bool,
        output: &Output,
    ) -> Result<()> {
        let notification = self
            .repository
            .save(Uuid::new_v4(), title, content, can_pin_notification, schedule)
            .await?;
        output.dispatch_event(EditorEvent::NotificationSaved(notification));
        Ok(())
    }

    /// Title, content and schedule are all replaced by the incoming values,
    /// so an absent value clears the stored one.
    async fn update_notification(
        &self,
        uuid: Uuid,
        title: Option<String>,
        content: Option<String>,
        schedule: Option<Schedule>,
        output: &Output,
    ) -> Result<()> {
        let current = self
            .repository
            .notification(uuid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {}", uuid)))?;

        let updated = self
            .repository
            .update_notification(Notification {
                title,
                content,
                schedule,
                ..current
            })
            .await?;

        output.dispatch_event(EditorEvent::NotificationUpdated(updated));
        Ok(())
    }

    /// Unpin, delete, dismiss, then cancel the schedule. The order matters:
    /// no reader may see a row that is both pinned and deleted.
    async fn delete_notification(&self, notification: Notification, output: &Output) -> Result<()> {
        self.repository
            .update_pin_status(notification.uuid, false)
            .await?;
        self.repository.delete_notification(&notification).await?;
        self.notifier.dismiss_notification(&notification).await?;
        self.scheduler.cancel(notification.uuid).await?;

        output.emit_view_effect(EditorViewEffect::CloseEditorView);
        Ok(())
    }

    fn validate_schedule(&self, date: NaiveDate, time: NaiveTime, output: &Output) {
        let result = self.validator.validate(date, time);
        output.dispatch_event(EditorEvent::ScheduleValidated(result));
    }
}

#[async_trait]
impl EffectHandler for EditorEffectHandler {
    type Effect = EditorEffect;
    type Event = EditorEvent;
    type ViewEffect = EditorViewEffect;

    fn tier(effect: &EditorEffect) -> Tier {
        match effect {
            EditorEffect::LoadNotification { .. }
            | EditorEffect::SaveNotification { .. }
            | EditorEffect::UpdateNotification { .. }
            | EditorEffect::DeleteNotification(_) => Tier::Io,

            EditorEffect::ShowNotification(_)
            | EditorEffect::ScheduleNotification(_)
            | EditorEffect::CancelNotificationSchedule(_)
            | EditorEffect::ValidateSchedule { .. } => Tier::Background,

            EditorEffect::SetTitleAndContent { .. }
            | EditorEffect::ShowConfirmExitEditor
            | EditorEffect::CloseEditor
            | EditorEffect::ShowConfirmDelete
            | EditorEffect::ShowDatePicker(_)
            | EditorEffect::ShowTimePicker(_) => Tier::Ui,
        }
    }

    async fn handle(&self, effect: EditorEffect, output: &Output) -> Result<()> {
        match effect {
            EditorEffect::LoadNotification { uuid } => self.load_notification(uuid, output).await?,

            EditorEffect::SetTitleAndContent { title, content } => {
                self.set_title_and_content(title, content, output)
            }

            EditorEffect::SaveNotification {
                title,
                content,
                schedule,
                can_pin_notification,
            } => {
                self.save_notification(title, content, schedule, can_pin_notification, output)
                    .await?
            }

            EditorEffect::UpdateNotification {
                uuid,
                title,
                content,
                schedule,
            } => {
                self.update_notification(uuid, title, content, schedule, output)
                    .await?
            }

            EditorEffect::ShowConfirmExitEditor => {
                output.emit_view_effect(EditorViewEffect::ShowConfirmExitEditorDialog)
            }

            EditorEffect::CloseEditor => output.emit_view_effect(EditorViewEffect::CloseEditorView),

            EditorEffect::ShowConfirmDelete => {
                output.emit_view_effect(EditorViewEffect::ShowConfirmDeleteDialog)
            }

            EditorEffect::DeleteNotification(notification) => {
                self.delete_notification(notification, output).await?
            }

            EditorEffect::ShowDatePicker(date) => {
                output.emit_view_effect(EditorViewEffect::ShowDatePickerDialog(date))
            }

            EditorEffect::ShowTimePicker(time) => {
                output.emit_view_effect(EditorViewEffect::ShowTimePickerDialog(time))
            }

            EditorEffect::ShowNotification(notification) => {
                self.notifier.show_notification(&notification).await?
            }

            EditorEffect::ScheduleNotification(notification) => {
                self.scheduler.schedule_notification(&notification).await?
            }

            EditorEffect::CancelNotificationSchedule(uuid) => self.scheduler.cancel(uuid).await?,

            EditorEffect::ValidateSchedule { date, time } => {
                self.validate_schedule(date, time, output)
            }
        }

        Ok(())
    }
}
