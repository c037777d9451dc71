//! Recording fakes for the repository, notifier and scheduler. All three
//! write into one shared [`CallLog`] so tests can assert ordering across
//! collaborators.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::effects::{EffectOutput, ViewEffectChannel};
use crate::error::{AppError, Result};
use crate::notification::{Notification, NotificationRepository, NotificationsStream, Schedule};
use crate::system::{NotificationScheduler, Notifier};

pub fn notification(title: &str, is_pinned: bool) -> Notification {
    Notification {
        uuid: Uuid::new_v4(),
        title: Some(title.to_string()),
        content: None,
        is_pinned,
        schedule: None,
        deleted: false,
        created_at: Utc::now(),
    }
}

pub fn output<E, V: Clone>() -> (EffectOutput<E, V>, mpsc::UnboundedReceiver<E>, broadcast::Receiver<V>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let view_effects = ViewEffectChannel::new(16);
    let view_rx = view_effects.attach();
    (EffectOutput::new(events_tx, view_effects), events_rx, view_rx)
}

pub fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}

pub fn drain_view<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Notification(Uuid),
    PinnedNotifications,
    Save(Uuid),
    UpdateNotification(Notification),
    UpdatePinStatus(Uuid, bool),
    DeleteNotification(Uuid),
    UndoNotificationDelete(Uuid),
    RemoveSchedule(Uuid),
    ShowNotification(Uuid),
    DismissNotification(Uuid),
    HasPermission,
    CheckVisibility(Vec<Uuid>),
    ScheduleNotification(Uuid),
    CancelSchedule(Uuid),
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeRepository {
    log: CallLog,
    store: Mutex<HashMap<Uuid, Notification>>,
    snapshots: watch::Sender<Vec<Notification>>,
    open_streams: Arc<AtomicUsize>,
    fail_deletes: AtomicBool,
}

impl FakeRepository {
    pub fn new(log: CallLog) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            log,
            store: Mutex::new(HashMap::new()),
            snapshots,
            open_streams: Arc::new(AtomicUsize::new(0)),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn insert(&self, notification: Notification) {
        self.store
            .lock()
            .unwrap()
            .insert(notification.uuid, notification);
    }

    pub fn stored(&self, uuid: Uuid) -> Option<Notification> {
        self.store.lock().unwrap().get(&uuid).cloned()
    }

    pub fn push_snapshot(&self, snapshot: Vec<Notification>) {
        self.snapshots.send_replace(snapshot);
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }
}

/// Keeps the open-stream counter in step with the stream's lifetime.
struct CountedStream {
    inner: NotificationsStream,
    open_streams: Arc<AtomicUsize>,
}

impl Stream for CountedStream {
    type Item = Result<Vec<Notification>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl Drop for CountedStream {
    fn drop(&mut self) {
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationRepository for FakeRepository {
    async fn notification(&self, uuid: Uuid) -> Result<Option<Notification>> {
        self.log.record(Call::Notification(uuid));
        Ok(self.stored(uuid))
    }

    fn notifications(&self) -> NotificationsStream {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        CountedStream {
            inner: WatchStream::new(self.snapshots.subscribe()).map(Ok).boxed(),
            open_streams: self.open_streams.clone(),
        }
        .boxed()
    }

    async fn pinned_notifications(&self) -> Result<Vec<Notification>> {
        self.log.record(Call::PinnedNotifications);
        let mut pinned: Vec<Notification> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.is_pinned && !n.deleted)
            .cloned()
            .collect();
        pinned.sort_by_key(|n| n.created_at);
        Ok(pinned)
    }

    async fn save(
        &self,
        uuid: Uuid,
        title: Option<String>,
        content: Option<String>,
        is_pinned: bool,
        schedule: Option<Schedule>,
    ) -> Result<Notification> {
        self.log.record(Call::Save(uuid));
        let notification = Notification {
            uuid,
            title,
            content,
            is_pinned,
            schedule,
            deleted: false,
            created_at: Utc::now(),
        };
        self.insert(notification.clone());
        Ok(notification)
    }

    async fn update_notification(&self, notification: Notification) -> Result<Notification> {
        self.log.record(Call::UpdateNotification(notification.clone()));
        self.insert(notification.clone());
        Ok(notification)
    }

    async fn update_pin_status(&self, uuid: Uuid, is_pinned: bool) -> Result<()> {
        self.log.record(Call::UpdatePinStatus(uuid, is_pinned));
        if let Some(n) = self.store.lock().unwrap().get_mut(&uuid) {
            n.is_pinned = is_pinned;
        }
        Ok(())
    }

    async fn delete_notification(&self, notification: &Notification) -> Result<Notification> {
        self.log.record(Call::DeleteNotification(notification.uuid));
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::NotFound(notification.uuid.to_string()));
        }
        let removed = Notification {
            deleted: true,
            ..notification.clone()
        };
        self.insert(removed.clone());
        Ok(removed)
    }

    async fn undo_notification_delete(&self, notification: &Notification) -> Result<()> {
        self.log.record(Call::UndoNotificationDelete(notification.uuid));
        self.insert(notification.clone().restored());
        Ok(())
    }

    async fn remove_schedule(&self, uuid: Uuid) -> Result<()> {
        self.log.record(Call::RemoveSchedule(uuid));
        if let Some(n) = self.store.lock().unwrap().get_mut(&uuid) {
            n.schedule = None;
        }
        Ok(())
    }
}

pub struct FakeNotifier {
    log: CallLog,
    permitted: bool,
}

impl FakeNotifier {
    pub fn new(log: CallLog, permitted: bool) -> Self {
        Self { log, permitted }
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn show_notification(&self, notification: &Notification) -> Result<()> {
        self.log.record(Call::ShowNotification(notification.uuid));
        Ok(())
    }

    async fn dismiss_notification(&self, notification: &Notification) -> Result<()> {
        self.log.record(Call::DismissNotification(notification.uuid));
        Ok(())
    }

    async fn has_permission_to_post_notifications(&self) -> Result<bool> {
        self.log.record(Call::HasPermission);
        Ok(self.permitted)
    }

    async fn check_notifications_visibility(&self, pinned: &[Notification]) -> Result<()> {
        self.log
            .record(Call::CheckVisibility(pinned.iter().map(|n| n.uuid).collect()));
        Ok(())
    }
}

pub struct FakeScheduler {
    log: CallLog,
}

impl FakeScheduler {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl NotificationScheduler for FakeScheduler {
    async fn schedule_notification(&self, notification: &Notification) -> Result<()> {
        self.log.record(Call::ScheduleNotification(notification.uuid));
        Ok(())
    }

    async fn cancel(&self, uuid: Uuid) -> Result<()> {
        self.log.record(Call::CancelSchedule(uuid));
        Ok(())
    }
}

/// The three fakes wired to one call log.
pub struct Fakes {
    pub log: CallLog,
    pub repository: Arc<FakeRepository>,
    pub notifier: Arc<FakeNotifier>,
    pub scheduler: Arc<FakeScheduler>,
}

impl Fakes {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            repository: Arc::new(FakeRepository::new(log.clone())),
            notifier: Arc::new(FakeNotifier::new(log.clone(), true)),
            scheduler: Arc::new(FakeScheduler::new(log.clone())),
            log,
        }
    }
}
