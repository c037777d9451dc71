use pin_reminders::clock::SystemClock;
use pin_reminders::db::{create_pool, run_migrations};
use pin_reminders::editor::ScheduleValidator;
use pin_reminders::effects::{
    follow_view_effects, EffectDispatcher, EffectOutput, ExecutionTiers, Session, ViewEffectChannel,
};
use pin_reminders::list::{ListEffect, ListEffectHandler, ListEvent};
use pin_reminders::notification::SqliteNotificationRepository;
use pin_reminders::preferences::{follow_theme, AppPreferences, PreferenceStore};
use pin_reminders::state::{AppState, Config};
use pin_reminders::system::{CronNotificationScheduler, NotificationTray};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pin_reminders=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    tracing::info!("Opening database...");
    let db = create_pool(&config.database_url).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Preferences are owned here and followed until shutdown
    let preferences = PreferenceStore::new(AppPreferences {
        theme: config.theme,
    });
    let preferences_cancel = CancellationToken::new();
    let theme_task = tokio::spawn(follow_theme(
        preferences.clone(),
        preferences_cancel.clone(),
        |theme| tracing::info!("Applying {:?} theme", theme),
    ));

    // Create collaborators
    let repository = Arc::new(SqliteNotificationRepository::new(db.clone()));
    let tray = Arc::new(NotificationTray::new(config.notifications_permitted));
    let scheduler = Arc::new(
        CronNotificationScheduler::start(repository.clone(), tray.clone(), Arc::new(SystemClock)).await?,
    );

    let state = AppState {
        repository,
        notifier: tray,
        scheduler: scheduler.clone(),
        validator: ScheduleValidator::new(Arc::new(SystemClock)),
        tiers: ExecutionTiers::from_config(Handle::current(), &config),
    };

    // Open the notifications list session
    let session = Session::new();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let view_effects = ViewEffectChannel::new(32);
    let view_rx = view_effects.attach();
    let dispatcher = Arc::new(EffectDispatcher::new(
        ListEffectHandler::from_state(&state),
        EffectOutput::new(events_tx, view_effects),
        state.tiers.clone(),
        session.scope(),
    ));

    dispatcher.dispatch(ListEffect::CheckNotificationsVisibility);
    dispatcher.dispatch(ListEffect::CheckPermissionToPostNotification);
    dispatcher.dispatch(ListEffect::LoadNotifications);

    let event_dispatcher = dispatcher.clone();
    let event_scope = session.scope();
    event_scope.spawn_on(
        async move {
            let mut armed = false;
            while let Some(event) = events_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(json) => tracing::debug!("Event: {}", json),
                    Err(e) => tracing::warn!("Could not serialize event: {:?}", e),
                }

                match event {
                    ListEvent::NotificationsLoaded(notifications) if !armed => {
                        armed = true;
                        for notification in notifications.into_iter().filter(|n| n.schedule.is_some()) {
                            event_dispatcher.dispatch(ListEffect::ScheduleNotification(notification));
                        }
                    }
                    ListEvent::HasPermissionToPostNotifications(false) => {
                        event_dispatcher.dispatch(ListEffect::RequestNotificationPermission);
                    }
                    _ => {}
                }
            }
        },
        state.tiers.runtime(),
    );

    event_scope.spawn_on(
        follow_view_effects(view_rx, |effect| tracing::info!("View effect: {:?}", effect)),
        state.tiers.runtime(),
    );

    tracing::info!("Pinned reminders running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");
    preferences_cancel.cancel();
    theme_task.await?;
    session.shutdown().await;
    scheduler.shutdown().await?;
    db.close().await;

    Ok(())
}
