use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" => Ok(Theme::Auto),
            other => Err(AppError::Config(format!("unknown theme: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppPreferences {
    pub theme: Theme,
}

/// Holds the current preferences and notifies subscribers of changes.
#[derive(Clone)]
pub struct PreferenceStore {
    tx: Arc<watch::Sender<AppPreferences>>,
}

impl PreferenceStore {
    pub fn new(initial: AppPreferences) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> AppPreferences {
        *self.tx.borrow()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.tx.send_if_modified(|prefs| {
            let changed = prefs.theme != theme;
            prefs.theme = theme;
            changed
        });
    }

    /// Current theme first, then every change.
    pub fn themes(&self) -> impl Stream<Item = Theme> + Send + 'static {
        WatchStream::new(self.tx.subscribe()).map(|prefs| prefs.theme)
    }
}

/// Applies every theme the store publishes until `cancel` fires.
pub async fn follow_theme(
    store: PreferenceStore,
    cancel: CancellationToken,
    mut apply: impl FnMut(Theme) + Send,
) {
    let mut themes = Box::pin(store.themes());
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            theme = themes.next() => match theme {
                Some(theme) => apply(theme),
                None => break,
            },
        }
    }
    tracing::debug!("Stopped following theme changes");
}
