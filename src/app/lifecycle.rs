//! Detection of quick app switches.
//!
//! There is no timer involved: leaving the foreground stamps the current time into storage and
//! coming back compares that stamp with the current time once.

use std::{str::FromStr, time::Duration};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    storage::{
        entities::{decode_timestamp, encode_timestamp},
        kv_store::KeyValueStore,
        LAST_BACKGROUND_KEY,
    },
    utils::clock::{epoch_millis, Clock},
};

use super::events::AppEvent;

/// Returning within this window after leaving counts as a quick switch.
pub const DEFAULT_NUDGE_THRESHOLD: Duration = Duration::from_millis(20_000);

pub const RESUME_PROMPT: &str = "Did you just switch? Want to resume your last task?";

/// Lifecycle phases reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Active,
    Inactive,
    Background,
}

impl AppPhase {
    pub fn is_away(self) -> bool {
        matches!(self, AppPhase::Inactive | AppPhase::Background)
    }
}

impl FromStr for AppPhase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AppPhase::Active),
            "inactive" => Ok(AppPhase::Inactive),
            "background" => Ok(AppPhase::Background),
            _ => Err(anyhow!("Unknown lifecycle phase {s}")),
        }
    }
}

/// Prompt shown after a quick switch. Lives only in the session and is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nudge(&'static str);

impl Nudge {
    pub fn resume_prompt() -> Self {
        Self(RESUME_PROMPT)
    }

    pub fn message(&self) -> &str {
        self.0
    }
}

pub struct LifecycleWatcher<S> {
    store: S,
    clock: Box<dyn Clock>,
    current: AppPhase,
    threshold: Duration,
}

impl<S: KeyValueStore> LifecycleWatcher<S> {
    /// The application is assumed to start in the foreground.
    pub fn new(store: S, clock: Box<dyn Clock>, threshold: Duration) -> Self {
        Self {
            store,
            clock,
            current: AppPhase::Active,
            threshold,
        }
    }

    pub fn current(&self) -> AppPhase {
        self.current
    }

    /// Handles a lifecycle transition. Returns a nudge when the application comes back to the
    /// foreground shortly after it left. A slow return returns nothing and leaves any nudge
    /// that is already on screen to the caller.
    pub async fn on_change(&mut self, next: AppPhase) -> Option<Nudge> {
        let now = epoch_millis(self.clock.as_ref());
        debug!("Lifecycle {:?} -> {next:?} at {now}", self.current);

        if self.current == AppPhase::Active && next.is_away() {
            if let Err(e) = self
                .store
                .set_item(LAST_BACKGROUND_KEY, &encode_timestamp(now))
                .await
            {
                warn!("Failed to store background time {e:?}");
            }
        }

        let nudge = if next == AppPhase::Active {
            self.check_quick_return(now).await
        } else {
            None
        };

        self.current = next;
        nudge
    }

    async fn check_quick_return(&self, now: i64) -> Option<Nudge> {
        let last = match self.store.get_item(LAST_BACKGROUND_KEY).await {
            Ok(value) => value.as_deref().and_then(decode_timestamp)?,
            Err(e) => {
                warn!("Failed to read background time {e:?}");
                return None;
            }
        };

        let away_ms = now - last;
        if away_ms < self.threshold.as_millis() as i64 {
            info!("Came back after {away_ms}ms, nudging");
            Some(Nudge::resume_prompt())
        } else {
            debug!("Came back after {away_ms}ms");
            None
        }
    }
}

/// Forwards lifecycle notifications delivered as signals: `SIGUSR1` means the application left
/// the foreground, `SIGUSR2` means it is active again.
#[cfg(unix)]
pub async fn forward_lifecycle_signals(
    sender: mpsc::Sender<AppEvent>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut away = signal(SignalKind::user_defined1())?;
    let mut back = signal(SignalKind::user_defined2())?;

    loop {
        let phase = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = away.recv() => AppPhase::Background,
            _ = back.recv() => AppPhase::Active,
        };
        if sender.send(AppEvent::Lifecycle(phase)).await.is_err() {
            return Ok(());
        }
    }
}

#[cfg(not(unix))]
pub async fn forward_lifecycle_signals(
    sender: mpsc::Sender<AppEvent>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    // Lifecycle changes only arrive as line commands here.
    shutdown.cancelled().await;
    drop(sender);
    Ok(())
}
