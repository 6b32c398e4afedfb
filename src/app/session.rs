use std::{io::Write, time::Duration};

use anyhow::Result;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    cli::render::{render_screen, ScreenView},
    storage::kv_store::KeyValueStore,
    tasks::TaskManager,
    utils::clock::Clock,
};

use super::{
    events::{AppEvent, UserAction},
    feedback::Feedback,
    lifecycle::{LifecycleWatcher, Nudge},
    processing::EventProcessor,
};

/// State that only lives as long as the screen does. None of it is ever stored.
#[derive(Debug, Default)]
pub struct UiState {
    pub input: String,
    pub nudge: Option<Nudge>,
}

/// One running instance of the application screen. Owns the persisted state through
/// [TaskManager] and the disposable state through [UiState].
pub struct Session<S> {
    manager: TaskManager<S>,
    watcher: LifecycleWatcher<S>,
    feedback: Box<dyn Feedback>,
    header_scale: watch::Receiver<f32>,
    screen: Box<dyn Write + Send>,
    shutdown: CancellationToken,
    ui: UiState,
    quit: bool,
}

pub struct SessionParts {
    pub clock: Box<dyn Clock>,
    pub feedback: Box<dyn Feedback>,
    pub header_scale: watch::Receiver<f32>,
    pub screen: Box<dyn Write + Send>,
    pub shutdown: CancellationToken,
    pub nudge_threshold: Duration,
}

impl<S: KeyValueStore + Clone> Session<S> {
    /// Hydrates persisted state from `store` and draws the first screen.
    pub async fn start(store: S, parts: SessionParts) -> Result<Self> {
        let manager = TaskManager::load(store.clone()).await;
        let watcher = LifecycleWatcher::new(store, parts.clock, parts.nudge_threshold);
        let mut session = Self {
            manager,
            watcher,
            feedback: parts.feedback,
            header_scale: parts.header_scale,
            screen: parts.screen,
            shutdown: parts.shutdown,
            ui: UiState::default(),
            quit: false,
        };
        session.render()?;
        Ok(session)
    }
}

impl<S: KeyValueStore> Session<S> {
    pub fn manager(&self) -> &TaskManager<S> {
        &self.manager
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub async fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::User(action) => self.handle_action(action).await,
            AppEvent::Lifecycle(phase) => {
                // A slow return keeps whatever nudge is already showing.
                if let Some(nudge) = self.watcher.on_change(phase).await {
                    self.ui.nudge = Some(nudge);
                }
            }
            AppEvent::Redraw => {}
        }
    }

    async fn handle_action(&mut self, action: UserAction) {
        match action {
            UserAction::EditInput(text) => self.ui.input = text,
            UserAction::Submit => {
                if self.manager.add_task(&self.ui.input).await {
                    self.ui.input.clear();
                    self.feedback.reward();
                }
            }
            UserAction::Remove(index) => {
                self.manager.remove_task(index).await;
            }
            UserAction::TogglePrivacy => {
                self.manager.toggle_privacy().await;
            }
            UserAction::DismissNudge => self.ui.nudge = None,
            UserAction::OpenLink(link) => info!("{link:?} doesn't lead anywhere yet"),
            UserAction::Quit => {
                self.quit = true;
                self.shutdown.cancel();
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let header_scale = *self.header_scale.borrow();
        render_screen(
            &mut self.screen,
            &ScreenView {
                header_scale,
                nudge: self.ui.nudge.as_ref().map(Nudge::message),
                tasks: self.manager.tasks(),
                privacy_mode: self.manager.privacy_mode(),
                input: &self.ui.input,
            },
        )?;
        Ok(())
    }
}

impl<S: KeyValueStore> EventProcessor for Session<S> {
    async fn process_next(&mut self, event: AppEvent) -> Result<()> {
        // Whatever was queued behind a quit is dropped.
        if self.quit {
            debug!("Ignoring {event:?} after quit");
            return Ok(());
        }
        self.handle(event).await;
        if !self.quit {
            self.render()?;
        }
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        info!("Session finished with {} tasks", self.manager.tasks().len());
        writeln!(self.screen)?;
        self.screen.flush()?;
        Ok(())
    }
}
