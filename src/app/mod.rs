//! The interactive screen. Input from the user and lifecycle notifications from the host are
//! turned into [events::AppEvent]s and fed through a channel into a single [session::Session].

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::Result;
use feedback::{forward_pulse_redraws, TerminalFeedback};
use processing::ProcessingModule;
use session::{Session, SessionParts};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    storage::{kv_store::FileStore, STORAGE_DIR},
    utils::clock::{Clock, DefaultClock},
};

pub mod events;
pub mod feedback;
pub mod lifecycle;
pub mod processing;
pub mod session;
pub mod shutdown;

const EVENT_BUFFER: usize = 16;

/// Runs the screen until the user quits, input ends, or Ctrl-C is pressed.
pub async fn start_app(dir: &Path, nudge_threshold: Duration) -> Result<()> {
    let store = Arc::new(FileStore::open(dir.join(STORAGE_DIR))?);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let feedback = TerminalFeedback::new(std::io::stdout(), clock.clone());
    let header_scale = feedback.header_scale();
    let pulse = feedback.header_scale();

    let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
    let shutdown_token = CancellationToken::new();

    let session = Session::start(
        store,
        SessionParts {
            clock: Box::new(DefaultClock),
            feedback: Box::new(feedback),
            header_scale,
            screen: Box::new(std::io::stdout()),
            shutdown: shutdown_token.clone(),
            nudge_threshold,
        },
    )
    .await?;
    let processor = ProcessingModule::new(receiver, session);

    let (_, input_result, lifecycle_result, pulse_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        events::read_user_input(tokio::io::stdin(), sender.clone(), shutdown_token.clone()),
        lifecycle::forward_lifecycle_signals(sender.clone(), shutdown_token.clone()),
        forward_pulse_redraws(pulse, sender, shutdown_token.clone()),
        processor.run(),
    );

    if let Err(input_result) = input_result {
        error!("Reading input got an error {:?}", input_result);
    }

    if let Err(lifecycle_result) = lifecycle_result {
        error!("Lifecycle notifications got an error {:?}", lifecycle_result);
    }

    if let Err(pulse_result) = pulse_result {
        error!("Header pulse redraws got an error {:?}", pulse_result);
    }

    processing_result
}
