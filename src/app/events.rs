use anyhow::{anyhow, Result};
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc,
};
use tokio_stream::wrappers::LinesStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::lifecycle::AppPhase;

/// Placeholder affordances on the footer. They don't lead anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    KoFi,
    Merch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Replaces the contents of the input buffer.
    EditInput(String),
    /// Submits the input buffer as a new task.
    Submit,
    /// Removes the task at a position of the current list.
    Remove(usize),
    TogglePrivacy,
    DismissNudge,
    OpenLink(Link),
    Quit,
}

/// Everything the session reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    User(UserAction),
    Lifecycle(AppPhase),
    /// Nothing changed in the state but the screen looks different, e.g. the header pulsed.
    Redraw,
}

/// Turns a line typed by the user into events. Plain text is typed into the input buffer and
/// submitted, lines starting with `/` are commands. Task numbers on screen start at 1.
pub fn parse_line(line: &str) -> Result<Vec<AppEvent>> {
    let Some(command) = line.trim_start().strip_prefix('/') else {
        return Ok(vec![
            AppEvent::User(UserAction::EditInput(line.to_owned())),
            AppEvent::User(UserAction::Submit),
        ]);
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let event = match name {
        "rm" | "remove" => {
            let position = parts
                .next()
                .ok_or_else(|| anyhow!("Which task should be removed?"))?
                .parse::<usize>()?;
            let index = position
                .checked_sub(1)
                .ok_or_else(|| anyhow!("Tasks are numbered from 1"))?;
            AppEvent::User(UserAction::Remove(index))
        }
        "privacy" => AppEvent::User(UserAction::TogglePrivacy),
        "ok" | "dismiss" => AppEvent::User(UserAction::DismissNudge),
        "kofi" => AppEvent::User(UserAction::OpenLink(Link::KoFi)),
        "merch" => AppEvent::User(UserAction::OpenLink(Link::Merch)),
        "quit" => AppEvent::User(UserAction::Quit),
        "active" | "inactive" | "background" => AppEvent::Lifecycle(name.parse()?),
        _ => return Err(anyhow!("Unknown command /{name}")),
    };
    Ok(vec![event])
}

/// Reads user input line by line and sends resulting events to the session. Stops at end of
/// input, on shutdown, or once the session stopped listening. Running out of input shuts the
/// whole application down.
pub async fn read_user_input(
    input: impl AsyncRead + Unpin,
    sender: mpsc::Sender<AppEvent>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut lines = LinesStream::new(BufReader::new(input).lines());

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            line = lines.next() => line,
        };
        let Some(line) = line.transpose().inspect_err(|_| shutdown.cancel())? else {
            debug!("Input closed");
            shutdown.cancel();
            return Ok(());
        };

        let events = match parse_line(&line) {
            Ok(events) => events,
            Err(e) => {
                warn!("Ignoring input {line:?}: {e}");
                continue;
            }
        };

        for event in events {
            if sender.send(event).await.is_err() {
                return Ok(());
            }
        }
    }
}
