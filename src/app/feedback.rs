//! Positive feedback after a task was added: a haptic tick and a short pulse of the header.

use std::{io::Write, sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::events::AppEvent;
use crate::utils::clock::Clock;

/// Something able to reward the user. Rewards never block and never report failure.
pub trait Feedback: Send {
    fn reward(&mut self);
}

/// Scale animation that grows to `peak` and settles back to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub peak: f32,
    pub rise: Duration,
    pub fall: Duration,
}

pub const HEADER_PULSE: Pulse = Pulse {
    peak: 1.15,
    rise: Duration::from_millis(140),
    fall: Duration::from_millis(160),
};

const FRAME: Duration = Duration::from_millis(16);

impl Pulse {
    pub fn total(&self) -> Duration {
        self.rise + self.fall
    }

    /// Scale of the animated element `elapsed` after the pulse started.
    pub fn scale_at(&self, elapsed: Duration) -> f32 {
        if elapsed < self.rise {
            let progress = ease_in_out(elapsed.as_secs_f32() / self.rise.as_secs_f32());
            1.0 + (self.peak - 1.0) * progress
        } else if elapsed < self.total() {
            let progress =
                ease_in_out((elapsed - self.rise).as_secs_f32() / self.fall.as_secs_f32());
            self.peak - (self.peak - 1.0) * progress
        } else {
            1.0
        }
    }
}

/// Quadratic ease-in-out over `[0, 1]`.
fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Plays `pulse`, publishing every frame into `scale`.
async fn play(pulse: Pulse, scale: watch::Sender<f32>, clock: Arc<dyn Clock>) {
    let start = clock.instant();
    let mut frame = start;
    loop {
        let elapsed = clock.instant().saturating_duration_since(start);
        let value = pulse.scale_at(elapsed);
        trace!("Header scale {value}");
        scale.send_replace(value);
        if elapsed >= pulse.total() {
            return;
        }
        frame += FRAME;
        clock.sleep_until(frame).await;
    }
}

/// Terminal rendition of the reward: the bell stands in for the haptic tick and the header
/// scale is published for the renderer.
pub struct TerminalFeedback<W> {
    bell: W,
    scale: watch::Sender<f32>,
    clock: Arc<dyn Clock>,
    animation: Option<JoinHandle<()>>,
}

impl<W: Write + Send> TerminalFeedback<W> {
    pub fn new(bell: W, clock: Arc<dyn Clock>) -> Self {
        let (scale, _) = watch::channel(1.0);
        Self {
            bell,
            scale,
            clock,
            animation: None,
        }
    }

    /// Current header scale, 1.0 when nothing is playing.
    pub fn header_scale(&self) -> watch::Receiver<f32> {
        self.scale.subscribe()
    }
}

impl<W: Write + Send> Feedback for TerminalFeedback<W> {
    fn reward(&mut self) {
        // Errors are ignored, the bell is only a nicety.
        let _ = self.bell.write_all(b"\x07").and_then(|_| self.bell.flush());

        if let Some(previous) = self.animation.take() {
            previous.abort();
        }
        self.animation = Some(tokio::spawn(play(
            HEADER_PULSE,
            self.scale.clone(),
            self.clock.clone(),
        )));
    }
}

/// Asks the session to redraw whenever the header switches between its resting and highlighted
/// look. Individual frames of the pulse are not forwarded, the terminal can't show them anyway.
pub async fn forward_pulse_redraws(
    mut scale: watch::Receiver<f32>,
    sender: mpsc::Sender<AppEvent>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut highlighted = *scale.borrow_and_update() > 1.0;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            changed = scale.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
        }

        let now_highlighted = *scale.borrow_and_update() > 1.0;
        if now_highlighted == highlighted {
            continue;
        }
        highlighted = now_highlighted;
        if sender.send(AppEvent::Redraw).await.is_err() {
            return Ok(());
        }
    }
}

impl<W> Drop for TerminalFeedback<W> {
    fn drop(&mut self) {
        if let Some(animation) = self.animation.take() {
            animation.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::Result;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::{forward_pulse_redraws, Feedback, TerminalFeedback, HEADER_PULSE};
    use crate::{app::events::AppEvent, utils::clock::DefaultClock};

    #[test]
    fn test_pulse_shape() {
        assert_eq!(HEADER_PULSE.scale_at(Duration::ZERO), 1.0);
        assert!((HEADER_PULSE.scale_at(Duration::from_millis(140)) - 1.15).abs() < 1e-4);
        assert_eq!(HEADER_PULSE.scale_at(Duration::from_millis(300)), 1.0);
        assert_eq!(HEADER_PULSE.scale_at(Duration::from_secs(5)), 1.0);
        assert_eq!(HEADER_PULSE.total(), Duration::from_millis(300));
    }

    #[test]
    fn test_pulse_is_not_linear() {
        let quarter = HEADER_PULSE.scale_at(Duration::from_millis(35)) - 1.0;
        let half = HEADER_PULSE.scale_at(Duration::from_millis(70)) - 1.0;
        // Linear growth would put the quarter point at half of the half point.
        assert!(quarter < half / 2.0);
        assert!((half - 0.075).abs() < 1e-4);
    }

    #[test]
    fn test_pulse_never_leaves_range() {
        for ms in 0..=320 {
            let scale = HEADER_PULSE.scale_at(Duration::from_millis(ms));
            assert!((1.0..=1.15 + 1e-4).contains(&scale), "{ms}ms -> {scale}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reward_plays_in_background() {
        let mut bell = Vec::<u8>::new();
        let scale = {
            let mut feedback = TerminalFeedback::new(&mut bell, Arc::new(DefaultClock));
            let scale = feedback.header_scale();

            feedback.reward();
            assert_eq!(*scale.borrow(), 1.0);

            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(*scale.borrow() > 1.0);

            tokio::time::sleep(Duration::from_millis(400)).await;
            assert_eq!(*scale.borrow(), 1.0);
            scale
        };
        assert_eq!(bell, b"\x07");
        assert_eq!(*scale.borrow(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_reward_restarts_pulse() {
        let mut feedback = TerminalFeedback::new(std::io::sink(), Arc::new(DefaultClock));
        let scale = feedback.header_scale();

        feedback.reward();
        tokio::time::sleep(Duration::from_millis(250)).await;
        feedback.reward();
        tokio::time::sleep(Duration::from_millis(120)).await;

        // The first pulse would be over by now, the second one is near its peak.
        assert!(*scale.borrow() > 1.1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pulse_asks_for_two_redraws() -> Result<()> {
        let mut feedback = TerminalFeedback::new(std::io::sink(), Arc::new(DefaultClock));
        let (sender, mut receiver) = mpsc::channel(10);
        let shutdown = CancellationToken::new();
        let forwarder = tokio::spawn(forward_pulse_redraws(
            feedback.header_scale(),
            sender,
            shutdown.clone(),
        ));

        feedback.reward();
        tokio::time::sleep(Duration::from_millis(400)).await;
        shutdown.cancel();
        forwarder.await??;

        let mut redraws = 0;
        while let Some(event) = receiver.recv().await {
            assert_eq!(event, AppEvent::Redraw);
            redraws += 1;
        }
        // One when the header lights up, one when it settles.
        assert_eq!(redraws, 2);
        Ok(())
    }
}
