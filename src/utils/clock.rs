use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Source of wall-clock time and monotonic instants for the application. Lifecycle transitions
/// are stamped with [Clock::time], animations are paced with [Clock::sleep_until], so tests can
/// swap in a clock they control.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

/// Milliseconds since the unix epoch, the unit every stored timestamp uses.
pub fn epoch_millis(clock: &dyn Clock) -> i64 {
    clock.time().timestamp_millis()
}
