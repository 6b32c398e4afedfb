use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error};

use super::events::AppEvent;

/// Represents a consumer of application events.
pub trait EventProcessor {
    fn process_next(&mut self, event: AppEvent) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}

/// Drains events one at a time until every sender is gone. A failing event is logged and
/// doesn't stop the loop.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<AppEvent>,
    processor: Processor,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<AppEvent>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            debug!("Processing event {:?}", event);
            if let Err(e) = self.processor.process_next(event.clone()).await {
                error!("Error processing event {:?}: {e:?}", event)
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
