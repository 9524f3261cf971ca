//! Fans events out to every filter in a chain.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::event::EventReceiver;
use crate::filter::EventHandler;

/// Drains the event queue and invokes `handle_event` on every registered
/// filter, in registration order, one event at a time.
///
/// Runs as its own task, decoupling event propagation from packet-processing
/// latency: a filter downstream of the event filter may see a packet via
/// `process` before or after the event that packet triggered, but events are
/// always delivered in publish order, completely, to every filter.
pub struct EventDispatcher {
    events: EventReceiver,
    handlers: Vec<Arc<Mutex<dyn EventHandler>>>,
}

impl EventDispatcher {
    pub fn new(events: EventReceiver) -> Self {
        Self {
            events,
            handlers: Vec::new(),
        }
    }

    pub fn register(&mut self, handler: Arc<Mutex<dyn EventHandler>>) {
        self.handlers.push(handler);
    }

    /// Consume events until every queue sender is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            trace!("dispatching {:?} to {} filters", event, self.handlers.len());
            for handler in &self.handlers {
                handler.lock().await.handle_event(&event);
            }
        }
        debug!("event queue closed, dispatcher exiting");
    }
}
