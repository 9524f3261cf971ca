//! Composes filters into one direction of the proxy.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dispatcher::EventDispatcher;
use crate::filter::{EventHandler, Filter, FilterError, PacketSink};

/// Capacity of each stage's input channel.
const STAGE_CHANNEL_CAPACITY: usize = 256;

/// An ordered filter pipeline for one stream direction, terminating in the
/// harness-supplied transport sink.
///
/// Every filter needs its downstream sink at construction, so filters are
/// pushed transport-side first: each [`push`](Chain::push) hands the current
/// chain input to the builder as the new filter's sink, spawns a task that
/// drains the stage's channel into `process`, and makes the stage's sender
/// the new chain input. The two directions of a proxy are two independent
/// chains; they share no filter state, only the event queue.
pub struct Chain {
    input: PacketSink,
    /// Filters in stream order (head first), for event registration.
    handlers: Vec<Arc<Mutex<dyn EventHandler>>>,
    stages: Vec<JoinHandle<()>>,
}

impl Chain {
    pub fn new(transport: PacketSink) -> Self {
        Self {
            input: transport,
            handlers: Vec::new(),
            stages: Vec::new(),
        }
    }

    /// Prepend a filter to the chain. The builder receives the sink the new
    /// filter must forward into (the previously pushed filter, or the
    /// transport for the first push).
    pub fn push<F>(
        &mut self,
        build: impl FnOnce(PacketSink) -> Result<F, FilterError>,
    ) -> Result<Arc<Mutex<F>>, FilterError>
    where
        F: Filter,
    {
        let filter = Arc::new(Mutex::new(build(self.input.clone())?));

        let (sink, mut rx) = PacketSink::stage(STAGE_CHANNEL_CAPACITY);
        let stage = Arc::clone(&filter);
        self.stages.push(tokio::spawn(async move {
            while let Some(packet) = rx.recv().await {
                let mut filter = stage.lock().await;
                if let Err(e) = filter.process(packet).await {
                    warn!("{}: stage stopping: {}", filter.name(), e);
                    break;
                }
            }
        }));

        self.handlers.insert(0, filter.clone());
        self.input = sink;
        Ok(filter)
    }

    /// Where the harness feeds packets received from the wire.
    pub fn input(&self) -> PacketSink {
        self.input.clone()
    }

    /// Register every filter of this chain with the dispatcher, in stream
    /// order.
    pub fn register_events(&self, dispatcher: &mut EventDispatcher) {
        for handler in &self.handlers {
            dispatcher.register(Arc::clone(handler));
        }
    }

    /// Stop the stage tasks. In-flight packets are discarded; per-filter
    /// timers are cancelled when the filters are dropped.
    pub fn shutdown(&mut self) {
        debug!("shutting down chain with {} stages", self.stages.len());
        for stage in self.stages.drain(..) {
            stage.abort();
        }
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        self.shutdown();
    }
}
