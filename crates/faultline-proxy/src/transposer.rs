//! Randomized adjacent-pair reordering with a flush timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::filter::{EventHandler, Filter, FilterError, Packet, PacketSink};
use crate::rng::{SeededRng, UniformSource};

/// Swaps adjacent packets at a configured probability.
///
/// Each incoming packet is either forwarded immediately or held; a held
/// packet is emitted *after* the next packet that arrives, transposing the
/// pair. If nothing arrives within `timeout`, a flush timer forwards the
/// held packet alone in its original position, so a quiet line never
/// strands the tail of a stream.
pub struct DataTransposer {
    name: String,
    sink: PacketSink,
    rate: f64,
    timeout: Duration,
    rng: Box<dyn UniformSource>,
    /// Shared with the flush task; whoever takes the packet owns sending it.
    pending: Arc<Mutex<Option<Packet>>>,
    flush: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for DataTransposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTransposer")
            .field("name", &self.name)
            .field("rate", &self.rate)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DataTransposer {
    pub fn new(
        sink: PacketSink,
        name: impl Into<String>,
        rate: f64,
        timeout: Duration,
        seed: u64,
    ) -> Result<Self, FilterError> {
        Self::with_source(sink, name, rate, timeout, Box::new(SeededRng::new(seed)))
    }

    /// Construct with an explicit randomness source instead of a seed.
    pub fn with_source(
        sink: PacketSink,
        name: impl Into<String>,
        rate: f64,
        timeout: Duration,
        rng: Box<dyn UniformSource>,
    ) -> Result<Self, FilterError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(FilterError::Config(format!(
                "transpose rate {rate} outside [0, 1]"
            )));
        }
        Ok(Self {
            name: name.into(),
            sink,
            rate,
            timeout,
            rng,
            pending: Arc::new(Mutex::new(None)),
            flush: None,
        })
    }

    fn arm_flush_timer(&mut self) {
        let pending = Arc::clone(&self.pending);
        let sink = self.sink.clone();
        let name = self.name.clone();
        let timeout = self.timeout;
        self.flush = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let held = pending.lock().await.take();
            if let Some(held) = held {
                debug!("{}: flush timeout, sending held packet unswapped", name);
                if let Err(e) = sink.send(held).await {
                    warn!("{}: failed to flush held packet: {}", name, e);
                }
            }
        }));
    }
}

impl EventHandler for DataTransposer {}

impl Filter for DataTransposer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&mut self, packet: Packet) -> Result<(), FilterError> {
        let held = self.pending.lock().await.take();
        if let Some(held) = held {
            // The slot is empty now, so a timer that already started can no
            // longer send anything.
            if let Some(timer) = self.flush.take() {
                timer.abort();
            }
            debug!(
                "{}: transposing {} byte and {} byte packets",
                self.name,
                packet.len(),
                held.len()
            );
            self.sink.send(packet).await?;
            self.sink.send(held).await?;
            return Ok(());
        }

        if self.rng.uniform(0.0, 1.0) < self.rate {
            debug!("{}: holding {} byte packet", self.name, packet.len());
            *self.pending.lock().await = Some(packet);
            self.arm_flush_timer();
            Ok(())
        } else {
            self.sink.send(packet).await
        }
    }
}

impl Drop for DataTransposer {
    fn drop(&mut self) {
        // Teardown cancels the timer; a still-held packet is dropped with
        // the state, not flushed.
        if let Some(timer) = self.flush.take() {
            timer.abort();
        }
    }
}
