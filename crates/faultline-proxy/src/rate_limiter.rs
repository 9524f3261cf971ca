//! Bandwidth throttling by per-packet pacing.

use std::time::Duration;

use crate::filter::{EventHandler, Filter, FilterError, Packet, PacketSink};

/// Caps throughput at a byte rate by sleeping `len / rate` seconds before
/// forwarding each packet. Order is always preserved and nothing is dropped.
pub struct RateLimiter {
    name: String,
    sink: PacketSink,
    /// Bytes per second.
    rate: f64,
}

impl RateLimiter {
    pub fn new(
        sink: PacketSink,
        name: impl Into<String>,
        rate: f64,
    ) -> Result<Self, FilterError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(FilterError::Config(format!(
                "byte rate {rate} must be positive"
            )));
        }
        Ok(Self {
            name: name.into(),
            sink,
            rate,
        })
    }
}

impl EventHandler for RateLimiter {}

impl Filter for RateLimiter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&mut self, packet: Packet) -> Result<(), FilterError> {
        let delay = Duration::from_secs_f64(packet.len() as f64 / self.rate);
        tokio::time::sleep(delay).await;
        self.sink.send(packet).await
    }
}
