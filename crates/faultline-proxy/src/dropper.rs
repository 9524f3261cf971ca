//! Random packet loss.

use tracing::debug;

use crate::filter::{EventHandler, Filter, FilterError, Packet, PacketSink};
use crate::rng::{SeededRng, UniformSource};

/// Drops each packet with a configured probability.
pub struct DataDropper {
    name: String,
    sink: PacketSink,
    rate: f64,
    rng: Box<dyn UniformSource>,
}

impl DataDropper {
    pub fn new(
        sink: PacketSink,
        name: impl Into<String>,
        rate: f64,
        seed: u64,
    ) -> Result<Self, FilterError> {
        Self::with_source(sink, name, rate, Box::new(SeededRng::new(seed)))
    }

    pub fn with_source(
        sink: PacketSink,
        name: impl Into<String>,
        rate: f64,
        rng: Box<dyn UniformSource>,
    ) -> Result<Self, FilterError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(FilterError::Config(format!(
                "drop rate {rate} outside [0, 1]"
            )));
        }
        Ok(Self {
            name: name.into(),
            sink,
            rate,
            rng,
        })
    }
}

impl EventHandler for DataDropper {}

impl Filter for DataDropper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&mut self, packet: Packet) -> Result<(), FilterError> {
        if self.rng.uniform(0.0, 1.0) < self.rate {
            debug!("{}: dropping {} byte packet", self.name, packet.len());
            Ok(())
        } else {
            self.sink.send(packet).await
        }
    }
}
