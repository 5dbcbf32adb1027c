//! 随机丢包

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::queue::RelayQueues;

use super::TestCase;

#[derive(Debug)]
pub struct RandomDropCase {
    drop_rate: f64,
    rng: StdRng,
    pub dropped: u64,
}

impl RandomDropCase {
    pub fn new(drop_rate: f64, seed: u64) -> Self {
        Self {
            drop_rate: drop_rate.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
            dropped: 0,
        }
    }
}

impl TestCase for RandomDropCase {
    fn name(&self) -> &str {
        "random_drop"
    }

    fn on_packet(&mut self, queues: &mut RelayQueues) {
        for pkt in queues.take_inbound() {
            if self.rng.gen_bool(self.drop_rate) {
                self.dropped += 1;
                tracing::debug!(%pkt, "丢弃");
            } else {
                queues.outbound.push_back(pkt);
            }
        }
    }
}
