//! 损坏 payload 但保留旧校验和，接收端应当识别并丢弃

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::queue::RelayQueues;
use crate::wire::PacketUpdate;

use super::TestCase;

#[derive(Debug)]
pub struct CorruptCase {
    rate: f64,
    rng: StdRng,
    pub corrupted: u64,
}

impl CorruptCase {
    pub fn new(rate: f64, seed: u64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
            corrupted: 0,
        }
    }
}

impl TestCase for CorruptCase {
    fn name(&self) -> &str {
        "corrupt"
    }

    fn on_packet(&mut self, queues: &mut RelayQueues) {
        for mut pkt in queues.take_inbound() {
            if !pkt.is_bogon() && self.rng.gen_bool(self.rate) {
                let mut payload = pkt.payload().map(<[u8]>::to_vec).unwrap_or_default();
                payload.push(b'#');
                pkt.update(
                    PacketUpdate {
                        payload: Some(payload),
                        ..Default::default()
                    },
                    false,
                );
                self.corrupted += 1;
                tracing::debug!(%pkt, "注入损坏");
            }
            queues.outbound.push_back(pkt);
        }
    }
}
