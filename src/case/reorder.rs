//! 乱序：攒下一个 tick 内到达的报文，tick 时倒序放出

use std::time::Duration;

use crate::queue::RelayQueues;
use crate::wire::Packet;

use super::TestCase;

#[derive(Debug, Default)]
pub struct ReorderCase {
    held: Vec<Packet>,
}

impl TestCase for ReorderCase {
    fn name(&self) -> &str {
        "reorder"
    }

    fn on_packet(&mut self, queues: &mut RelayQueues) {
        self.held.extend(queues.take_inbound());
    }

    fn on_tick(&mut self, _interval: Duration, queues: &mut RelayQueues) {
        queues.outbound.extend(self.held.drain(..).rev());
    }
}
