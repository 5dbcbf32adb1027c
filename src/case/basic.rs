use crate::queue::RelayQueues;

use super::TestCase;

/// 不注入任何故障：入站报文立即转入出站队列
#[derive(Debug, Default)]
pub struct BasicCase;

impl TestCase for BasicCase {
    fn name(&self) -> &str {
        "basic"
    }

    fn on_packet(&mut self, queues: &mut RelayQueues) {
        queues.forward_all();
    }
}
