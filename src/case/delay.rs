//! 固定延迟：每个报文在队列里停留若干 tick

use std::collections::VecDeque;
use std::time::Duration;

use crate::queue::RelayQueues;
use crate::wire::Packet;

use super::TestCase;

#[derive(Debug)]
pub struct DelayCase {
    ticks: u64,
    now: u64,
    // (到期 tick, 报文)，到期 tick 单调不减
    held: VecDeque<(u64, Packet)>,
}

impl DelayCase {
    pub fn new(ticks: u64) -> Self {
        Self {
            ticks,
            now: 0,
            held: VecDeque::new(),
        }
    }
}

impl TestCase for DelayCase {
    fn name(&self) -> &str {
        "delay"
    }

    fn on_packet(&mut self, queues: &mut RelayQueues) {
        let due = self.now.saturating_add(self.ticks);
        for pkt in queues.take_inbound() {
            self.held.push_back((due, pkt));
        }
    }

    fn on_tick(&mut self, _interval: Duration, queues: &mut RelayQueues) {
        self.now += 1;
        while self.held.front().is_some_and(|(due, _)| *due <= self.now) {
            if let Some((_, pkt)) = self.held.pop_front() {
                queues.outbound.push_back(pkt);
            }
        }
    }
}
