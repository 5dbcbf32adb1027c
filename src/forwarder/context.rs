//! 单次运行的上下文
//!
//! 每个测试开始时新建，结束时丢弃，运行之间不共享任何状态。

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::case::TestCase;
use crate::queue::RelayQueues;
use crate::wire::{Packet, PacketFields};

use super::error::ForwarderError;

/// 运行状态：`Init`（socket 已绑定、无运行）→ `New`（运行开始、端点未知）→ `Ready`（已学到发送端与基线）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    New,
    Ready,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub datagrams_in: u64,
    pub datagrams_out: u64,
    pub bogons: u64,
    pub ticks: u64,
}

#[derive(Debug)]
pub struct RunContext {
    state: RunState,
    receiver: SocketAddr,
    sender: Option<SocketAddr>,
    baseline: i64,
    pub queues: RelayQueues,
    pub stats: RunStats,
}

impl RunContext {
    pub fn new(receiver: SocketAddr) -> Self {
        Self {
            state: RunState::New,
            receiver,
            sender: None,
            baseline: 0,
            queues: RelayQueues::default(),
            stats: RunStats::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn sender(&self) -> Option<SocketAddr> {
        self.sender
    }

    pub fn receiver(&self) -> SocketAddr {
        self.receiver
    }

    /// 会话基线：首个合法数据报的绝对序号
    pub fn baseline(&self) -> i64 {
        self.baseline
    }

    /// 处理一个到达的数据报：必要时学习发送端与基线，按来源改写目的地后
    /// 追加到入站队列，再调用一次 `on_packet`。
    #[tracing::instrument(skip(self, msg, src, case), fields(len = msg.len(), src = %src, state = ?self.state))]
    pub fn handle_datagram(
        &mut self,
        msg: &[u8],
        src: SocketAddr,
        case: &mut dyn TestCase,
    ) -> Result<(), ForwarderError> {
        if self.state == RunState::New && src.port() != self.receiver.port() {
            if let Ok(first) = PacketFields::parse(msg, 0) {
                self.baseline = first.seqno;
                self.sender = Some(src);
                self.state = RunState::Ready;
                info!(sender = %src, baseline = self.baseline, "🤝 学到发送端与序号基线");
            }
        }

        let dest = if src == self.receiver {
            self.sender.ok_or(ForwarderError::SenderUnknown(src))?
        } else if Some(src) == self.sender {
            self.receiver
        } else {
            return Err(ForwarderError::UnknownSource(src));
        };

        let pkt = Packet::parse(msg.to_vec(), dest, self.baseline);
        self.stats.datagrams_in += 1;
        if pkt.is_bogon() {
            self.stats.bogons += 1;
        }
        trace!(%pkt, dest = %dest, "入队");
        self.queues.inbound.push_back(pkt);
        case.on_packet(&mut self.queues);
        Ok(())
    }

    /// 一个 tick：先调用 `on_tick`，再按序取空出站队列，返回加回基线后待发送的数据报。
    pub fn tick(&mut self, case: &mut dyn TestCase, interval: Duration) -> Vec<(Vec<u8>, SocketAddr)> {
        case.on_tick(interval, &mut self.queues);
        self.stats.ticks += 1;

        let baseline = self.baseline;
        let out: Vec<_> = self
            .queues
            .outbound
            .drain()
            .map(|pkt| (pkt.to_wire(baseline), pkt.dest()))
            .collect();
        if !out.is_empty() {
            debug!(count = out.len(), "📤 flush 出站队列");
        }
        self.stats.datagrams_out += out.len() as u64;
        out
    }
}
