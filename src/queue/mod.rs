//! 中继队列
//!
//! 入站队列只由中继追加，出站队列只由测试用例填充；中继每个 tick 清空出站队列。

use crate::wire::Packet;

mod fifo;

pub use fifo::PacketQueue;

/// 一次运行的两条队列，测试用例回调时拿到的唯一可变状态
#[derive(Debug, Default)]
pub struct RelayQueues {
    pub inbound: PacketQueue,
    pub outbound: PacketQueue,
}

impl RelayQueues {
    /// 把入站队列全部按序移到出站队列
    pub fn forward_all(&mut self) {
        for pkt in self.inbound.drain() {
            self.outbound.push_back(pkt);
        }
    }

    /// 取出入站队列中的全部报文
    pub fn take_inbound(&mut self) -> Vec<Packet> {
        self.inbound.drain().collect()
    }
}
