//! FIFO 报文队列，插入顺序即投递顺序。

use std::collections::VecDeque;

use crate::wire::Packet;

#[derive(Debug, Default)]
pub struct PacketQueue {
    q: VecDeque<Packet>,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, pkt: Packet) {
        self.q.push_back(pkt);
    }

    pub fn pop_front(&mut self) -> Option<Packet> {
        self.q.pop_front()
    }

    /// 按插入顺序取出全部报文
    pub fn drain(&mut self) -> impl Iterator<Item = Packet> + '_ {
        self.q.drain(..)
    }

    pub fn retain(&mut self, f: impl FnMut(&Packet) -> bool) {
        self.q.retain(f);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.q.iter()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }
}

impl Extend<Packet> for PacketQueue {
    fn extend<I: IntoIterator<Item = Packet>>(&mut self, iter: I) {
        self.q.extend(iter);
    }
}
