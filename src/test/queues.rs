use std::net::SocketAddr;

use crate::queue::{PacketQueue, RelayQueues};
use crate::wire::{MsgType, Packet, encode};

fn pkt(seq: i64) -> Packet {
    let dest: SocketAddr = "127.0.0.1:1".parse().expect("addr");
    Packet::parse(encode(MsgType::Data, seq, b"x"), dest, 0)
}

#[test]
fn packet_queue_is_fifo() {
    let mut q = PacketQueue::new();
    assert!(q.is_empty());
    q.push_back(pkt(1));
    q.push_back(pkt(2));
    q.push_back(pkt(3));
    assert_eq!(q.len(), 3);
    assert_eq!(q.pop_front().and_then(|p| p.seqno()), Some(1));

    q.retain(|p| p.seqno() != Some(2));
    let rest: Vec<_> = q.drain().filter_map(|p| p.seqno()).collect();
    assert_eq!(rest, vec![3]);
    assert!(q.is_empty());
}

#[test]
fn forward_all_moves_inbound_to_outbound_in_order() {
    let mut q = RelayQueues::default();
    q.outbound.push_back(pkt(0));
    for s in 1..4 {
        q.inbound.push_back(pkt(s));
    }
    q.forward_all();
    assert!(q.inbound.is_empty());
    let seqs: Vec<_> = q.outbound.iter().filter_map(|p| p.seqno()).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
}
