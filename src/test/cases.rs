use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::case::{
    BasicCase, CorruptCase, DelayCase, RandomDropCase, ReorderCase, RunFiles, TestCase, Verdict,
    files_match,
};
use crate::queue::RelayQueues;
use crate::wire::{MsgType, Packet, encode, validate_checksum};

const TICK: Duration = Duration::from_millis(1);

fn pkt(seq: i64) -> Packet {
    let dest: SocketAddr = "127.0.0.1:1".parse().expect("addr");
    Packet::parse(encode(MsgType::Data, seq, b"payload"), dest, 0)
}

/// 模拟中继：入队一个报文并回调一次
fn arrive(case: &mut dyn TestCase, q: &mut RelayQueues, seq: i64) {
    q.inbound.push_back(pkt(seq));
    case.on_packet(q);
}

fn out_seqs(q: &mut RelayQueues) -> Vec<i64> {
    q.outbound.drain().filter_map(|p| p.seqno()).collect()
}

pub(super) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "bearstp-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn basic_case_forwards_everything_in_order() {
    let mut case = BasicCase;
    let mut q = RelayQueues::default();
    for s in 0..4 {
        arrive(&mut case, &mut q, s);
    }
    assert!(q.inbound.is_empty());
    assert_eq!(out_seqs(&mut q), vec![0, 1, 2, 3]);
}

#[test]
fn random_drop_extremes() {
    let mut keep = RandomDropCase::new(0.0, 1);
    let mut drop = RandomDropCase::new(1.0, 1);
    let mut q = RelayQueues::default();
    for s in 0..10 {
        arrive(&mut keep, &mut q, s);
    }
    assert_eq!(out_seqs(&mut q).len(), 10);
    for s in 0..10 {
        arrive(&mut drop, &mut q, s);
    }
    assert!(q.outbound.is_empty());
    assert!(q.inbound.is_empty());
    assert_eq!(drop.dropped, 10);
}

#[test]
fn random_drop_is_reproducible_for_a_seed() {
    let run = |seed| {
        let mut case = RandomDropCase::new(0.5, seed);
        let mut q = RelayQueues::default();
        for s in 0..50 {
            arrive(&mut case, &mut q, s);
        }
        out_seqs(&mut q)
    };
    assert_eq!(run(42), run(42));
}

#[test]
fn reorder_releases_held_batch_backwards_on_tick() {
    let mut case = ReorderCase::default();
    let mut q = RelayQueues::default();
    for s in 0..3 {
        arrive(&mut case, &mut q, s);
    }
    assert!(q.outbound.is_empty());
    case.on_tick(TICK, &mut q);
    assert_eq!(out_seqs(&mut q), vec![2, 1, 0]);
}

#[test]
fn delay_holds_packets_for_configured_ticks() {
    let mut case = DelayCase::new(2);
    let mut q = RelayQueues::default();
    arrive(&mut case, &mut q, 0);
    case.on_tick(TICK, &mut q);
    assert!(q.outbound.is_empty());
    arrive(&mut case, &mut q, 1);
    case.on_tick(TICK, &mut q);
    assert_eq!(out_seqs(&mut q), vec![0]);
    case.on_tick(TICK, &mut q);
    assert_eq!(out_seqs(&mut q), vec![1]);
}

#[test]
fn corrupt_keeps_old_checksum_and_skips_bogons() {
    let mut case = CorruptCase::new(1.0, 3);
    let mut q = RelayQueues::default();
    arrive(&mut case, &mut q, 8);
    let dest: SocketAddr = "127.0.0.1:1".parse().expect("addr");
    q.inbound.push_back(Packet::parse(b"junk".to_vec(), dest, 0));
    case.on_packet(&mut q);

    let out: Vec<_> = q.outbound.drain().collect();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].payload(), Some(&b"payload#"[..]));
    assert!(!validate_checksum(&out[0].to_wire(0)));
    assert_eq!(out[1].to_wire(0), b"junk");
    assert_eq!(case.corrupted, 1);
}

#[test]
fn files_match_compares_bytes() {
    let dir = unique_temp_dir("files-match");
    let input = dir.join("input");
    let same = dir.join("same");
    let other = dir.join("other");
    fs::write(&input, b"hello world").expect("write");
    fs::write(&same, b"hello world").expect("write");
    fs::write(&other, b"hello").expect("write");

    assert_eq!(files_match(&input, &same), Verdict::Pass);
    assert!(!files_match(&input, &other).passed());
    assert!(!files_match(&input, &dir.join("missing")).passed());

    let mut case = BasicCase;
    let files = RunFiles {
        input: input.clone(),
        output: same,
    };
    assert!(case.result(&files).passed());
}
