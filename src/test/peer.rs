use crate::peer::{CHUNK_BYTES, Reassembly, plan_frames};
use crate::wire::{MsgType, PacketFields, validate_checksum};

fn fields(frame: &[u8]) -> PacketFields {
    PacketFields::parse(frame, 0).expect("parse")
}

#[test]
fn plan_frames_splits_file_between_start_and_end() {
    let data = vec![b'a'; CHUNK_BYTES * 2 + 500];
    let frames = plan_frames(10, &data);
    assert_eq!(frames.len(), 5);

    let parsed: Vec<_> = frames.iter().map(|(_, f)| fields(f)).collect();
    assert_eq!(parsed[0].msg_type, MsgType::Start);
    assert_eq!(parsed[4].msg_type, MsgType::End);
    assert_eq!(parsed[3].payload.len(), 500);
    for (i, ((seqno, frame), f)) in frames.iter().zip(&parsed).enumerate() {
        assert_eq!(*seqno, 10 + i as i64);
        assert_eq!(f.seqno, *seqno);
        assert!(validate_checksum(frame));
    }
}

#[test]
fn empty_file_is_just_start_and_end() {
    let frames = plan_frames(0, &[]);
    let types: Vec<_> = frames.iter().map(|(_, f)| fields(f).msg_type).collect();
    assert_eq!(types, vec![MsgType::Start, MsgType::End]);
}

#[test]
fn reassembly_delivers_in_order_and_acks_next_expected() {
    let frames = plan_frames(10, b"first-chunk");
    let mut r = Reassembly::default();

    // data 在 start 之前到达：忽略
    assert!(r.accept(fields(&frames[1].1)).is_none());

    let (ready, ack) = r.accept(fields(&frames[0].1)).expect("start");
    assert!(ready.is_empty());
    assert_eq!(ack, 11);

    let (ready, ack) = r.accept(fields(&frames[1].1)).expect("data");
    assert_eq!(ready, vec![b"first-chunk".to_vec()]);
    assert_eq!(ack, 12);

    // 重复报文不会重复交付
    let (ready, ack) = r.accept(fields(&frames[1].1)).expect("dup");
    assert!(ready.is_empty());
    assert_eq!(ack, 12);
    assert!(!r.finished());

    let (_, ack) = r.accept(fields(&frames[2].1)).expect("end");
    assert_eq!(ack, 13);
    assert!(r.finished());
}

#[test]
fn reassembly_buffers_out_of_order_data() {
    let data = vec![b'x'; CHUNK_BYTES + 1];
    let frames = plan_frames(0, &data);
    let mut r = Reassembly::default();
    r.accept(fields(&frames[0].1)).expect("start");

    let (ready, ack) = r.accept(fields(&frames[2].1)).expect("second");
    assert!(ready.is_empty());
    assert_eq!(ack, 1);

    let (ready, ack) = r.accept(fields(&frames[1].1)).expect("first");
    assert_eq!(ready.len(), 2);
    assert_eq!(ready[0].len(), CHUNK_BYTES);
    assert_eq!(ready[1].len(), 1);
    assert_eq!(ack, 3);
}
