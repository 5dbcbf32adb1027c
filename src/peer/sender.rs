//! 停等发送端：一次只有一个报文在途，收到 `ack|seqno+1` 才发下一个。

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::wire::{MsgType, PacketFields, encode, validate_checksum};

use super::PeerError;

/// 每个 data 报文的最大 payload
pub const CHUNK_BYTES: usize = 1000;

/// 把文件内容切成 `start, data.., end` 报文序列，序号从 `isn` 开始连续递增
pub fn plan_frames(isn: i64, data: &[u8]) -> Vec<(i64, Vec<u8>)> {
    let mut frames = vec![(isn, encode(MsgType::Start, isn, &[]))];
    let mut seqno = isn;
    for chunk in data.chunks(CHUNK_BYTES) {
        seqno += 1;
        frames.push((seqno, encode(MsgType::Data, seqno, chunk)));
    }
    seqno += 1;
    frames.push((seqno, encode(MsgType::End, seqno, &[])));
    frames
}

#[derive(Debug)]
pub struct StopAndWaitSender {
    socket: UdpSocket,
    dest: SocketAddr,
    pub rto: Duration,
    pub max_attempts: u32,
}

impl StopAndWaitSender {
    pub fn new(socket: UdpSocket, dest: SocketAddr) -> Self {
        Self {
            socket,
            dest,
            rto: Duration::from_millis(100),
            max_attempts: 200,
        }
    }

    /// 依次可靠地送出所有报文
    pub fn send_all(&self, frames: &[(i64, Vec<u8>)]) -> Result<(), PeerError> {
        self.socket.set_read_timeout(Some(self.rto))?;
        for (seqno, frame) in frames {
            self.send_one(*seqno, frame)?;
        }
        info!(frames = frames.len(), "✅ 发送完成");
        Ok(())
    }

    fn send_one(&self, seqno: i64, frame: &[u8]) -> Result<(), PeerError> {
        let mut buf = [0u8; 4096];
        for attempt in 1..=self.max_attempts {
            self.socket.send_to(frame, self.dest)?;
            trace!(seqno, attempt, "发送");
            let deadline = Instant::now() + self.rto;
            while Instant::now() < deadline {
                let n = match self.socket.recv_from(&mut buf) {
                    Ok((n, _)) => n,
                    Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
                    Err(e) if e.kind() == ErrorKind::ConnectionRefused => break,
                    Err(e) => return Err(e.into()),
                };
                let reply = &buf[..n];
                if !validate_checksum(reply) {
                    debug!(seqno, "丢弃校验失败的回复");
                    continue;
                }
                match PacketFields::parse(reply, 0) {
                    Ok(ack) if ack.msg_type == MsgType::Ack && ack.seqno > seqno => return Ok(()),
                    _ => continue,
                }
            }
        }
        Err(PeerError::GaveUp {
            seqno,
            attempts: self.max_attempts,
        })
    }
}
