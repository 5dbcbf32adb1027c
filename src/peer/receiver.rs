//! 接收端：按序重组 payload 写入 `<来源 ip>.<来源端口>`，对每个合法报文回复累计 ack。

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Write;
use std::net::{SocketAddr, UdpSocket};
use std::path::Path;

use tracing::{debug, info, trace};

use crate::wire::{MsgType, PacketFields, encode, validate_checksum};

use super::PeerError;

/// 单个连接的重组状态
#[derive(Debug, Default)]
pub struct Reassembly {
    next: Option<i64>,
    pending: BTreeMap<i64, Vec<u8>>,
    end: Option<i64>,
}

impl Reassembly {
    /// 接收一个报文，返回按序可交付的 payload 和应当回复的 ack 序号（下一个期望序号）。
    /// `start` 之前的报文被忽略，返回 `None`。
    pub fn accept(&mut self, fields: PacketFields) -> Option<(Vec<Vec<u8>>, i64)> {
        if fields.msg_type == MsgType::Start && self.next.is_none() {
            self.next = Some(fields.seqno);
        }
        let mut next = self.next?;
        if fields.msg_type == MsgType::Ack {
            return None;
        }
        if fields.msg_type == MsgType::End {
            self.end = Some(fields.seqno);
        }
        if fields.seqno >= next {
            self.pending.entry(fields.seqno).or_insert(fields.payload);
        }

        let mut ready = Vec::new();
        while let Some(payload) = self.pending.remove(&next) {
            if !payload.is_empty() {
                ready.push(payload);
            }
            next += 1;
        }
        self.next = Some(next);
        Some((ready, next))
    }

    /// `end` 及其之前的所有报文都已交付
    pub fn finished(&self) -> bool {
        matches!((self.end, self.next), (Some(end), Some(next)) if next > end)
    }
}

struct Conn {
    state: Reassembly,
    out: File,
}

/// 一直服务直到进程被终止
pub fn serve(socket: &UdpSocket, out_dir: &Path) -> Result<(), PeerError> {
    let mut conns: HashMap<SocketAddr, Conn> = HashMap::new();
    let mut buf = [0u8; 4096];
    loop {
        let (n, src) = socket.recv_from(&mut buf)?;
        let raw = &buf[..n];
        if !validate_checksum(raw) {
            debug!(%src, "校验失败，丢弃");
            continue;
        }
        let Ok(fields) = PacketFields::parse(raw, 0) else {
            continue;
        };

        if fields.msg_type == MsgType::Start && !conns.contains_key(&src) {
            let path = out_dir.join(format!("{}.{}", src.ip(), src.port()));
            info!(%src, path = %path.display(), "新连接");
            let out = File::create(&path)?;
            conns.insert(
                src,
                Conn {
                    state: Reassembly::default(),
                    out,
                },
            );
        }
        let Some(conn) = conns.get_mut(&src) else {
            continue;
        };

        let Some((ready, ack)) = conn.state.accept(fields) else {
            continue;
        };
        for payload in ready {
            conn.out.write_all(&payload)?;
        }
        conn.out.flush()?;
        if conn.state.finished() {
            conn.out.sync_all()?;
        }
        trace!(%src, ack, "回复 ack");
        socket.send_to(&encode(MsgType::Ack, ack, &[]), src)?;
    }
}
