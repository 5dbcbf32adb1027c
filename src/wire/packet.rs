//! 中继报文
//!
//! 把原始数据报解析成带类型的字段；解析失败的报文标记为 bogon，之后只能原样转发。

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::trace;

use super::DELIM;
use super::checksum::generate_checksum;
use super::msg_type::MsgType;

/// 结构性解析错误。中继内部吸收为 bogon，从不向上抛出。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected at least 3 fields, got {0}")]
    TooFewFields(usize),
    #[error("header field is not valid UTF-8")]
    NotUtf8,
    #[error("unexpected message type {0:?}")]
    UnknownType(String),
    #[error("bad sequence number {0:?}")]
    BadSeqno(String),
    #[error("bad checksum token {0:?}")]
    BadChecksum(String),
}

/// 解析成功后的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFields {
    pub msg_type: MsgType,
    /// 会话相对序号（已减去基线）
    pub seqno: i64,
    pub payload: Vec<u8>,
    /// 线上原文，保证可以逐字保留
    pub checksum: String,
}

fn field_str(raw: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(raw).map_err(|_| ParseError::NotUtf8)
}

impl PacketFields {
    /// 按分隔符切分：首字段为类型，次字段为绝对序号，末字段为校验和，
    /// 中间所有字段用分隔符重新拼回 payload（payload 里允许出现分隔符）。
    pub fn parse(raw: &[u8], baseline: i64) -> Result<PacketFields, ParseError> {
        let pieces: Vec<&[u8]> = raw.split(|b| *b == DELIM).collect();
        let n = pieces.len();
        if n < 3 {
            return Err(ParseError::TooFewFields(n));
        }

        let type_str = field_str(pieces[0])?;
        let msg_type = MsgType::from_wire(type_str)
            .filter(|t| t.is_incoming())
            .ok_or_else(|| ParseError::UnknownType(type_str.to_string()))?;

        let seq_str = field_str(pieces[1])?;
        let seqno = seq_str
            .parse::<i64>()
            .ok()
            .and_then(|abs| abs.checked_sub(baseline))
            .ok_or_else(|| ParseError::BadSeqno(seq_str.to_string()))?;

        let checksum = field_str(pieces[n - 1])?;
        if checksum.parse::<i64>().is_err() {
            return Err(ParseError::BadChecksum(checksum.to_string()));
        }

        Ok(PacketFields {
            msg_type,
            seqno,
            payload: pieces[2..n - 1].join(&DELIM),
            checksum: checksum.to_string(),
        })
    }
}

/// 报文主体：`type|seqno|payload|`，payload 为空时为 `type|seqno|`
fn body(msg_type: MsgType, seqno: i64, payload: &[u8]) -> Vec<u8> {
    let mut out = format!("{}|{}|", msg_type, seqno).into_bytes();
    if !payload.is_empty() {
        out.extend_from_slice(payload);
        out.push(DELIM);
    }
    out
}

/// 生成完整报文（主体 + 新计算的校验和）
pub fn encode(msg_type: MsgType, seqno: i64, payload: &[u8]) -> Vec<u8> {
    let mut out = body(msg_type, seqno, payload);
    let sum = generate_checksum(&out);
    out.extend_from_slice(sum.to_string().as_bytes());
    out
}

/// [`Packet::update`] 的字段覆盖；`None` 表示保留原值
#[derive(Debug, Clone, Default)]
pub struct PacketUpdate {
    pub msg_type: Option<MsgType>,
    pub seqno: Option<i64>,
    pub payload: Option<Vec<u8>>,
}

/// 中继队列中的报文
#[derive(Debug, Clone)]
pub struct Packet {
    raw: Vec<u8>,
    dest: SocketAddr,
    fields: Option<PacketFields>,
    modified: bool,
    keep_checksum: bool,
}

impl Packet {
    /// 解析原始数据报；失败时返回 bogon，不报错
    pub fn parse(raw: Vec<u8>, dest: SocketAddr, baseline: i64) -> Packet {
        let fields = match PacketFields::parse(&raw, baseline) {
            Ok(f) => Some(f),
            Err(err) => {
                trace!(%err, len = raw.len(), "bogon");
                None
            }
        };
        Packet {
            raw,
            dest,
            fields,
            modified: false,
            keep_checksum: false,
        }
    }

    pub fn is_bogon(&self) -> bool {
        self.fields.is_none()
    }

    /// 当前线上表示（序号为会话相对值）
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// 投递目标
    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    pub fn fields(&self) -> Option<&PacketFields> {
        self.fields.as_ref()
    }

    pub fn msg_type(&self) -> Option<MsgType> {
        self.fields.as_ref().map(|f| f.msg_type)
    }

    pub fn seqno(&self) -> Option<i64> {
        self.fields.as_ref().map(|f| f.seqno)
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.fields.as_ref().map(|f| f.payload.as_slice())
    }

    pub fn checksum(&self) -> Option<&str> {
        self.fields.as_ref().map(|f| f.checksum.as_str())
    }

    /// 覆盖部分字段并重新序列化。
    ///
    /// `recompute_checksum` 为 false 时保留原校验和文本，用于故意注入损坏；
    /// 这个选择会一直保持到发送。bogon 上调用无效果。
    pub fn update(&mut self, changes: PacketUpdate, recompute_checksum: bool) {
        let Some(fields) = self.fields.as_mut() else {
            return;
        };
        if let Some(t) = changes.msg_type {
            fields.msg_type = t;
        }
        if let Some(seqno) = changes.seqno {
            fields.seqno = seqno;
        }
        if let Some(payload) = changes.payload {
            fields.payload = payload;
        }

        let mut raw = body(fields.msg_type, fields.seqno, &fields.payload);
        if recompute_checksum {
            fields.checksum = generate_checksum(&raw).to_string();
        }
        raw.extend_from_slice(fields.checksum.as_bytes());

        self.raw = raw;
        self.modified = true;
        self.keep_checksum = !recompute_checksum;
    }

    /// 发送到线上的字节：序号加回基线。
    ///
    /// bogon 与未修改过的报文逐字节原样发送。
    pub fn to_wire(&self, baseline: i64) -> Vec<u8> {
        let Some(fields) = self.fields.as_ref().filter(|_| self.modified) else {
            return self.raw.clone();
        };
        let seqno = fields.seqno.wrapping_add(baseline);
        if self.keep_checksum {
            let mut out = body(fields.msg_type, seqno, &fields.payload);
            out.extend_from_slice(fields.checksum.as_bytes());
            out
        } else {
            encode(fields.msg_type, seqno, &fields.payload)
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fields {
            Some(fields) => write!(
                f,
                "{}|{}|...|{}",
                fields.msg_type, fields.seqno, fields.checksum
            ),
            None => write!(f, "<bogon {} bytes>", self.raw.len()),
        }
    }
}
