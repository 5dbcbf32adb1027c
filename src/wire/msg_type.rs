//! 报文类型

use std::fmt;

/// 报文类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    Start,
    Data,
    Ack,
    End,
    EndAck,
}

impl MsgType {
    /// 从线上文本解析（五种类型都认识）
    pub fn from_wire(s: &str) -> Option<MsgType> {
        match s {
            "start" => Some(MsgType::Start),
            "data" => Some(MsgType::Data),
            "ack" => Some(MsgType::Ack),
            "end" => Some(MsgType::End),
            "end-ack" => Some(MsgType::EndAck),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MsgType::Start => "start",
            MsgType::Data => "data",
            MsgType::Ack => "ack",
            MsgType::End => "end",
            MsgType::EndAck => "end-ack",
        }
    }

    /// 中继校验入站报文时接受的类型。
    ///
    /// `end-ack` 只会由交互式发送端发往接收端，不会经过中继回来，因此不在入站集合里。
    /// 带 `end-ack` 的报文会被当作 bogon 原样转发。
    pub fn is_incoming(self) -> bool {
        !matches!(self, MsgType::EndAck)
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
