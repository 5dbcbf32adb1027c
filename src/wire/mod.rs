//! BEARS-TP 报文格式
//!
//! 线上格式为 ASCII：`type|seqno|[payload|]checksum`，payload 为空时连同其分隔符一起省略。

mod checksum;
mod msg_type;
mod packet;

pub use checksum::{generate_checksum, validate_checksum};
pub use msg_type::MsgType;
pub use packet::{Packet, PacketFields, PacketUpdate, ParseError, encode};

/// 字段分隔符
pub const DELIM: u8 = b'|';
