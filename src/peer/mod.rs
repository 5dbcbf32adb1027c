//! 随仓库附带的被测端实现（停等协议），用于演示和端到端测试。
//!
//! 它们和任何其他实现一样，只通过 UDP 与中继交互。

use std::io;

use thiserror::Error;

mod receiver;
mod sender;

pub use receiver::{Reassembly, serve};
pub use sender::{CHUNK_BYTES, StopAndWaitSender, plan_frames};

#[derive(Debug, Error)]
pub enum PeerError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("gave up on seqno {seqno} after {attempts} attempts")]
    GaveUp { seqno: i64, attempts: u32 },
}
