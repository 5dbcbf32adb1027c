//! 校验和
//!
//! CRC-32（zlib 多项式），以十进制文本出现在报文最后一个字段。

use crc::{CRC_32_ISO_HDLC, Crc};

use super::DELIM;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// 计算报文主体（`type|seqno|[payload|]`）的校验和
pub fn generate_checksum(body: &[u8]) -> u32 {
    CRC32.checksum(body)
}

/// 校验完整报文：最后一个分隔符之后的文本必须等于其之前部分的校验和。
pub fn validate_checksum(raw: &[u8]) -> bool {
    let Some(pos) = raw.iter().rposition(|b| *b == DELIM) else {
        return false;
    };
    let (body, token) = (&raw[..=pos], &raw[pos + 1..]);
    std::str::from_utf8(token)
        .ok()
        .and_then(|t| t.parse::<u32>().ok())
        .is_some_and(|sum| sum == generate_checksum(body))
}
