//! CRC32 校验和计算
//!
//! 自检时用来确认恢复后的块与原始快照一致

/// 计算整块数据的 CRC32
#[inline]
pub fn block_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
