//! 空闲块位图

use super::ops;
use crate::error::Result;
use alloc::vec::Vec;

/// 分配元数据接口
///
/// 块缓存只在加载块之后做一次一致性检查：如果刚读入的块在位图中被标为空闲，
/// 说明其他地方的簿记出了问题。
pub trait BlockBitmap {
    /// 块是否空闲
    fn is_block_free(&self, blockno: u32) -> bool;
}

/// 字节数组形式的空闲块位图，位为 1 表示空闲
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBitmap {
    bits: Vec<u8>,
    nblocks: u32,
}

impl FreeBitmap {
    /// 所有块都标为已用
    pub fn new(nblocks: u32) -> Self {
        Self {
            bits: alloc::vec![0u8; (nblocks as usize + 7) / 8],
            nblocks,
        }
    }

    /// 从磁盘上的位图字节创建
    pub fn from_bytes(bits: Vec<u8>, nblocks: u32) -> Self {
        Self { bits, nblocks }
    }

    /// 标记为空闲
    pub fn mark_free(&mut self, blockno: u32) -> Result<()> {
        ops::set_bit(&mut self.bits, blockno)
    }

    /// 标记为已用
    pub fn mark_used(&mut self, blockno: u32) -> Result<()> {
        ops::clear_bit(&mut self.bits, blockno)
    }

    /// 空闲块数
    pub fn count_free(&self) -> u32 {
        ops::count_ones(&self.bits, 0, self.nblocks)
    }

    /// 原始位图字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}

impl BlockBitmap for FreeBitmap {
    fn is_block_free(&self, blockno: u32) -> bool {
        // 超出设备范围的块号一律视为非空闲
        blockno < self.nblocks && ops::test_bit(&self.bits, blockno)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_bitmap() {
        let mut bitmap = FreeBitmap::new(20);
        assert_eq!(bitmap.count_free(), 0);
        bitmap.mark_free(17).unwrap();
        assert!(bitmap.is_block_free(17));
        assert_eq!(bitmap.count_free(), 1);
        bitmap.mark_used(17).unwrap();
        assert!(!bitmap.is_block_free(17));
    }

    #[test]
    fn test_out_of_range_is_not_free() {
        let bitmap = FreeBitmap::from_bytes(alloc::vec![0xFF; 4], 10);
        assert!(bitmap.is_block_free(9));
        assert!(!bitmap.is_block_free(10));
        assert!(!bitmap.is_block_free(31));
        assert_eq!(bitmap.count_free(), 10);
    }
}
