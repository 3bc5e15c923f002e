//! 位图基本操作
//!
//! 位的编号与小端 32 位字数组一致：第 `i` 位位于字节 `i / 8` 的第 `i % 8` 位。

use crate::error::{Error, ErrorKind, Result};

/// 测试位图中某一位是否被设置，越界视为未设置
pub fn test_bit(bitmap: &[u8], index: u32) -> bool {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return false;
    }

    (bitmap[byte_index] & (1 << bit_offset)) != 0
}

/// 设置位图中的某一位
///
/// # 返回
///
/// 成功返回 ()，如果索引超出范围返回错误
pub fn set_bit(bitmap: &mut [u8], index: u32) -> Result<()> {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Bitmap index out of range",
        ));
    }

    bitmap[byte_index] |= 1 << bit_offset;
    Ok(())
}

/// 清除位图中的某一位
///
/// # 返回
///
/// 成功返回 ()，如果索引超出范围返回错误
pub fn clear_bit(bitmap: &mut [u8], index: u32) -> Result<()> {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Bitmap index out of range",
        ));
    }

    bitmap[byte_index] &= !(1 << bit_offset);
    Ok(())
}

/// 统计 `[start, end)` 范围内被设置的位数
pub fn count_ones(bitmap: &[u8], start: u32, end: u32) -> u32 {
    let max_bits = (bitmap.len() * 8) as u32;
    let end = end.min(max_bits);
    (start..end).filter(|&i| test_bit(bitmap, i)).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clear() {
        let mut bitmap = [0u8; 4];
        set_bit(&mut bitmap, 9).unwrap();
        assert_eq!(bitmap[1], 0b10);
        assert!(test_bit(&bitmap, 9));
        clear_bit(&mut bitmap, 9).unwrap();
        assert!(!test_bit(&bitmap, 9));
    }

    #[test]
    fn test_matches_u32_word_layout() {
        // 字 1 的第 3 位 == 第 35 位
        let word: u32 = 1 << 3;
        let mut bitmap = [0u8; 8];
        bitmap[4..8].copy_from_slice(&word.to_le_bytes());
        assert!(test_bit(&bitmap, 35));
        assert_eq!(count_ones(&bitmap, 0, 64), 1);
    }

    #[test]
    fn test_out_of_range() {
        let mut bitmap = [0xFFu8; 1];
        assert!(!test_bit(&bitmap, 8));
        assert!(set_bit(&mut bitmap, 8).is_err());
        assert!(clear_bit(&mut bitmap, 100).is_err());
        assert_eq!(count_ones(&bitmap, 0, 100), 8);
    }
}
