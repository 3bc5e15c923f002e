//! 内存块设备
//!
//! 用于测试和无盘环境。可以注入读写失败来模拟坏盘。

use super::BlockDevice;
use crate::consts::{BLOCK_SIZE, SECTOR_SIZE};
use crate::error::{Error, ErrorKind, Result};
use alloc::vec::Vec;

/// 内存块设备
pub struct RamDisk {
    storage: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
    short_transfers: bool,
    reads: u64,
    writes: u64,
}

impl RamDisk {
    /// 创建容纳 `blocks` 个块的全零设备
    pub fn new(blocks: usize) -> Self {
        Self::from_image(alloc::vec![0u8; blocks * BLOCK_SIZE])
    }

    /// 从现成的磁盘镜像创建设备，长度不足一个扇区的尾部会被截掉
    pub fn from_image(mut image: Vec<u8>) -> Self {
        let len = image.len() - image.len() % SECTOR_SIZE;
        image.truncate(len);
        Self {
            storage: image,
            fail_reads: false,
            fail_writes: false,
            short_transfers: false,
            reads: 0,
            writes: 0,
        }
    }

    /// 之后的读操作全部失败
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// 之后的写操作全部失败
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// 之后的读写只传输前一半扇区，并如实报告传输的字节数
    pub fn set_short_transfers(&mut self, short: bool) {
        self.short_transfers = short;
    }

    /// 读操作次数
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// 写操作次数
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// 整个磁盘镜像
    pub fn image(&self) -> &[u8] {
        &self.storage
    }

    /// 某个块在镜像中的内容
    pub fn block(&self, blockno: u32) -> &[u8] {
        let start = blockno as usize * BLOCK_SIZE;
        &self.storage[start..start + BLOCK_SIZE]
    }

    /// 直接改写镜像中某个块（绕过缓存）
    pub fn block_mut(&mut self, blockno: u32) -> &mut [u8] {
        let start = blockno as usize * BLOCK_SIZE;
        &mut self.storage[start..start + BLOCK_SIZE]
    }

    fn byte_range(&self, first: u64, count: u32, buf_len: usize) -> Result<(usize, usize)> {
        let start = first as usize * SECTOR_SIZE;
        let len = count as usize * SECTOR_SIZE;
        if buf_len < len {
            return Err(Error::new(ErrorKind::InvalidInput, "buffer too small for sectors"));
        }
        if start + len > self.storage.len() {
            return Err(Error::new(ErrorKind::Io, "sector beyond end of device"));
        }
        Ok((start, len))
    }

    fn transfer_len(&self, len: usize) -> usize {
        if self.short_transfers {
            (len / 2) - (len / 2) % SECTOR_SIZE
        } else {
            len
        }
    }
}

impl BlockDevice for RamDisk {
    fn sector_size(&self) -> u32 {
        SECTOR_SIZE as u32
    }

    fn total_sectors(&self) -> u64 {
        (self.storage.len() / SECTOR_SIZE) as u64
    }

    fn read_sectors(&mut self, first: u64, buf: &mut [u8], count: u32) -> Result<usize> {
        if self.fail_reads {
            return Err(Error::new(ErrorKind::Io, "injected read failure"));
        }
        let (start, len) = self.byte_range(first, count, buf.len())?;
        let len = self.transfer_len(len);
        buf[..len].copy_from_slice(&self.storage[start..start + len]);
        self.reads += 1;
        Ok(len)
    }

    fn write_sectors(&mut self, first: u64, buf: &[u8], count: u32) -> Result<usize> {
        if self.fail_writes {
            return Err(Error::new(ErrorKind::Io, "injected write failure"));
        }
        let (start, len) = self.byte_range(first, count, buf.len())?;
        let len = self.transfer_len(len);
        self.storage[start..start + len].copy_from_slice(&buf[..len]);
        self.writes += 1;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_out_of_bounds_is_io_error() {
        let mut disk = RamDisk::new(1);
        let mut buf = vec![0u8; SECTOR_SIZE];
        assert!(disk.read_sectors(7, &mut buf, 1).is_ok());
        let err = disk.read_sectors(8, &mut buf, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_injected_failures() {
        let mut disk = RamDisk::new(2);
        let mut buf = vec![0u8; SECTOR_SIZE];
        disk.set_fail_reads(true);
        assert_eq!(disk.read_sectors(0, &mut buf, 1).unwrap_err().kind(), ErrorKind::Io);
        disk.set_fail_writes(true);
        assert_eq!(disk.write_sectors(0, &buf, 1).unwrap_err().kind(), ErrorKind::Io);
        assert_eq!(disk.reads(), 0);
        assert_eq!(disk.writes(), 0);
    }

    #[test]
    fn test_short_transfers_report_count() {
        let mut disk = RamDisk::new(1);
        disk.block_mut(0).fill(0x5A);
        disk.set_short_transfers(true);
        let mut buf = vec![0u8; BLOCK_SIZE];
        let n = disk.read_sectors(0, &mut buf, 8).unwrap();
        assert_eq!(n, BLOCK_SIZE / 2);
        assert!(buf[..n].iter().all(|&b| b == 0x5A));
        assert!(buf[n..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_image_truncates_partial_sector() {
        let disk = RamDisk::from_image(vec![1u8; SECTOR_SIZE * 3 + 17]);
        assert_eq!(disk.total_sectors(), 3);
    }
}
