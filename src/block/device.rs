//! 块设备核心类型

use crate::consts::{BLOCK_SECTORS, BLOCK_SIZE};
use crate::error::{Error, ErrorKind, Result};

/// 块设备接口
///
/// 块缓存只需要设备提供"按扇区读写"两个阻塞操作，扇区大小固定。
///
/// # 示例
///
/// ```rust,ignore
/// use bcache_core::{BlockDevice, Result};
///
/// struct IdeDisk {
///     // ...
/// }
///
/// impl BlockDevice for IdeDisk {
///     fn sector_size(&self) -> u32 {
///         512
///     }
///
///     fn total_sectors(&self) -> u64 {
///         1 << 20
///     }
///
///     fn read_sectors(&mut self, first: u64, buf: &mut [u8], count: u32) -> Result<usize> {
///         // PIO 读取
///         Ok(count as usize * 512)
///     }
///
///     fn write_sectors(&mut self, first: u64, buf: &[u8], count: u32) -> Result<usize> {
///         // PIO 写入
///         Ok(count as usize * 512)
///     }
/// }
/// ```
pub trait BlockDevice {
    /// 物理扇区大小（通常 512）
    fn sector_size(&self) -> u32;

    /// 设备总扇区数
    fn total_sectors(&self) -> u64;

    /// 读取扇区
    ///
    /// # 参数
    ///
    /// * `first` - 起始扇区号
    /// * `buf` - 目标缓冲区（大小至少为 count * sector_size）
    /// * `count` - 要读取的扇区数
    ///
    /// # 返回
    ///
    /// 成功返回实际读取的字节数
    fn read_sectors(&mut self, first: u64, buf: &mut [u8], count: u32) -> Result<usize>;

    /// 写入扇区
    ///
    /// # 参数
    ///
    /// * `first` - 起始扇区号
    /// * `buf` - 源缓冲区（大小至少为 count * sector_size）
    /// * `count` - 要写入的扇区数
    ///
    /// # 返回
    ///
    /// 成功返回实际写入的字节数
    fn write_sectors(&mut self, first: u64, buf: &[u8], count: u32) -> Result<usize>;

    /// 刷新设备写缓存
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// 打开设备
    ///
    /// 在开始使用设备前调用。默认实现什么都不做。
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// 关闭设备
    ///
    /// 默认实现什么都不做。
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 块设备包装器
///
/// 负责块号到扇区号的换算（`blockno * BLOCK_SECTORS`）和 I/O 计数。
/// 块大小固定为一页。
pub struct BlockDev<D> {
    /// 底层设备
    device: D,
    /// 物理读取次数
    physical_read_count: u64,
    /// 物理写入次数
    physical_write_count: u64,
}

impl<D: BlockDevice> BlockDev<D> {
    /// 创建新的块设备包装器
    ///
    /// 块大小必须是扇区大小的整数倍。
    pub fn new(device: D) -> Result<Self> {
        let sector_size = device.sector_size() as usize;
        if sector_size == 0 || BLOCK_SIZE % sector_size != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block size must be a multiple of sector size",
            ));
        }

        Ok(Self {
            device,
            physical_read_count: 0,
            physical_write_count: 0,
        })
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 获取底层设备的可变引用
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 设备能容纳的完整块数
    pub fn total_blocks(&self) -> u64 {
        self.device.total_sectors() / self.sectors_per_block() as u64
    }

    /// 物理读取次数
    pub fn physical_read_count(&self) -> u64 {
        self.physical_read_count
    }

    /// 物理写入次数
    pub fn physical_write_count(&self) -> u64 {
        self.physical_write_count
    }

    /// 每个块包含的扇区数
    pub fn sectors_per_block(&self) -> u32 {
        (BLOCK_SIZE / self.device.sector_size() as usize) as u32
    }

    /// 块号对应的起始扇区号
    pub fn block_to_sector(&self, blockno: u32) -> u64 {
        blockno as u64 * self.sectors_per_block() as u64
    }

    /// 读取一个完整的块
    ///
    /// # 参数
    ///
    /// * `blockno` - 块号
    /// * `buf` - 目标缓冲区（大小至少为 BLOCK_SIZE）
    ///
    /// 设备只传输了部分字节时返回 `Io`。
    pub fn read_block(&mut self, blockno: u32, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < BLOCK_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "buffer too small for block",
            ));
        }

        let first = self.block_to_sector(blockno);
        let count = self.sectors_per_block();
        self.physical_read_count += 1;
        log::trace!("[BDEV] read block {} (sectors {}..{})", blockno, first, first + count as u64);
        let n = self.device.read_sectors(first, &mut buf[..BLOCK_SIZE], count)?;
        full_block(n, "short read from device")
    }

    /// 写入一个完整的块
    ///
    /// # 参数
    ///
    /// * `blockno` - 块号
    /// * `buf` - 源缓冲区（大小至少为 BLOCK_SIZE）
    ///
    /// 设备只传输了部分字节时返回 `Io`。
    pub fn write_block(&mut self, blockno: u32, buf: &[u8]) -> Result<usize> {
        if buf.len() < BLOCK_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "buffer too small for block",
            ));
        }

        let first = self.block_to_sector(blockno);
        let count = self.sectors_per_block();
        self.physical_write_count += 1;
        log::trace!("[BDEV] write block {} (sectors {}..{})", blockno, first, first + count as u64);
        let n = self.device.write_sectors(first, &buf[..BLOCK_SIZE], count)?;
        full_block(n, "short write to device")
    }

    /// 打开底层设备
    pub fn open(&mut self) -> Result<()> {
        self.device.open()
    }

    /// 刷新并关闭底层设备
    pub fn close(&mut self) -> Result<()> {
        self.device.flush()?;
        self.device.close()
    }
}

fn full_block(n: usize, what: &'static str) -> Result<usize> {
    if n < BLOCK_SIZE {
        log::error!("[BDEV] device transferred {} of {} bytes", n, BLOCK_SIZE);
        return Err(Error::new(ErrorKind::Io, what));
    }
    Ok(n)
}

// 保证 BLOCK_SECTORS 常量与默认扇区大小一致
const _: () = assert!(BLOCK_SECTORS as usize * crate::consts::SECTOR_SIZE == BLOCK_SIZE);
