//! Superblock 解析

use crate::consts::FS_MAGIC;
use crate::error::{Error, ErrorKind, Result};
use byteorder::{ByteOrder, LittleEndian};

/// `s_magic` 偏移
const MAGIC_OFFSET: usize = 0;
/// `s_nblocks` 偏移
const NBLOCKS_OFFSET: usize = 4;
/// 需要读取的最小字节数
pub(crate) const SUPERBLOCK_PREFIX: usize = 8;

/// Superblock 快照
///
/// 初始化时从缓存中复制一次，按值持有，不与缓存页别名。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    magic: u32,
    nblocks: u32,
}

impl Superblock {
    /// 构造 superblock（主要用于制作磁盘镜像）
    pub const fn new(nblocks: u32) -> Self {
        Self {
            magic: FS_MAGIC,
            nblocks,
        }
    }

    /// 从块内容解析
    ///
    /// 魔数不符或块数小于 2（至少要容纳引导块和 superblock）时返回 `Corrupted`。
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < SUPERBLOCK_PREFIX {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "buffer too small for superblock",
            ));
        }

        let magic = LittleEndian::read_u32(&buf[MAGIC_OFFSET..]);
        if magic != FS_MAGIC {
            log::error!("[SUPER] bad magic {:#010x}", magic);
            return Err(Error::new(ErrorKind::Corrupted, "bad file system magic number"));
        }

        let nblocks = LittleEndian::read_u32(&buf[NBLOCKS_OFFSET..]);
        if nblocks < 2 {
            log::error!("[SUPER] implausible block count {}", nblocks);
            return Err(Error::new(ErrorKind::Corrupted, "superblock block count too small"));
        }

        Ok(Self { magic, nblocks })
    }

    /// 写入块缓冲区开头
    pub fn write_to(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[MAGIC_OFFSET..], self.magic);
        LittleEndian::write_u32(&mut buf[NBLOCKS_OFFSET..], self.nblocks);
    }

    /// 魔数
    pub fn magic(&self) -> u32 {
        self.magic
    }

    /// 设备总块数
    pub fn nblocks(&self) -> u32 {
        self.nblocks
    }
}
