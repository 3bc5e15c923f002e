//! 块缓存配置

use crate::consts::{
    BLOCK_SIZE, DEFAULT_CACHE_LINES, DEFAULT_DIRECT_BLOCKS, DEFAULT_DISK_MAP_BASE,
    DEFAULT_DISK_MAP_SIZE, PAGE_SIZE,
};
use crate::error::{Error, ErrorKind, Result};

/// 块缓存配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// 磁盘映射窗口起始虚拟地址（页对齐）
    pub disk_map_base: u64,
    /// 磁盘映射窗口大小（字节，页对齐）
    pub disk_map_size: u64,
    /// 按块号直接映射的低编号块数量
    pub direct_blocks: u32,
    /// 缓存行数量
    pub cache_lines: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            disk_map_base: DEFAULT_DISK_MAP_BASE,
            disk_map_size: DEFAULT_DISK_MAP_SIZE,
            direct_blocks: DEFAULT_DIRECT_BLOCKS,
            cache_lines: DEFAULT_CACHE_LINES,
        }
    }
}

impl CacheConfig {
    /// 检查配置是否自洽
    ///
    /// 窗口必须页对齐、不回绕，并且能放下直接映射区和全部缓存行。
    pub fn validate(&self) -> Result<()> {
        if self.cache_lines == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "cache needs at least one line"));
        }
        if self.disk_map_base % PAGE_SIZE as u64 != 0 || self.disk_map_size % PAGE_SIZE as u64 != 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "disk map window must be page aligned"));
        }
        if self.disk_map_base.checked_add(self.disk_map_size).is_none() {
            return Err(Error::new(ErrorKind::InvalidInput, "disk map window wraps around"));
        }

        let needed = (self.direct_blocks as u64 + self.cache_lines as u64) * BLOCK_SIZE as u64;
        if needed > self.disk_map_size {
            log::error!(
                "[BCACHE] {} direct blocks + {} lines need {:#x} bytes, window is {:#x}",
                self.direct_blocks,
                self.cache_lines,
                needed,
                self.disk_map_size
            );
            return Err(Error::new(ErrorKind::InvalidInput, "cache pool does not fit in disk map window"));
        }
        Ok(())
    }
}
