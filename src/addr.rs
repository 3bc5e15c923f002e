//! 地址映射
//!
//! 磁盘映射窗口 `[base, base + size)` 的布局：
//!
//! ```text
//! base
//! | 直接映射块 0 .. direct_blocks | 缓存行 0 .. lines | (未使用) |
//! ```
//!
//! 低编号块（引导块、superblock 等）按块号直接映射，其余块都要经过缓存行间接访问。
//! 缓存行 `i` 固定位于 `base + (direct_blocks + i) * BLOCK_SIZE`。

use crate::cache::CacheConfig;
use crate::consts::{BLOCK_SIZE, PAGE_SIZE};
use core::fmt;

/// 虚拟地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u64);

impl VirtAddr {
    /// 向下对齐到页边界
    pub const fn page_round_down(self) -> Self {
        Self(self.0 & !(PAGE_SIZE as u64 - 1))
    }

    /// 页内偏移
    pub const fn page_offset(self) -> usize {
        (self.0 & (PAGE_SIZE as u64 - 1)) as usize
    }

    /// 页号
    pub const fn page_number(self) -> u64 {
        self.0 / PAGE_SIZE as u64
    }

    /// 向后偏移 `bytes` 字节
    pub const fn offset_by(self, bytes: usize) -> Self {
        Self(self.0 + bytes as u64)
    }

    /// 原始数值
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u64> for VirtAddr {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// 磁盘映射窗口布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskMap {
    base: u64,
    size: u64,
    direct_blocks: u32,
    lines: usize,
}

impl DiskMap {
    /// 根据配置创建布局（配置应已通过 `validate`）
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            base: config.disk_map_base,
            size: config.disk_map_size,
            direct_blocks: config.direct_blocks,
            lines: config.cache_lines,
        }
    }

    /// 窗口起始地址
    pub fn base(&self) -> VirtAddr {
        VirtAddr(self.base)
    }

    /// 窗口结束地址（不含）
    pub fn end(&self) -> VirtAddr {
        VirtAddr(self.base + self.size)
    }

    /// 直接映射的块数量
    pub fn direct_blocks(&self) -> u32 {
        self.direct_blocks
    }

    /// 缓存行数量
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// 地址是否落在本缓存负责的窗口内
    pub fn contains(&self, va: VirtAddr) -> bool {
        va.0 >= self.base && va.0 - self.base < self.size
    }

    /// 地址是否落在直接映射区
    pub fn is_direct(&self, va: VirtAddr) -> bool {
        self.contains(va) && va.0 - self.base < self.direct_blocks as u64 * BLOCK_SIZE as u64
    }

    /// 直接映射块的虚拟地址
    pub fn direct_region(&self, blockno: u32) -> VirtAddr {
        VirtAddr(self.base + blockno as u64 * BLOCK_SIZE as u64)
    }

    /// 直接映射区内地址对应的块号
    pub fn direct_block_of(&self, va: VirtAddr) -> Option<u32> {
        if !self.is_direct(va) {
            return None;
        }
        Some(((va.0 - self.base) / BLOCK_SIZE as u64) as u32)
    }

    /// 缓存行的虚拟地址
    pub fn line_region(&self, index: usize) -> VirtAddr {
        VirtAddr(self.base + (self.direct_blocks as u64 + index as u64) * BLOCK_SIZE as u64)
    }

    /// 地址所在的缓存行，不在缓存池范围内则返回 None
    pub fn line_of(&self, va: VirtAddr) -> Option<usize> {
        if !self.contains(va) || self.is_direct(va) {
            return None;
        }
        let index = (va.0 - self.base) / BLOCK_SIZE as u64 - self.direct_blocks as u64;
        if index < self.lines as u64 {
            Some(index as usize)
        } else {
            None
        }
    }
}
