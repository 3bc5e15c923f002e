//! 块缓存实现
//!
//! 每个块都有一个虚拟地址。第一次访问时触发缺页，由缺页处理器从设备读入；
//! 之后的访问直接命中。写访问会由内存子系统设置脏位，刷新时只写回脏页。
//!
//! 真实的访问缺页在这里表现为显式的 [`BlockCache::resolve_or_load`]：
//! 所有访问路径（`read_at`、`write_at`、`read_block`、`modify_block`）都先经过它。

use super::replace::{select_line, LineChoice};
use super::{CacheConfig, CacheLine};
use crate::addr::{DiskMap, VirtAddr};
use crate::bitmap::BlockBitmap;
use crate::block::{BlockDev, BlockDevice};
use crate::consts::PAGE_SIZE;
use crate::error::{Error, ErrorKind, Result};
use crate::mm::PageMapper;
use crate::superblock::Superblock;
use alloc::boxed::Box;
use alloc::vec::Vec;

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 缺页加载次数
    pub faults: u64,
    /// 缓存池命中次数
    pub hits: u64,
    /// 缓存池未命中次数（需要改绑缓存行）
    pub misses: u64,
    /// 驱逐已绑定块的次数
    pub evictions: u64,
    /// 脏页写回次数
    pub writebacks: u64,
}

impl CacheStats {
    /// 计算缓存池命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 按需调页的块缓存
///
/// 持有设备、内存子系统、缓存行表和设备几何信息，生命周期与文件系统服务相同。
/// 所有操作都需要 `&mut self`，借用检查保证"扫描-选择-改绑-刷新"不会被并发打断。
pub struct BlockCache<D, M> {
    pub(super) bdev: BlockDev<D>,
    pub(super) mmu: M,
    pub(super) map: DiskMap,
    pub(super) lines: Vec<CacheLine>,
    pub(super) bitmap: Option<Box<dyn BlockBitmap>>,
    pub(super) super_block: Option<Superblock>,
    pub(super) handler_installed: bool,
    pub(super) stats: CacheStats,
}

impl<D: BlockDevice, M: PageMapper> BlockCache<D, M> {
    /// 创建块缓存，不安装缺页处理器也不做自检
    ///
    /// 正常使用应调用 [`BlockCache::init`]。
    pub fn new(device: D, mmu: M, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let bdev = BlockDev::new(device)?;

        Ok(Self {
            bdev,
            mmu,
            map: DiskMap::new(&config),
            lines: alloc::vec![CacheLine::default(); config.cache_lines],
            bitmap: None,
            super_block: None,
            handler_installed: false,
            stats: CacheStats::default(),
        })
    }

    /// 设置空闲块位图，之后每次加载都会检查块是否被标为空闲
    pub fn set_bitmap(&mut self, bitmap: Box<dyn BlockBitmap>) {
        self.bitmap = Some(bitmap);
    }

    /// 返回块号对应的虚拟地址
    ///
    /// 低编号块直接映射；其余块查找缓存池，命中则递增访问计数，
    /// 未命中则选出牺牲行，写回并解除其映射后改绑到 `blockno`。
    /// 块号为 0 或超出设备几何（已知时）返回 `InvalidInput`。
    pub fn diskaddr(&mut self, blockno: u32) -> Result<VirtAddr> {
        self.check_blockno(blockno, "diskaddr")?;

        if blockno < self.map.direct_blocks() {
            return Ok(self.map.direct_region(blockno));
        }

        match select_line(&self.lines, blockno) {
            LineChoice::Hit(i) => {
                self.lines[i].touch();
                self.stats.hits += 1;
                log::trace!(
                    "[BCACHE] block {} HIT line {} (touch={})",
                    blockno,
                    i,
                    self.lines[i].touch_count
                );
                Ok(self.map.line_region(i))
            }
            LineChoice::Victim(i) => {
                self.stats.misses += 1;
                self.evict_line(i)?;
                self.lines[i].bind(blockno);
                log::debug!("[BCACHE] block {} MISS, bound to line {}", blockno, i);
                Ok(self.map.line_region(i))
            }
        }
    }

    /// 虚拟地址对应的块号
    ///
    /// 直接映射区按偏移计算，缓存池区查缓存行；窗口外或未绑定的行返回 None。
    pub fn block_number_of(&self, va: VirtAddr) -> Option<u32> {
        if let Some(blockno) = self.map.direct_block_of(va) {
            return Some(blockno);
        }
        self.map
            .line_of(va)
            .and_then(|i| self.lines[i].bound_block)
    }

    /// 确保 `va` 所在页已驻留，必要时触发缺页加载，返回页对齐地址
    pub fn resolve_or_load(&mut self, va: VirtAddr) -> Result<VirtAddr> {
        if !self.map.contains(va) {
            log::error!("[BCACHE] access outside disk map, va {}", va);
            return Err(Error::new(ErrorKind::OutOfRange, "access outside disk map"));
        }

        let page_va = va.page_round_down();
        if !self.mmu.is_mapped(page_va) {
            if !self.handler_installed {
                log::error!("[BCACHE] unhandled page fault at {}", va);
                return Err(Error::new(ErrorKind::InvalidState, "block cache fault handler not installed"));
            }
            self.handle_fault(va)?;
        }
        Ok(page_va)
    }

    /// 从 `va` 开始读取 `buf.len()` 字节，不能跨页
    pub fn read_at(&mut self, va: VirtAddr, buf: &mut [u8]) -> Result<()> {
        let offset = Self::check_span(va, buf.len())?;
        let page_va = self.resolve_or_load(va)?;
        let page = self.mmu.page(page_va).ok_or(Error::new(
            ErrorKind::InvalidState,
            "page vanished after load",
        ))?;
        buf.copy_from_slice(&page[offset..offset + buf.len()]);
        Ok(())
    }

    /// 向 `va` 写入 `data`，不能跨页；写入会设置脏位
    pub fn write_at(&mut self, va: VirtAddr, data: &[u8]) -> Result<()> {
        let offset = Self::check_span(va, data.len())?;
        let page_va = self.resolve_or_load(va)?;
        let page = self.mmu.page_mut(page_va).ok_or(Error::new(
            ErrorKind::InvalidState,
            "page vanished after load",
        ))?;
        page[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// 以只读方式访问整个块
    pub fn read_block<R>(&mut self, blockno: u32, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let va = self.diskaddr(blockno)?;
        let page_va = self.resolve_or_load(va)?;
        let page = self.mmu.page(page_va).ok_or(Error::new(
            ErrorKind::InvalidState,
            "page vanished after load",
        ))?;
        Ok(f(page))
    }

    /// 以可写方式访问整个块，块会被标记为脏
    pub fn modify_block<R>(&mut self, blockno: u32, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        let va = self.diskaddr(blockno)?;
        let page_va = self.resolve_or_load(va)?;
        let page = self.mmu.page_mut(page_va).ok_or(Error::new(
            ErrorKind::InvalidState,
            "page vanished after load",
        ))?;
        Ok(f(page))
    }

    /// 缓存行表
    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    /// 地址布局
    pub fn disk_map(&self) -> &DiskMap {
        &self.map
    }

    /// 统计信息
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// 初始化时保存的 superblock 快照
    pub fn superblock(&self) -> Option<&Superblock> {
        self.super_block.as_ref()
    }

    /// 设备总块数（几何信息已知时）
    pub fn total_blocks(&self) -> Option<u32> {
        self.super_block.map(|sb| sb.nblocks())
    }

    /// 底层设备
    pub fn device(&self) -> &D {
        self.bdev.device()
    }

    /// 底层设备（可变）
    pub fn device_mut(&mut self) -> &mut D {
        self.bdev.device_mut()
    }

    /// 内存子系统
    pub fn mmu(&self) -> &M {
        &self.mmu
    }

    pub(super) fn check_blockno(&self, blockno: u32, what: &'static str) -> Result<()> {
        let beyond = self
            .super_block
            .map(|sb| blockno >= sb.nblocks())
            .unwrap_or(false);
        if blockno == 0 || beyond {
            log::error!("[BCACHE] bad block number {:#010x} in {}", blockno, what);
            return Err(Error::new(ErrorKind::InvalidInput, "bad block number"));
        }
        Ok(())
    }

    /// 写回第 i 行当前的块并解除映射，使改绑后的下一次访问重新缺页
    fn evict_line(&mut self, index: usize) -> Result<()> {
        let old = match self.lines[index].bound_block {
            Some(blockno) => blockno,
            None => return Ok(()),
        };

        let va = self.map.line_region(index);
        self.flush(va)?;
        self.mmu.page_unmap(va);
        self.stats.evictions += 1;
        log::debug!("[EVICT] line {} drops block {} (touch={})", index, old, self.lines[index].touch_count);
        Ok(())
    }

    fn check_span(va: VirtAddr, len: usize) -> Result<usize> {
        let offset = va.page_offset();
        if offset + len > PAGE_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "access crosses block boundary"));
        }
        Ok(offset)
    }
}

impl<D, M> core::fmt::Debug for BlockCache<D, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockCache")
            .field("map", &self.map)
            .field("lines", &self.lines.len())
            .field("bound", &self.lines.iter().filter(|l| l.is_bound()).count())
            .field("super_block", &self.super_block)
            .field("handler_installed", &self.handler_installed)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::block::RamDisk;
    use crate::mm::SoftMmu;

    #[test]
    fn test_first_access_maps_exactly_one_region() {
        let mut cache = test_cache(4);
        let before = cache.mmu().mapped_pages();

        let va = cache.diskaddr(20).unwrap();
        assert!(!cache.is_mapped(va));

        let tag = cache.read_block(20, |data| block_tag(data)).unwrap();
        assert_eq!(tag, 20);
        assert_eq!(&cache.read_block(20, |d| d.to_vec()).unwrap()[..], cache.device().block(20));
        assert!(cache.is_mapped(va));
        assert!(!cache.is_dirty(va));
        assert_eq!(cache.mmu().mapped_pages(), before + 1);
    }

    #[test]
    fn test_repeated_access_does_not_fault() {
        let mut cache = test_cache(4);
        cache.read_block(20, |_| ()).unwrap();
        let faults = cache.stats().faults;
        let reads = cache.device().reads();

        for _ in 0..5 {
            cache.read_block(20, |_| ()).unwrap();
        }
        assert_eq!(cache.stats().faults, faults);
        assert_eq!(cache.device().reads(), reads);
        assert_eq!(cache.stats().hits, 5);
    }

    #[test]
    fn test_invalid_block_numbers() {
        let mut cache = test_cache(4);
        assert_eq!(cache.diskaddr(0).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(
            cache.diskaddr(TEST_NBLOCKS).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            cache.read_block(TEST_NBLOCKS + 5, |_| ()).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert!(cache.diskaddr(TEST_NBLOCKS - 1).is_ok());
    }

    #[test]
    fn test_range_check_skipped_before_geometry() {
        let mut cache = BlockCache::new(formatted_disk(TEST_NBLOCKS), SoftMmu::new(), test_config(4)).unwrap();
        assert!(cache.diskaddr(TEST_NBLOCKS + 100).is_ok());
        assert_eq!(cache.diskaddr(0).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_direct_blocks_bypass_pool() {
        let mut cache = test_cache(4);
        let va = cache.diskaddr(2).unwrap();
        assert_eq!(va, cache.disk_map().direct_region(2));
        assert!(cache.lines().iter().all(|l| !l.is_bound()));
        assert_eq!(cache.block_number_of(va.offset_by(100)), Some(2));
    }

    #[test]
    fn test_block_number_of_pool_region() {
        let mut cache = test_cache(4);
        let va = cache.diskaddr(33).unwrap();
        assert_eq!(cache.block_number_of(va), Some(33));
        assert_eq!(cache.block_number_of(va.offset_by(PAGE_SIZE - 1)), Some(33));
        // 未绑定的行
        let unbound = cache.disk_map().line_region(3);
        assert_eq!(cache.block_number_of(unbound), None);
        // 窗口外
        assert_eq!(cache.block_number_of(VirtAddr(0x1000)), None);
    }

    #[test]
    fn test_k_plus_one_evicts_first_loaded() {
        let mut cache = test_cache(4);
        for b in 10..14 {
            cache.read_block(b, |_| ()).unwrap();
        }
        cache.read_block(14, |_| ()).unwrap();

        let bound: Vec<_> = cache.lines().iter().map(|l| l.bound_block).collect();
        assert_eq!(bound, [Some(14), Some(11), Some(12), Some(13)]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_least_touched_scenario() {
        let mut cache = test_cache(4);
        for b in 10..14 {
            cache.read_block(b, |_| ()).unwrap();
        }
        cache.read_block(10, |_| ()).unwrap();
        cache.read_block(10, |_| ()).unwrap();
        assert_eq!(cache.lines()[0].touch_count, 3);

        let va = cache.diskaddr(14).unwrap();
        assert_eq!(va, cache.disk_map().line_region(1));
        assert_eq!(cache.lines()[1], CacheLine { bound_block: Some(14), touch_count: 1 });
        assert_eq!(cache.lines()[0].bound_block, Some(10));

        // 改绑后读到的是 14 的内容，而不是 11 的旧内容
        assert!(!cache.is_mapped(va));
        assert_eq!(cache.read_block(14, |d| block_tag(d)).unwrap(), 14);
    }

    #[test]
    fn test_hot_block_survives() {
        let mut cache = test_cache(3);
        for b in [10, 11, 12] {
            cache.read_block(b, |_| ()).unwrap();
        }
        for _ in 0..5 {
            cache.read_block(11, |_| ()).unwrap();
        }
        for b in 13..40 {
            assert_eq!(cache.read_block(b, |d| block_tag(d)).unwrap(), b);
            assert_eq!(cache.lines()[1].bound_block, Some(11));
        }
    }

    #[test]
    fn test_dirty_victim_is_written_back() {
        let mut cache = test_cache(2);
        cache.modify_block(10, |d| d[100] = 0xEE).unwrap();
        cache.read_block(11, |_| ()).unwrap();
        assert_eq!(cache.device().block(10)[100], 0);

        // 10 和 11 计数相同，10 在第 0 行先被扫描到
        cache.read_block(12, |_| ()).unwrap();
        assert_eq!(cache.device().block(10)[100], 0xEE);
        assert_eq!(cache.lines()[0].bound_block, Some(12));

        // 再次读 10 时从设备重新加载，看到写回的数据
        assert_eq!(cache.read_block(10, |d| d[100]).unwrap(), 0xEE);
    }

    #[test]
    fn test_byte_access() {
        let mut cache = test_cache(4);
        let va = cache.diskaddr(21).unwrap();
        cache.write_at(va.offset_by(8), b"hello").unwrap();
        assert!(cache.is_dirty(va));

        let mut buf = [0u8; 5];
        cache.read_at(va.offset_by(8), &mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        let err = cache.read_at(va.offset_by(PAGE_SIZE - 2), &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = cache.write_at(VirtAddr(0x42), b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_stats_hit_rate() {
        let mut cache = test_cache(4);
        cache.read_block(10, |_| ()).unwrap();
        cache.read_block(10, |_| ()).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = CacheConfig { cache_lines: 0, ..test_config(1) };
        let err = BlockCache::new(RamDisk::new(4), SoftMmu::new(), config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
