//! 初始化与自检

use super::{BlockCache, CacheConfig};
use crate::addr::VirtAddr;
use crate::block::BlockDevice;
use crate::consts::{SELF_TEST_PATTERN, SUPERBLOCK_BLOCKNO};
use crate::crc::block_checksum;
use crate::error::{Error, ErrorKind, Result};
use crate::mm::PageMapper;
use crate::superblock::Superblock;
use alloc::vec::Vec;

impl<D: BlockDevice, M: PageMapper> BlockCache<D, M> {
    /// 创建并初始化块缓存
    ///
    /// 依次：打开设备、安装缺页处理器、自检、读取并保存 superblock。
    /// 自检通过之前不做块号范围检查。
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let mut cache = BlockCache::init(disk, SoftMmu::new(), CacheConfig::default())?;
    /// let nblocks = cache.total_blocks();
    /// cache.modify_block(42, |data| data[0] = 1)?;
    /// cache.sync_all()?;
    /// ```
    pub fn init(device: D, mmu: M, config: CacheConfig) -> Result<Self> {
        let mut cache = Self::new(device, mmu, config)?;
        cache.bdev.open()?;
        cache.install_fault_handler();
        cache.check()?;

        let sb = cache.read_block(SUPERBLOCK_BLOCKNO, |data| Superblock::parse(data))??;
        let capacity = cache.bdev.total_blocks();
        if sb.nblocks() as u64 > capacity {
            log::warn!(
                "[BCACHE] superblock claims {} blocks, device holds {}",
                sb.nblocks(),
                capacity
            );
        }
        cache.super_block = Some(sb);
        log::info!("[BCACHE] superblock has {} blocks", sb.nblocks());
        Ok(cache)
    }

    /// 自检：破坏 superblock、写回、丢弃、重新加载，再恢复原内容
    pub fn check(&mut self) -> Result<()> {
        log::info!("[SELFTEST] running block cache check");

        let va = self.diskaddr(SUPERBLOCK_BLOCKNO)?;
        let backup = self.snapshot(va)?;
        let backup_crc = block_checksum(&backup);

        // smash it
        self.write_at(va, SELF_TEST_PATTERN)?;
        self.flush(va)?;
        ensure(self.is_mapped(va), "block unmapped by flush")?;
        ensure(!self.is_dirty(va), "block still dirty after flush")?;

        // clear it out
        self.evict(va)?;
        ensure(!self.is_mapped(va), "block still mapped after evict")?;

        // read it back in
        let mut readback = [0u8; SELF_TEST_PATTERN.len()];
        self.read_at(va, &mut readback)?;
        ensure(&readback[..] == SELF_TEST_PATTERN, "smashed block did not survive reload")?;

        // fix it
        self.write_at(va, &backup)?;
        self.flush(va)?;
        self.evict(va)?;
        let restored = self.snapshot(va)?;
        ensure(block_checksum(&restored) == backup_crc, "restored block differs from snapshot")?;

        log::info!("[SELFTEST] block cache is good");
        Ok(())
    }

    fn snapshot(&mut self, va: VirtAddr) -> Result<Vec<u8>> {
        let page_va = self.resolve_or_load(va)?;
        self.mmu
            .page(page_va)
            .map(|page| page.to_vec())
            .ok_or(Error::new(ErrorKind::InvalidState, "page vanished after load"))
    }
}

fn ensure(cond: bool, what: &'static str) -> Result<()> {
    if cond {
        Ok(())
    } else {
        log::error!("[SELFTEST] {}", what);
        Err(Error::new(ErrorKind::InvalidState, what))
    }
}
