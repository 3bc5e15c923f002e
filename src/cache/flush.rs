//! 脏页写回

use super::BlockCache;
use crate::addr::VirtAddr;
use crate::block::BlockDevice;
use crate::error::{Error, ErrorKind, Result};
use crate::mm::{PageFlags, PageMapper};

impl<D: BlockDevice, M: PageMapper> BlockCache<D, M> {
    /// 如果 `va` 所在页已映射且是脏的，写回设备并清除脏位
    ///
    /// `va` 可以是块内任意地址。未映射或干净的页什么都不做。
    pub fn flush(&mut self, va: VirtAddr) -> Result<()> {
        if !self.map.contains(va) {
            log::error!("[FLUSH] flush of bad va {}", va);
            return Err(Error::new(ErrorKind::OutOfRange, "flush outside disk map"));
        }

        let page_va = va.page_round_down();
        if !self.mmu.is_mapped(page_va) || !self.mmu.is_dirty(page_va) {
            return Ok(());
        }

        let blockno = match self.block_number_of(page_va) {
            Some(blockno) => blockno,
            None => {
                log::error!("[FLUSH] dirty page {} has no bound block", page_va);
                return Err(Error::new(ErrorKind::InvalidState, "dirty page has no bound block"));
            }
        };

        let written = match self.mmu.page(page_va) {
            Some(page) => self.bdev.write_block(blockno, page),
            None => Err(Error::new(ErrorKind::InvalidState, "mapped page has no contents")),
        };
        if let Err(e) = written {
            log::error!("[FLUSH] writing block {} failed: {}", blockno, e);
            return Err(e);
        }

        let perm = self
            .mmu
            .flags(page_va)
            .map(|f| f & PageFlags::SYSCALL)
            .unwrap_or(PageFlags::cache_page());
        if let Err(e) = self.mmu.page_remap(page_va, perm) {
            log::error!("[FLUSH] page_remap at {} failed: {}", page_va, e);
            return Err(e);
        }

        self.stats.writebacks += 1;
        log::debug!("[FLUSH] wrote block {} from {}", blockno, page_va);
        Ok(())
    }

    /// `va` 所在页是否已映射
    pub fn is_mapped(&self, va: VirtAddr) -> bool {
        self.mmu.is_mapped(va.page_round_down())
    }

    /// `va` 所在页是否是脏的
    pub fn is_dirty(&self, va: VirtAddr) -> bool {
        self.mmu.is_dirty(va.page_round_down())
    }

    /// 丢弃 `va` 所在页的映射，不写回
    ///
    /// 下一次访问会重新从设备加载。
    pub fn evict(&mut self, va: VirtAddr) -> Result<()> {
        if !self.map.contains(va) {
            log::error!("[FLUSH] evict of bad va {}", va);
            return Err(Error::new(ErrorKind::OutOfRange, "evict outside disk map"));
        }
        self.mmu.page_unmap(va.page_round_down());
        Ok(())
    }

    /// 写回所有驻留的脏块（直接映射区和缓存池）
    ///
    /// # 返回
    ///
    /// 写回的块数
    pub fn sync_all(&mut self) -> Result<u64> {
        let before = self.stats.writebacks;

        for blockno in 1..self.map.direct_blocks() {
            let va = self.map.direct_region(blockno);
            self.flush(va)?;
        }
        for i in 0..self.lines.len() {
            let va = self.map.line_region(i);
            self.flush(va)?;
        }

        let written = self.stats.writebacks - before;
        log::debug!("[FLUSH] sync_all wrote {} blocks", written);
        Ok(written)
    }

    /// 写回所有脏块后关闭设备
    pub fn close(&mut self) -> Result<()> {
        self.sync_all()?;
        self.bdev.close()
    }
}
