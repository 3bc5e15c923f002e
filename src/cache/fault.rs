//! 缺页加载
//!
//! 唯一把一页从"未映射"变为"已映射"的路径。任何失败都是致命的，
//! 调用者不应再继续使用这个缓存。

use super::BlockCache;
use crate::addr::VirtAddr;
use crate::block::BlockDevice;
use crate::error::{Error, ErrorKind, Result};
use crate::mm::{PageFlags, PageMapper};

impl<D: BlockDevice, M: PageMapper> BlockCache<D, M> {
    /// 安装缺页处理器
    ///
    /// 在此之前，对磁盘映射窗口的访问缺页都会以 `InvalidState` 失败。
    pub fn install_fault_handler(&mut self) {
        self.handler_installed = true;
        log::info!(
            "[FAULT] handler installed for {}..{}",
            self.map.base(),
            self.map.end()
        );
    }

    /// 处理 `va` 处的缺页：分配页、从设备读入块、清除脏位
    ///
    /// 页已驻留时什么都不做。任何失败都会解除这一页的映射。
    ///
    /// # 错误
    ///
    /// * `OutOfRange` - 地址不在磁盘映射窗口内
    /// * `InvalidState` - 地址所在缓存行未绑定任何块
    /// * `InvalidInput` - 块号为 0 或超出设备几何
    /// * `NoMemory` / `Io` - 分配页或读设备失败
    /// * `Corrupted` - 读入的块在空闲位图中被标为空闲
    pub fn handle_fault(&mut self, va: VirtAddr) -> Result<()> {
        if !self.map.contains(va) {
            log::error!("[FAULT] page fault outside disk map, va {}", va);
            return Err(Error::new(ErrorKind::OutOfRange, "page fault outside disk map"));
        }

        let page_va = va.page_round_down();
        if self.mmu.is_mapped(page_va) {
            // 已驻留的页可能带着未写回的修改，不能重新加载
            log::trace!("[FAULT] {} already resident", page_va);
            return Ok(());
        }

        let blockno = match self.block_number_of(page_va) {
            Some(blockno) => blockno,
            None => {
                log::error!("[FAULT] va {} is not bound to any block", va);
                return Err(Error::new(ErrorKind::InvalidState, "fault on unbound cache region"));
            }
        };
        self.check_blockno(blockno, "handle_fault")?;

        if let Err(e) = self.mmu.page_alloc(page_va, PageFlags::cache_page()) {
            log::error!("[FAULT] page_alloc at {} failed: {}", page_va, e);
            return Err(e);
        }

        // 读盘相当于 CPU 写入这一页，会留下脏位
        let loaded = match self.mmu.page_mut(page_va) {
            Some(page) => self.bdev.read_block(blockno, page),
            None => Err(Error::new(ErrorKind::InvalidState, "freshly allocated page is not writable")),
        };
        if let Err(e) = loaded {
            self.mmu.page_unmap(page_va);
            log::error!("[FAULT] reading block {} failed: {}", blockno, e);
            return Err(e);
        }

        let perm = self
            .mmu
            .flags(page_va)
            .map(|f| f & PageFlags::SYSCALL)
            .unwrap_or(PageFlags::cache_page());
        if let Err(e) = self.mmu.page_remap(page_va, perm) {
            self.mmu.page_unmap(page_va);
            log::error!("[FAULT] page_remap at {} failed: {}", page_va, e);
            return Err(e);
        }

        // 先读入再检查：位图本身也可能要经过缓存加载
        if let Some(bitmap) = &self.bitmap {
            if bitmap.is_block_free(blockno) {
                self.mmu.page_unmap(page_va);
                log::error!("[FAULT] reading free block {:#010x}", blockno);
                return Err(Error::new(ErrorKind::Corrupted, "reading free block"));
            }
        }

        self.stats.faults += 1;
        log::debug!("[FAULT] loaded block {} at {}", blockno, page_va);
        Ok(())
    }
}
