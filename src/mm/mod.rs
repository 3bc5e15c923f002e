//! 内存子系统接口
//!
//! 块缓存依赖内存子系统完成三件事：在指定虚拟地址分配物理页、查询页的有效位和脏位、
//! 以及通过重映射清除脏位。真实内核中这些由页表硬件和系统调用提供，
//! [`SoftMmu`] 是一个纯软件实现，由它在每次写访问时维护脏位。

mod flags;
mod soft;

pub use flags::PageFlags;
pub use soft::SoftMmu;

use crate::addr::VirtAddr;
use crate::error::Result;

/// 页映射接口
///
/// 所有地址参数都可以是页内任意地址，实现负责向下对齐。
pub trait PageMapper {
    /// 在 `va` 处分配一个清零的物理页，已有的映射会被替换
    fn page_alloc(&mut self, va: VirtAddr, perm: PageFlags) -> Result<()>;

    /// 用新的权限重新映射 `va` 处已有的页，页内容保持不变
    ///
    /// `perm` 中不含 `DIRTY` 时会清除脏位。
    fn page_remap(&mut self, va: VirtAddr, perm: PageFlags) -> Result<()>;

    /// 解除 `va` 处的映射，未映射时什么都不做
    fn page_unmap(&mut self, va: VirtAddr);

    /// 当前页表项标志，未映射返回 None
    fn flags(&self, va: VirtAddr) -> Option<PageFlags>;

    /// 以读方式访问页内容（设置 `ACCESSED`）
    fn page(&mut self, va: VirtAddr) -> Option<&[u8]>;

    /// 以写方式访问页内容（设置 `ACCESSED | DIRTY`），页不可写时返回 None
    fn page_mut(&mut self, va: VirtAddr) -> Option<&mut [u8]>;

    /// 是否已映射
    fn is_mapped(&self, va: VirtAddr) -> bool {
        self.flags(va)
            .map(|f| f.contains(PageFlags::PRESENT))
            .unwrap_or(false)
    }

    /// 是否被写过
    fn is_dirty(&self, va: VirtAddr) -> bool {
        self.flags(va)
            .map(|f| f.contains(PageFlags::DIRTY))
            .unwrap_or(false)
    }
}
