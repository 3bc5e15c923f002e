//! 页表项标志

use bitflags::bitflags;

bitflags! {
    /// 页表项标志
    ///
    /// `ACCESSED` 和 `DIRTY` 由"硬件"（这里是 [`SoftMmu`](super::SoftMmu)）在访问时自动设置，
    /// 其余位由调用者在分配或重映射时指定。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u16 {
        /// 有效
        const PRESENT  = 0x001;
        /// 可写
        const WRITABLE = 0x002;
        /// 用户态可访问
        const USER     = 0x004;
        /// 被访问过
        const ACCESSED = 0x020;
        /// 被写过（脏）
        const DIRTY    = 0x040;

        /// 调用者可以传回给 `page_remap` 的位，不含硬件维护的位
        const SYSCALL  = Self::PRESENT.bits() | Self::WRITABLE.bits() | Self::USER.bits();
    }
}

impl PageFlags {
    /// 块缓存页使用的权限
    pub const fn cache_page() -> Self {
        Self::PRESENT.union(Self::WRITABLE).union(Self::USER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syscall_mask_drops_dirty() {
        let flags = PageFlags::cache_page() | PageFlags::DIRTY | PageFlags::ACCESSED;
        let remapped = flags & PageFlags::SYSCALL;
        assert_eq!(remapped, PageFlags::cache_page());
        assert!(!remapped.contains(PageFlags::DIRTY));
    }
}
