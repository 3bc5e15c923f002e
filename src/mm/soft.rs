//! 软件页表

use super::{PageFlags, PageMapper};
use crate::addr::VirtAddr;
use crate::consts::PAGE_SIZE;
use crate::error::{Error, ErrorKind, Result};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;

struct SoftPage {
    data: Box<[u8]>,
    flags: PageFlags,
}

/// 软件 MMU
///
/// 以页号为键的稀疏页表。可以限制物理页数量，超出时 `page_alloc` 返回 `NoMemory`。
pub struct SoftMmu {
    pages: BTreeMap<u64, SoftPage>,
    max_pages: Option<usize>,
}

impl SoftMmu {
    /// 创建不限页数的 MMU
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
            max_pages: None,
        }
    }

    /// 创建最多持有 `max_pages` 个物理页的 MMU
    pub fn with_limit(max_pages: usize) -> Self {
        Self {
            pages: BTreeMap::new(),
            max_pages: Some(max_pages),
        }
    }

    /// 当前已映射的页数
    pub fn mapped_pages(&self) -> usize {
        self.pages.len()
    }
}

impl Default for SoftMmu {
    fn default() -> Self {
        Self::new()
    }
}

impl PageMapper for SoftMmu {
    fn page_alloc(&mut self, va: VirtAddr, perm: PageFlags) -> Result<()> {
        if !perm.contains(PageFlags::PRESENT) || !PageFlags::SYSCALL.contains(perm) {
            return Err(Error::new(ErrorKind::InvalidInput, "bad page permissions"));
        }

        let vpn = va.page_number();
        if let Some(limit) = self.max_pages {
            if !self.pages.contains_key(&vpn) && self.pages.len() >= limit {
                log::warn!("[MMU] out of pages ({} mapped) at {}", self.pages.len(), va);
                return Err(Error::new(ErrorKind::NoMemory, "out of physical pages"));
            }
        }

        self.pages.insert(
            vpn,
            SoftPage {
                data: alloc::vec![0u8; PAGE_SIZE].into_boxed_slice(),
                flags: perm,
            },
        );
        log::trace!("[MMU] alloc page {} perm={:?}", va.page_round_down(), perm);
        Ok(())
    }

    fn page_remap(&mut self, va: VirtAddr, perm: PageFlags) -> Result<()> {
        if !perm.contains(PageFlags::PRESENT) || !PageFlags::SYSCALL.contains(perm) {
            return Err(Error::new(ErrorKind::InvalidInput, "bad page permissions"));
        }

        match self.pages.get_mut(&va.page_number()) {
            Some(page) => {
                page.flags = perm;
                Ok(())
            }
            None => Err(Error::new(ErrorKind::InvalidInput, "remap of unmapped page")),
        }
    }

    fn page_unmap(&mut self, va: VirtAddr) {
        if self.pages.remove(&va.page_number()).is_some() {
            log::trace!("[MMU] unmap page {}", va.page_round_down());
        }
    }

    fn flags(&self, va: VirtAddr) -> Option<PageFlags> {
        self.pages.get(&va.page_number()).map(|p| p.flags)
    }

    fn page(&mut self, va: VirtAddr) -> Option<&[u8]> {
        let page = self.pages.get_mut(&va.page_number())?;
        page.flags.insert(PageFlags::ACCESSED);
        Some(&page.data)
    }

    fn page_mut(&mut self, va: VirtAddr) -> Option<&mut [u8]> {
        let page = self.pages.get_mut(&va.page_number())?;
        if !page.flags.contains(PageFlags::WRITABLE) {
            return None;
        }
        page.flags.insert(PageFlags::ACCESSED | PageFlags::DIRTY);
        Some(&mut page.data)
    }
}
