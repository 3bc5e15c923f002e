//! 缓存行

/// 缓存行
///
/// 缓存行与虚拟地址的对应关系是固定的（由下标决定），与块号的绑定则由替换策略动态改写。
/// 一旦装入过块，`bound_block` 就不会再回到 `None`，驱逐只会改绑。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// 当前绑定的块号
    pub bound_block: Option<u32>,
    /// 访问次数，只增不减，改绑时重置为 1
    pub touch_count: u32,
}

impl CacheLine {
    /// 记录一次命中
    pub fn touch(&mut self) {
        self.touch_count = self.touch_count.saturating_add(1);
    }

    /// 改绑到新块
    pub fn bind(&mut self, blockno: u32) {
        self.bound_block = Some(blockno);
        self.touch_count = 1;
    }

    /// 是否已绑定块
    pub fn is_bound(&self) -> bool {
        self.bound_block.is_some()
    }
}
