//! 按需调页的块缓存
//!
//! 设备上的每个块都对应磁盘映射窗口中的一页。第一次访问时缺页加载，
//! 修改后由脏位记录，写回时只写脏页。
//!
//! # 主要组件
//!
//! - [`BlockCache`] - 缓存上下文：设备、内存子系统、缓存行表、设备几何
//! - [`CacheLine`] - 缓存池中的一行，绑定一个块号和访问计数
//! - [`CacheConfig`] - 窗口位置、直接映射块数、缓存行数
//! - [`CacheStats`] - 统计信息
//!
//! # 控制流
//!
//! ```text
//! diskaddr(blockno) ──► 直接映射 / select_line ──► (牺牲行 flush + unmap + 改绑)
//!        │
//!        ▼
//! resolve_or_load(va) ──未映射──► handle_fault: page_alloc → read_block → page_remap
//!        │
//!        ▼
//! read_at / write_at / read_block / modify_block   (写访问设置脏位)
//!        │
//!        ▼
//! flush(va) ──已映射且脏──► write_block → page_remap（清脏位）
//! ```
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use bcache_core::{BlockCache, CacheConfig, RamDisk, SoftMmu};
//!
//! let mut cache = BlockCache::init(disk, SoftMmu::new(), CacheConfig::default())?;
//! let va = cache.diskaddr(42)?;
//! cache.write_at(va, b"data")?;
//! cache.flush(va)?;
//! ```

mod block_cache;
mod config;
mod fault;
mod flush;
mod init;
mod line;
mod replace;

pub use block_cache::{BlockCache, CacheStats};
pub use config::CacheConfig;
pub use line::CacheLine;
pub use replace::{select_line, LineChoice};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{BlockCache, CacheConfig};
    use crate::block::RamDisk;
    use crate::consts::DEFAULT_DISK_MAP_BASE;
    use crate::mm::SoftMmu;
    use crate::superblock::Superblock;

    pub const TEST_NBLOCKS: u32 = 64;

    pub fn test_config(lines: usize) -> CacheConfig {
        CacheConfig {
            disk_map_base: DEFAULT_DISK_MAP_BASE,
            disk_map_size: 0x10_0000,
            direct_blocks: 3,
            cache_lines: lines,
        }
    }

    /// 写好 superblock，块 2.. 的前 4 字节是自己的块号
    pub fn formatted_disk(nblocks: u32) -> RamDisk {
        let mut disk = RamDisk::new(nblocks as usize);
        Superblock::new(nblocks).write_to(disk.block_mut(1));
        for b in 2..nblocks {
            disk.block_mut(b)[..4].copy_from_slice(&b.to_le_bytes());
        }
        disk
    }

    pub fn block_tag(data: &[u8]) -> u32 {
        u32::from_le_bytes([data[0], data[1], data[2], data[3]])
    }

    pub fn test_cache(lines: usize) -> BlockCache<RamDisk, SoftMmu> {
        BlockCache::init(formatted_disk(TEST_NBLOCKS), SoftMmu::new(), test_config(lines)).unwrap()
    }
}
