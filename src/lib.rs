//! bcache_core: 按需调页的磁盘块缓存
//!
//! 把块设备上的每个块都呈现为"已经在内存里"：第一次访问时才从设备读入，
//! 写回时只写被修改过的块。
//! - **地址映射**：块号 ⇄ 虚拟地址（低编号块直接映射，其余经缓存行间接映射）
//! - **缺页加载**：访问未映射的页时分配物理页并读入块内容，然后清除脏位
//! - **替换策略**：缓存池满时按最少访问次数选出牺牲行，写回后改绑
//! - **写回**：只写回已映射且脏的页
//! - **自检**：初始化时验证加载/写回往返的正确性
//!
//! # 示例
//!
//! ```rust,ignore
//! use bcache_core::{BlockCache, CacheConfig, RamDisk, SoftMmu, Result};
//!
//! fn main() -> Result<()> {
//!     let disk = RamDisk::from_image(load_image());
//!     let mut cache = BlockCache::init(disk, SoftMmu::new(), CacheConfig::default())?;
//!
//!     // 读取块
//!     let first = cache.read_block(10, |data| data[0])?;
//!
//!     // 修改块，之后写回
//!     cache.modify_block(10, |data| data[0] = first.wrapping_add(1))?;
//!     cache.sync_all()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 块设备抽象
//! - [`mm`] - 内存子系统接口和软件页表
//! - [`addr`] - 块号与虚拟地址的映射
//! - [`cache`] - 块缓存本体
//! - [`bitmap`] - 空闲块位图
//! - [`superblock`] - superblock 快照

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 常量定义
pub mod consts;

/// 块设备抽象
pub mod block;

/// 内存子系统
pub mod mm;

/// 地址映射
pub mod addr;

/// 块缓存
pub mod cache;

/// 位图操作
pub mod bitmap;

/// Superblock 快照
pub mod superblock;

/// CRC32 校验和计算
pub(crate) mod crc;

// ===== 公共导出 =====

pub use error::{Error, ErrorKind, Result};

pub use block::{BlockDevice, BlockDev, RamDisk};
#[cfg(feature = "std")]
pub use block::FileDisk;

pub use mm::{PageFlags, PageMapper, SoftMmu};

pub use addr::{DiskMap, VirtAddr};

pub use cache::{BlockCache, CacheConfig, CacheLine, CacheStats};

pub use bitmap::{BlockBitmap, FreeBitmap};

pub use superblock::Superblock;
