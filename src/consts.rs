//! 块缓存常量定义
//!
//! 磁盘布局相关的常量由外部文件系统定义，这里只是照搬使用。

//=============================================================================
// 设备与页
//=============================================================================

/// 扇区大小（字节）
pub const SECTOR_SIZE: usize = 512;

/// 页大小（字节）
pub const PAGE_SIZE: usize = 4096;

/// 块大小（字节），一个块恰好占一页
pub const BLOCK_SIZE: usize = PAGE_SIZE;

/// 每个块包含的扇区数
pub const BLOCK_SECTORS: u32 = (BLOCK_SIZE / SECTOR_SIZE) as u32;

//=============================================================================
// 磁盘映射窗口
//=============================================================================

/// 磁盘映射窗口的默认起始虚拟地址
pub const DEFAULT_DISK_MAP_BASE: u64 = 0x1000_0000;

/// 磁盘映射窗口的默认大小（3GB，与最大可寻址磁盘一致）
pub const DEFAULT_DISK_MAP_SIZE: u64 = 0xC000_0000;

/// 默认直接映射的低编号块数量（引导块、superblock、位图首块）
pub const DEFAULT_DIRECT_BLOCKS: u32 = 3;

/// 默认缓存行数量
pub const DEFAULT_CACHE_LINES: usize = 16;

//=============================================================================
// Superblock
//=============================================================================

/// Superblock 所在块号
pub const SUPERBLOCK_BLOCKNO: u32 = 1;

/// 文件系统魔数
pub const FS_MAGIC: u32 = 0x4A05_30AE;

/// 自检时写入 superblock 的破坏内容
pub const SELF_TEST_PATTERN: &[u8] = b"OOPS!\n\0";
