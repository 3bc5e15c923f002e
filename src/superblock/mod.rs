//! Superblock 快照
//!
//! 块缓存只关心 superblock 中的设备几何信息（总块数），用来做块号范围检查。

mod read;

pub use read::Superblock;
