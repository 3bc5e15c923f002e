//! 块设备抽象
//!
//! block/device.rs 定义块缓存所需的最小设备接口（按扇区读写）以及块号到扇区号的换算
//! block/ramdisk.rs 提供内存设备，block/file.rs 提供镜像文件设备（`std` 特性）

mod device;
mod ramdisk;
#[cfg(feature = "std")]
mod file;

pub use device::{BlockDevice, BlockDev};
pub use ramdisk::RamDisk;
#[cfg(feature = "std")]
pub use file::FileDisk;
