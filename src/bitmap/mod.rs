//! 位图操作
//!
//! 提供块缓存使用的分配元数据接口 [`BlockBitmap`] 和一个基于字节数组的实现。

pub mod ops;
mod free;

pub use free::{BlockBitmap, FreeBitmap};
