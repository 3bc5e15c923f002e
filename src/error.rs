//! 错误类型定义
//!
//! 块缓存中的错误几乎都是"致命"的：调用者拿到 `Err` 后不应继续使用该缓存。
//! 具体数值（块号、地址）在返回前通过 `log::error!` 输出。

use core::fmt;

/// 块缓存操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 设备 I/O 错误
    Io,
    /// 无效参数（非法块号、缓冲区过小等）
    InvalidInput,
    /// 地址不在本缓存负责的虚拟地址窗口内
    OutOfRange,
    /// 元数据不一致（读到空闲块、superblock 魔数错误）
    Corrupted,
    /// 无效状态（自检失败、缺页处理器未安装等）
    InvalidState,
    /// 无法分配物理页
    NoMemory,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
