//! 错误类型定义
//!
//! 提供 ext2/3/4 只读卷操作的错误类型。

use core::fmt;

/// 卷操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
    value: Option<u64>,
}

/// 格式错误的细分类别
///
/// 卷的磁盘结构无法被本实现接受时返回。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    /// Superblock 魔数不是 0xEF53
    BadMagic,
    /// 含有不支持的 incompat 特性
    UnsupportedIncompat,
    /// 非只读挂载时含有 ro_compat 特性
    UnsupportedRoCompat,
    /// 文件系统状态标记为有错误
    FilesystemHasErrors,
    /// 原始版本布局中 cluster 大小与块大小不同
    ClusterSizeMismatch,
    /// 几何参数不合理（每组块数为 0 等）
    BadGeometry,
    /// Extent 头部校验失败
    BadExtentHeader,
    /// Extent 树深度不合法
    ExtentDepth,
    /// 无法识别的 inode 类型
    BadInodeType,
    /// 逻辑块不在任何 extent 中
    UnmappedBlock,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// I/O 错误（来自后备存储）
    Io,
    /// 磁盘格式错误
    Format(FormatError),
    /// 元数据损坏
    Corrupted,
    /// 文件不存在
    NotFound,
    /// 文件名过长（> 255 字节）
    NameTooLong,
    /// 不支持的操作（所有写操作）
    Unsupported,
    /// 内存不足
    OutOfMemory,
    /// 无效参数
    InvalidInput,
    /// 不是目录
    NotADirectory,
    /// 不是普通文件
    NotAFile,
    /// 仍有未释放的引用
    Busy,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            value: None,
        }
    }

    /// 创建附带出错字段值的错误
    ///
    /// 挂载失败时用于报告具体的磁盘字段值。
    pub const fn with_value(kind: ErrorKind, message: &'static str, value: u64) -> Self {
        Self {
            kind,
            message,
            value: Some(value),
        }
    }

    /// 创建格式错误
    pub const fn format(kind: FormatError, message: &'static str) -> Self {
        Self::new(ErrorKind::Format(kind), message)
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// 获取出错字段值（如有）
    pub const fn value(&self) -> Option<u64> {
        self.value
    }

    /// 是否是格式错误
    pub fn is_format(&self) -> bool {
        matches!(self.kind, ErrorKind::Format(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{:?}: {} ({:#x})", self.kind, self.message, value),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::OutOfMemory => Error::new(ErrorKind::OutOfMemory, "Backing store out of memory"),
            _ => Error::new(ErrorKind::Io, "Backing store I/O error"),
        }
    }
}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
