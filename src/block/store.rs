//! 后备存储核心类型

use crate::error::{Error, ErrorKind, Result};
use alloc::vec::Vec;

/// 后备存储接口
///
/// 实现此 trait 以提供卷镜像的字节级读取。
///
/// # 示例
///
/// ```rust,ignore
/// use extfs_core::{BackingStore, Result};
///
/// struct MyDisk {
///     // ...
/// }
///
/// impl BackingStore for MyDisk {
///     fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
///         // 读取 buf.len() 字节，不足即返回错误
///         Ok(())
///     }
///
///     fn size(&self) -> u64 {
///         1 << 30
///     }
/// }
/// ```
pub trait BackingStore {
    /// 从 `offset` 处读取恰好 `buf.len()` 字节
    ///
    /// # 参数
    ///
    /// * `offset` - 字节偏移
    /// * `buf` - 目标缓冲区
    ///
    /// # 返回
    ///
    /// 读满缓冲区返回 `Ok(())`，否则返回错误（不允许短读）
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// 存储总字节数
    fn size(&self) -> u64;
}

impl<T: BackingStore + ?Sized> BackingStore for &mut T {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read_at(offset, buf)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}

/// 后备存储包装器
///
/// 卷持有的唯一存储入口，记录物理读取次数和字节数，
/// 用于观察缓存是否真正避免了重复读取。
pub struct Backing<B> {
    /// 底层存储
    store: B,
    /// 物理读取次数
    read_count: u64,
    /// 物理读取字节数
    bytes_read: u64,
}

impl<B: BackingStore> Backing<B> {
    /// 包装一个后备存储
    pub fn new(store: B) -> Self {
        Self {
            store,
            read_count: 0,
            bytes_read: 0,
        }
    }

    /// 读取 `buf.len()` 字节
    ///
    /// 越过存储末尾的请求在交给底层存储之前就会被拒绝。
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let end = offset
            .checked_add(buf.len() as u64)
            .ok_or(Error::with_value(ErrorKind::Io, "Read offset overflows", offset))?;
        if end > self.store.size() {
            return Err(Error::with_value(
                ErrorKind::Io,
                "Read beyond end of backing store",
                offset,
            ));
        }

        self.store.read_at(offset, buf)?;
        self.read_count += 1;
        self.bytes_read += buf.len() as u64;
        Ok(())
    }

    /// 存储总字节数
    pub fn size(&self) -> u64 {
        self.store.size()
    }

    /// 物理读取次数
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// 物理读取字节数
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// 获取底层存储引用
    pub fn store(&self) -> &B {
        &self.store
    }

    /// 取回底层存储
    pub fn into_inner(self) -> B {
        self.store
    }
}

/// 内存中的卷镜像
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    data: Vec<u8>,
}

impl MemStore {
    /// 从镜像字节创建
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// 镜像字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl BackingStore for MemStore {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| Error::with_value(ErrorKind::Io, "Offset out of range", offset))?;
        let src = start
            .checked_add(buf.len())
            .and_then(|end| self.data.get(start..end))
            .ok_or(Error::with_value(ErrorKind::Io, "Short read from memory image", offset))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// 基于 `std::io::Read + Seek` 的后备存储（例如打开的镜像文件）
#[cfg(feature = "std")]
pub struct StdStore<R> {
    inner: R,
    size: u64,
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> StdStore<R> {
    /// 包装读取器，并通过定位到末尾获得总大小
    pub fn new(mut inner: R) -> Result<Self> {
        let size = inner.seek(std::io::SeekFrom::End(0))?;
        Ok(Self { inner, size })
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> BackingStore for StdStore<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.inner.seek(std::io::SeekFrom::Start(offset))?;
        self.inner.read_exact(buf)?;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}
