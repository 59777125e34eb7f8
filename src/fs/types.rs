//! 卷配置和标志类型

use crate::consts::*;
use bitflags::bitflags;

/// 卷配置
///
/// 三个缓存各自的字节预算。预算只限制可驱逐条目；仍被引用的条目
/// 不会因为超出预算而被丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeConfig {
    /// 块缓存预算（字节）
    pub block_cache_bytes: usize,
    /// 块组缓存预算（字节）
    pub block_group_cache_bytes: usize,
    /// Inode 缓存预算（字节）
    pub inode_cache_bytes: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            block_cache_bytes: EXT_DEFAULT_BLOCK_CACHE_SIZE,
            block_group_cache_bytes: EXT_DEFAULT_BLOCK_GROUP_CACHE_SIZE,
            inode_cache_bytes: EXT_DEFAULT_INODE_CACHE_SIZE,
        }
    }
}

bitflags! {
    /// 挂载标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MountFlags: u32 {
        /// 只读挂载（含 ro_compat 特性的卷必须使用）
        const READ_ONLY = 0x0001;
    }
}

bitflags! {
    /// 打开目录项时的标志
    ///
    /// 只接受 `READ` 或空标志（打开已存在的对象）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// 读
        const READ = 0x0001;
        /// 写
        const WRITE = 0x0002;
        /// 不存在时创建
        const CREATE = 0x0004;
        /// 截断
        const TRUNCATE = 0x0008;
        /// 追加
        const APPEND = 0x0010;
        /// 与 CREATE 一起使用，已存在时失败
        const EXCLUSIVE = 0x0020;
    }
}

impl OpenFlags {
    /// 是否只是打开已存在的对象
    pub fn is_open_existing(&self) -> bool {
        self.difference(OpenFlags::READ).is_empty()
    }
}

/// 文件定位方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    /// 从文件开头
    Start(u64),
    /// 相对文件末尾
    End(i64),
    /// 相对当前位置
    Current(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_flags_policy() {
        assert!(OpenFlags::empty().is_open_existing());
        assert!(OpenFlags::READ.is_open_existing());
        assert!(!(OpenFlags::READ | OpenFlags::WRITE).is_open_existing());
        assert!(!OpenFlags::CREATE.is_open_existing());
        assert!(!(OpenFlags::CREATE | OpenFlags::EXCLUSIVE).is_open_existing());
    }

    #[test]
    fn test_default_config() {
        let cfg = VolumeConfig::default();
        assert_eq!(cfg.block_cache_bytes, 512 * 1024);
        assert_eq!(cfg.block_group_cache_bytes, 512 * 1024);
        assert_eq!(cfg.inode_cache_bytes, 512 * 1024);
    }
}
