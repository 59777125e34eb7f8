//! extfs_core: 纯 Rust 的 ext2/3/4 只读卷读取器
//!
//! 这个库把一个 ext2/ext3/ext4 镜像挂载为只读卷：
//! - 支持传统间接块和 extent 树两种块映射
//! - 块、块组、inode 三个按字节预算的引用计数 LRU 缓存
//! - 线性扫描的目录查找和枚举
//! - 所有写操作返回 `Unsupported`
//!
//! # 示例
//!
//! ```rust,ignore
//! use extfs_core::{MemStore, MountFlags, Node, OpenFlags, Volume};
//!
//! fn main() -> extfs_core::Result<()> {
//!     let mut vol = Volume::open(MemStore::new(image_bytes()), MountFlags::READ_ONLY)?;
//!
//!     let root = vol.open_root()?;
//!     if let Node::File(file) = root.open(&mut vol, "hello.txt", OpenFlags::READ)? {
//!         let mut buf = vec![0u8; 4096];
//!         let n = file.read(&mut vol, 0, &mut buf)?;
//!         println!("Read {} bytes", n);
//!         file.close(&mut vol);
//!     }
//!     root.close(&mut vol);
//!
//!     vol.close()?;
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 后备存储边界
//! - [`cache`] - 引用计数 LRU 缓存和块缓存
//! - [`superblock`] - Superblock 解码和卷几何参数
//! - [`block_group`] - 块组缓存
//! - [`inode`] - Inode 解码和缓存
//! - [`indirect`] / [`extent`] / [`mapping`] - 块映射
//! - [`dir`] - 目录记录
//! - [`fs`] - 卷、文件和目录 API

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 后备存储抽象
pub mod block;

/// 常量定义
pub mod consts;

/// 磁盘数据结构定义
pub mod types;

/// Superblock 操作
pub mod superblock;

/// Inode 解码和缓存
pub mod inode;

/// 块组缓存
pub mod block_group;

/// Extent 树解析
pub mod extent;

/// Indirect blocks 解析（传统 ext2/ext3 间接块寻址）
pub mod indirect;

/// 逻辑块到物理块的映射
pub mod mapping;

/// 目录记录
pub mod dir;

/// 卷、文件和目录 API
pub mod fs;

/// 缓存
pub mod cache;

#[cfg(test)]
mod test_utils;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, FormatError, Result};

// 后备存储
pub use block::{Backing, BackingStore, MemStore};

#[cfg(feature = "std")]
pub use block::StdStore;

// Superblock
pub use superblock::{DescriptorLayout, IncompatFeatures, RoCompatFeatures, Superblock, VolumeGeometry};

// Inode
pub use inode::{BlockArea, InodeEntry};

// Block mapping
pub use mapping::BlockMapping;

// Dir
pub use dir::DirEntry;

// Volume
pub use fs::{
    DirEntries, DirEntryInfo, Directory, File, FileType, MountFlags, Node, ObjectInfo, OpenFlags, SeekFrom,
    Volume, VolumeConfig, VolumeObject,
};

// Cache
pub use cache::CacheStats;
