//! 卷、文件和目录 API
//!
//! 挂载得到的 [`Volume`] 拥有后备存储和全部缓存；[`File`] 与 [`Directory`]
//! 只持有 inode 缓存的引用，每次操作都显式传入卷。

mod directory;
mod file;
mod metadata;
mod types;
mod volume;

pub use directory::{DirEntries, DirEntryInfo, Directory, Node};
pub use file::File;
pub use metadata::{FileType, ObjectInfo, VolumeObject};
pub use types::{MountFlags, OpenFlags, SeekFrom, VolumeConfig};
pub use volume::Volume;
