//! 对象元数据

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    inode::InodeEntry,
};

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// 普通文件
    RegularFile,
    /// 目录
    Directory,
    /// 符号链接
    Symlink,
    /// 字符设备
    CharDevice,
    /// 块设备
    BlockDevice,
    /// FIFO（命名管道）
    Fifo,
    /// Socket
    Socket,
}

impl FileType {
    /// 从 inode 模式解析文件类型，无法识别时返回 `None`
    pub fn from_mode(mode: u16) -> Option<Self> {
        match mode & EXT_INODE_MODE_TYPE_MASK {
            EXT_INODE_MODE_FILE => Some(FileType::RegularFile),
            EXT_INODE_MODE_DIRECTORY => Some(FileType::Directory),
            EXT_INODE_MODE_SOFTLINK => Some(FileType::Symlink),
            EXT_INODE_MODE_CHARDEV => Some(FileType::CharDevice),
            EXT_INODE_MODE_BLOCKDEV => Some(FileType::BlockDevice),
            EXT_INODE_MODE_FIFO => Some(FileType::Fifo),
            EXT_INODE_MODE_SOCKET => Some(FileType::Socket),
            _ => None,
        }
    }

    /// 是否是目录
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// 是否是普通文件
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::RegularFile)
    }

    /// 是否是符号链接
    pub fn is_symlink(&self) -> bool {
        matches!(self, FileType::Symlink)
    }
}

/// 对象信息
///
/// 时间为 Unix 时间戳（秒）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Inode 编号
    pub inode: u32,
    /// 文件类型
    pub file_type: FileType,
    /// 完整模式（类型 + 权限）
    pub mode: u16,
    /// 文件大小（字节）
    pub size: u64,
    /// 已分配字节数
    pub allocated: u64,
    /// 访问时间
    pub atime: i64,
    /// 修改时间
    pub mtime: i64,
    /// 状态改变时间
    pub ctime: i64,
    /// 创建时间
    pub birth: i64,
    /// 用户 ID
    pub uid: u32,
    /// 组 ID
    pub gid: u32,
    /// 硬链接数
    pub links: u16,
    /// 文件版本
    pub generation: u32,
}

impl ObjectInfo {
    /// 从 inode 创建
    pub fn from_inode(inode: &InodeEntry) -> Self {
        Self {
            inode: inode.number,
            file_type: inode.file_type,
            mode: inode.mode,
            size: inode.size,
            allocated: inode.allocated,
            atime: inode.atime as i64,
            mtime: inode.mtime as i64,
            ctime: inode.ctime as i64,
            birth: inode.birth as i64,
            uid: inode.uid,
            gid: inode.gid,
            links: inode.links,
            generation: inode.generation,
        }
    }

    /// 权限位
    pub fn permissions(&self) -> u16 {
        self.mode & EXT_INODE_MODE_PERM_MASK
    }

    /// 是否是目录
    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    /// 是否是普通文件
    pub fn is_file(&self) -> bool {
        self.file_type.is_file()
    }
}

/// 打开的卷对象（文件或目录）共有的操作
///
/// 元数据修改一律返回 `Unsupported`。
pub trait VolumeObject {
    /// 对象的 inode
    fn inode(&self) -> &InodeEntry;

    /// 查询对象信息
    fn query_info(&self) -> ObjectInfo {
        ObjectInfo::from_inode(self.inode())
    }

    /// 修改权限
    fn set_mode(&mut self, _mode: u16) -> Result<()> {
        Err(read_only())
    }

    /// 修改访问/修改时间
    fn set_times(&mut self, _atime: i64, _mtime: i64) -> Result<()> {
        Err(read_only())
    }

    /// 修改属主
    fn set_owner(&mut self, _uid: u32, _gid: u32) -> Result<()> {
        Err(read_only())
    }
}

pub(crate) fn read_only() -> Error {
    Error::new(ErrorKind::Unsupported, "Volume is read-only")
}
