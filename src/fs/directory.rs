//! 目录句柄

use super::{
    file::File,
    metadata::{read_only, FileType, ObjectInfo, VolumeObject},
    types::OpenFlags,
    volume::Volume,
};
use crate::{
    block::BackingStore,
    dir::{find_entry, DirCursor, DirEntry},
    error::{Error, ErrorKind, Result},
    inode::{InodeEntry, InodeHandle},
};
use alloc::vec::Vec;

/// 打开目录项得到的对象
pub enum Node {
    /// 普通文件
    File(File),
    /// 目录
    Directory(Directory),
}

/// 打开的目录
///
/// # 注意
///
/// 句柄借出了 inode 缓存条目，必须用 [`Directory::close`] 归还。
/// 直接丢弃句柄不会归还条目，之后 [`Volume::close`] 一直返回 `Busy`。
pub struct Directory {
    inode: InodeHandle,
}

impl Directory {
    pub(super) fn new(inode: InodeHandle) -> Self {
        Self { inode }
    }

    /// 按名字查找
    ///
    /// # 错误
    ///
    /// - `NameTooLong` - 名字超过 255 字节（不会扫描目录）
    /// - `NotFound` - 目录中没有该名字
    /// - `Corrupted` - 目录记录损坏
    pub fn lookup<B: BackingStore>(&self, vol: &mut Volume<B>, name: &str) -> Result<u32> {
        find_entry(vol, &self.inode, name.as_bytes())
    }

    /// 打开目录中的文件或子目录
    ///
    /// 只支持打开已存在的对象；符号链接、设备等其他类型返回 `Unsupported`。
    pub fn open<B: BackingStore>(&self, vol: &mut Volume<B>, name: &str, flags: OpenFlags) -> Result<Node> {
        if !flags.is_open_existing() {
            return Err(Error::with_value(ErrorKind::Unsupported, "Unsupported open flags", flags.bits() as u64));
        }

        let number = self.lookup(vol, name)?;
        let inode = vol.inode(number)?;
        match inode.file_type {
            FileType::RegularFile => Ok(Node::File(File::new(inode))),
            FileType::Directory => Ok(Node::Directory(Directory::new(inode))),
            other => {
                log::debug!("[DIR] refusing to open inode {} of type {:?}", number, other);
                vol.release_inode(inode);
                Err(Error::with_value(ErrorKind::Unsupported, "Unsupported object type", number as u64))
            }
        }
    }

    /// 按顺序枚举目录项（跳过空闲槽位）
    ///
    /// 迭代器只能向前，出错后返回该错误并结束。
    pub fn enumerate<'a, B: BackingStore>(&'a self, vol: &'a mut Volume<B>) -> DirEntries<'a, B> {
        DirEntries {
            cursor: DirCursor::new(vol),
            dir: &self.inode,
            vol,
            done: false,
        }
    }

    /// 创建子目录（只读卷，总是失败）
    pub fn create_dir<B: BackingStore>(&self, _vol: &mut Volume<B>, _name: &str) -> Result<Directory> {
        Err(read_only())
    }

    /// 创建符号链接（只读卷，总是失败）
    pub fn create_symlink<B: BackingStore>(&self, _vol: &mut Volume<B>, _name: &str, _target: &str) -> Result<()> {
        Err(read_only())
    }

    /// 删除目录项（只读卷，总是失败）
    pub fn unlink<B: BackingStore>(&self, _vol: &mut Volume<B>, _name: &str) -> Result<()> {
        Err(read_only())
    }

    /// 重命名（只读卷，总是失败）
    pub fn rename<B: BackingStore>(&self, _vol: &mut Volume<B>, _from: &str, _to: &str) -> Result<()> {
        Err(read_only())
    }

    /// 打开符号链接（不解析链接目标）
    pub fn open_symlink<B: BackingStore>(&self, _vol: &mut Volume<B>, _name: &str) -> Result<Node> {
        Err(Error::new(ErrorKind::Unsupported, "Symbolic links are not supported"))
    }

    /// 关闭目录，归还 inode
    pub fn close<B: BackingStore>(self, vol: &mut Volume<B>) {
        vol.release_inode(self.inode);
    }
}

impl VolumeObject for Directory {
    fn inode(&self) -> &InodeEntry {
        &self.inode
    }
}

/// 枚举得到的目录项及其对象信息
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    /// 文件名（原始字节）
    pub name: Vec<u8>,
    /// 目录项中记录的类型（仅 FILETYPE 特性）
    pub file_type: Option<u8>,
    /// 目标 inode 的信息
    pub info: ObjectInfo,
}

impl DirEntryInfo {
    /// 名字的 UTF-8 形式
    pub fn name_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.name).ok()
    }
}

/// 目录项迭代器
pub struct DirEntries<'a, B> {
    vol: &'a mut Volume<B>,
    dir: &'a InodeEntry,
    cursor: DirCursor,
    done: bool,
}

impl<B: BackingStore> DirEntries<'_, B> {
    fn next_entry(&mut self) -> Result<Option<DirEntry>> {
        while let Some(record) = self.cursor.next_record(self.vol, self.dir)? {
            if !record.is_unused() {
                return Ok(Some(record.to_entry()));
            }
        }
        Ok(None)
    }

    fn describe(&mut self, entry: DirEntry) -> Result<DirEntryInfo> {
        let inode = self.vol.inode(entry.inode)?;
        let info = ObjectInfo::from_inode(&inode);
        self.vol.release_inode(inode);
        Ok(DirEntryInfo {
            name: entry.name,
            file_type: entry.file_type,
            info,
        })
    }
}

impl<B: BackingStore> Iterator for DirEntries<'_, B> {
    type Item = Result<DirEntryInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = match self.next_entry() {
            Ok(Some(entry)) => self.describe(entry),
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(err) => Err(err),
        };

        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
