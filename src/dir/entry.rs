//! 目录项解析

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    types::ext_dir_entry_head,
};
use alloc::vec::Vec;

/// 块内的一条目录记录（名字借用自块缓冲区）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirRecord<'a> {
    /// inode 编号（0 表示空闲槽位）
    pub inode: u32,
    /// 记录长度
    pub rec_len: u16,
    /// 文件类型（仅 FILETYPE 特性）
    pub file_type: Option<u8>,
    /// 名字
    pub name: &'a [u8],
}

fn corrupted(message: &'static str, offset: usize) -> Error {
    log::warn!("[DIR] {} at offset {}", message, offset);
    Error::with_value(ErrorKind::Corrupted, message, offset as u64)
}

impl<'a> DirRecord<'a> {
    /// 解码 `block` 中 `offset` 处的记录
    ///
    /// 记录必须完整位于 `block` 之内，名字长度不超过 255，
    /// 且记录长度足以容纳头部和名字。
    pub fn parse(block: &'a [u8], offset: usize, has_filetype: bool) -> Result<Self> {
        let rest = block
            .get(offset..)
            .filter(|rest| rest.len() >= EXT_DIR_ENTRY_HEADER_LEN)
            .ok_or_else(|| corrupted("Directory record header crosses block boundary", offset))?;

        let head = ext_dir_entry_head::parse(rest, has_filetype)?;
        let rec_len = head.rec_len as usize;
        let name_len = head.name_len as usize;

        if rec_len == 0 {
            return Err(corrupted("Zero directory record length", offset));
        }
        if name_len > EXT_NAME_MAX {
            return Err(corrupted("Directory record name too long", offset));
        }
        if rec_len < EXT_DIR_ENTRY_HEADER_LEN + name_len {
            return Err(corrupted("Directory record shorter than its name", offset));
        }
        if rec_len > rest.len() {
            return Err(corrupted("Directory record crosses block boundary", offset));
        }

        Ok(Self {
            inode: head.inode,
            rec_len: head.rec_len,
            file_type: head.file_type,
            name: &rest[EXT_DIR_ENTRY_HEADER_LEN..EXT_DIR_ENTRY_HEADER_LEN + name_len],
        })
    }

    /// 是否是空闲槽位
    pub fn is_unused(&self) -> bool {
        self.inode == 0
    }

    /// 转为独立的目录项
    pub fn to_entry(&self) -> DirEntry {
        DirEntry {
            inode: self.inode,
            name: self.name.to_vec(),
            file_type: self.file_type,
        }
    }
}

/// 目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode 编号
    pub inode: u32,
    /// 文件名（原始字节）
    pub name: Vec<u8>,
    /// 文件类型
    pub file_type: Option<u8>,
}

impl DirEntry {
    /// 名字的 UTF-8 形式
    pub fn name_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.name).ok()
    }

    /// 检查是否是目录
    pub fn is_dir(&self) -> bool {
        self.file_type == Some(EXT_DE_DIR)
    }

    /// 检查是否是普通文件
    pub fn is_file(&self) -> bool {
        self.file_type == Some(EXT_DE_REG_FILE)
    }

    /// 检查是否是符号链接
    pub fn is_symlink(&self) -> bool {
        self.file_type == Some(EXT_DE_SYMLINK)
    }
}
