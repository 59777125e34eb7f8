//! 按名字查找目录项

use super::iterator::DirCursor;
use crate::{
    block::BackingStore,
    consts::EXT_NAME_MAX,
    error::{Error, ErrorKind, Result},
    fs::Volume,
    inode::InodeEntry,
};

/// 在目录中查找 `name`，返回其 inode 编号
///
/// 名字超过 255 字节时不扫描，直接返回 `NameTooLong`；
/// 空闲槽位（inode 为 0）中的名字不会被匹配。
pub fn find_entry<B: BackingStore>(vol: &mut Volume<B>, dir: &InodeEntry, name: &[u8]) -> Result<u32> {
    if name.len() > EXT_NAME_MAX {
        return Err(Error::with_value(ErrorKind::NameTooLong, "File name too long", name.len() as u64));
    }

    let mut cursor = DirCursor::new(vol);
    while let Some(record) = cursor.next_record(vol, dir)? {
        if !record.is_unused() && record.name == name {
            log::debug!("[DIR] found entry in inode {} -> inode {}", dir.number, record.inode);
            return Ok(record.inode);
        }
    }

    Err(Error::new(ErrorKind::NotFound, "Directory entry not found"))
}
