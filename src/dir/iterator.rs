//! 目录记录游标
//!
//! 游标只保存位置状态和当前块的副本，不持有卷或 inode 的引用；
//! 每次前进时由调用方传入卷和目录 inode。目录内容经由文件读取路径获得，
//! 因此未分配的目录块读出全零，并在解码时报告为损坏。

use super::entry::DirRecord;
use crate::{
    block::BackingStore,
    error::{Error, ErrorKind, Result},
    fs::Volume,
    inode::InodeEntry,
};
use alloc::vec::Vec;

/// 目录记录游标
pub struct DirCursor {
    /// 下一条记录的目录内偏移
    pos: u64,
    /// 当前块副本
    block: Vec<u8>,
    /// 当前块有效字节数
    valid: usize,
    /// 当前块的起始偏移（尚未读取时为 None）
    loaded: Option<u64>,
    /// 目录项是否带文件类型
    has_filetype: bool,
}

impl DirCursor {
    /// 从目录开头创建游标
    pub fn new<B: BackingStore>(vol: &Volume<B>) -> Self {
        Self {
            pos: 0,
            block: Vec::new(),
            valid: 0,
            loaded: None,
            has_filetype: vol.geometry().has_filetype(),
        }
    }

    /// 下一条记录的偏移
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// 读取下一条记录（包括空闲槽位），到达末尾返回 `None`
    pub fn next_record<'c, B: BackingStore>(
        &'c mut self,
        vol: &mut Volume<B>,
        dir: &InodeEntry,
    ) -> Result<Option<DirRecord<'c>>> {
        if self.pos >= dir.size {
            return Ok(None);
        }

        let block_size = vol.geometry().block_size() as u64;
        let block_start = self.pos & !(block_size - 1);
        if self.loaded != Some(block_start) {
            if self.block.len() != block_size as usize {
                self.block.clear();
                self.block
                    .try_reserve_exact(block_size as usize)
                    .map_err(|_| Error::new(ErrorKind::OutOfMemory, "Cannot allocate directory buffer"))?;
                self.block.resize(block_size as usize, 0);
            }
            self.valid = vol.read_inode_data(dir, block_start, &mut self.block)?;
            self.loaded = Some(block_start);
        }

        let offset = (self.pos - block_start) as usize;
        let record = DirRecord::parse(&self.block[..self.valid], offset, self.has_filetype)?;
        log::trace!(
            "[DIR] inode {} offset {} -> record inode={} rec_len={}",
            dir.number,
            self.pos,
            record.inode,
            record.rec_len
        );
        self.pos += record.rec_len as u64;
        Ok(Some(record))
    }
}
