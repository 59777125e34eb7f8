//! 块缓存
//!
//! 以物理块号为键缓存整块原始数据。间接块、extent 树节点、
//! 目录块和文件数据块都经过这里读取。
//!
//! 新条目的存储优先复用被驱逐条目的缓冲区，否则用
//! `try_reserve_exact` 分配，分配失败返回 `OutOfMemory`。

use crate::{
    block::{Backing, BackingStore},
    error::{Error, ErrorKind, Result},
};

use super::ref_cache::{CacheHandle, CacheStats, RefCache};
use alloc::vec::Vec;

/// 借出的块
pub type BlockHandle = CacheHandle<u64, Vec<u8>>;

/// 块缓存
pub struct BlockCache {
    inner: RefCache<u64, Vec<u8>>,
    /// 块大小（字节）
    block_size: usize,
}

impl BlockCache {
    /// 创建新的块缓存
    ///
    /// # 参数
    ///
    /// * `budget` - 驻留字节预算
    /// * `block_size` - 块大小（字节）
    pub fn new(budget: usize, block_size: usize) -> Self {
        Self {
            inner: RefCache::new("CACHE", budget),
            block_size,
        }
    }

    /// 借出一个块
    ///
    /// 命中时不产生 I/O；未命中时从后备存储读取 `block * block_size`
    /// 处的一整块。读取失败不会留下缓存条目。
    pub fn get<B: BackingStore>(&mut self, store: &mut Backing<B>, block: u64) -> Result<BlockHandle> {
        if let Some(handle) = self.inner.lookup(block) {
            return Ok(handle);
        }

        let offset = block
            .checked_mul(self.block_size as u64)
            .ok_or(Error::with_value(ErrorKind::Corrupted, "Block number out of range", block))?;

        let mut data = match self.inner.reclaim(self.block_size) {
            Some(reused) => reused,
            None => alloc_block(self.block_size)?,
        };
        data.resize(self.block_size, 0);

        store.read_at(offset, &mut data)?;
        log::debug!("[CACHE] block={:#x} loaded", block);

        Ok(self.inner.insert(block, data, self.block_size))
    }

    /// 归还借出的块
    pub fn release(&mut self, handle: BlockHandle) {
        self.inner.release(handle);
    }

    /// 块大小
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// 块是否驻留
    pub fn contains(&self, block: u64) -> bool {
        self.inner.contains(block)
    }

    /// 驻留块数
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// 驻留字节数
    pub fn resident_bytes(&self) -> usize {
        self.inner.resident_bytes()
    }

    /// 仍被借出的块数
    pub fn pinned_count(&self) -> usize {
        self.inner.pinned_count()
    }

    /// 获取统计信息
    pub fn stats(&self) -> &CacheStats {
        self.inner.stats()
    }

    /// 丢弃全部块，返回仍被借出的块数
    pub fn clear(&mut self) -> usize {
        self.inner.clear()
    }
}

fn alloc_block(size: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(size)
        .map_err(|_| Error::with_value(ErrorKind::OutOfMemory, "Cannot allocate cache block", size as u64))?;
    Ok(data)
}
