//! Inode 缓存

use super::read::{load_inode, InodeEntry};
use crate::{
    block::{Backing, BackingStore},
    block_group::BlockGroupCache,
    cache::{CacheHandle, CacheStats, RefCache},
    error::Result,
    superblock::VolumeGeometry,
};

/// 借出的 inode
pub type InodeHandle = CacheHandle<u32, InodeEntry>;

const ENTRY_SIZE: usize = core::mem::size_of::<InodeEntry>();

/// Inode 缓存
pub struct InodeCache {
    inner: RefCache<u32, InodeEntry>,
}

impl InodeCache {
    /// 创建空缓存
    pub fn new(budget: usize) -> Self {
        Self {
            inner: RefCache::new("ICACHE", budget),
        }
    }

    /// 借出 inode，未命中时经由块组缓存定位并读取
    pub fn get<B: BackingStore>(
        &mut self,
        store: &mut Backing<B>,
        geometry: &VolumeGeometry,
        groups: &mut BlockGroupCache,
        number: u32,
    ) -> Result<InodeHandle> {
        if let Some(handle) = self.inner.lookup(number) {
            return Ok(handle);
        }

        let entry = load_inode(store, geometry, groups, number)?;
        // 定长条目，没有可复用的存储
        self.inner.make_room(ENTRY_SIZE);
        Ok(self.inner.insert(number, entry, ENTRY_SIZE))
    }

    /// 归还 inode
    pub fn release(&mut self, handle: InodeHandle) {
        self.inner.release(handle);
    }

    /// inode 是否驻留
    pub fn contains(&self, number: u32) -> bool {
        self.inner.contains(number)
    }

    /// 驻留条目数
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// 仍被借出的条目数
    pub fn pinned_count(&self) -> usize {
        self.inner.pinned_count()
    }

    /// 获取统计信息
    pub fn stats(&self) -> &CacheStats {
        self.inner.stats()
    }

    /// 丢弃全部条目，返回仍被借出的条目数
    pub fn clear(&mut self) -> usize {
        self.inner.clear()
    }
}
