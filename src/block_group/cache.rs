//! 块组缓存

use super::read::{load_group, GroupEntry};
use crate::{
    block::{Backing, BackingStore},
    cache::{CacheHandle, CacheStats, RefCache},
    error::Result,
    superblock::VolumeGeometry,
};

fn entry_size(geometry: &VolumeGeometry) -> usize {
    core::mem::size_of::<GroupEntry>() + geometry.block_bitmap_bytes() + geometry.inode_bitmap_bytes()
}

/// 借出的块组条目
pub type GroupHandle = CacheHandle<u32, GroupEntry>;

/// 块组缓存
pub struct BlockGroupCache {
    inner: RefCache<u32, GroupEntry>,
}

impl BlockGroupCache {
    /// 创建空缓存
    pub fn new(budget: usize) -> Self {
        Self {
            inner: RefCache::new("BGCACHE", budget),
        }
    }

    /// 借出块组条目，未命中时读取描述符和位图
    pub fn get<B: BackingStore>(
        &mut self,
        store: &mut Backing<B>,
        geometry: &VolumeGeometry,
        group: u32,
    ) -> Result<GroupHandle> {
        if let Some(handle) = self.inner.lookup(group) {
            return Ok(handle);
        }

        let recycled = self.inner.reclaim(entry_size(geometry));
        let entry = load_group(store, geometry, group, recycled)?;
        let size = entry.cache_size();

        Ok(self.inner.insert(group, entry, size))
    }

    /// 归还块组条目
    pub fn release(&mut self, handle: GroupHandle) {
        self.inner.release(handle);
    }

    /// 块组是否驻留
    pub fn contains(&self, group: u32) -> bool {
        self.inner.contains(group)
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
