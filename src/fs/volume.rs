//! 已挂载的只读卷

use super::{
    directory::Directory,
    file::File,
    types::{MountFlags, VolumeConfig},
};
use crate::{
    block::{Backing, BackingStore},
    block_group::BlockGroupCache,
    cache::{BlockCache, CacheStats},
    consts::EXT_ROOT_INODE,
    error::{Error, ErrorKind, Result},
    inode::{InodeCache, InodeEntry, InodeHandle},
    mapping::BlockResolver,
    superblock::{Superblock, VolumeGeometry},
};

/// 已挂载的 ext2/3/4 卷
///
/// 持有后备存储、几何参数和三个缓存。所有操作都通过 `&mut Volume`
/// 串行执行；打开的 [`File`] 和 [`Directory`] 只持有 inode 缓存的引用，
/// 使用时需要把卷传回去。
///
/// # 示例
///
/// ```rust,ignore
/// use extfs_core::{MemStore, MountFlags, Volume};
///
/// let mut vol = Volume::open(MemStore::new(image), MountFlags::READ_ONLY)?;
/// let root = vol.open_root()?;
/// for entry in root.enumerate(&mut vol) {
///     let entry = entry?;
///     println!("{:?} {}", entry.name_str(), entry.info.size);
/// }
/// root.close(&mut vol);
/// let store = vol.close()?;
/// ```
pub struct Volume<B> {
    store: Backing<B>,
    superblock: Superblock,
    geometry: VolumeGeometry,
    blocks: BlockCache,
    groups: BlockGroupCache,
    inodes: InodeCache,
    resolver: BlockResolver,
}

impl<B: BackingStore> Volume<B> {
    /// 以默认缓存预算挂载
    pub fn open(store: B, flags: MountFlags) -> Result<Self> {
        Self::open_with_config(store, flags, VolumeConfig::default())
    }

    /// 挂载卷
    ///
    /// 依次读取并检查 superblock、推导几何参数，全部通过后才创建缓存。
    ///
    /// # 错误
    ///
    /// - `Format(BadMagic)` - 不是 ext 卷
    /// - `Format(FilesystemHasErrors)` - 文件系统标记为有错误
    /// - `Format(ClusterSizeMismatch)` - 原始版本中 cluster 大小与块大小不同
    /// - `Format(UnsupportedIncompat)` / `Format(UnsupportedRoCompat)` - 特性不支持
    /// - `Format(BadGeometry)` - 几何参数不合理
    /// - `Io` - 后备存储读取失败
    pub fn open_with_config(store: B, flags: MountFlags, config: VolumeConfig) -> Result<Self> {
        let mut store = Backing::new(store);

        let superblock = Superblock::load(&mut store)?;
        superblock.check(flags)?;
        let geometry = VolumeGeometry::derive(&superblock, flags)?;

        log::info!(
            "[MOUNT] volume {:?} mounted ({:?}), caches: block={} group={} inode={}",
            superblock.volume_name(),
            flags,
            config.block_cache_bytes,
            config.block_group_cache_bytes,
            config.inode_cache_bytes
        );

        Ok(Self {
            blocks: BlockCache::new(config.block_cache_bytes, geometry.block_size() as usize),
            groups: BlockGroupCache::new(config.block_group_cache_bytes),
            inodes: InodeCache::new(config.inode_cache_bytes),
            resolver: BlockResolver::new(geometry.block_size()),
            store,
            superblock,
            geometry,
        })
    }

    /// 打开根目录
    pub fn open_root(&mut self) -> Result<Directory> {
        self.open_dir(EXT_ROOT_INODE)
    }

    /// 按 inode 编号打开目录
    pub fn open_dir(&mut self, number: u32) -> Result<Directory> {
        let inode = self.inode(number)?;
        if !inode.is_dir() {
            self.release_inode(inode);
            return Err(Error::with_value(ErrorKind::NotADirectory, "Inode is not a directory", number as u64));
        }
        Ok(Directory::new(inode))
    }

    /// 按 inode 编号打开普通文件
    pub fn open_file(&mut self, number: u32) -> Result<File> {
        let inode = self.inode(number)?;
        if !inode.is_file() {
            self.release_inode(inode);
            return Err(Error::with_value(ErrorKind::NotAFile, "Inode is not a regular file", number as u64));
        }
        Ok(File::new(inode))
    }

    /// 借出 inode
    pub fn inode(&mut self, number: u32) -> Result<InodeHandle> {
        self.inodes.get(&mut self.store, &self.geometry, &mut self.groups, number)
    }

    /// 归还 inode
    pub fn release_inode(&mut self, handle: InodeHandle) {
        self.inodes.release(handle);
    }

    /// 从 inode 的数据中读取
    ///
    /// 读取范围被截断到文件大小；稀疏段填零，不访问存储。
    /// 返回实际读取的字节数，`offset` 不小于文件大小时返回 0。
    pub fn read_inode_data(&mut self, inode: &InodeEntry, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= inode.size || buf.is_empty() {
            return Ok(0);
        }

        let len = (inode.size - offset).min(buf.len() as u64) as usize;
        let block_size = self.geometry.block_size() as usize;
        let shift = self.geometry.block_shift();

        let mut done = 0;
        while done < len {
            let pos = offset + done as u64;
            let logical = pos >> shift;
            let in_block = (pos & (block_size as u64 - 1)) as usize;
            let remaining = len - done;
            let wanted = (in_block + remaining).div_ceil(block_size).min(u32::MAX as usize) as u32;

            let mapping = self
                .resolver
                .resolve(&mut self.store, &mut self.blocks, inode, logical, wanted)?;
            let run = mapping.run.clamp(1, wanted) as usize;
            let span = (run * block_size - in_block).min(remaining);
            let out = &mut buf[done..done + span];

            if mapping.sparse {
                log::trace!("[CACHE] inode {} logical {} sparse x{}", inode.number, logical, run);
                out.fill(0);
            } else {
                let mut copied = 0;
                let mut block = mapping.physical;
                let mut start = in_block;
                while copied < span {
                    let handle = self.blocks.get(&mut self.store, block)?;
                    let n = (block_size - start).min(span - copied);
                    out[copied..copied + n].copy_from_slice(&handle[start..start + n]);
                    self.blocks.release(handle);
                    copied += n;
                    block += 1;
                    start = 0;
                }
            }

            done += span;
        }

        Ok(len)
    }

    /// 字节范围 `[offset, offset + len)` 中是否有块在块位图中标记为已用
    ///
    /// `first_data_block` 之前的块（引导块）视为已用；
    /// 超出卷末尾的范围返回 `InvalidInput`。
    pub fn query_range_state(&mut self, offset: u64, len: u64) -> Result<bool> {
        if len == 0 {
            return Ok(false);
        }
        let end = offset
            .checked_add(len - 1)
            .ok_or(Error::new(ErrorKind::InvalidInput, "Byte range overflows"))?;

        let shift = self.geometry.block_shift();
        let mut block = offset >> shift;
        let last = end >> shift;

        if block < self.geometry.first_data_block() as u64 {
            return Ok(true);
        }

        while block <= last {
            let (group, index) = self
                .geometry
                .block_group_of(block)
                .ok_or(Error::with_value(ErrorKind::InvalidInput, "Block outside of any group", block))?;
            let in_group = (self.geometry.blocks_per_group() - index) as u64;
            let count = in_group
                .min(last - block + 1)
                .min(self.geometry.total_blocks() - block);

            let entry = self.groups.get(&mut self.store, &self.geometry, group)?;
            let used = entry.block_range_in_use(index, count as u32);
            self.groups.release(entry);

            if used {
                return Ok(true);
            }
            block += count;
        }

        Ok(false)
    }

    /// 卸载卷并交还后备存储
    ///
    /// 仍有借出的缓存条目时返回 `Busy`（卷同样被销毁）。没有 `close`
    /// 就被丢弃的 [`File`]/[`Directory`] 句柄也算借出。
    pub fn close(mut self) -> Result<B> {
        let pinned = self.inodes.clear() + self.groups.clear() + self.blocks.clear();
        if pinned != 0 {
            log::warn!("[MOUNT] volume closed with {} cache entries still referenced", pinned);
            return Err(Error::with_value(ErrorKind::Busy, "Cache entries still referenced", pinned as u64));
        }
        log::info!("[MOUNT] volume closed after {} reads", self.store.read_count());
        Ok(self.store.into_inner())
    }

    /// 几何参数
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// Superblock
    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    /// 后备存储（含读取计数）
    pub fn store(&self) -> &Backing<B> {
        &self.store
    }

    /// 块缓存
    pub fn block_cache(&self) -> &BlockCache {
        &self.blocks
    }

    /// 块组缓存
    pub fn block_group_cache(&self) -> &BlockGroupCache {
        &self.groups
    }

    /// Inode 缓存
    pub fn inode_cache(&self) -> &InodeCache {
        &self.inodes
    }

    /// 三个缓存的统计（块、块组、inode）
    pub fn cache_stats(&self) -> (CacheStats, CacheStats, CacheStats) {
        (
            self.blocks.stats().clone(),
            self.groups.stats().clone(),
            self.inodes.stats().clone(),
        )
    }
}
