//! Extent 树解析和块映射

use crate::{
    block::{Backing, BackingStore},
    cache::{BlockCache, BlockHandle},
    consts::*,
    error::{Error, ErrorKind, FormatError, Result},
    mapping::BlockMapping,
    types::{ext_extent, ext_extent_header, ext_extent_idx},
};
use log::*;

/// 在一个节点中查找的结果
enum Step {
    /// 叶子层命中
    Found(BlockMapping),
    /// 继续到子节点
    Descend(u64),
}

/// Extent 树遍历器
///
/// 迭代下降，每层一次块缓存借用，深度受 `EXT_EXTENT_MAX_DEPTH` 限制。
pub struct ExtentTree {
    block_size: u32,
}

impl ExtentTree {
    /// 创建新的 extent 树遍历器
    pub fn new(block_size: u32) -> Self {
        Self { block_size }
    }

    /// 子节点最多容纳的条目数
    fn node_capacity(&self) -> u16 {
        ((self.block_size as usize - EXT_EXTENT_HEADER_SIZE) / EXT_EXTENT_ENTRY_SIZE) as u16
    }

    /// 将逻辑块号映射到物理块号
    ///
    /// # 参数
    ///
    /// * `root` - inode 中的 60 字节 extent 树根
    /// * `logical_block` - 逻辑块号
    /// * `requested` - 期望的连续块数
    ///
    /// # 返回
    ///
    /// 命中的叶子给出物理块和 `min(requested, 叶子剩余长度)`；
    /// 任何 extent 都不覆盖的逻辑块返回 `Format(UnmappedBlock)`。
    pub fn map_block<B: BackingStore>(
        &self,
        store: &mut Backing<B>,
        cache: &mut BlockCache,
        root: &[u8; EXT_INODE_BLOCK_AREA_SIZE],
        logical_block: u64,
        requested: u32,
    ) -> Result<BlockMapping> {
        let logical = u32::try_from(logical_block).map_err(|_| unmapped(logical_block))?;

        let mut header = ext_extent_header::parse(root)?;
        check_header(&header, EXT_EXTENT_ROOT_MAX_ENTRIES, None)?;

        let mut node: Option<BlockHandle> = None;
        loop {
            let data: &[u8] = match &node {
                Some(handle) => &handle[..],
                None => &root[..],
            };
            let step = find_in_node(data, &header, logical, requested);
            let parent_depth = header.depth;

            if let Some(handle) = node.take() {
                cache.release(handle);
            }

            let child = match step? {
                Step::Found(mapping) => return Ok(mapping),
                Step::Descend(child) => child,
            };

            trace!("[EXTENT] logical={} depth={} -> child block {:#x}", logical, parent_depth, child);
            let handle = cache.get(store, child)?;
            header = match ext_extent_header::parse(&handle[..])
                .and_then(|h| check_header(&h, self.node_capacity(), Some(parent_depth - 1)).map(|()| h))
            {
                Ok(h) => h,
                Err(err) => {
                    cache.release(handle);
                    return Err(err);
                }
            };
            node = Some(handle);
        }
    }
}

fn unmapped(logical_block: u64) -> Error {
    Error::with_value(
        ErrorKind::Format(FormatError::UnmappedBlock),
        "Logical block not covered by any extent",
        logical_block,
    )
}

/// 校验节点头部
///
/// `expected_depth` 为 `None` 时是根节点，只检查深度上限。
fn check_header(header: &ext_extent_header, capacity: u16, expected_depth: Option<u16>) -> Result<()> {
    if !header.is_valid() {
        error!("[EXTENT] bad header magic {:#06x}", header.magic);
        return Err(Error::with_value(
            ErrorKind::Format(FormatError::BadExtentHeader),
            "Invalid extent header magic",
            header.magic as u64,
        ));
    }
    if header.max > capacity {
        error!("[EXTENT] header max {} exceeds node capacity {}", header.max, capacity);
        return Err(Error::with_value(
            ErrorKind::Format(FormatError::BadExtentHeader),
            "Extent header maximum exceeds node capacity",
            header.max as u64,
        ));
    }
    if header.depth > EXT_EXTENT_MAX_DEPTH || expected_depth.is_some_and(|depth| depth != header.depth) {
        error!("[EXTENT] unexpected depth {} (expected {:?})", header.depth, expected_depth);
        return Err(Error::with_value(
            ErrorKind::Format(FormatError::ExtentDepth),
            "Invalid extent tree depth",
            header.depth as u64,
        ));
    }
    if header.entries > header.max {
        error!("[EXTENT] {} entries exceed maximum {}", header.entries, header.max);
        return Err(Error::with_value(
            ErrorKind::Corrupted,
            "Extent node entries exceed declared maximum",
            header.entries as u64,
        ));
    }
    Ok(())
}

fn entry_bytes(node: &[u8], index: usize) -> &[u8] {
    let offset = EXT_EXTENT_HEADER_SIZE + index * EXT_EXTENT_ENTRY_SIZE;
    &node[offset..offset + EXT_EXTENT_ENTRY_SIZE]
}

/// 在已校验的节点中查找
fn find_in_node(node: &[u8], header: &ext_extent_header, logical: u32, requested: u32) -> Result<Step> {
    let entries = header.entries as usize;

    if header.is_leaf() {
        for i in 0..entries {
            let extent = ext_extent::parse(entry_bytes(node, i))?;
            let start = extent.block as u64;
            let len = extent.actual_len() as u64;
            let logical = logical as u64;

            if logical >= start && logical < start + len {
                let rel = logical - start;
                let run = (len - rel).min(requested as u64) as u32;
                trace!(
                    "[EXTENT] logical={} in leaf[{}] start={} len={} sparse={}",
                    logical,
                    i,
                    start,
                    len,
                    extent.is_sparse()
                );
                return Ok(Step::Found(if extent.is_sparse() {
                    BlockMapping::sparse(run)
                } else {
                    BlockMapping::mapped(extent.physical_block() + rel, run)
                }));
            }
        }
        return Err(unmapped(logical as u64));
    }

    // 索引按逻辑块号排序：取最后一个起点不超过目标的条目
    let mut target: Option<ext_extent_idx> = None;
    for i in 0..entries {
        let idx = ext_extent_idx::parse(entry_bytes(node, i))?;
        if logical >= idx.block {
            target = Some(idx);
        } else {
            break;
        }
    }

    target
        .map(|idx| Step::Descend(idx.leaf_block()))
        .ok_or_else(|| unmapped(logical as u64))
}
