//! 间接块映射器实现
//!
//! 将文件的逻辑块号映射到物理块号，支持直接块和多级间接块。
//! 遍历是迭代的，最多 3 层，每层一次块缓存借用。

use crate::block::{Backing, BackingStore};
use crate::cache::BlockCache;
use crate::consts::{EXT_INDIRECT_MAX_DEPTH, EXT_INODE_BLOCKS, EXT_INODE_DIRECT_BLOCKS, EXT_INODE_INDIRECT_BLOCK};
use crate::error::{Error, ErrorKind, Result};
use crate::mapping::BlockMapping;
use byteorder::{ByteOrder, LittleEndian};

/// 间接块映射器
///
/// 用于计算各间接层级的块数限制和执行块映射。
pub struct IndirectBlockMapper {
    /// 每个间接块可以容纳的指针数量 (block_size / 4)
    blocks_per_indirect: u32,

    /// 每个间接层级的块数限制
    ///
    /// - limits[0] = 12 (直接块)
    /// - limits[1] = 12 + N (一级间接)
    /// - limits[2] = limits[1] + N^2 (二级间接)
    /// - limits[3] = limits[2] + N^3 (三级间接)
    block_limits: [u64; 4],

    /// 每个层级可以寻址的块数
    ///
    /// - blocks_per_level[0] = 1
    /// - blocks_per_level[1] = N
    /// - blocks_per_level[2] = N^2
    /// - blocks_per_level[3] = N^3
    blocks_per_level: [u64; 4],
}

impl IndirectBlockMapper {
    /// 创建新的间接块映射器
    ///
    /// # 参数
    ///
    /// - `block_size`: 文件系统块大小（字节）
    pub fn new(block_size: u32) -> Self {
        let blocks_per_indirect = block_size / 4;

        let mut block_limits = [0u64; 4];
        let mut blocks_per_level = [0u64; 4];

        block_limits[0] = EXT_INODE_DIRECT_BLOCKS as u64;
        blocks_per_level[0] = 1;

        for i in 1..4 {
            blocks_per_level[i] = blocks_per_level[i - 1] * blocks_per_indirect as u64;
            block_limits[i] = block_limits[i - 1] + blocks_per_level[i];
        }

        Self {
            blocks_per_indirect,
            block_limits,
            blocks_per_level,
        }
    }

    /// 可映射的逻辑块总数
    pub fn max_blocks(&self) -> u64 {
        self.block_limits[EXT_INDIRECT_MAX_DEPTH]
    }

    /// 将逻辑块号映射到物理块号
    ///
    /// # 参数
    ///
    /// - `store`: 后备存储
    /// - `cache`: 块缓存（间接块经由它读取）
    /// - `pointers`: inode 中的 15 个块指针
    /// - `logical_block`: 文件内的逻辑块号
    ///
    /// # 返回
    ///
    /// 运行长度恒为 1；任一层指针为 0 时返回稀疏映射。
    pub fn map_block<B: BackingStore>(
        &self,
        store: &mut Backing<B>,
        cache: &mut BlockCache,
        pointers: &[u32; EXT_INODE_BLOCKS],
        logical_block: u64,
    ) -> Result<BlockMapping> {
        // 1. 直接块
        if logical_block < EXT_INODE_DIRECT_BLOCKS as u64 {
            let physical = pointers[logical_block as usize];
            log::trace!("[INDIRECT] block {} direct -> {:#x}", logical_block, physical);
            return Ok(BlockMapping::from_pointer(physical as u64));
        }

        // 2. 确定间接层级和每层索引
        let level = self.determine_indirect_level(logical_block)?;
        let path = self.index_path(level, logical_block);

        // 3. 从 inode 中该层级的根指针开始逐层向下
        let mut current = pointers[EXT_INODE_INDIRECT_BLOCK + level - 1] as u64;
        for &index in &path[..level] {
            if current == 0 {
                log::trace!("[INDIRECT] block {} hole at level {}", logical_block, level);
                return Ok(BlockMapping::sparse(1));
            }
            current = self.read_block_pointer(store, cache, current, index)? as u64;
        }

        log::trace!("[INDIRECT] block {} level {} -> {:#x}", logical_block, level, current);
        Ok(BlockMapping::from_pointer(current))
    }

    /// 确定逻辑块号对应的间接层级（1..=3）
    fn determine_indirect_level(&self, logical_block: u64) -> Result<usize> {
        for level in 1..=EXT_INDIRECT_MAX_DEPTH {
            if logical_block < self.block_limits[level] {
                return Ok(level);
            }
        }

        Err(Error::with_value(
            ErrorKind::InvalidInput,
            "Logical block number exceeds maximum file size",
            logical_block,
        ))
    }

    /// 计算从最外层到最内层的指针索引
    ///
    /// 二级：`(rel / N, rel % N)`；三级：`(rel / N², (rel / N) % N, rel % N)`。
    fn index_path(&self, level: usize, logical_block: u64) -> [u32; EXT_INDIRECT_MAX_DEPTH] {
        let rel = logical_block - self.block_limits[level - 1];
        let n = self.blocks_per_indirect as u64;
        let mut path = [0u32; EXT_INDIRECT_MAX_DEPTH];
        for (depth, slot) in path[..level].iter_mut().enumerate() {
            let span = self.blocks_per_level[level - 1 - depth];
            *slot = ((rel / span) % n) as u32;
        }
        path
    }

    /// 读取间接块中的第 `index` 个指针
    fn read_block_pointer<B: BackingStore>(
        &self,
        store: &mut Backing<B>,
        cache: &mut BlockCache,
        block: u64,
        index: u32,
    ) -> Result<u32> {
        let handle = cache.get(store, block)?;
        let offset = index as usize * 4;
        let pointer = LittleEndian::read_u32(&handle[offset..offset + 4]);
        cache.release(handle);
        Ok(pointer)
    }
}
