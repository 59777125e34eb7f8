//! 块映射
//!
//! 根据 inode 的块指针区域类型，把逻辑块解析为物理块、连续运行长度和稀疏标志。
//! 中间节点（间接块、extent 树节点）都经由块缓存读取。

use crate::{
    block::{Backing, BackingStore},
    cache::BlockCache,
    error::Result,
    extent::ExtentTree,
    indirect::IndirectBlockMapper,
    inode::{BlockArea, InodeEntry},
};

/// 一次解析的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMapping {
    /// 起始物理块号（稀疏时无意义，为 0）
    pub physical: u64,
    /// 从该逻辑块开始的连续块数（至少为 1）
    pub run: u32,
    /// 是否未分配（读出全零）
    pub sparse: bool,
}

impl BlockMapping {
    /// 已分配的映射
    pub fn mapped(physical: u64, run: u32) -> Self {
        Self {
            physical,
            run,
            sparse: false,
        }
    }

    /// 稀疏映射
    pub fn sparse(run: u32) -> Self {
        Self {
            physical: 0,
            run,
            sparse: true,
        }
    }

    /// 由块指针构造：0 表示未分配
    pub fn from_pointer(pointer: u64) -> Self {
        if pointer == 0 {
            Self::sparse(1)
        } else {
            Self::mapped(pointer, 1)
        }
    }
}

/// 块映射解析器
pub struct BlockResolver {
    indirect: IndirectBlockMapper,
    extents: ExtentTree,
}

impl BlockResolver {
    /// 按块大小创建
    pub fn new(block_size: u32) -> Self {
        Self {
            indirect: IndirectBlockMapper::new(block_size),
            extents: ExtentTree::new(block_size),
        }
    }

    /// 解析 `logical_block` 开始的一段
    ///
    /// # 参数
    ///
    /// * `inode` - 文件的 inode
    /// * `logical_block` - 逻辑块号
    /// * `requested` - 期望的连续块数，返回的运行长度不超过它
    pub fn resolve<B: BackingStore>(
        &self,
        store: &mut Backing<B>,
        cache: &mut BlockCache,
        inode: &InodeEntry,
        logical_block: u64,
        requested: u32,
    ) -> Result<BlockMapping> {
        let requested = requested.max(1);
        match &inode.blocks {
            BlockArea::Legacy(pointers) => self.indirect.map_block(store, cache, pointers, logical_block),
            BlockArea::Extents(root) => self.extents.map_block(store, cache, root, logical_block, requested),
        }
    }
}
