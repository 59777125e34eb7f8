//! 卷几何参数
//!
//! 挂载时从 superblock 一次性推导，之后不再变化。

use super::read::{IncompatFeatures, RoCompatFeatures, Superblock};
use crate::{
    consts::*,
    error::{Error, ErrorKind, FormatError, Result},
    fs::MountFlags,
};

/// 块组描述符布局
///
/// 挂载时确定，之后描述符只按这一种布局解码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorLayout {
    /// 32 位块号的传统描述符
    Legacy32,
    /// 带 `_hi` 字段的 64 位描述符
    Wide64,
}

/// 卷几何参数
#[derive(Debug, Clone)]
pub struct VolumeGeometry {
    block_size: u32,
    block_shift: u32,
    total_blocks: u64,
    group_count: u32,
    blocks_per_group: u32,
    inodes_per_group: u32,
    first_data_block: u32,
    inode_size: u32,
    desc_size: u32,
    desc_layout: DescriptorLayout,
    block_bitmap_bytes: usize,
    inode_bitmap_bytes: usize,
    incompat: IncompatFeatures,
    ro_compat: RoCompatFeatures,
    revision: u32,
    mount_flags: MountFlags,
}

fn bad_geometry(message: &'static str, value: u64) -> Error {
    log::warn!("[MOUNT] {} ({:#x})", message, value);
    Error::with_value(ErrorKind::Format(FormatError::BadGeometry), message, value)
}

impl VolumeGeometry {
    /// 从已通过检查的 superblock 推导几何参数
    pub fn derive(sb: &Superblock, mount_flags: MountFlags) -> Result<Self> {
        let raw = sb.inner();

        if raw.log_block_size > EXT_MAX_BLOCK_SIZE.trailing_zeros() - EXT_MIN_BLOCK_LOG_SIZE {
            return Err(bad_geometry("Block size out of range", raw.log_block_size as u64));
        }
        let block_shift = EXT_MIN_BLOCK_LOG_SIZE + raw.log_block_size;
        let block_size = 1u32 << block_shift;

        if raw.blocks_per_group == 0 {
            return Err(bad_geometry("Zero blocks per group", 0));
        }
        if raw.inodes_per_group == 0 {
            return Err(bad_geometry("Zero inodes per group", 0));
        }

        let incompat = sb.incompat();
        let (inode_size, desc_size, desc_layout) = if sb.is_original_revision() {
            (
                EXT_GOOD_OLD_INODE_SIZE as u32,
                EXT_GROUP_DESC_SIZE as u32,
                DescriptorLayout::Legacy32,
            )
        } else if incompat.contains(IncompatFeatures::BIT64) {
            (raw.inode_size as u32, raw.desc_size as u32, DescriptorLayout::Wide64)
        } else {
            (raw.inode_size as u32, EXT_GROUP_DESC_SIZE as u32, DescriptorLayout::Legacy32)
        };

        if inode_size < EXT_GOOD_OLD_INODE_SIZE as u32 || !inode_size.is_power_of_two() || inode_size > block_size {
            return Err(bad_geometry("Invalid inode size", inode_size as u64));
        }
        let min_desc = match desc_layout {
            DescriptorLayout::Legacy32 => EXT_GROUP_DESC_SIZE,
            DescriptorLayout::Wide64 => EXT_GROUP_DESC_SIZE_64,
        };
        if (desc_size as usize) < min_desc || desc_size > block_size {
            return Err(bad_geometry("Invalid group descriptor size", desc_size as u64));
        }

        let total_blocks = if incompat.contains(IncompatFeatures::BIT64) {
            (raw.blocks_count_hi as u64) << 32 | raw.blocks_count_lo as u64
        } else {
            raw.blocks_count_lo as u64
        };
        // 最后一个块组可以不完整，向上取整
        let group_count = total_blocks
            .saturating_sub(raw.first_data_block as u64)
            .div_ceil(raw.blocks_per_group as u64);
        let group_count =
            u32::try_from(group_count).map_err(|_| bad_geometry("Too many block groups", group_count))?;

        let geometry = Self {
            block_size,
            block_shift,
            total_blocks,
            group_count,
            blocks_per_group: raw.blocks_per_group,
            inodes_per_group: raw.inodes_per_group,
            first_data_block: raw.first_data_block,
            inode_size,
            desc_size,
            desc_layout,
            block_bitmap_bytes: raw.blocks_per_group.div_ceil(8) as usize,
            inode_bitmap_bytes: raw.inodes_per_group.div_ceil(8) as usize,
            incompat,
            ro_compat: sb.ro_compat(),
            revision: raw.rev_level,
            mount_flags,
        };

        log::info!(
            "[MOUNT] rev={} block_size={} blocks={} groups={} blocks/group={} inodes/group={} inode_size={} desc={:?}/{}",
            geometry.revision,
            geometry.block_size,
            geometry.total_blocks,
            geometry.group_count,
            geometry.blocks_per_group,
            geometry.inodes_per_group,
            geometry.inode_size,
            geometry.desc_layout,
            geometry.desc_size
        );

        Ok(geometry)
    }

    /// 块大小（字节）
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// 块大小的位移
    pub fn block_shift(&self) -> u32 {
        self.block_shift
    }

    /// 卷的总块数
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// 块组数量（含末尾不完整的块组）
    pub fn group_count(&self) -> u32 {
        self.group_count
    }

    /// 每组块数
    pub fn blocks_per_group(&self) -> u32 {
        self.blocks_per_group
    }

    /// 每组 inode 数
    pub fn inodes_per_group(&self) -> u32 {
        self.inodes_per_group
    }

    /// 第一个数据块（块组 0 的起始块）
    pub fn first_data_block(&self) -> u32 {
        self.first_data_block
    }

    /// inode 记录大小
    pub fn inode_size(&self) -> u32 {
        self.inode_size
    }

    /// 块组描述符大小
    pub fn desc_size(&self) -> u32 {
        self.desc_size
    }

    /// 块组描述符布局
    pub fn desc_layout(&self) -> DescriptorLayout {
        self.desc_layout
    }

    /// 块位图字节数
    pub fn block_bitmap_bytes(&self) -> usize {
        self.block_bitmap_bytes
    }

    /// inode 位图字节数
    pub fn inode_bitmap_bytes(&self) -> usize {
        self.inode_bitmap_bytes
    }

    /// 启用的不兼容特性
    pub fn incompat(&self) -> IncompatFeatures {
        self.incompat
    }

    /// 启用的只读兼容特性
    pub fn ro_compat(&self) -> RoCompatFeatures {
        self.ro_compat
    }

    /// 版本号
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// 挂载标志
    pub fn mount_flags(&self) -> MountFlags {
        self.mount_flags
    }

    /// 目录项是否带文件类型字节
    pub fn has_filetype(&self) -> bool {
        self.incompat.contains(IncompatFeatures::FILETYPE)
    }

    /// 每个间接块容纳的块指针数
    pub fn pointers_per_block(&self) -> u32 {
        self.block_size / 4
    }

    /// 可寻址的 inode 总数
    pub fn inode_count(&self) -> u64 {
        self.group_count as u64 * self.inodes_per_group as u64
    }

    /// inode 编号 -> (块组, 组内索引)
    ///
    /// 满足 `inode - 1 == group * inodes_per_group + index`。
    pub fn derive_group_and_index(&self, inode: u32) -> Result<(u32, u32)> {
        if inode == 0 || inode as u64 > self.inode_count() {
            return Err(Error::with_value(ErrorKind::InvalidInput, "Inode number out of range", inode as u64));
        }
        let rel = inode - 1;
        Ok((rel / self.inodes_per_group, rel % self.inodes_per_group))
    }

    /// (块组, 组内索引) -> inode 编号
    pub fn reconstruct_inode(&self, group: u32, index: u32) -> u32 {
        group * self.inodes_per_group + index + 1
    }

    /// 块组描述符在存储上的字节偏移
    ///
    /// 描述符表紧跟在 superblock 所在的块之后。
    pub fn group_desc_offset(&self, group: u32) -> u64 {
        let table_block: u64 = if self.block_size == EXT_MIN_BLOCK_SIZE { 2 } else { 1 };
        table_block * self.block_size as u64 + group as u64 * self.desc_size as u64
    }

    /// 物理块号 -> (块组, 组内块索引)
    ///
    /// `first_data_block` 之前的块和卷末尾之后的块不属于任何块组。
    pub fn block_group_of(&self, block: u64) -> Option<(u32, u32)> {
        if block >= self.total_blocks {
            return None;
        }
        let rel = block.checked_sub(self.first_data_block as u64)?;
        let group = rel / self.blocks_per_group as u64;
        if group >= self.group_count as u64 {
            return None;
        }
        Some((group as u32, (rel % self.blocks_per_group as u64) as u32))
    }
}
