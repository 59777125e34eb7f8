//! 块组描述符和位图读取

use crate::{
    block::{Backing, BackingStore},
    error::{Error, ErrorKind, Result},
    superblock::{DescriptorLayout, VolumeGeometry},
    types::ext_group_desc,
};
use alloc::vec::Vec;

/// 一个块组的元数据
#[derive(Debug, Clone)]
pub struct GroupEntry {
    /// 块组号
    pub group: u32,
    /// 块位图
    pub block_bitmap: Vec<u8>,
    /// inode 位图
    pub inode_bitmap: Vec<u8>,
    /// inode 表起始块号（统一为 64 位）
    pub inode_table_block: u64,
}

impl GroupEntry {
    /// 条目占用的缓存字节数
    pub fn cache_size(&self) -> usize {
        core::mem::size_of::<Self>() + self.block_bitmap.len() + self.inode_bitmap.len()
    }

    /// 组内第 `index` 个块是否已分配
    pub fn block_in_use(&self, index: u32) -> bool {
        bit_set(&self.block_bitmap, index)
    }

    /// 组内第 `index` 个 inode 是否已分配
    pub fn inode_in_use(&self, index: u32) -> bool {
        bit_set(&self.inode_bitmap, index)
    }

    /// 组内 `[start, start + count)` 中是否有已分配的块
    pub fn block_range_in_use(&self, start: u32, count: u32) -> bool {
        (start..start.saturating_add(count)).any(|index| self.block_in_use(index))
    }
}

fn bit_set(bitmap: &[u8], index: u32) -> bool {
    bitmap
        .get((index / 8) as usize)
        .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
}

fn prepare_bitmap(mut bitmap: Vec<u8>, len: usize) -> Result<Vec<u8>> {
    bitmap.clear();
    bitmap
        .try_reserve_exact(len)
        .map_err(|_| Error::with_value(ErrorKind::OutOfMemory, "Cannot allocate group bitmap", len as u64))?;
    bitmap.resize(len, 0);
    Ok(bitmap)
}

/// 从存储读取块组描述符及其位图
///
/// # 参数
///
/// * `store` - 后备存储
/// * `geometry` - 卷几何参数
/// * `group` - 块组号
/// * `recycled` - 被驱逐的旧条目，其位图缓冲区会被复用
pub fn load_group<B: BackingStore>(
    store: &mut Backing<B>,
    geometry: &VolumeGeometry,
    group: u32,
    recycled: Option<GroupEntry>,
) -> Result<GroupEntry> {
    if group >= geometry.group_count() {
        return Err(Error::with_value(ErrorKind::InvalidInput, "Block group out of range", group as u64));
    }

    let mut raw = [0u8; crate::consts::EXT_GROUP_DESC_SIZE_64];
    let desc_len = (geometry.desc_size() as usize).min(raw.len());
    store.read_at(geometry.group_desc_offset(group), &mut raw[..desc_len])?;

    let desc = match geometry.desc_layout() {
        DescriptorLayout::Legacy32 => ext_group_desc::parse_legacy(&raw[..desc_len])?,
        DescriptorLayout::Wide64 => ext_group_desc::parse_wide(&raw[..desc_len])?,
    };

    let block_size = geometry.block_size() as u64;
    let bitmap_offset = |block: u64| {
        block
            .checked_mul(block_size)
            .ok_or(Error::with_value(ErrorKind::Corrupted, "Bitmap block out of range", block))
    };

    let (block_bitmap, inode_bitmap) = match recycled {
        Some(old) => (old.block_bitmap, old.inode_bitmap),
        None => (Vec::new(), Vec::new()),
    };

    let mut block_bitmap = prepare_bitmap(block_bitmap, geometry.block_bitmap_bytes())?;
    store.read_at(bitmap_offset(desc.block_bitmap())?, &mut block_bitmap)?;

    let mut inode_bitmap = prepare_bitmap(inode_bitmap, geometry.inode_bitmap_bytes())?;
    store.read_at(bitmap_offset(desc.inode_bitmap())?, &mut inode_bitmap)?;

    log::debug!(
        "[BGCACHE] group={} block_bitmap={:#x} inode_bitmap={:#x} inode_table={:#x}",
        group,
        desc.block_bitmap(),
        desc.inode_bitmap(),
        desc.inode_table()
    );

    Ok(GroupEntry {
        group,
        block_bitmap,
        inode_bitmap,
        inode_table_block: desc.inode_table(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_bitmap_queries() {
        let entry = GroupEntry {
            group: 0,
            block_bitmap: vec![0b0000_0101, 0, 0b1000_0000],
            inode_bitmap: vec![0b0000_0010],
            inode_table_block: 5,
        };
        assert!(entry.block_in_use(0));
        assert!(!entry.block_in_use(1));
        assert!(entry.block_in_use(2));
        assert!(entry.block_in_use(23));
        // 超出位图的索引视为未分配
        assert!(!entry.block_in_use(100));

        assert!(!entry.block_range_in_use(3, 20));
        assert!(entry.block_range_in_use(3, 21));
        assert!(entry.inode_in_use(1));
        assert!(!entry.inode_in_use(0));
    }
}
