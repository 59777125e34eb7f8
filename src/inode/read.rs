//! Inode 读取和解码

use crate::{
    block::{Backing, BackingStore},
    block_group::BlockGroupCache,
    consts::*,
    error::{Error, ErrorKind, FormatError, Result},
    fs::FileType,
    superblock::VolumeGeometry,
    types::ext_inode,
};
use byteorder::{ByteOrder, LittleEndian};

/// inode 的块指针区域
///
/// 由 EXTENTS 标志在解码时二选一。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockArea {
    /// 12 个直接块 + 一/二/三级间接块
    Legacy([u32; EXT_INODE_BLOCKS]),
    /// extent 树根节点（头部 + 最多 4 个条目）
    Extents([u8; EXT_INODE_BLOCK_AREA_SIZE]),
}

/// 解码后的 inode
#[derive(Debug, Clone)]
pub struct InodeEntry {
    /// inode 编号
    pub number: u32,
    /// 文件类型
    pub file_type: FileType,
    /// 完整模式（类型 + 权限）
    pub mode: u16,
    /// 用户 ID
    pub uid: u32,
    /// 组 ID
    pub gid: u32,
    /// 硬链接数
    pub links: u16,
    /// 文件大小（字节）
    pub size: u64,
    /// 已分配字节数
    pub allocated: u64,
    /// 访问时间
    pub atime: u32,
    /// 数据修改时间
    pub mtime: u32,
    /// inode 修改时间
    pub ctime: u32,
    /// 创建时间（无扩展字段时等于 ctime）
    pub birth: u32,
    /// inode 标志
    pub flags: u32,
    /// 文件版本
    pub generation: u32,
    /// 块指针区域
    pub blocks: BlockArea,
}

impl InodeEntry {
    /// 从 inode 表槽位字节解码
    ///
    /// # 参数
    ///
    /// * `number` - inode 编号
    /// * `raw` - 槽位字节（至少 128 字节）
    /// * `block_size` - 块大小（HUGE_FILE inode 的块计数单位）
    pub fn parse(number: u32, raw: &[u8], block_size: u32) -> Result<Self> {
        let inode = ext_inode::parse(raw)?;

        let file_type = FileType::from_mode(inode.mode).ok_or_else(|| {
            log::warn!("[ICACHE] inode {} has unknown mode {:#o}", number, inode.mode);
            Error::with_value(
                ErrorKind::Format(FormatError::BadInodeType),
                "Unrecognized inode type",
                inode.mode as u64,
            )
        })?;

        let unit = if inode.flags & EXT_INODE_FLAG_HUGE_FILE != 0 {
            block_size as u64
        } else {
            EXT_INODE_BLOCKS_UNIT
        };

        let blocks = if inode.flags & EXT_INODE_FLAG_EXTENTS != 0 {
            BlockArea::Extents(inode.blocks)
        } else {
            let mut pointers = [0u32; EXT_INODE_BLOCKS];
            LittleEndian::read_u32_into(&inode.blocks, &mut pointers);
            BlockArea::Legacy(pointers)
        };

        Ok(Self {
            number,
            file_type,
            mode: inode.mode,
            uid: inode.uid(),
            gid: inode.gid(),
            links: inode.links_count,
            size: inode.file_size(),
            allocated: inode.blocks_count().saturating_mul(unit),
            atime: inode.atime,
            mtime: inode.mtime,
            ctime: inode.ctime,
            birth: inode.crtime.unwrap_or(inode.ctime),
            flags: inode.flags,
            generation: inode.generation,
            blocks,
        })
    }

    /// 权限位（含 setuid/setgid/sticky）
    pub fn permissions(&self) -> u16 {
        self.mode & EXT_INODE_MODE_PERM_MASK
    }

    /// 是否使用 extent 树
    pub fn uses_extents(&self) -> bool {
        matches!(self.blocks, BlockArea::Extents(_))
    }

    /// 是否是目录
    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    /// 是否是普通文件
    pub fn is_file(&self) -> bool {
        self.file_type.is_file()
    }
}

/// 从存储读取一个 inode
///
/// 所属块组的条目只在计算偏移期间借用。
pub fn load_inode<B: BackingStore>(
    store: &mut Backing<B>,
    geometry: &VolumeGeometry,
    groups: &mut BlockGroupCache,
    number: u32,
) -> Result<InodeEntry> {
    let (group, index) = geometry.derive_group_and_index(number)?;

    let group_entry = groups.get(store, geometry, group)?;
    let table_block = group_entry.inode_table_block;
    groups.release(group_entry);

    let offset = table_block
        .checked_mul(geometry.block_size() as u64)
        .and_then(|base| base.checked_add(index as u64 * geometry.inode_size() as u64))
        .ok_or(Error::with_value(ErrorKind::Corrupted, "Inode table out of range", table_block))?;

    let mut raw = [0u8; EXT_INODE_EXTENDED_SIZE];
    let len = (geometry.inode_size() as usize).min(EXT_INODE_EXTENDED_SIZE);
    store.read_at(offset, &mut raw[..len])?;

    log::debug!("[ICACHE] inode {} read from group {} index {}", number, group, index);
    InodeEntry::parse(number, &raw[..len], geometry.block_size())
}
