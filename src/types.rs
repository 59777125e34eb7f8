//! ext2/3/4 磁盘数据结构
//!
//! 这个模块包含了直接对应磁盘格式的数据结构。
//!
//! ## 设计原则
//!
//! 1. **磁盘格式结构** - 保留 C 风格命名（便于对照 ext 磁盘格式文档）
//! 2. **解码方式** - 使用 `byteorder::LittleEndian` 从字节切片逐字段解码，不做指针转换
//! 3. **只解码需要的字段** - 只读实现用不到的字段不保留

#![allow(non_camel_case_types)]

use crate::consts::*;
use crate::error::{Error, ErrorKind, Result};
use byteorder::{ByteOrder, LittleEndian};

fn check_len(buf: &[u8], need: usize, what: &'static str) -> Result<()> {
    if buf.len() < need {
        return Err(Error::with_value(ErrorKind::InvalidInput, what, buf.len() as u64));
    }
    Ok(())
}

//=============================================================================
// Superblock
//=============================================================================

/// Superblock 结构（只读实现使用的字段）
///
/// 对应磁盘上偏移 1024 处的 superblock
#[derive(Debug, Clone, Copy, Default)]
pub struct ext_sblock {
    pub inodes_count: u32,       // 0: 总 inode 数
    pub blocks_count_lo: u32,    // 4: 总块数（低32位）
    pub first_data_block: u32,   // 20: 第一个数据块
    pub log_block_size: u32,     // 24: 块大小 = 1024 << log_block_size
    pub log_cluster_size: u32,   // 28: cluster 大小
    pub blocks_per_group: u32,   // 32: 每组块数
    pub inodes_per_group: u32,   // 40: 每组 inode 数
    pub magic: u16,              // 56: 魔数 0xEF53
    pub state: u16,              // 58: 文件系统状态
    pub rev_level: u32,          // 76: 版本号
    pub inode_size: u16,         // 88: inode 大小（动态版本）
    pub feature_compat: u32,     // 92: 兼容特性
    pub feature_incompat: u32,   // 96: 不兼容特性
    pub feature_ro_compat: u32,  // 100: 只读兼容特性
    pub uuid: [u8; 16],          // 104: 卷 UUID
    pub volume_name: [u8; 16],   // 120: 卷名
    pub desc_size: u16,          // 254: 块组描述符大小（64位）
    pub blocks_count_hi: u32,    // 336: 总块数（高32位）
}

impl ext_sblock {
    /// 从 superblock 字节解码
    pub fn parse(buf: &[u8]) -> Result<Self> {
        check_len(buf, EXT_SUPERBLOCK_SIZE, "Superblock buffer too short")?;

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&buf[104..120]);
        let mut volume_name = [0u8; 16];
        volume_name.copy_from_slice(&buf[120..136]);

        Ok(Self {
            inodes_count: LittleEndian::read_u32(&buf[0..]),
            blocks_count_lo: LittleEndian::read_u32(&buf[4..]),
            first_data_block: LittleEndian::read_u32(&buf[20..]),
            log_block_size: LittleEndian::read_u32(&buf[24..]),
            log_cluster_size: LittleEndian::read_u32(&buf[28..]),
            blocks_per_group: LittleEndian::read_u32(&buf[32..]),
            inodes_per_group: LittleEndian::read_u32(&buf[40..]),
            magic: LittleEndian::read_u16(&buf[56..]),
            state: LittleEndian::read_u16(&buf[58..]),
            rev_level: LittleEndian::read_u32(&buf[76..]),
            inode_size: LittleEndian::read_u16(&buf[88..]),
            feature_compat: LittleEndian::read_u32(&buf[92..]),
            feature_incompat: LittleEndian::read_u32(&buf[96..]),
            feature_ro_compat: LittleEndian::read_u32(&buf[100..]),
            uuid,
            volume_name,
            desc_size: LittleEndian::read_u16(&buf[254..]),
            blocks_count_hi: LittleEndian::read_u32(&buf[336..]),
        })
    }

    /// 检查魔数是否有效
    pub fn is_valid(&self) -> bool {
        self.magic == EXT_SUPERBLOCK_MAGIC
    }
}

//=============================================================================
// 块组描述符
//=============================================================================

/// 块组描述符
///
/// 32 字节传统布局只有 `_lo` 字段有意义，64 位布局额外提供 `_hi` 字段
#[derive(Debug, Clone, Copy, Default)]
pub struct ext_group_desc {
    pub block_bitmap_lo: u32,  // 0: 块位图块号（低32位）
    pub inode_bitmap_lo: u32,  // 4: inode 位图块号（低32位）
    pub inode_table_lo: u32,   // 8: inode 表起始块号（低32位）
    pub block_bitmap_hi: u32,  // 32: 块位图块号（高32位）
    pub inode_bitmap_hi: u32,  // 36: inode 位图块号（高32位）
    pub inode_table_hi: u32,   // 40: inode 表起始块号（高32位）
}

impl ext_group_desc {
    /// 解码 32 字节传统描述符
    pub fn parse_legacy(buf: &[u8]) -> Result<Self> {
        check_len(buf, EXT_GROUP_DESC_SIZE, "Group descriptor buffer too short")?;
        Ok(Self {
            block_bitmap_lo: LittleEndian::read_u32(&buf[0..]),
            inode_bitmap_lo: LittleEndian::read_u32(&buf[4..]),
            inode_table_lo: LittleEndian::read_u32(&buf[8..]),
            ..Self::default()
        })
    }

    /// 解码 64 位描述符
    pub fn parse_wide(buf: &[u8]) -> Result<Self> {
        check_len(buf, EXT_GROUP_DESC_SIZE_64, "Group descriptor buffer too short")?;
        Ok(Self {
            block_bitmap_hi: LittleEndian::read_u32(&buf[32..]),
            inode_bitmap_hi: LittleEndian::read_u32(&buf[36..]),
            inode_table_hi: LittleEndian::read_u32(&buf[40..]),
            ..Self::parse_legacy(buf)?
        })
    }

    /// 块位图块号
    pub fn block_bitmap(&self) -> u64 {
        (self.block_bitmap_hi as u64) << 32 | self.block_bitmap_lo as u64
    }

    /// inode 位图块号
    pub fn inode_bitmap(&self) -> u64 {
        (self.inode_bitmap_hi as u64) << 32 | self.inode_bitmap_lo as u64
    }

    /// inode 表起始块号
    pub fn inode_table(&self) -> u64 {
        (self.inode_table_hi as u64) << 32 | self.inode_table_lo as u64
    }
}

//=============================================================================
// Inode
//=============================================================================

/// Inode 结构（128 字节核心 + 可选扩展部分）
#[derive(Debug, Clone, Copy)]
pub struct ext_inode {
    pub mode: u16,                              // 0: 文件模式
    pub uid: u16,                               // 2: 所有者 UID（低16位）
    pub size_lo: u32,                           // 4: 文件大小（低32位）
    pub atime: u32,                             // 8: 访问时间
    pub ctime: u32,                             // 12: inode 修改时间
    pub mtime: u32,                             // 16: 数据修改时间
    pub gid: u16,                               // 24: 组 ID（低16位）
    pub links_count: u16,                       // 26: 硬链接数
    pub blocks_lo: u32,                         // 28: 块计数（低32位）
    pub flags: u32,                             // 32: inode 标志
    pub blocks: [u8; EXT_INODE_BLOCK_AREA_SIZE], // 40: 块指针 / extent 树根
    pub generation: u32,                        // 100: 文件版本
    pub size_hi: u32,                           // 108: 文件大小（高32位）
    pub blocks_high: u16,                       // 116: 块计数（高16位）
    pub uid_high: u16,                          // 120: UID 高16位
    pub gid_high: u16,                          // 122: GID 高16位
    pub crtime: Option<u32>,                    // 144: 创建时间（extra_isize 在 128 处）
}

impl ext_inode {
    /// 从 inode 表槽位字节解码
    ///
    /// `buf` 至少 128 字节；长度达到 160 字节时才解码创建时间。
    pub fn parse(buf: &[u8]) -> Result<Self> {
        check_len(buf, EXT_GOOD_OLD_INODE_SIZE, "Inode buffer too short")?;

        let mut blocks = [0u8; EXT_INODE_BLOCK_AREA_SIZE];
        blocks.copy_from_slice(&buf[40..40 + EXT_INODE_BLOCK_AREA_SIZE]);

        // 创建时间位于扩展区偏移 16..20，extra_isize 覆盖到它才有效
        let crtime = if buf.len() >= EXT_INODE_EXTENDED_SIZE && LittleEndian::read_u16(&buf[128..]) >= 20 {
            Some(LittleEndian::read_u32(&buf[144..]))
        } else {
            None
        };

        Ok(Self {
            mode: LittleEndian::read_u16(&buf[0..]),
            uid: LittleEndian::read_u16(&buf[2..]),
            size_lo: LittleEndian::read_u32(&buf[4..]),
            atime: LittleEndian::read_u32(&buf[8..]),
            ctime: LittleEndian::read_u32(&buf[12..]),
            mtime: LittleEndian::read_u32(&buf[16..]),
            gid: LittleEndian::read_u16(&buf[24..]),
            links_count: LittleEndian::read_u16(&buf[26..]),
            blocks_lo: LittleEndian::read_u32(&buf[28..]),
            flags: LittleEndian::read_u32(&buf[32..]),
            blocks,
            generation: LittleEndian::read_u32(&buf[100..]),
            size_hi: LittleEndian::read_u32(&buf[108..]),
            blocks_high: LittleEndian::read_u16(&buf[116..]),
            uid_high: LittleEndian::read_u16(&buf[120..]),
            gid_high: LittleEndian::read_u16(&buf[122..]),
            crtime,
        })
    }

    /// 文件大小
    pub fn file_size(&self) -> u64 {
        (self.size_hi as u64) << 32 | self.size_lo as u64
    }

    /// 块计数（以文件系统块为单位）
    pub fn blocks_count(&self) -> u64 {
        (self.blocks_high as u64) << 32 | self.blocks_lo as u64
    }

    /// 完整 UID
    pub fn uid(&self) -> u32 {
        (self.uid_high as u32) << 16 | self.uid as u32
    }

    /// 完整 GID
    pub fn gid(&self) -> u32 {
        (self.gid_high as u32) << 16 | self.gid as u32
    }
}

//=============================================================================
// Extent 树
//=============================================================================

/// Extent 头部
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ext_extent_header {
    pub magic: u16,      // 0: 魔数 0xF30A
    pub entries: u16,    // 2: 有效条目数
    pub max: u16,        // 4: 最大条目数
    pub depth: u16,      // 6: 树深度（0 = 叶子）
    pub generation: u32, // 8: 树版本
}

impl ext_extent_header {
    /// 从节点起始字节解码
    pub fn parse(buf: &[u8]) -> Result<Self> {
        check_len(buf, EXT_EXTENT_HEADER_SIZE, "Extent node too short")?;
        Ok(Self {
            magic: LittleEndian::read_u16(&buf[0..]),
            entries: LittleEndian::read_u16(&buf[2..]),
            max: LittleEndian::read_u16(&buf[4..]),
            depth: LittleEndian::read_u16(&buf[6..]),
            generation: LittleEndian::read_u32(&buf[8..]),
        })
    }

    /// 检查魔数
    pub fn is_valid(&self) -> bool {
        self.magic == EXT_EXTENT_MAGIC
    }

    /// 是否是叶子节点
    pub fn is_leaf(&self) -> bool {
        self.depth == 0
    }
}

/// Extent 叶子条目
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ext_extent {
    pub block: u32,    // 0: 起始逻辑块号
    pub len: u16,      // 4: 长度（> 32768 表示未分配）
    pub start_hi: u16, // 6: 物理块号（高16位）
    pub start_lo: u32, // 8: 物理块号（低32位）
}

impl ext_extent {
    /// 解码 12 字节叶子条目
    pub fn parse(buf: &[u8]) -> Result<Self> {
        check_len(buf, EXT_EXTENT_ENTRY_SIZE, "Extent entry too short")?;
        Ok(Self {
            block: LittleEndian::read_u32(&buf[0..]),
            len: LittleEndian::read_u16(&buf[4..]),
            start_hi: LittleEndian::read_u16(&buf[6..]),
            start_lo: LittleEndian::read_u32(&buf[8..]),
        })
    }

    /// 物理起始块号
    pub fn physical_block(&self) -> u64 {
        (self.start_hi as u64) << 32 | self.start_lo as u64
    }

    /// 是否是未分配（稀疏）extent
    pub fn is_sparse(&self) -> bool {
        self.len > EXT_EXTENT_LENGTH_LIMIT
    }

    /// 实际覆盖的块数
    pub fn actual_len(&self) -> u16 {
        if self.is_sparse() {
            self.len - EXT_EXTENT_LENGTH_LIMIT
        } else {
            self.len
        }
    }
}

/// Extent 索引条目
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ext_extent_idx {
    pub block: u32,   // 0: 覆盖的起始逻辑块号
    pub leaf_lo: u32, // 4: 子节点物理块号（低32位）
    pub leaf_hi: u16, // 8: 子节点物理块号（高16位）
}

impl ext_extent_idx {
    /// 解码 12 字节索引条目
    pub fn parse(buf: &[u8]) -> Result<Self> {
        check_len(buf, EXT_EXTENT_ENTRY_SIZE, "Extent index too short")?;
        Ok(Self {
            block: LittleEndian::read_u32(&buf[0..]),
            leaf_lo: LittleEndian::read_u32(&buf[4..]),
            leaf_hi: LittleEndian::read_u16(&buf[8..]),
        })
    }

    /// 子节点物理块号
    pub fn leaf_block(&self) -> u64 {
        (self.leaf_hi as u64) << 32 | self.leaf_lo as u64
    }
}

//=============================================================================
// 目录项
//=============================================================================

/// 目录项头部（8 字节，不含文件名）
///
/// 名字长度字段的布局取决于 FILETYPE 特性：
/// - 启用：8 位名字长度 + 8 位文件类型
/// - 未启用：16 位名字长度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ext_dir_entry_head {
    pub inode: u32,             // 0: inode 编号（0 表示空闲槽位）
    pub rec_len: u16,           // 4: 记录长度
    pub name_len: u16,          // 6: 名字长度
    pub file_type: Option<u8>,  // 7: 文件类型（仅 FILETYPE）
}

impl ext_dir_entry_head {
    /// 解码目录项头部
    pub fn parse(buf: &[u8], has_filetype: bool) -> Result<Self> {
        check_len(buf, EXT_DIR_ENTRY_HEADER_LEN, "Directory entry header too short")?;
        let (name_len, file_type) = if has_filetype {
            (buf[6] as u16, Some(buf[7]))
        } else {
            (LittleEndian::read_u16(&buf[6..]), None)
        };
        Ok(Self {
            inode: LittleEndian::read_u32(&buf[0..]),
            rec_len: LittleEndian::read_u16(&buf[4..]),
            name_len,
            file_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_physical_block() {
        let mut raw = [0u8; 12];
        LittleEndian::write_u32(&mut raw[0..], 100);
        LittleEndian::write_u16(&mut raw[4..], 8);
        LittleEndian::write_u16(&mut raw[6..], 0xABCD);
        LittleEndian::write_u32(&mut raw[8..], 0x12345678);

        let extent = ext_extent::parse(&raw).unwrap();
        assert_eq!(extent.physical_block(), 0x0000ABCD12345678u64);
        assert!(!extent.is_sparse());
        assert_eq!(extent.actual_len(), 8);
    }

    #[test]
    fn test_sparse_extent_length() {
        let extent = ext_extent {
            block: 0,
            len: EXT_EXTENT_LENGTH_LIMIT + 5,
            start_hi: 0,
            start_lo: 0,
        };
        assert!(extent.is_sparse());
        assert_eq!(extent.actual_len(), 5);

        // 恰好 32768 仍是已分配 extent
        let full = ext_extent { len: EXT_EXTENT_LENGTH_LIMIT, ..extent };
        assert!(!full.is_sparse());
        assert_eq!(full.actual_len(), EXT_EXTENT_LENGTH_LIMIT);
    }

    #[test]
    fn test_dir_entry_head_layouts() {
        let raw = [11, 0, 0, 0, 12, 0, 3, 1];

        let with_type = ext_dir_entry_head::parse(&raw, true).unwrap();
        assert_eq!(with_type.inode, 11);
        assert_eq!(with_type.rec_len, 12);
        assert_eq!(with_type.name_len, 3);
        assert_eq!(with_type.file_type, Some(EXT_DE_REG_FILE));

        let without_type = ext_dir_entry_head::parse(&raw, false).unwrap();
        assert_eq!(without_type.name_len, 0x0103);
        assert_eq!(without_type.file_type, None);
    }

    #[test]
    fn test_group_desc_hi_fields() {
        let mut raw = [0u8; 64];
        LittleEndian::write_u32(&mut raw[8..], 5);
        LittleEndian::write_u32(&mut raw[40..], 1);

        assert_eq!(ext_group_desc::parse_legacy(&raw).unwrap().inode_table(), 5);
        assert_eq!(ext_group_desc::parse_wide(&raw).unwrap().inode_table(), (1 << 32) | 5);
    }

    #[test]
    fn test_short_buffers_rejected() {
        assert_eq!(
            ext_inode::parse(&[0u8; 64]).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert!(ext_extent_header::parse(&[0u8; 4]).is_err());
    }
}
