//! 测试用的合成卷镜像
//!
//! 按真实 ext 布局在内存中构造小镜像：superblock、描述符表、
//! 每组的两张位图和 inode 表都放在块组 0 的开头，数据块按顺序分配。
//! 总块数可以不是整数个块组。

use crate::block::MemStore;
use crate::consts::*;
use crate::superblock::IncompatFeatures;
use alloc::vec;
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

/// 镜像参数
#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub block_size: usize,
    pub groups: u32,
    pub blocks_per_group: u32,
    /// 总块数；`None` 时为整数个块组
    pub blocks_count: Option<u64>,
    pub inodes_per_group: u32,
    pub inode_size: usize,
    pub revision: u32,
    pub incompat: u32,
    pub ro_compat: u32,
    pub desc_size: usize,
    pub state: u16,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            groups: 1,
            blocks_per_group: 256,
            blocks_count: None,
            inodes_per_group: 32,
            inode_size: 256,
            revision: EXT_REV_DYNAMIC,
            incompat: IncompatFeatures::FILETYPE.bits(),
            ro_compat: 0,
            desc_size: EXT_GROUP_DESC_SIZE,
            state: 1,
        }
    }
}

/// inode 内容
#[derive(Debug, Clone)]
pub struct InodeSpec {
    pub mode: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub crtime: u32,
    pub links: u16,
    pub blocks_count: u64,
    pub flags: u32,
    pub area: [u8; EXT_INODE_BLOCK_AREA_SIZE],
    pub generation: u32,
}

impl Default for InodeSpec {
    fn default() -> Self {
        Self {
            mode: EXT_INODE_MODE_FILE | 0o644,
            uid: 0,
            gid: 0,
            size: 0,
            atime: 0,
            ctime: 0,
            mtime: 0,
            crtime: 0,
            links: 1,
            blocks_count: 0,
            flags: 0,
            area: [0; EXT_INODE_BLOCK_AREA_SIZE],
            generation: 0,
        }
    }
}

/// 合成镜像构造器
pub struct ImageBuilder {
    cfg: ImageConfig,
    data: Vec<u8>,
    first_data_block: u64,
    inode_tables: Vec<u64>,
    block_bitmaps: Vec<u64>,
    inode_bitmaps: Vec<u64>,
    next_free: u64,
}

impl ImageBuilder {
    /// 按参数布置元数据
    pub fn new(cfg: ImageConfig) -> Self {
        let bs = cfg.block_size as u64;
        let first_data_block = if bs == 1024 { 1 } else { 0 };
        let total_blocks = cfg
            .blocks_count
            .unwrap_or(first_data_block + cfg.groups as u64 * cfg.blocks_per_group as u64);
        let gdt_block = if bs == 1024 { 2 } else { 1 };
        let gdt_blocks = (cfg.groups as u64 * cfg.desc_size as u64).div_ceil(bs);
        let table_blocks = (cfg.inodes_per_group as u64 * cfg.inode_size as u64).div_ceil(bs);

        let mut builder = Self {
            data: vec![0u8; (total_blocks * bs) as usize],
            first_data_block,
            inode_tables: Vec::new(),
            block_bitmaps: Vec::new(),
            inode_bitmaps: Vec::new(),
            next_free: gdt_block + gdt_blocks,
            cfg,
        };

        for _ in 0..builder.cfg.groups {
            let bb = builder.take_blocks(1);
            let ib = builder.take_blocks(1);
            let it = builder.take_blocks(table_blocks);
            builder.block_bitmaps.push(bb);
            builder.inode_bitmaps.push(ib);
            builder.inode_tables.push(it);
        }

        for block in first_data_block..builder.next_free {
            builder.mark_block(block);
        }
        builder.write_superblock(total_blocks);
        builder.write_descriptors(gdt_block);
        builder
    }

    fn take_blocks(&mut self, count: u64) -> u64 {
        let start = self.next_free;
        self.next_free += count;
        start
    }

    fn write_superblock(&mut self, total_blocks: u64) {
        let cfg = self.cfg.clone();
        let log = (cfg.block_size as u32).trailing_zeros() - EXT_MIN_BLOCK_LOG_SIZE;
        let sb = &mut self.data[1024..2048];
        LittleEndian::write_u32(&mut sb[0..], cfg.groups * cfg.inodes_per_group);
        LittleEndian::write_u32(&mut sb[4..], total_blocks as u32);
        LittleEndian::write_u32(&mut sb[20..], self.first_data_block as u32);
        LittleEndian::write_u32(&mut sb[24..], log);
        LittleEndian::write_u32(&mut sb[28..], log);
        LittleEndian::write_u32(&mut sb[32..], cfg.blocks_per_group);
        LittleEndian::write_u32(&mut sb[40..], cfg.inodes_per_group);
        LittleEndian::write_u16(&mut sb[56..], EXT_SUPERBLOCK_MAGIC);
        LittleEndian::write_u16(&mut sb[58..], cfg.state);
        LittleEndian::write_u32(&mut sb[76..], cfg.revision);
        LittleEndian::write_u16(&mut sb[88..], cfg.inode_size as u16);
        LittleEndian::write_u32(&mut sb[96..], cfg.incompat);
        LittleEndian::write_u32(&mut sb[100..], cfg.ro_compat);
        sb[120..124].copy_from_slice(b"test");
        LittleEndian::write_u16(&mut sb[254..], cfg.desc_size as u16);
    }

    fn write_descriptors(&mut self, gdt_block: u64) {
        let base = (gdt_block * self.cfg.block_size as u64) as usize;
        for g in 0..self.cfg.groups as usize {
            let off = base + g * self.cfg.desc_size;
            let desc = &mut self.data[off..off + self.cfg.desc_size];
            LittleEndian::write_u32(&mut desc[0..], self.block_bitmaps[g] as u32);
            LittleEndian::write_u32(&mut desc[4..], self.inode_bitmaps[g] as u32);
            LittleEndian::write_u32(&mut desc[8..], self.inode_tables[g] as u32);
        }
    }

    fn mark_block(&mut self, block: u64) {
        let Some(rel) = block.checked_sub(self.first_data_block) else {
            return;
        };
        let group = (rel / self.cfg.blocks_per_group as u64) as usize;
        let bit = rel % self.cfg.blocks_per_group as u64;
        let off = (self.block_bitmaps[group] * self.cfg.block_size as u64 + bit / 8) as usize;
        self.data[off] |= 1 << (bit % 8);
    }

    /// 之后的分配从 `block` 开始（用于把数据放进后面的块组）
    pub fn skip_to(&mut self, block: u64) {
        self.next_free = self.next_free.max(block);
    }

    /// 块大小
    pub fn block_size(&self) -> usize {
        self.cfg.block_size
    }

    /// 块组 `group` 的 inode 表起始块
    pub fn inode_table(&self, group: u32) -> u64 {
        self.inode_tables[group as usize]
    }

    /// 分配 `count` 个连续数据块并在块位图中标记
    pub fn alloc_blocks(&mut self, count: u64) -> u64 {
        let start = self.take_blocks(count);
        for block in start..start + count {
            self.mark_block(block);
        }
        start
    }

    /// 整块写入（不足一块的部分补零）
    pub fn write_block(&mut self, block: u64, bytes: &[u8]) {
        let bs = self.cfg.block_size;
        let off = block as usize * bs;
        let dst = &mut self.data[off..off + bs];
        dst.fill(0);
        dst[..bytes.len()].copy_from_slice(bytes);
    }

    /// 直接修改一块
    pub fn block_mut(&mut self, block: u64) -> &mut [u8] {
        let bs = self.cfg.block_size;
        let off = block as usize * bs;
        &mut self.data[off..off + bs]
    }

    /// 写入 inode 并在 inode 位图中标记
    pub fn set_inode(&mut self, inode: u32, spec: &InodeSpec) {
        let rel = inode - 1;
        let group = (rel / self.cfg.inodes_per_group) as usize;
        let index = (rel % self.cfg.inodes_per_group) as usize;

        let bitmap_off = self.inode_bitmaps[group] as usize * self.cfg.block_size + index / 8;
        self.data[bitmap_off] |= 1 << (index % 8);

        let off = self.inode_tables[group] as usize * self.cfg.block_size + index * self.cfg.inode_size;
        let raw = &mut self.data[off..off + self.cfg.inode_size];
        LittleEndian::write_u16(&mut raw[0..], spec.mode);
        LittleEndian::write_u16(&mut raw[2..], spec.uid as u16);
        LittleEndian::write_u32(&mut raw[4..], spec.size as u32);
        LittleEndian::write_u32(&mut raw[8..], spec.atime);
        LittleEndian::write_u32(&mut raw[12..], spec.ctime);
        LittleEndian::write_u32(&mut raw[16..], spec.mtime);
        LittleEndian::write_u16(&mut raw[24..], spec.gid as u16);
        LittleEndian::write_u16(&mut raw[26..], spec.links);
        LittleEndian::write_u32(&mut raw[28..], spec.blocks_count as u32);
        LittleEndian::write_u32(&mut raw[32..], spec.flags);
        raw[40..100].copy_from_slice(&spec.area);
        LittleEndian::write_u32(&mut raw[100..], spec.generation);
        LittleEndian::write_u32(&mut raw[108..], (spec.size >> 32) as u32);
        LittleEndian::write_u16(&mut raw[116..], (spec.blocks_count >> 32) as u16);
        LittleEndian::write_u16(&mut raw[120..], (spec.uid >> 16) as u16);
        LittleEndian::write_u16(&mut raw[122..], (spec.gid >> 16) as u16);
        if self.cfg.inode_size >= EXT_INODE_EXTENDED_SIZE {
            LittleEndian::write_u16(&mut raw[128..], 32);
            LittleEndian::write_u32(&mut raw[144..], spec.crtime);
        }
    }

    /// 写入只用直接块的普通文件，返回数据块起始块号
    pub fn add_file(&mut self, inode: u32, contents: &[u8]) -> u64 {
        let bs = self.cfg.block_size;
        let count = contents.len().div_ceil(bs).max(1);
        assert!(count <= EXT_INODE_DIRECT_BLOCKS);
        let start = self.alloc_blocks(count as u64);

        let mut pointers = [0u32; EXT_INODE_BLOCKS];
        for (i, chunk) in contents.chunks(bs).enumerate() {
            self.write_block(start + i as u64, chunk);
            pointers[i] = (start + i as u64) as u32;
        }

        self.set_inode(
            inode,
            &InodeSpec {
                size: contents.len() as u64,
                blocks_count: count as u64 * (bs as u64 / 512),
                area: legacy_area(&pointers),
                ..InodeSpec::default()
            },
        );
        start
    }

    /// 写入单块目录
    pub fn add_dir(&mut self, inode: u32, records: &[(u32, &[u8], u8)]) -> u64 {
        let block = self.alloc_blocks(1);
        let filetype = self.cfg.incompat & IncompatFeatures::FILETYPE.bits() != 0;
        let bytes = dir_block(self.cfg.block_size, records, filetype);
        self.write_block(block, &bytes);

        let mut pointers = [0u32; EXT_INODE_BLOCKS];
        pointers[0] = block as u32;
        self.set_inode(
            inode,
            &InodeSpec {
                mode: EXT_INODE_MODE_DIRECTORY | 0o755,
                size: self.cfg.block_size as u64,
                links: 2,
                area: legacy_area(&pointers),
                ..InodeSpec::default()
            },
        );
        block
    }

    /// 完成构造
    pub fn build(self) -> MemStore {
        MemStore::new(self.data)
    }
}

/// 15 个传统块指针 -> 60 字节块区域
pub fn legacy_area(pointers: &[u32; EXT_INODE_BLOCKS]) -> [u8; EXT_INODE_BLOCK_AREA_SIZE] {
    let mut area = [0u8; EXT_INODE_BLOCK_AREA_SIZE];
    LittleEndian::write_u32_into(pointers, &mut area);
    area
}

/// extent 树节点中的一个条目
#[derive(Debug, Clone, Copy)]
pub enum ExtentEntry {
    /// 叶子：(起始逻辑块, 长度, 起始物理块)
    Leaf(u32, u16, u64),
    /// 索引：(起始逻辑块, 子节点物理块)
    Index(u32, u64),
}

/// 编码一个 extent 节点（头部 + 条目）到 `out`
pub fn write_extent_node(out: &mut [u8], max: u16, depth: u16, entries: &[ExtentEntry]) {
    LittleEndian::write_u16(&mut out[0..], EXT_EXTENT_MAGIC);
    LittleEndian::write_u16(&mut out[2..], entries.len() as u16);
    LittleEndian::write_u16(&mut out[4..], max);
    LittleEndian::write_u16(&mut out[6..], depth);
    for (i, entry) in entries.iter().enumerate() {
        let rec = &mut out[12 + i * 12..24 + i * 12];
        match *entry {
            ExtentEntry::Leaf(block, len, start) => {
                LittleEndian::write_u32(&mut rec[0..], block);
                LittleEndian::write_u16(&mut rec[4..], len);
                LittleEndian::write_u16(&mut rec[6..], (start >> 32) as u16);
                LittleEndian::write_u32(&mut rec[8..], start as u32);
            }
            ExtentEntry::Index(block, child) => {
                LittleEndian::write_u32(&mut rec[0..], block);
                LittleEndian::write_u32(&mut rec[4..], child as u32);
                LittleEndian::write_u16(&mut rec[8..], (child >> 32) as u16);
            }
        }
    }
}

/// inode 内的 extent 树根
pub fn extent_root(depth: u16, entries: &[ExtentEntry]) -> [u8; EXT_INODE_BLOCK_AREA_SIZE] {
    let mut area = [0u8; EXT_INODE_BLOCK_AREA_SIZE];
    write_extent_node(&mut area, EXT_EXTENT_ROOT_MAX_ENTRIES, depth, entries);
    area
}

/// 编码一个目录块，最后一条记录延伸到块尾
pub fn dir_block(block_size: usize, records: &[(u32, &[u8], u8)], filetype: bool) -> Vec<u8> {
    let mut block = vec![0u8; block_size];
    let mut off = 0;
    for (i, &(inode, name, file_type)) in records.iter().enumerate() {
        let min_len = (EXT_DIR_ENTRY_HEADER_LEN + name.len()).next_multiple_of(4);
        let rec_len = if i + 1 == records.len() { block_size - off } else { min_len };
        LittleEndian::write_u32(&mut block[off..], inode);
        LittleEndian::write_u16(&mut block[off + 4..], rec_len as u16);
        if filetype {
            block[off + 6] = name.len() as u8;
            block[off + 7] = file_type;
        } else {
            LittleEndian::write_u16(&mut block[off + 6..], name.len() as u16);
        }
        block[off + 8..off + 8 + name.len()].copy_from_slice(name);
        off += rec_len;
    }
    block
}

/// 加载 superblock 并推导几何参数（只读挂载）
pub fn geometry_of(store: MemStore) -> (crate::block::Backing<MemStore>, crate::superblock::VolumeGeometry) {
    use crate::superblock::{Superblock, VolumeGeometry};

    let mut backing = crate::block::Backing::new(store);
    let sb = Superblock::load(&mut backing).unwrap();
    let geometry = VolumeGeometry::derive(&sb, crate::fs::MountFlags::READ_ONLY).unwrap();
    (backing, geometry)
}
