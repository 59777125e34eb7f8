//! 文件句柄

use super::{
    metadata::{read_only, VolumeObject},
    types::SeekFrom,
    volume::Volume,
};
use crate::{
    block::BackingStore,
    error::{Error, ErrorKind, Result},
    inode::{InodeEntry, InodeHandle},
};

/// 打开的普通文件
///
/// 持有 inode 缓存中的条目和当前读取位置。读取时需要传入所属的卷。
///
/// # 注意
///
/// 用完后必须调用 [`File::close`] 归还 inode。直接丢弃句柄不会归还条目，
/// 之后 [`Volume::close`] 一直返回 `Busy`。
pub struct File {
    inode: InodeHandle,
    pos: u64,
}

impl File {
    pub(super) fn new(inode: InodeHandle) -> Self {
        Self { inode, pos: 0 }
    }

    /// 从 `offset` 处读取，不改变当前位置
    ///
    /// 返回实际读取的字节数，读到文件末尾之后返回 0。
    pub fn read<B: BackingStore>(&self, vol: &mut Volume<B>, offset: u64, buf: &mut [u8]) -> Result<usize> {
        vol.read_inode_data(&self.inode, offset, buf)
    }

    /// 从当前位置读取并前移
    pub fn read_next<B: BackingStore>(&mut self, vol: &mut Volume<B>, buf: &mut [u8]) -> Result<usize> {
        let n = vol.read_inode_data(&self.inode, self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// 移动当前位置
    ///
    /// 允许越过文件末尾（之后的读取返回 0）；结果为负时返回 `InvalidInput`。
    pub fn seek(&mut self, target: SeekFrom) -> Result<u64> {
        let (base, delta) = match target {
            SeekFrom::Start(pos) => {
                self.pos = pos;
                return Ok(pos);
            }
            SeekFrom::End(delta) => (self.inode.size, delta),
            SeekFrom::Current(delta) => (self.pos, delta),
        };

        let pos = base
            .checked_add_signed(delta)
            .ok_or(Error::new(ErrorKind::InvalidInput, "Seek to a negative or overflowing position"))?;
        self.pos = pos;
        Ok(pos)
    }

    /// 当前位置
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// 文件大小
    pub fn size(&self) -> u64 {
        self.inode.size
    }

    /// 支持的最大文件大小
    pub fn max_size(&self) -> u64 {
        i64::MAX as u64
    }

    /// 写入（只读卷，总是失败）
    pub fn write<B: BackingStore>(&mut self, _vol: &mut Volume<B>, _buf: &[u8]) -> Result<usize> {
        Err(read_only())
    }

    /// 修改文件大小（只读卷，总是失败）
    pub fn set_size<B: BackingStore>(&mut self, _vol: &mut Volume<B>, _size: u64) -> Result<()> {
        Err(read_only())
    }

    /// 关闭文件，归还 inode
    pub fn close<B: BackingStore>(self, vol: &mut Volume<B>) {
        vol.release_inode(self.inode);
    }
}

impl VolumeObject for File {
    fn inode(&self) -> &InodeEntry {
        &self.inode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        block::MemStore,
        consts::*,
        fs::MountFlags,
        test_utils::{extent_root, legacy_area, write_extent_node, ExtentEntry, ImageBuilder, ImageConfig, InodeSpec},
    };
    use alloc::vec;
    use alloc::vec::Vec;
    use byteorder::{ByteOrder, LittleEndian};

    /// 分配一个数据块并写入 `fill` 填充的内容
    fn data_block(image: &mut ImageBuilder, fill: u8) -> u64 {
        let block = image.alloc_blocks(1);
        image.write_block(block, &[fill; 1024]);
        block
    }

    /// 在指针块的第 `index` 项写入块号
    fn set_pointer(image: &mut ImageBuilder, block: u64, index: usize, target: u64) {
        LittleEndian::write_u32(&mut image.block_mut(block)[index * 4..], target as u32);
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn volume_with_file(contents: &[u8]) -> Volume<MemStore> {
        let mut image = ImageBuilder::new(ImageConfig::default());
        image.add_file(12, contents);
        Volume::open(image.build(), MountFlags::READ_ONLY).unwrap()
    }

    #[test]
    fn test_read_three_direct_blocks() {
        let contents = pattern(3 * 1024 - 100);
        let mut vol = volume_with_file(&contents);
        let file = vol.open_file(12).unwrap();
        assert_eq!(file.size(), contents.len() as u64);

        let mut buf = vec![0u8; 4096];
        let n = file.read(&mut vol, 0, &mut buf).unwrap();
        assert_eq!(n, contents.len());
        assert_eq!(&buf[..n], &contents[..]);

        // 跨块边界的小读取
        let mut small = [0u8; 10];
        assert_eq!(file.read(&mut vol, 1020, &mut small).unwrap(), 10);
        assert_eq!(&small[..], &contents[1020..1030]);

        // 末尾之后
        assert_eq!(file.read(&mut vol, contents.len() as u64, &mut small).unwrap(), 0);

        file.close(&mut vol);
        vol.close().unwrap();
    }

    #[test]
    fn test_read_next_and_seek() {
        let contents = pattern(2000);
        let mut vol = volume_with_file(&contents);
        let mut file = vol.open_file(12).unwrap();

        let mut buf = [0u8; 700];
        assert_eq!(file.read_next(&mut vol, &mut buf).unwrap(), 700);
        assert_eq!(file.position(), 700);
        assert_eq!(file.read_next(&mut vol, &mut buf).unwrap(), 700);
        assert_eq!(file.read_next(&mut vol, &mut buf).unwrap(), 600);
        assert_eq!(&buf[..600], &contents[1400..]);
        assert_eq!(file.read_next(&mut vol, &mut buf).unwrap(), 0);

        assert_eq!(file.seek(SeekFrom::End(-100)).unwrap(), 1900);
        assert_eq!(file.seek(SeekFrom::Current(-1900)).unwrap(), 0);
        assert_eq!(file.seek(SeekFrom::Start(5000)).unwrap(), 5000);
        assert_eq!(file.read_next(&mut vol, &mut buf).unwrap(), 0);

        let err = file.seek(SeekFrom::End(-2001)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(file.position(), 5000);

        file.close(&mut vol);
    }

    #[test]
    fn test_sparse_extent_reads_zeros() {
        let mut image = ImageBuilder::new(ImageConfig::default());
        // 逻辑块 0..4 为未写入的 extent（长度带稀疏标记）
        image.set_inode(
            12,
            &InodeSpec {
                size: 4 * 1024,
                flags: EXT_INODE_FLAG_EXTENTS,
                area: extent_root(0, &[ExtentEntry::Leaf(0, 32768 + 4, 0)]),
                ..InodeSpec::default()
            },
        );
        let mut vol = Volume::open(image.build(), MountFlags::READ_ONLY).unwrap();
        let file = vol.open_file(12).unwrap();

        let reads = vol.store().read_count();
        let mut buf = vec![0xAAu8; 4096];
        assert_eq!(file.read(&mut vol, 0, &mut buf).unwrap(), 4096);
        assert!(buf.iter().all(|&b| b == 0));
        assert_eq!(vol.store().read_count(), reads);

        file.close(&mut vol);
    }

    #[test]
    fn test_extent_file_multi_block_run() {
        let mut image = ImageBuilder::new(ImageConfig::default());
        let contents = pattern(3 * 1024);
        let start = image.alloc_blocks(3);
        for (i, chunk) in contents.chunks(1024).enumerate() {
            image.write_block(start + i as u64, chunk);
        }
        image.set_inode(
            12,
            &InodeSpec {
                size: contents.len() as u64,
                blocks_count: 6,
                flags: EXT_INODE_FLAG_EXTENTS,
                area: extent_root(0, &[ExtentEntry::Leaf(0, 3, start)]),
                ..InodeSpec::default()
            },
        );
        let mut vol = Volume::open(image.build(), MountFlags::READ_ONLY).unwrap();
        let file = vol.open_file(12).unwrap();
        assert_eq!(file.query_info().allocated, 6 * 512);

        let mut buf = vec![0u8; contents.len()];
        assert_eq!(file.read(&mut vol, 0, &mut buf).unwrap(), contents.len());
        assert_eq!(buf, contents);

        file.close(&mut vol);
    }

    #[test]
    fn test_read_through_indirect_blocks_and_holes() {
        let mut image = ImageBuilder::new(ImageConfig::default());
        let d0 = data_block(&mut image, 0x10);
        let d12 = data_block(&mut image, 0x20);
        let d268 = data_block(&mut image, 0x30);

        // 逻辑块 12 经一次间接块；13 是间接块里的空指针
        let single = image.alloc_blocks(1);
        set_pointer(&mut image, single, 0, d12);
        // 逻辑块 268 = 12 + 256，经二次间接块
        let double = image.alloc_blocks(1);
        let inner = image.alloc_blocks(1);
        set_pointer(&mut image, double, 0, inner);
        set_pointer(&mut image, inner, 0, d268);

        let mut pointers = [0u32; EXT_INODE_BLOCKS];
        pointers[0] = d0 as u32;
        // 直接指针 1..12 为零（空洞）
        pointers[EXT_INODE_INDIRECT_BLOCK] = single as u32;
        pointers[EXT_INODE_DOUBLE_INDIRECT_BLOCK] = double as u32;

        let size = 268 * 1024 + 500;
        image.set_inode(
            12,
            &InodeSpec {
                size,
                blocks_count: 6 * 2,
                area: legacy_area(&pointers),
                ..InodeSpec::default()
            },
        );
        let mut vol = Volume::open(image.build(), MountFlags::READ_ONLY).unwrap();
        let file = vol.open_file(12).unwrap();

        let mut expected = vec![0u8; size as usize];
        expected[..1024].fill(0x10);
        expected[12 * 1024..13 * 1024].fill(0x20);
        expected[268 * 1024..].fill(0x30);

        let mut buf = vec![0xFFu8; size as usize];
        assert_eq!(file.read(&mut vol, 0, &mut buf).unwrap(), buf.len());
        assert!(buf == expected);

        // 单独读空洞：不触碰存储
        let reads = vol.store().read_count();
        let mut hole = [0xFFu8; 1024];
        assert_eq!(file.read(&mut vol, 5 * 1024, &mut hole).unwrap(), 1024);
        assert!(hole.iter().all(|&b| b == 0));
        assert_eq!(vol.store().read_count(), reads);

        // 间接块内的空指针同样读出零
        assert_eq!(file.read(&mut vol, 13 * 1024, &mut hole).unwrap(), 1024);
        assert!(hole.iter().all(|&b| b == 0));

        file.close(&mut vol);
        vol.close().unwrap();
    }

    #[test]
    fn test_read_through_indexed_extent_tree() {
        let mut image = ImageBuilder::new(ImageConfig::default());
        let first = image.alloc_blocks(2);
        image.write_block(first, &[0x41; 1024]);
        image.write_block(first + 1, &[0x42; 1024]);
        let _gap = image.alloc_blocks(3);
        let second = data_block(&mut image, 0x43);

        // 根节点深度 1，唯一索引指向叶子块
        let leaf = image.alloc_blocks(1);
        let capacity = ((1024 - 12) / 12) as u16;
        write_extent_node(
            image.block_mut(leaf),
            capacity,
            0,
            &[
                ExtentEntry::Leaf(0, 2, first),
                ExtentEntry::Leaf(2, 1, second),
                ExtentEntry::Leaf(3, 32768 + 2, 0),
            ],
        );
        image.set_inode(
            12,
            &InodeSpec {
                size: 5 * 1024,
                blocks_count: 4 * 2,
                flags: EXT_INODE_FLAG_EXTENTS,
                area: extent_root(1, &[ExtentEntry::Index(0, leaf)]),
                ..InodeSpec::default()
            },
        );
        let mut vol = Volume::open(image.build(), MountFlags::READ_ONLY).unwrap();
        let file = vol.open_file(12).unwrap();

        let mut expected = vec![0u8; 5 * 1024];
        expected[..1024].fill(0x41);
        expected[1024..2048].fill(0x42);
        expected[2048..3072].fill(0x43);

        let mut buf = vec![0xFFu8; 5 * 1024];
        assert_eq!(file.read(&mut vol, 0, &mut buf).unwrap(), buf.len());
        assert!(buf == expected);

        // 跨越两个 extent 的读取
        let mut small = [0u8; 8];
        assert_eq!(file.read(&mut vol, 2044, &mut small).unwrap(), 8);
        assert_eq!(small, [0x42, 0x42, 0x42, 0x42, 0x43, 0x43, 0x43, 0x43]);

        file.close(&mut vol);
    }

    #[test]
    fn test_mutators_unsupported() {
        let mut vol = volume_with_file(b"data");
        let mut file = vol.open_file(12).unwrap();

        assert_eq!(file.write(&mut vol, b"x").unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(file.set_size(&mut vol, 0).unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(file.set_mode(0o600).unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(file.set_times(1, 2).unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(file.set_owner(1, 1).unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(file.max_size(), i64::MAX as u64);

        file.close(&mut vol);
    }

    #[test]
    fn test_open_file_on_directory() {
        let mut image = ImageBuilder::new(ImageConfig::default());
        image.add_dir(2, &[(2, b".", EXT_DE_DIR), (2, b"..", EXT_DE_DIR)]);
        let mut vol = Volume::open(image.build(), MountFlags::READ_ONLY).unwrap();

        let err = vol.open_file(2).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotAFile);
        assert_eq!(vol.inode_cache().pinned_count(), 0);
    }
}
