//! Superblock 读取和验证

use crate::{
    block::{Backing, BackingStore},
    consts::*,
    error::{Error, ErrorKind, FormatError, Result},
    fs::MountFlags,
    types::ext_sblock,
};
use alloc::vec;
use bitflags::bitflags;

bitflags! {
    /// 不兼容特性位
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IncompatFeatures: u32 {
        /// 压缩
        const COMPRESSION = 0x0001;
        /// 目录项带文件类型
        const FILETYPE = 0x0002;
        /// 需要日志恢复
        const RECOVER = 0x0004;
        /// 外部日志设备
        const JOURNAL_DEV = 0x0008;
        /// 元块组
        const META_BG = 0x0010;
        /// 文件使用 extent 树
        const EXTENTS = 0x0040;
        /// 64 位块号
        const BIT64 = 0x0080;
        /// 多重挂载保护
        const MMP = 0x0100;
        /// 灵活块组
        const FLEX_BG = 0x0200;
        /// 大扩展属性存放在 inode 中
        const EA_INODE = 0x0400;
        /// 目录项附加数据
        const DIRDATA = 0x1000;
        /// 校验和种子
        const CSUM_SEED = 0x2000;
        /// 大目录
        const LARGEDIR = 0x4000;
        /// 内联数据
        const INLINE_DATA = 0x8000;
        /// 加密
        const ENCRYPT = 0x10000;
    }
}

impl IncompatFeatures {
    /// 本实现能够读取的不兼容特性
    pub const SUPPORTED: Self = Self::FILETYPE
        .union(Self::EXTENTS)
        .union(Self::BIT64)
        .union(Self::FLEX_BG);
}

bitflags! {
    /// 只读兼容特性位
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RoCompatFeatures: u32 {
        /// 稀疏 superblock 备份
        const SPARSE_SUPER = 0x0001;
        /// 大文件
        const LARGE_FILE = 0x0002;
        /// B 树目录
        const BTREE_DIR = 0x0004;
        /// 巨型文件
        const HUGE_FILE = 0x0008;
        /// 块组描述符校验和
        const GDT_CSUM = 0x0010;
        /// 目录链接数不受限
        const DIR_NLINK = 0x0020;
        /// 扩展 inode 大小
        const EXTRA_ISIZE = 0x0040;
        /// 配额
        const QUOTA = 0x0100;
        /// 大分配单元
        const BIGALLOC = 0x0200;
        /// 元数据校验和
        const METADATA_CSUM = 0x0400;
    }
}

/// 从后备存储读取 superblock
///
/// 只校验魔数，其余检查由 [`Superblock::check`] 完成。
pub fn read_superblock<B: BackingStore>(store: &mut Backing<B>) -> Result<ext_sblock> {
    let mut sb_buf = vec![0u8; EXT_SUPERBLOCK_SIZE];

    // 读取 superblock（从偏移 1024 开始）
    store.read_at(EXT_SUPERBLOCK_OFFSET, &mut sb_buf)?;

    let sb = ext_sblock::parse(&sb_buf)?;

    if !sb.is_valid() {
        log::warn!("[MOUNT] bad superblock magic {:#06x}", sb.magic);
        return Err(Error::with_value(
            ErrorKind::Format(FormatError::BadMagic),
            "Not an ext filesystem: signature mismatch",
            sb.magic as u64,
        ));
    }

    Ok(sb)
}

/// Superblock 包装器
#[derive(Debug, Clone)]
pub struct Superblock {
    inner: ext_sblock,
}

impl Superblock {
    /// 从 ext_sblock 创建 Superblock（主要用于测试）
    pub fn new(inner: ext_sblock) -> Self {
        Self { inner }
    }

    /// 从后备存储加载 superblock
    pub fn load<B: BackingStore>(store: &mut Backing<B>) -> Result<Self> {
        let inner = read_superblock(store)?;
        Ok(Self { inner })
    }

    /// 获取内部 superblock 结构的引用
    pub fn inner(&self) -> &ext_sblock {
        &self.inner
    }

    /// 是否是原始版本布局
    pub fn is_original_revision(&self) -> bool {
        self.inner.rev_level == EXT_REV_ORIGINAL
    }

    /// 不兼容特性（原始版本恒为空）
    pub fn incompat(&self) -> IncompatFeatures {
        if self.is_original_revision() {
            IncompatFeatures::empty()
        } else {
            IncompatFeatures::from_bits_retain(self.inner.feature_incompat)
        }
    }

    /// 只读兼容特性（原始版本恒为空）
    pub fn ro_compat(&self) -> RoCompatFeatures {
        if self.is_original_revision() {
            RoCompatFeatures::empty()
        } else {
            RoCompatFeatures::from_bits_retain(self.inner.feature_ro_compat)
        }
    }

    /// 获取卷名称（UTF-8 字符串）
    pub fn volume_name(&self) -> Option<&str> {
        let len = self
            .inner
            .volume_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.inner.volume_name.len());

        core::str::from_utf8(&self.inner.volume_name[..len]).ok()
    }

    /// 获取 UUID
    pub fn uuid(&self) -> &[u8; 16] {
        &self.inner.uuid
    }

    /// 检查卷能否以给定标志挂载
    ///
    /// 失败时错误附带出错的字段值。
    pub fn check(&self, flags: MountFlags) -> Result<()> {
        let sb = &self.inner;

        // 1. 文件系统标记为有错误
        if sb.state == EXT_SUPER_STATE_ERROR {
            log::warn!("[MOUNT] filesystem state is ERRORS");
            return Err(Error::with_value(
                ErrorKind::Format(FormatError::FilesystemHasErrors),
                "Filesystem contains errors",
                sb.state as u64,
            ));
        }

        if self.is_original_revision() {
            // 2. 原始布局不支持 cluster 大小与块大小不同
            if sb.log_cluster_size != sb.log_block_size {
                log::warn!(
                    "[MOUNT] cluster size log {} differs from block size log {}",
                    sb.log_cluster_size,
                    sb.log_block_size
                );
                return Err(Error::with_value(
                    ErrorKind::Format(FormatError::ClusterSizeMismatch),
                    "Cluster and block size differ",
                    sb.log_cluster_size as u64,
                ));
            }
            return Ok(());
        }

        // 3. 不支持的不兼容特性
        let unsupported = self.incompat().difference(IncompatFeatures::SUPPORTED);
        if !unsupported.is_empty() {
            log::warn!("[MOUNT] unsupported incompat features {:#x}", unsupported.bits());
            return Err(Error::with_value(
                ErrorKind::Format(FormatError::UnsupportedIncompat),
                "Unsupported incompatible features",
                unsupported.bits() as u64,
            ));
        }

        // 4. 只读兼容特性只允许只读挂载
        let ro_compat = self.ro_compat();
        if !ro_compat.is_empty() && !flags.contains(MountFlags::READ_ONLY) {
            log::warn!("[MOUNT] ro_compat features {:#x} require read-only mount", ro_compat.bits());
            return Err(Error::with_value(
                ErrorKind::Format(FormatError::UnsupportedRoCompat),
                "Read-only compatible features require a read-only mount",
                ro_compat.bits() as u64,
            ));
        }

        Ok(())
    }
}
