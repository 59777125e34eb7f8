//! ext2/3/4 磁盘格式常量
//!
//! 这个模块包含只读卷实现依赖的全部常量：
//! - 磁盘布局（superblock 位置、魔数、结构大小）
//! - inode 模式位和标志
//! - 目录项格式
//! - 缓存预算默认值

//=============================================================================
// 基础常量
//=============================================================================

/// 最小块大小（1024 字节，log_block_size = 0）
pub const EXT_MIN_BLOCK_SIZE: u32 = 1024;

/// 最大块大小（65536 字节）
pub const EXT_MAX_BLOCK_SIZE: u32 = 65536;

/// 最小块大小对应的位移
pub const EXT_MIN_BLOCK_LOG_SIZE: u32 = 10;

//=============================================================================
// Superblock 相关
//=============================================================================

/// Superblock 在设备上的字节偏移
pub const EXT_SUPERBLOCK_OFFSET: u64 = 1024;

/// Superblock 大小（字节）
pub const EXT_SUPERBLOCK_SIZE: usize = 1024;

/// Superblock 魔数 (0xEF53)
pub const EXT_SUPERBLOCK_MAGIC: u16 = 0xEF53;

/// Superblock 状态：有错误
pub const EXT_SUPER_STATE_ERROR: u16 = 0x0002;

/// 原始版本（固定 inode 大小，无特性位）
pub const EXT_REV_ORIGINAL: u32 = 0;

/// 动态版本（可变 inode 大小，特性位）
pub const EXT_REV_DYNAMIC: u32 = 1;

/// Root inode 编号
pub const EXT_ROOT_INODE: u32 = 2;

/// 块组描述符大小（传统）
pub const EXT_GROUP_DESC_SIZE: usize = 32;

/// 块组描述符大小（64位）
pub const EXT_GROUP_DESC_SIZE_64: usize = 64;

//=============================================================================
// Inode 相关
//=============================================================================

/// Inode 中的块指针总数（15个）
/// - 12个直接块
/// - 1个一级间接块
/// - 1个二级间接块
/// - 1个三级间接块
pub const EXT_INODE_BLOCKS: usize = 15;

/// Inode 块指针区域字节数
pub const EXT_INODE_BLOCK_AREA_SIZE: usize = EXT_INODE_BLOCKS * 4;

/// 直接块指针数量
pub const EXT_INODE_DIRECT_BLOCKS: usize = 12;

/// 一级间接块索引
pub const EXT_INODE_INDIRECT_BLOCK: usize = 12;

/// 二级间接块索引
pub const EXT_INODE_DOUBLE_INDIRECT_BLOCK: usize = 13;

/// 三级间接块索引
pub const EXT_INODE_TRIPLE_INDIRECT_BLOCK: usize = 14;

/// 间接块最大层数
pub const EXT_INDIRECT_MAX_DEPTH: usize = 3;

/// 旧的 inode 大小（不含扩展字段，原始版本固定使用）
pub const EXT_GOOD_OLD_INODE_SIZE: usize = 128;

/// 含创建时间的扩展 inode 结构大小
pub const EXT_INODE_EXTENDED_SIZE: usize = 160;

//=============================================================================
// Inode 模式位（文件类型和权限）
//=============================================================================

/// 文件类型掩码
pub const EXT_INODE_MODE_TYPE_MASK: u16 = 0xF000;

/// FIFO
pub const EXT_INODE_MODE_FIFO: u16 = 0x1000;

/// 字符设备
pub const EXT_INODE_MODE_CHARDEV: u16 = 0x2000;

/// 目录
pub const EXT_INODE_MODE_DIRECTORY: u16 = 0x4000;

/// 块设备
pub const EXT_INODE_MODE_BLOCKDEV: u16 = 0x6000;

/// 普通文件
pub const EXT_INODE_MODE_FILE: u16 = 0x8000;

/// 符号链接
pub const EXT_INODE_MODE_SOFTLINK: u16 = 0xA000;

/// Socket
pub const EXT_INODE_MODE_SOCKET: u16 = 0xC000;

/// 权限位掩码（含 setuid/setgid/sticky）
pub const EXT_INODE_MODE_PERM_MASK: u16 = 0x0FFF;

//=============================================================================
// Inode 标志
//=============================================================================

/// 块计数以文件系统块为单位（否则为 512 字节扇区）
pub const EXT_INODE_FLAG_HUGE_FILE: u32 = 0x00040000;

/// 使用 extent 树存储文件数据
pub const EXT_INODE_FLAG_EXTENTS: u32 = 0x00080000;

/// 块计数的默认单位（字节）
pub const EXT_INODE_BLOCKS_UNIT: u64 = 512;

//=============================================================================
// Extent 树
//=============================================================================

/// Extent 树魔数 (0xF30A)
pub const EXT_EXTENT_MAGIC: u16 = 0xF30A;

/// Extent 树最大深度
pub const EXT_EXTENT_MAX_DEPTH: u16 = 5;

/// inode 内根节点最多容纳的条目数
pub const EXT_EXTENT_ROOT_MAX_ENTRIES: u16 = 4;

/// Extent 长度上限，超过表示未分配（稀疏）extent
pub const EXT_EXTENT_LENGTH_LIMIT: u16 = 32768;

/// Extent 头部大小
pub const EXT_EXTENT_HEADER_SIZE: usize = 12;

/// Extent 条目（叶子或索引）大小
pub const EXT_EXTENT_ENTRY_SIZE: usize = 12;

//=============================================================================
// 目录项
//=============================================================================

/// 普通文件
pub const EXT_DE_REG_FILE: u8 = 1;

/// 目录
pub const EXT_DE_DIR: u8 = 2;

/// 符号链接
pub const EXT_DE_SYMLINK: u8 = 7;

/// 目录项头部长度（inode + rec_len + name_len）
pub const EXT_DIR_ENTRY_HEADER_LEN: usize = 8;

/// 最大文件名长度
pub const EXT_NAME_MAX: usize = 255;

//=============================================================================
// 缓存预算
//=============================================================================

/// 块组缓存默认字节预算
pub const EXT_DEFAULT_BLOCK_GROUP_CACHE_SIZE: usize = 512 * 1024;

/// Inode 缓存默认字节预算
pub const EXT_DEFAULT_INODE_CACHE_SIZE: usize = 512 * 1024;

/// 块缓存默认字节预算
pub const EXT_DEFAULT_BLOCK_CACHE_SIZE: usize = 512 * 1024;
