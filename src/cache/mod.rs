//! 缓存模块
//!
//! 卷持有三个相互独立的缓存：块缓存、块组缓存、inode 缓存。
//! 它们共享同一套引用计数与驱逐规则，由 [`RefCache`] 实现。
//!
//! # 主要组件
//!
//! - [`RefCache`] - 带字节预算的引用计数 LRU 缓存
//! - [`CacheHandle`] - 借出的条目，持有期间不可驱逐
//! - [`BlockCache`] - 物理块缓存
//! - [`CacheStats`] - 缓存统计信息
//!
//! # 驱逐规则
//!
//! 1. 借出条目时引用计数加一，引用计数从 0 变为 1 时移出可驱逐队列
//! 2. 归还后引用计数为 0 的条目进入可驱逐队列的最近端
//! 3. 新条目会使驻留字节超出预算时，驱逐可驱逐队列最久的条目并复用其存储
//! 4. 没有可驱逐条目时照常分配，被借出的条目永远不会被驱逐
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use extfs_core::cache::BlockCache;
//!
//! let mut cache = BlockCache::new(512 * 1024, 4096);
//! let block = cache.get(&mut backing, 100)?;
//! let magic = u16::from_le_bytes([block[0], block[1]]);
//! cache.release(block);
//! ```

mod block_cache;
mod ref_cache;

pub use block_cache::{BlockCache, BlockHandle};
pub use ref_cache::{CacheHandle, CacheStats, RefCache};
