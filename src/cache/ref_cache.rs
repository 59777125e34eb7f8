//! 引用计数 + 字节预算的 LRU 缓存
//!
//! 三个缓存（块、块组、inode）共用的核心结构：
//!
//! ```text
//! struct RefCache<K, V> {
//!     entries: BTreeMap<K, Slot<V>>,   // 全部驻留条目，Arc 持有数据
//!     unpinned: LruCache<K, ()>,       // 只包含引用计数为 0 的键
//!     resident: usize,                 // 驻留字节数
//!     budget: usize,                   // 字节预算
//! }
//! ```
//!
//! 条目的引用计数就是 `Arc::strong_count - 1`（缓存自己持有一份）。
//! 被借出的条目不在 `unpinned` 中，因此永远不会被驱逐。

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::hash::Hash;
use core::ops::Deref;
use lru::LruCache;

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// 总访问次数
    pub total_accesses: u64,
    /// 缓存命中次数
    pub hits: u64,
    /// 缓存未命中次数
    pub misses: u64,
    /// 驱逐次数（含释放时超预算直接丢弃）
    pub evictions: u64,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_accesses as f64
        }
    }
}

/// 借出的缓存条目
///
/// 持有期间条目不会被驱逐。用完后交还给所属缓存的 `release`。
#[derive(Debug)]
pub struct CacheHandle<K, V> {
    key: K,
    entry: Arc<V>,
}

impl<K: Copy, V> CacheHandle<K, V> {
    /// 条目的键
    pub fn key(&self) -> K {
        self.key
    }
}

impl<K, V> Deref for CacheHandle<K, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.entry
    }
}

struct Slot<V> {
    value: Arc<V>,
    size: usize,
}

impl<V> Slot<V> {
    fn refs(&self) -> usize {
        Arc::strong_count(&self.value) - 1
    }
}

/// 引用计数 LRU 缓存
pub struct RefCache<K, V> {
    /// 日志前缀
    tag: &'static str,
    /// 键 -> 条目
    entries: BTreeMap<K, Slot<V>>,
    /// 可驱逐队列（引用计数为 0 的键，LRU 端最先被驱逐）
    unpinned: LruCache<K, ()>,
    /// 驻留字节数
    resident: usize,
    /// 字节预算
    budget: usize,
    /// 统计信息
    stats: CacheStats,
}

impl<K: Ord + Hash + Copy + core::fmt::Debug, V> RefCache<K, V> {
    /// 创建空缓存
    ///
    /// # 参数
    ///
    /// * `tag` - 日志前缀（如 `"CACHE"`）
    /// * `budget` - 驻留字节预算
    pub fn new(tag: &'static str, budget: usize) -> Self {
        Self {
            tag,
            entries: BTreeMap::new(),
            unpinned: LruCache::unbounded(),
            resident: 0,
            budget,
            stats: CacheStats::default(),
        }
    }

    /// 查找驻留条目
    ///
    /// 命中时引用计数加一；若条目原本在可驱逐队列中，将其移出。
    pub fn lookup(&mut self, key: K) -> Option<CacheHandle<K, V>> {
        self.stats.total_accesses += 1;

        let Some(slot) = self.entries.get(&key) else {
            self.stats.misses += 1;
            log::trace!("[{}] key={:?} MISS", self.tag, key);
            return None;
        };

        if slot.refs() == 0 {
            self.unpinned.pop(&key);
        }
        self.stats.hits += 1;
        log::trace!("[{}] key={:?} HIT refs={}", self.tag, key, slot.refs() + 1);

        Some(CacheHandle {
            key,
            entry: Arc::clone(&slot.value),
        })
    }

    /// 为 `size` 字节的新条目腾出预算
    ///
    /// 若插入后会超出预算，驱逐可驱逐队列最久未使用的条目，
    /// 并把它的存储交还给调用者复用。没有可驱逐条目时返回 `None`，
    /// 调用者照常分配（被借出的条目不能驱逐）。
    pub fn reclaim(&mut self, size: usize) -> Option<V> {
        let slot = self.evict_lru(size)?;
        Arc::try_unwrap(slot.value).ok()
    }

    /// 为 `size` 字节的新条目腾出预算，被驱逐的条目直接丢弃
    ///
    /// 用于没有可复用存储的定长条目。返回是否驱逐了条目。
    pub fn make_room(&mut self, size: usize) -> bool {
        self.evict_lru(size).is_some()
    }

    fn evict_lru(&mut self, size: usize) -> Option<Slot<V>> {
        if self.resident + size <= self.budget {
            return None;
        }

        let (key, ()) = self.unpinned.pop_lru()?;
        let slot = self.entries.remove(&key)?;
        self.resident -= slot.size;
        self.stats.evictions += 1;
        log::debug!(
            "[{}] evicted key={:?}, resident={}/{}",
            self.tag,
            key,
            self.resident,
            self.budget
        );
        Some(slot)
    }

    /// 插入新条目并借出（引用计数 1）
    pub fn insert(&mut self, key: K, value: V, size: usize) -> CacheHandle<K, V> {
        let value = Arc::new(value);
        if let Some(old) = self.entries.insert(
            key,
            Slot {
                value: Arc::clone(&value),
                size,
            },
        ) {
            self.resident -= old.size;
            self.unpinned.pop(&key);
        }
        self.resident += size;
        log::debug!(
            "[{}] key={:?} inserted, resident={}/{}",
            self.tag,
            key,
            self.resident,
            self.budget
        );

        CacheHandle { key, entry: value }
    }

    /// 归还借出的条目
    ///
    /// 引用计数归零时：未超预算则放入可驱逐队列的最近端，
    /// 超预算则立即丢弃。
    pub fn release(&mut self, handle: CacheHandle<K, V>) {
        let CacheHandle { key, entry } = handle;
        drop(entry);

        let Some(slot) = self.entries.get(&key) else {
            return;
        };
        if slot.refs() != 0 {
            return;
        }

        if self.resident <= self.budget {
            self.unpinned.put(key, ());
        } else {
            let size = slot.size;
            self.entries.remove(&key);
            self.resident -= size;
            self.stats.evictions += 1;
            log::debug!("[{}] key={:?} dropped on release (over budget)", self.tag, key);
        }
    }

    /// 条目是否驻留
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// 条目当前的借出数
    pub fn ref_count(&self, key: K) -> Option<usize> {
        self.entries.get(&key).map(Slot::refs)
    }

    /// 仍被借出的条目数
    pub fn pinned_count(&self) -> usize {
        self.entries.values().filter(|slot| slot.refs() > 0).count()
    }

    /// 驻留条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 驻留字节数
    pub fn resident_bytes(&self) -> usize {
        self.resident
    }

    /// 字节预算
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// 获取统计信息
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// 丢弃全部条目
    ///
    /// 返回清空前仍被借出的条目数；这些条目的数据由借出方的句柄继续持有。
    pub fn clear(&mut self) -> usize {
        let pinned = self.pinned_count();
        if pinned > 0 {
            log::warn!("[{}] teardown with {} entries still referenced", self.tag, pinned);
        }
        self.entries.clear();
        self.unpinned.clear();
        self.resident = 0;
        pinned
    }
}
