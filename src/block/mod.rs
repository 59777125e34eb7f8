//! 后备存储抽象
//!
//! 卷只通过按字节偏移的随机读访问底层存储。
//! `BackingStore` 是调用方实现的边界接口，`Backing` 在其上增加读取统计，
//! 三个缓存的所有物理读取都经过它。

mod store;

pub use store::{Backing, BackingStore, MemStore};

#[cfg(feature = "std")]
pub use store::StdStore;
