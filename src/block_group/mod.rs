//! 块组模块
//!
//! 这个模块负责读取块组描述符和两张位图，并以块组号为键缓存结果。
//! inode 查找只在定位 inode 表时短暂借用块组条目，不会在 inode 生命周期内持有。

mod cache;
mod read;

pub use cache::{BlockGroupCache, GroupHandle};
pub use read::{load_group, GroupEntry};
