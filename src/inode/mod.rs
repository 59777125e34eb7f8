//! Inode 模块
//!
//! 这个模块负责把 inode 表槽位解码为 [`InodeEntry`]，并以 inode 编号为键缓存。
//! 块指针区域在解码时就确定为传统块指针或 extent 树根，之后不再重新解释。

mod cache;
mod read;

pub use cache::{InodeCache, InodeHandle};
pub use read::{load_inode, BlockArea, InodeEntry};
