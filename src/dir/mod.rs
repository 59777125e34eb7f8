//! 目录操作模块
//!
//! 目录内容是一串填满整块的变长记录，按顺序线性扫描（不使用哈希树索引）。
//!
//! ## 模块结构
//!
//! - `entry` - 单条记录的解码和边界校验
//! - `iterator` - 只保存位置状态的记录游标
//! - `lookup` - 按名字查找

mod entry;
mod iterator;
mod lookup;

pub use entry::{DirEntry, DirRecord};
pub use iterator::DirCursor;
pub use lookup::find_entry;
