//! Extent 树模块
//!
//! 这个模块提供 extent 树的只读解析和块映射。
//!
//! Extent 用 (起始逻辑块, 长度, 起始物理块) 描述一段连续映射，
//! 长度超过 32768 的叶子表示 `长度 - 32768` 块未分配区域。
//!
//! ## 节点格式
//!
//! ```text
//! +----------------+----------------+-----+
//! | header (12 B)  | entry (12 B)   | ... |
//! +----------------+----------------+-----+
//! depth == 0: entry 是叶子 ext_extent
//! depth  > 0: entry 是索引 ext_extent_idx
//! ```
//!
//! 根节点位于 inode 的 60 字节块区域（最多 4 个条目），
//! 子节点各占一整块（最多 `(block_size - 12) / 12` 个条目）。

mod tree;

pub use tree::ExtentTree;
