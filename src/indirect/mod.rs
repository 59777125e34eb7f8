//! 传统间接块映射
//!
//! 12 个直接块之后依次是一级、二级、三级间接块，每级扇出为 `block_size / 4`。

mod mapper;

pub use mapper::IndirectBlockMapper;
