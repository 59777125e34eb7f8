//! Superblock 模块
//!
//! 这个模块负责读取和验证 superblock，并推导出挂载后不再变化的卷几何参数。

mod geometry;
mod read;

pub use geometry::{DescriptorLayout, VolumeGeometry};
pub use read::{read_superblock, IncompatFeatures, RoCompatFeatures, Superblock};
