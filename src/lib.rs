//! Dynamo 粒子表 + EM 体数据 → 单个文本文件
//!
//! 每个粒子的欧拉角转换为旋转矩阵，与坐标一起写成变换行，
//! 随后写入体数据的 mode、维度以及（可选压缩的）base64 体素数据。

pub mod combine;
pub mod config;
pub mod document;
pub mod error;
pub mod parsers;
pub mod rotation;
pub mod table;
pub mod utils;
pub mod volume;

pub use combine::{CombineReport, run_combine};
pub use config::CombineConfig;
pub use error::{CombineError, CombineResult};
pub use rotation::{Convention, RotationMatrix, rotation_matrix};
pub use utils::parser_registry::ReaderRegistry;
