use std::path::PathBuf;

use thiserror::Error;

/// 合并流程中可能出现的所有错误
/// 任何一个错误都会中止整个转换，不存在部分成功
#[derive(Debug, Error)]
pub enum CombineError {
    /// 欧拉角旋转约定不在支持列表中
    #[error("不支持的旋转约定 '{0}'，可选: zxz, zyz, xzx, xyx, yxy, yzy")]
    UnsupportedConvention(String),

    /// 表格行字段数不足
    #[error("第 {line} 行字段不足: 需要至少 {required} 列，但只有 {found} 列")]
    MalformedRecord {
        line: usize,
        found: usize,
        required: usize,
    },

    /// 欧拉角字段无法解析为浮点数
    #[error("第 {line} 行第 {column} 列的角度值 '{value}' 无法解析为浮点数")]
    InvalidAngle {
        line: usize,
        column: usize,
        value: String,
    },

    /// 表格文件无法读取
    #[error("无法读取表格文件 {path}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 体数据文件无法读取或结构损坏
    #[error("无法读取体数据 {path}: {reason}")]
    VolumeRead { path: PathBuf, reason: String },

    /// 体素载荷压缩失败
    #[error("体素数据压缩失败: {0}")]
    Compression(#[source] std::io::Error),

    /// 输出文件无法写入
    #[error("无法写入输出文件 {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 输入文件不存在
    #[error("文件 '{0}' 不存在")]
    InputNotFound(PathBuf),
}

impl CombineError {
    /// 构造体数据读取错误
    pub fn volume(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CombineError::VolumeRead {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type CombineResult<T> = Result<T, CombineError>;
