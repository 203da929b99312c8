use std::path::Path;

use crate::error::CombineResult;
use crate::volume::{Volume, VolumeMetadata};

/// 体数据读取器 trait
/// 不同文件格式需要实现这个 trait
pub trait VolumeReader: Send + Sync {
    /// 获取支持的文件扩展名（不含点号），例如: "em"
    fn supported_extensions(&self) -> Vec<&'static str>;

    /// 检查文件扩展名是否被支持
    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// 从文件路径读取元信息和完整体素字节
    fn read_from_file(&self, file_path: &Path) -> CombineResult<Volume>;

    /// 只读取文件头中的元信息，不读取体素数据
    fn read_metadata_from_file(&self, file_path: &Path) -> CombineResult<VolumeMetadata>;

    /// 获取读取器名称（用于日志和错误信息）
    fn name(&self) -> &'static str;
}
