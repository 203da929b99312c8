use std::path::Path;

use crate::error::{CombineError, CombineResult};
use crate::utils::parser::VolumeReader;

/// 读取器注册表
/// 管理所有可用的体数据读取器，并根据文件扩展名匹配对应的读取器
pub struct ReaderRegistry {
    readers: Vec<Box<dyn VolumeReader>>,
}

impl ReaderRegistry {
    /// 创建新的读取器注册表，自动注册所有可用的读取器
    pub fn new() -> Self {
        let readers = crate::parsers::get_all_readers();
        Self { readers }
    }

    /// 根据文件扩展名查找匹配的读取器
    /// extension: 文件扩展名（不含点号），例如 "em"
    pub fn find_reader(&self, extension: &str) -> Option<&dyn VolumeReader> {
        self.readers
            .iter()
            .find(|reader| reader.supports(extension))
            .map(|r| r.as_ref())
    }

    /// 根据文件路径查找匹配的读取器
    /// 扩展名缺失或不受支持时返回 VolumeRead 错误
    pub fn find_reader_for_file(&self, file_path: &Path) -> CombineResult<&dyn VolumeReader> {
        let extension = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        self.find_reader(extension).ok_or_else(|| {
            CombineError::volume(
                file_path,
                format!(
                    "不支持的文件格式 '{}'，支持的扩展名: {}",
                    extension,
                    self.supported_extensions().join(", ")
                ),
            )
        })
    }

    /// 获取所有支持的扩展名列表
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions = Vec::new();
        for reader in &self.readers {
            extensions.extend(
                reader
                    .supported_extensions()
                    .iter()
                    .map(|s| s.to_lowercase()),
            );
        }
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
