use std::path::PathBuf;

use crate::error::{CombineError, CombineResult};

/// 一次合并运行所需的全部配置
#[derive(Debug, Clone)]
pub struct CombineConfig {
    /// EM 体数据文件
    pub em_path: PathBuf,
    /// Dynamo 粒子表
    pub tbl_path: PathBuf,
    /// 输出文件名（可不带 .txt）
    pub output: PathBuf,
    /// 是否压缩体素数据
    pub compress: bool,
    /// 欧拉角旋转约定，在读取任何文件前校验
    pub convention: String,
}

impl CombineConfig {
    /// 输出文件路径: 已经以 .txt 结尾时原样使用，否则追加 .txt
    pub fn output_path(&self) -> PathBuf {
        let has_txt = self
            .output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if has_txt {
            self.output.clone()
        } else {
            let mut path = self.output.clone().into_os_string();
            path.push(".txt");
            PathBuf::from(path)
        }
    }

    /// 确认两个输入文件都存在
    pub fn validate_inputs(&self) -> CombineResult<()> {
        for path in [&self.em_path, &self.tbl_path] {
            if !path.exists() {
                return Err(CombineError::InputNotFound(path.clone()));
            }
        }
        Ok(())
    }
}
