use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::document::fragment::format_transformation;
use crate::error::{CombineError, CombineResult};
use crate::rotation::Convention;
use crate::table::ParticleRecord;
use crate::volume::{PayloadEncoding, VolumeMetadata, VolumePayload};

/// 每个粒子行的标签
pub const TRANSFORMATION_LABEL: &str = "Tag, transformation:";

/// 渲染一个粒子的变换行，tag 从 1 开始，由调用方按记录顺序给出
pub fn transformation_line(tag: usize, record: &ParticleRecord, convention: Convention) -> String {
    let angles = record.angles;
    let matrix = convention.matrix(angles.a, angles.b, angles.c);
    format!(
        "{}\t{}\t{}",
        TRANSFORMATION_LABEL,
        tag,
        format_transformation(&matrix, &record.trailing_fields())
    )
}

/// 组装完成的文档
/// 粒子变换行在前，随后是 4 行元信息和 1 行数据
#[derive(Debug, Clone)]
pub struct CombinedDocument {
    lines: Vec<String>,
    encoding: PayloadEncoding,
}

impl CombinedDocument {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 数据行实际使用的编码
    pub fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }

    /// 数据行中的载荷文本
    pub fn payload_text(&self) -> &str {
        self.lines
            .last()
            .and_then(|line| line.strip_prefix("Data:\t"))
            .unwrap_or_default()
    }

    /// 行之间以换行分隔，最后的数据行后没有换行
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    /// 先写入同目录下的临时文件，成功后再重命名为目标文件
    /// 任何一步失败都会删除临时文件，目标位置不会留下半个文件
    pub fn write_atomic(&self, path: &Path) -> CombineResult<()> {
        let temp_path = temp_path_for(path);
        debug!("写入临时文件 {}", temp_path.display());

        let result = self
            .write_to(&temp_path)
            .and_then(|()| fs::rename(&temp_path, path));

        result.map_err(|source| {
            if temp_path.exists() {
                if let Err(e) = fs::remove_file(&temp_path) {
                    warn!("无法删除临时文件 {}: {}", temp_path.display(), e);
                }
            }
            CombineError::OutputWrite {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writer.write_all(b"\n")?;
            }
            writer.write_all(line.as_bytes())?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
}

/// 文档构建器，持有旋转约定和载荷编码选择
#[derive(Debug, Clone, Copy)]
pub struct CombinedDocumentBuilder {
    convention: Convention,
    encoding: PayloadEncoding,
}

impl CombinedDocumentBuilder {
    pub fn new(convention: Convention, compress: bool) -> Self {
        Self {
            convention,
            encoding: PayloadEncoding::from_compress_flag(compress),
        }
    }

    pub fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }

    /// 按记录顺序生成变换行，再追加元信息和数据行
    pub fn build(
        &self,
        records: &[ParticleRecord],
        metadata: &VolumeMetadata,
        payload: &VolumePayload,
    ) -> CombineResult<CombinedDocument> {
        let mut lines = Vec::with_capacity(records.len() + 5);
        for (tag, record) in (1..).zip(records) {
            lines.push(transformation_line(tag, record, self.convention));
        }

        lines.push(format!("Mode:\t{}", metadata.mode));
        lines.push(format!("Nc:\t{}", metadata.columns));
        lines.push(format!("Nr:\t{}", metadata.rows));
        lines.push(format!("Ns:\t{}", metadata.sections));

        let encoded = payload
            .encode(self.encoding)
            .map_err(CombineError::Compression)?;
        lines.push(format!("Data:\t{}", encoded));

        Ok(CombinedDocument {
            lines,
            encoding: self.encoding,
        })
    }
}
