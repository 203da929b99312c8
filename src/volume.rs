use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::Serialize;

/// 体数据元信息
/// mode 为像素编码类型，三个维度分别为列数、行数、层数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeMetadata {
    pub mode: i32,
    pub columns: usize,
    pub rows: usize,
    pub sections: usize,
}

impl VolumeMetadata {
    /// 体素总数，乘法溢出时返回 None
    pub fn voxel_count(&self) -> Option<usize> {
        self.columns
            .checked_mul(self.rows)?
            .checked_mul(self.sections)
    }

    /// 体素数据的总字节数，乘法溢出时返回 None
    pub fn data_len(&self, bytes_per_voxel: usize) -> Option<usize> {
        self.voxel_count()?.checked_mul(bytes_per_voxel)
    }
}

/// 嵌入文档时使用的载荷编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// 原始字节的 base64
    Raw,
    /// zlib 压缩后再 base64
    Compressed,
}

impl PayloadEncoding {
    pub fn from_compress_flag(compress: bool) -> Self {
        if compress {
            PayloadEncoding::Compressed
        } else {
            PayloadEncoding::Raw
        }
    }
}

/// 体素数据的字节序列，按列变化最快、层变化最慢的顺序存储，多字节体素为小端
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePayload {
    bytes: Vec<u8>,
}

impl VolumePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        VolumePayload { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 原始字节直接编码为文本
    pub fn encoded(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// zlib 压缩后编码为文本
    pub fn encoded_compressed(&self) -> std::io::Result<String> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.bytes)?;
        let compressed = encoder.finish()?;
        Ok(STANDARD.encode(compressed))
    }

    /// 按指定编码生成文本，每次调用只生成一种
    pub fn encode(&self, encoding: PayloadEncoding) -> std::io::Result<String> {
        match encoding {
            PayloadEncoding::Raw => Ok(self.encoded()),
            PayloadEncoding::Compressed => self.encoded_compressed(),
        }
    }
}

/// 外部体数据读取器提供的完整体数据
#[derive(Debug, Clone)]
pub struct Volume {
    pub metadata: VolumeMetadata,
    pub payload: VolumePayload,
}

impl Volume {
    /// 创建体数据，校验字节数与维度、体素大小一致
    pub fn new(
        metadata: VolumeMetadata,
        bytes_per_voxel: usize,
        bytes: Vec<u8>,
    ) -> Result<Self, String> {
        let expected = metadata.data_len(bytes_per_voxel).ok_or_else(|| {
            format!(
                "维度过大: {}x{}x{} 个体素（每个 {} 字节）超出可表示的字节数",
                metadata.columns, metadata.rows, metadata.sections, bytes_per_voxel
            )
        })?;

        if bytes.len() != expected {
            return Err(format!(
                "数据量不匹配: {}x{}x{} 个体素（每个 {} 字节）需要 {} 字节，但提供了 {} 字节",
                metadata.columns,
                metadata.rows,
                metadata.sections,
                bytes_per_voxel,
                expected,
                bytes.len()
            ));
        }

        Ok(Volume {
            metadata,
            payload: VolumePayload::new(bytes),
        })
    }
}
