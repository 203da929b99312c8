//! EM 体数据文件的结构读取
//!
//! 文件由 512 字节头和紧随其后的体素数据组成。头部布局:
//! - 字节 0: 机器类型，决定字节序
//! - 字节 3: 数据类型（即 mode）
//! - 字节 4..16: nx, ny, nz（i32）
//! - 其余字节为注释和用户数据，这里不使用
//!
//! 只取出 mode、维度和体素字节，不解释体素数值。

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::error::{CombineError, CombineResult};
use crate::utils::parser::VolumeReader;
use crate::volume::{Volume, VolumeMetadata};

pub const HEADER_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn from_machine(machine: u8) -> Option<Self> {
        match machine {
            // VAX, PC
            1 | 6 => Some(ByteOrder::Little),
            // OS-9, SGI, Mac
            0 | 3 | 5 => Some(ByteOrder::Big),
            _ => None,
        }
    }
}

/// 数据类型对应的 (每个体素字节数, 字节序交换单元)
/// 复数由两个 f32 组成，按 4 字节交换
fn voxel_layout(mode: i32) -> Option<(usize, usize)> {
    match mode {
        1 => Some((1, 1)),
        2 => Some((2, 2)),
        4 => Some((4, 4)),
        5 => Some((4, 4)),
        8 => Some((8, 4)),
        9 => Some((8, 8)),
        _ => None,
    }
}

/// 解析后的文件头
#[derive(Debug, Clone, Copy)]
struct EmHeader {
    byte_order: ByteOrder,
    metadata: VolumeMetadata,
    bytes_per_voxel: usize,
    swap_unit: usize,
    /// 头部之后体素数据的字节数
    data_len: usize,
}

fn parse_header(header: &[u8; HEADER_SIZE], path: &Path) -> CombineResult<EmHeader> {
    let machine = header[0];
    let byte_order = ByteOrder::from_machine(machine)
        .ok_or_else(|| CombineError::volume(path, format!("未知的机器类型 {}", machine)))?;

    let mode = i32::from(header[3]);
    let (bytes_per_voxel, swap_unit) = voxel_layout(mode)
        .ok_or_else(|| CombineError::volume(path, format!("不支持的数据类型 {}", mode)))?;

    let mut cursor = Cursor::new(&header[4..16]);
    let mut dims = [0i32; 3];
    for dim in dims.iter_mut() {
        let value = match byte_order {
            ByteOrder::Little => cursor.read_i32::<LittleEndian>(),
            ByteOrder::Big => cursor.read_i32::<BigEndian>(),
        };
        *dim = value.map_err(|e| CombineError::volume(path, e.to_string()))?;
    }
    if dims.iter().any(|&dim| dim <= 0) {
        return Err(CombineError::volume(
            path,
            format!("维度必须为正数，但得到 {:?}", dims),
        ));
    }
    let shape = dims.map(|dim| dim as usize);
    let metadata = VolumeMetadata {
        mode,
        columns: shape[0],
        rows: shape[1],
        sections: shape[2],
    };
    let data_len = metadata.data_len(bytes_per_voxel).ok_or_else(|| {
        CombineError::volume(path, format!("维度 {:?} 对应的数据量超出可表示范围", dims))
    })?;

    Ok(EmHeader {
        byte_order,
        metadata,
        bytes_per_voxel,
        swap_unit,
        data_len,
    })
}

fn read_header<R: Read>(reader: &mut R, path: &Path) -> CombineResult<EmHeader> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).map_err(|e| {
        CombineError::volume(path, format!("文件头不足 {} 字节: {}", HEADER_SIZE, e))
    })?;
    parse_header(&header, path)
}

/// 将大端体素转换为小端
fn normalize_byte_order(data: &mut [u8], header: &EmHeader) {
    if header.byte_order == ByteOrder::Big && header.swap_unit > 1 {
        for unit in data.chunks_exact_mut(header.swap_unit) {
            unit.reverse();
        }
    }
}

/// EM 文件读取器
#[derive(Default)]
pub struct EmReader;

impl EmReader {
    pub fn new() -> Self {
        EmReader
    }
}

impl VolumeReader for EmReader {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["em"]
    }

    fn name(&self) -> &'static str {
        "EM Reader"
    }

    fn read_from_file(&self, file_path: &Path) -> CombineResult<Volume> {
        let file =
            File::open(file_path).map_err(|e| CombineError::volume(file_path, e.to_string()))?;
        let file_len = file
            .metadata()
            .map_err(|e| CombineError::volume(file_path, e.to_string()))?
            .len();
        let mut reader = BufReader::new(file);
        let header = read_header(&mut reader, file_path)?;

        // 分配内存之前先按文件长度校验头部声明的数据量
        let expected = header.data_len;
        let available = file_len.saturating_sub(HEADER_SIZE as u64);
        if (expected as u64) > available {
            return Err(CombineError::volume(
                file_path,
                format!("体素数据不完整: 需要 {} 字节，只有 {} 字节", expected, available),
            ));
        }

        let mut data = Vec::new();
        reader
            .take(expected as u64)
            .read_to_end(&mut data)
            .map_err(|e| CombineError::volume(file_path, e.to_string()))?;
        if data.len() != expected {
            return Err(CombineError::volume(
                file_path,
                format!("体素数据不完整: 需要 {} 字节，只有 {} 字节", expected, data.len()),
            ));
        }

        normalize_byte_order(&mut data, &header);
        debug!(
            "读取 EM 文件 {}: mode={}, {}x{}x{}, {:?}",
            file_path.display(),
            header.metadata.mode,
            header.metadata.columns,
            header.metadata.rows,
            header.metadata.sections,
            header.byte_order
        );

        Volume::new(header.metadata, header.bytes_per_voxel, data)
            .map_err(|e| CombineError::volume(file_path, e))
    }

    fn read_metadata_from_file(&self, file_path: &Path) -> CombineResult<VolumeMetadata> {
        let mut file =
            File::open(file_path).map_err(|e| CombineError::volume(file_path, e.to_string()))?;
        Ok(read_header(&mut file, file_path)?.metadata)
    }
}

/// 测试用: 按给定机器类型和数据类型构造 EM 文件字节
#[cfg(test)]
pub(crate) fn em_bytes(machine: u8, mode: u8, dims: [i32; 3], data: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; HEADER_SIZE];
    bytes[0] = machine;
    bytes[3] = mode;
    for (i, dim) in dims.iter().enumerate() {
        let b = if ByteOrder::from_machine(machine) == Some(ByteOrder::Big) {
            dim.to_be_bytes()
        } else {
            dim.to_le_bytes()
        };
        bytes[4 + i * 4..8 + i * 4].copy_from_slice(&b);
    }
    bytes.extend_from_slice(data);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}.em", uuid::Uuid::new_v4()));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn reads_little_endian_float_volume() {
        let data: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let path = write_temp(&em_bytes(6, 5, [3, 2, 1], &data));

        let volume = EmReader::new().read_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            volume.metadata,
            VolumeMetadata {
                mode: 5,
                columns: 3,
                rows: 2,
                sections: 1
            }
        );
        assert_eq!(volume.payload.as_bytes(), data.as_slice());
    }

    #[test]
    fn big_endian_voxels_are_normalized() {
        let values = [1i16, -2, 300, 4];
        let be: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        let le: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let path = write_temp(&em_bytes(3, 2, [2, 2, 1], &be));

        let volume = EmReader::new().read_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(volume.metadata.columns, 2);
        assert_eq!(volume.metadata.mode, 2);
        assert_eq!(volume.payload.as_bytes(), le.as_slice());
    }

    #[test]
    fn metadata_only_reads_header() {
        let path = write_temp(&em_bytes(6, 1, [4, 5, 6], &[]));
        let metadata = EmReader::new().read_metadata_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!((metadata.columns, metadata.rows, metadata.sections), (4, 5, 6));
    }

    #[test]
    fn truncated_data_is_volume_error() {
        let path = write_temp(&em_bytes(6, 5, [2, 2, 2], &[0u8; 20]));
        let err = EmReader::new().read_from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, CombineError::VolumeRead { .. }));
    }

    #[test]
    fn overflowing_dimensions_are_volume_error() {
        let path = write_temp(&em_bytes(6, 9, [i32::MAX; 3], &[0u8; 8]));
        let err = EmReader::new().read_from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, CombineError::VolumeRead { .. }), "{err}");
    }

    #[test]
    fn huge_dimensions_on_tiny_file_are_volume_error() {
        let path = write_temp(&em_bytes(6, 1, [65536; 3], &[0u8; 8]));
        let err = EmReader::new().read_from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, CombineError::VolumeRead { .. }), "{err}");
        assert!(err.to_string().contains("不完整"));
    }

    #[test]
    fn default_matches_new() {
        let reader = EmReader::default();
        assert_eq!(reader.name(), EmReader::new().name());
        assert!(reader.supports("EM"));
    }

    #[test]
    fn rejects_bad_header_fields() {
        let unknown_mode = write_temp(&em_bytes(6, 7, [1, 1, 1], &[0u8; 8]));
        let unknown_machine = write_temp(&em_bytes(9, 1, [1, 1, 1], &[0u8]));
        let zero_dim = write_temp(&em_bytes(6, 1, [1, 0, 1], &[]));
        let short_header = write_temp(&[6u8, 0, 0, 5]);

        for path in [&unknown_mode, &unknown_machine, &zero_dim, &short_header] {
            let err = EmReader::new().read_from_file(path).unwrap_err();
            assert!(matches!(err, CombineError::VolumeRead { .. }), "{err}");
            std::fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn missing_file_is_volume_error() {
        let path = std::env::temp_dir().join("does-not-exist.em");
        assert!(matches!(
            EmReader::new().read_from_file(&path),
            Err(CombineError::VolumeRead { .. })
        ));
    }
}
