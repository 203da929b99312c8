use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::CombineConfig;
use crate::document::CombinedDocumentBuilder;
use crate::error::{CombineError, CombineResult};
use crate::rotation::Convention;
use crate::table::parse_table;
use crate::utils::parser_registry::ReaderRegistry;
use crate::volume::PayloadEncoding;

/// 一次合并运行的结果
#[derive(Debug, Clone, Serialize)]
pub struct CombineReport {
    pub output: PathBuf,
    pub particle_count: usize,
    pub convention: String,
    pub encoding: PayloadEncoding,
    pub mode: i32,
    pub columns: usize,
    pub rows: usize,
    pub sections: usize,
    /// 数据行中载荷文本的长度
    pub payload_chars: usize,
}

/// 将粒子表和体数据合并为一个文本文件
///
/// ## 流程
/// 1. 校验旋转约定（在读取任何文件之前），并预读体数据文件头
/// 2. 按文件顺序读取并解析整个粒子表
/// 3. 读取完整体数据
/// 4. 在内存中组装完整文档
/// 5. 原子写入输出文件
///
/// 任何一步失败都直接返回错误，不会留下部分写入的输出文件
pub fn run_combine(registry: &ReaderRegistry, config: &CombineConfig) -> CombineResult<CombineReport> {
    let start = Instant::now();

    // ==================== 步骤 1: 校验旋转约定 ====================
    let convention: Convention = config.convention.parse()?;

    // 先只读文件头，体数据损坏时不必解析整个粒子表
    let reader = registry.find_reader_for_file(&config.em_path)?;
    let header = reader.read_metadata_from_file(&config.em_path)?;
    debug!(
        "{} 文件头: mode={}, {}x{}x{}",
        reader.name(),
        header.mode,
        header.columns,
        header.rows,
        header.sections
    );

    // ==================== 步骤 2: 解析粒子表 ====================
    // 文件句柄只在这个作用域内持有
    let records = {
        let file = File::open(&config.tbl_path).map_err(|source| CombineError::TableRead {
            path: config.tbl_path.clone(),
            source,
        })?;
        parse_table(BufReader::new(file), &config.tbl_path)?
    };
    info!(
        "解析粒子表 {} 完成，共 {} 个粒子",
        config.tbl_path.display(),
        records.len()
    );

    // ==================== 步骤 3: 读取体数据 ====================
    let volume = reader.read_from_file(&config.em_path)?;
    let metadata = volume.metadata;
    info!(
        "读取体数据完成: mode={}, {}x{}x{}",
        metadata.mode, metadata.columns, metadata.rows, metadata.sections
    );

    // ==================== 步骤 4: 组装文档 ====================
    let builder = CombinedDocumentBuilder::new(convention, config.compress);
    let document = builder.build(&records, &metadata, &volume.payload)?;

    // ==================== 步骤 5: 原子写入 ====================
    let output = config.output_path();
    document.write_atomic(&output)?;

    info!(
        "{} 已生成（{}，{} 行），耗时 {}ms",
        output.display(),
        match document.encoding() {
            PayloadEncoding::Compressed => "压缩",
            PayloadEncoding::Raw => "未压缩",
        },
        document.line_count(),
        start.elapsed().as_millis()
    );

    Ok(CombineReport {
        output,
        particle_count: records.len(),
        convention: convention.to_string(),
        encoding: document.encoding(),
        mode: metadata.mode,
        columns: metadata.columns,
        rows: metadata.rows,
        sections: metadata.sections,
        payload_chars: document.payload_text().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::em_bytes;
    use crate::table::tests::row;
    use std::fs;
    use std::path::Path;
    use uuid::Uuid;

    struct Workspace {
        dir: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(Uuid::new_v4().to_string());
            fs::create_dir_all(&dir).unwrap();
            Workspace { dir }
        }

        fn file(&self, name: &str, bytes: &[u8]) -> PathBuf {
            let path = self.dir.join(name);
            fs::write(&path, bytes).unwrap();
            path
        }

        fn config(&self, em: &Path, tbl: &Path, compress: bool, convention: &str) -> CombineConfig {
            CombineConfig {
                em_path: em.to_path_buf(),
                tbl_path: tbl.to_path_buf(),
                output: self.dir.join("combined"),
                compress,
                convention: convention.to_string(),
            }
        }
    }

    impl Drop for Workspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn table(n: usize) -> String {
        (0..n)
            .map(|i| row(["30", "60", "90"], ["1", "2", &i.to_string()]))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn writes_document_and_reports_encoding() {
        let ws = Workspace::new();
        let em = ws.file("ref.em", &em_bytes(6, 1, [2, 2, 2], &[7u8; 8]));
        let tbl = ws.file("particles.tbl", table(3).as_bytes());

        let report = run_combine(&ReaderRegistry::new(), &ws.config(&em, &tbl, true, "zxz")).unwrap();

        assert_eq!(report.particle_count, 3);
        assert_eq!(report.encoding, PayloadEncoding::Compressed);
        assert_eq!(report.output, ws.dir.join("combined.txt"));
        let text = fs::read_to_string(&report.output).unwrap();
        assert_eq!(text.lines().count(), 3 + 5);
        assert!(text.contains("Mode:\t1\nNc:\t2\nNr:\t2\nNs:\t2\nData:\t"));
    }

    #[test]
    fn unsupported_convention_fails_before_output() {
        let ws = Workspace::new();
        let em = ws.file("ref.em", &em_bytes(6, 1, [1, 1, 1], &[0u8]));
        let tbl = ws.file("particles.tbl", table(2).as_bytes());
        let config = ws.config(&em, &tbl, false, "xyz");

        let err = run_combine(&ReaderRegistry::new(), &config).unwrap_err();
        assert!(matches!(err, CombineError::UnsupportedConvention(_)));
        assert!(!config.output_path().exists());
    }

    #[test]
    fn bad_row_aborts_whole_run() {
        let ws = Workspace::new();
        let em = ws.file("ref.em", &em_bytes(6, 1, [1, 1, 1], &[0u8]));
        let text = format!("{}\n1 2 3 4\n", table(2));
        let tbl = ws.file("particles.tbl", text.as_bytes());
        let config = ws.config(&em, &tbl, false, "zxz");

        let err = run_combine(&ReaderRegistry::new(), &config).unwrap_err();
        assert!(matches!(err, CombineError::MalformedRecord { line: 3, .. }));
        assert!(!config.output_path().exists());
    }

    #[test]
    fn corrupt_volume_leaves_no_output() {
        let ws = Workspace::new();
        let em = ws.file("ref.em", &em_bytes(6, 5, [4, 4, 4], &[0u8; 10]));
        let tbl = ws.file("particles.tbl", table(1).as_bytes());
        let config = ws.config(&em, &tbl, false, "zxz");

        let err = run_combine(&ReaderRegistry::new(), &config).unwrap_err();
        assert!(matches!(err, CombineError::VolumeRead { .. }));
        assert!(!config.output_path().exists());
        assert_eq!(fs::read_dir(&ws.dir).unwrap().count(), 2);
    }

    #[test]
    fn identical_inputs_give_identical_bytes() {
        let ws = Workspace::new();
        let em = ws.file("ref.em", &em_bytes(6, 2, [2, 1, 1], &[1, 0, 2, 0]));
        let tbl = ws.file("particles.tbl", table(2).as_bytes());
        let config = ws.config(&em, &tbl, false, "yxy");

        run_combine(&ReaderRegistry::new(), &config).unwrap();
        let first = fs::read(config.output_path()).unwrap();
        run_combine(&ReaderRegistry::new(), &config).unwrap();
        let second = fs::read(config.output_path()).unwrap();
        assert_eq!(first, second);
    }
}
