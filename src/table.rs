//! Dynamo `.tbl` 粒子表解析
//!
//! 每行描述一个粒子，字段以空白分隔，列号（从 1 开始）含义见
//! <https://wiki.dynamo.biozentrum.unibas.ch/w/index.php/Table_convention>
//!
//! | 列 | 名称 | 含义 |
//! |----|------|------|
//! | 1 | tag | 粒子编号 |
//! | 2 | aligned | 1 表示参与对齐 |
//! | 3 | averaged | 1 表示参与平均 |
//! | 4-6 | dx, dy, dz | 相对中心的平移（像素） |
//! | 7 | tdrot | 绕 z 轴的欧拉角（度） |
//! | 8 | tilt | 绕新 x 轴的欧拉角（度） |
//! | 9 | narot | 绕新 z 轴的欧拉角（度） |
//! | 10-11 | cc, cc2 | 互相关系数 |
//! | 12 | cpu | 处理该粒子的处理器 |
//! | 13-17 | ftype, ymintilt, ymaxtilt, xmintilt, xmaxtilt | 缺失楔参数 |
//! | 18-19 | fs1, fs2 | 傅里叶采样自由参数 |
//! | 20 | tomo | 断层图编号 |
//! | 21 | reg | 区域 |
//! | 22 | class | 类别 |
//! | 23 | annotation | 任意标注 |
//! | 24-26 | x, y, z | 在原始断层图中的坐标 |
//! | 27-30 | dshift, daxis, dnarot, dcc | 迭代间差值 |
//! | 31-32 | otag, npar | 原始编号 / 子单元标签 |
//! | 34-35 | ref, sref | 参考 / 子参考 |
//! | 36 | apix | 像素尺寸（埃） |
//! | 37 | def | 离焦（微米） |
//! | 41-42 | eig1, eig2 | 特征系数 |
//!
//! 只使用三个欧拉角列和紧随其后的坐标列，其它字段原样忽略。

use std::io::BufRead;
use std::path::Path;

use crate::error::{CombineError, CombineResult};

/// 欧拉角所在列（从 1 开始）
pub const ANGLE_COLUMNS: [usize; 3] = [7, 8, 9];

/// 写入变换片段的尾随字段所在列（从 1 开始），依次对应旋转矩阵的三行
/// 列号固定，表格列顺序改变时会读到错误的字段
pub const TRAILING_COLUMNS: [usize; 3] = [24, 25, 26];

/// 一行至少需要的字段数
pub const MIN_FIELDS: usize = 26;

/// 三个欧拉角，单位弧度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngleTriple {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// 一行粒子记录中被使用的部分
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRecord {
    pub angles: EulerAngleTriple,
    /// 尾随字段保留原始文本，不做数值转换
    pub trailing: [String; 3],
}

impl ParticleRecord {
    pub fn trailing_fields(&self) -> [&str; 3] {
        [
            self.trailing[0].as_str(),
            self.trailing[1].as_str(),
            self.trailing[2].as_str(),
        ]
    }
}

/// 解析一行表格
/// line_number 只用于错误信息
pub fn parse_record(line: &str, line_number: usize) -> CombineResult<ParticleRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Err(CombineError::MalformedRecord {
            line: line_number,
            found: fields.len(),
            required: MIN_FIELDS,
        });
    }

    let angle = |column: usize| -> CombineResult<f64> {
        let raw = fields[column - 1];
        raw.parse::<f64>()
            .map(f64::to_radians)
            .map_err(|_| CombineError::InvalidAngle {
                line: line_number,
                column,
                value: raw.to_string(),
            })
    };

    let angles = EulerAngleTriple {
        a: angle(ANGLE_COLUMNS[0])?,
        b: angle(ANGLE_COLUMNS[1])?,
        c: angle(ANGLE_COLUMNS[2])?,
    };
    let trailing = TRAILING_COLUMNS.map(|column| fields[column - 1].to_string());

    Ok(ParticleRecord { angles, trailing })
}

/// 按文件顺序解析整个表格，遇到第一行错误即返回
/// 空行被跳过，不占用粒子编号；path 只用于错误信息
pub fn parse_table<R: BufRead>(reader: R, path: &Path) -> CombineResult<Vec<ParticleRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| CombineError::TableRead {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_record(&line, index + 1)?);
    }
    Ok(records)
}
