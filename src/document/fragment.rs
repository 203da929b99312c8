use crate::rotation::RotationMatrix;

/// 将旋转矩阵和尾随字段渲染为制表符分隔的文本片段
///
/// 第 r 行输出三个分量和 `trailing[r]`，每个字段后都跟一个制表符，
/// 三组之间不再加分隔符。数值使用 `f64` 的 Debug 表示（`1.0`、`-0.0`、
/// `6.123233995736766e-17`），与区域设置无关，相同输入得到相同字节。
pub fn format_transformation(matrix: &RotationMatrix, trailing: &[&str; 3]) -> String {
    let mut fragment = String::new();
    for (row, field) in matrix.rows().iter().zip(trailing) {
        for value in row {
            fragment.push_str(&format!("{:?}\t", value));
        }
        fragment.push_str(field);
        fragment.push('\t');
    }
    fragment
}
