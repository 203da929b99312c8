use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use crate::error::CombineError;

/// 坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// 欧拉角旋转约定，共六种
/// 例如 zxz: 先绕 Z 轴转第一个角，再绕新的 X 轴转第二个角，最后绕新的 Z 轴转第三个角
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Convention {
    #[default]
    Zxz,
    Zyz,
    Xzx,
    Xyx,
    Yxy,
    Yzy,
}

impl Convention {
    pub const ALL: [Convention; 6] = [
        Convention::Zxz,
        Convention::Zyz,
        Convention::Xzx,
        Convention::Xyx,
        Convention::Yxy,
        Convention::Yzy,
    ];

    /// 三次旋转对应的轴顺序
    pub fn axes(self) -> [Axis; 3] {
        match self {
            Convention::Zxz => [Axis::Z, Axis::X, Axis::Z],
            Convention::Zyz => [Axis::Z, Axis::Y, Axis::Z],
            Convention::Xzx => [Axis::X, Axis::Z, Axis::X],
            Convention::Xyx => [Axis::X, Axis::Y, Axis::X],
            Convention::Yxy => [Axis::Y, Axis::X, Axis::Y],
            Convention::Yzy => [Axis::Y, Axis::Z, Axis::Y],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Convention::Zxz => "zxz",
            Convention::Zyz => "zyz",
            Convention::Xzx => "xzx",
            Convention::Xyx => "xyx",
            Convention::Yxy => "yxy",
            Convention::Yzy => "yzy",
        }
    }

    /// 计算旋转矩阵: M(轴1, a) · M(轴2, b) · M(轴3, c)
    /// 角度单位为弧度
    pub fn matrix(self, a: f64, b: f64, c: f64) -> RotationMatrix {
        let [first, second, third] = self.axes();
        elementary(first, a) * elementary(second, b) * elementary(third, c)
    }
}

impl FromStr for Convention {
    type Err = CombineError;

    /// 区分大小写，未知约定直接报错
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Convention::ALL
            .into_iter()
            .find(|convention| convention.as_str() == s)
            .ok_or_else(|| CombineError::UnsupportedConvention(s.to_string()))
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 3x3 旋转矩阵，按行存储
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix {
    pub rows: [[f64; 3]; 3],
}

impl RotationMatrix {
    pub fn identity() -> Self {
        RotationMatrix {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn rows(&self) -> &[[f64; 3]; 3] {
        &self.rows
    }

    pub fn column(&self, j: usize) -> [f64; 3] {
        [self.rows[0][j], self.rows[1][j], self.rows[2][j]]
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.rows;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }
}

impl Mul for RotationMatrix {
    type Output = RotationMatrix;

    fn mul(self, rhs: RotationMatrix) -> RotationMatrix {
        let mut rows = [[0.0; 3]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (0..3).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        RotationMatrix { rows }
    }
}

/// 绕单个坐标轴的逆时针旋转矩阵
/// Dynamo 按顺时针方向旋转物体，这里取逆时针形式与之对应
pub fn elementary(axis: Axis, theta: f64) -> RotationMatrix {
    let (s, c) = theta.sin_cos();
    let rows = match axis {
        Axis::X => [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
        Axis::Y => [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
        Axis::Z => [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
    };
    RotationMatrix { rows }
}

/// 根据约定字符串计算旋转矩阵，约定非法时在计算前返回错误
pub fn rotation_matrix(
    a: f64,
    b: f64,
    c: f64,
    convention: &str,
) -> Result<RotationMatrix, CombineError> {
    let convention: Convention = convention.parse()?;
    Ok(convention.matrix(a, b, c))
}
