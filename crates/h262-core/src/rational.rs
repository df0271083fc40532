//! 有理数.
//!
//! 帧率 (frame_rate_code 与扩展字段组合), 帧时间基和像素宽高比都用它表示.

use std::fmt;

/// 分数 `num / den`, `den == 0` 表示未定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// 未定义 (如序列头中 frame_rate_code 为保留值)
    pub const UNDEFINED: Self = Self { num: 0, den: 0 };

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 约分, 分母取正; 未定义值原样返回
    pub fn reduce(self) -> Self {
        if self.den == 0 {
            return self;
        }
        let g = gcd(i64::from(self.num).unsigned_abs(), i64::from(self.den).unsigned_abs());
        let sign = if self.den < 0 { -1 } else { 1 };
        Self {
            num: sign * (i64::from(self.num) / g as i64) as i32,
            den: sign * (i64::from(self.den) / g as i64) as i32,
        }
    }

    /// 倒数, 帧率转时间基
    pub const fn invert(self) -> Self {
        Self::new(self.den, self.num)
    }
}

impl std::ops::Mul for Rational {
    type Output = Self;

    /// 在 64 位下相乘后约分, 显示宽高比乘以尺寸比不会溢出
    fn mul(self, rhs: Self) -> Self {
        let num = i64::from(self.num) * i64::from(rhs.num);
        let den = i64::from(self.den) * i64::from(rhs.den);
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()) as i64;
        let sign = if den < 0 { -1 } else { 1 };
        Self::new((sign * num / g) as i32, (sign * den / g) as i32)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// 最大公约数, 两者都为 0 时返回 1
fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}
