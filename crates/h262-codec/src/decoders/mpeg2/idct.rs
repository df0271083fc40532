//! 8x8 逆 DCT
//!
//! 可分离的基 2 递归快速算法: 先列后行, 各做一次 8 点一维变换.
//! 一维变换把 N 点 IDCT 拆成偶数项与相邻奇数项之和两个 N/2 点 IDCT,
//! 再以 1 / (2cos((2n+1)π/2N)) 组合. 浮点计算, 结果与直接余弦求和定义一致.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// 输出范围
const OUTPUT_MIN: i32 = -256;
const OUTPUT_MAX: i32 = 255;

/// N 点一维 IDCT (N 为 1/2/4/8)
///
/// 计算 y[n] = Σ X[k] cos((2n+1)kπ / 2N), 未含归一化系数.
fn idct_1d(input: &[f64], output: &mut [f64]) {
    let n = input.len();
    if n == 1 {
        output[0] = input[0];
        return;
    }

    let half = n / 2;
    let mut even = [0.0f64; 4];
    let mut odd = [0.0f64; 4];
    for k in 0..half {
        even[k] = input[2 * k];
        odd[k] = input[2 * k + 1] + if k > 0 { input[2 * k - 1] } else { 0.0 };
    }

    let mut g = [0.0f64; 4];
    let mut h = [0.0f64; 4];
    idct_1d(&even[..half], &mut g[..half]);
    idct_1d(&odd[..half], &mut h[..half]);

    for i in 0..half {
        let c = 2.0 * (((2 * i + 1) as f64) * PI / ((2 * n) as f64)).cos();
        let t = h[i] / c;
        output[i] = g[i] + t;
        output[n - 1 - i] = g[i] - t;
    }
}

/// 8 点带归一化的一维 IDCT: f(x) = 1/2 Σ C(u) F(u) cos((2x+1)uπ/16)
fn idct_8(input: &[f64; 8]) -> [f64; 8] {
    let mut scaled = [0.0f64; 8];
    scaled[0] = input[0] * FRAC_1_SQRT_2 * 0.5;
    for k in 1..8 {
        scaled[k] = input[k] * 0.5;
    }
    let mut out = [0.0f64; 8];
    idct_1d(&scaled, &mut out);
    out
}

/// 对光栅顺序的 8x8 系数块做逆变换, 结果四舍五入并截断到 [-256, 255]
pub fn idct_8x8(block: &mut [i32; 64]) {
    if block.iter().all(|&c| c == 0) {
        return;
    }

    let mut tmp = [0.0f64; 64];

    // 列变换
    for x in 0..8 {
        let mut column = [0.0f64; 8];
        for y in 0..8 {
            column[y] = f64::from(block[y * 8 + x]);
        }
        let out = idct_8(&column);
        for y in 0..8 {
            tmp[y * 8 + x] = out[y];
        }
    }

    // 行变换
    for y in 0..8 {
        let mut row = [0.0f64; 8];
        row.copy_from_slice(&tmp[y * 8..y * 8 + 8]);
        let out = idct_8(&row);
        for x in 0..8 {
            block[y * 8 + x] = (out[x].round() as i32).clamp(OUTPUT_MIN, OUTPUT_MAX);
        }
    }
}
