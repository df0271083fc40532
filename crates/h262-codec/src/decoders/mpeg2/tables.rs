//! 常量表: 扫描顺序, 默认量化矩阵, quantiser_scale 映射, 帧率表

use h262_core::Rational;

/// Zig-zag 扫描: 扫描序号 -> 光栅位置 (行 * 8 + 列)
pub(super) const ZIGZAG_SCAN: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// 交替扫描 (alternate_scan = 1): 扫描序号 -> 光栅位置
pub(super) const ALTERNATE_SCAN: [usize; 64] = [
    0, 8, 16, 24, 1, 9, 2, 10, 17, 25, 32, 40, 48, 56, 57, 49, 41, 33, 26, 18, 3, 11, 4, 12, 19,
    27, 34, 42, 50, 58, 35, 43, 51, 59, 20, 28, 5, 13, 6, 14, 21, 29, 36, 44, 52, 60, 37, 45, 53,
    61, 22, 30, 7, 15, 23, 31, 38, 46, 54, 62, 39, 47, 55, 63,
];

/// 默认 intra 量化矩阵 (光栅顺序)
pub(super) const DEFAULT_INTRA_MATRIX: [u8; 64] = [
    8, 16, 19, 22, 26, 27, 29, 34, //
    16, 16, 22, 24, 27, 29, 34, 37, //
    19, 22, 26, 27, 29, 34, 34, 38, //
    22, 22, 26, 27, 29, 34, 37, 40, //
    22, 26, 27, 29, 32, 35, 40, 48, //
    26, 27, 29, 32, 35, 40, 48, 58, //
    26, 27, 29, 34, 38, 46, 56, 69, //
    27, 29, 35, 38, 46, 56, 69, 83,
];

/// 默认 non-intra 量化矩阵 (全 16)
pub(super) const DEFAULT_NON_INTRA_MATRIX: [u8; 64] = [16; 64];

/// quantiser_scale_code -> quantiser_scale, q_scale_type = 1 时使用
pub(super) const NON_LINEAR_QUANTISER_SCALE: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 12, 14, 16, 18, 20, 22, 24, 28, 32, 36, 40, 44, 48, 52, 56, 64,
    72, 80, 88, 96, 104, 112,
];

/// 按 q_scale_type 将 5 位 quantiser_scale_code 映射为实际量化步长
pub(super) fn quantiser_scale(q_scale_type: bool, code: u8) -> i32 {
    let code = (code & 0x1F) as usize;
    if q_scale_type {
        i32::from(NON_LINEAR_QUANTISER_SCALE[code])
    } else {
        (code as i32) * 2
    }
}

/// frame_rate_code -> 帧率, 0 与 9-15 为保留值
pub(super) fn frame_rate(code: u8) -> Option<Rational> {
    let (num, den) = match code {
        1 => (24000, 1001),
        2 => (24, 1),
        3 => (25, 1),
        4 => (30000, 1001),
        5 => (30, 1),
        6 => (50, 1),
        7 => (60000, 1001),
        8 => (60, 1),
        _ => return None,
    };
    Some(Rational::new(num, den))
}

/// aspect_ratio_information -> 显示宽高比 (DAR)
///
/// 1 表示方形像素, 返回 `None` 由调用方按 1:1 处理.
pub(super) fn display_aspect_ratio(code: u8) -> Option<Rational> {
    match code {
        2 => Some(Rational::new(4, 3)),
        3 => Some(Rational::new(16, 9)),
        4 => Some(Rational::new(221, 100)),
        _ => None,
    }
}
