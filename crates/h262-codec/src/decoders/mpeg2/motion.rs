//! 运动向量解码与运动补偿
//!
//! 运动向量以半像素为单位. 亮度直接使用; 色度向量先除以 2 (向 0 截断),
//! 再在色度平面上按半像素解释. 参考帧读取越界时截断到边缘.

use h262_core::bitreader::BitReader;
use h262_core::{H262Error, H262Result};

use super::frame_buffer::FrameBuffer;
use super::types::MotionVector;
use super::vlc::decode_motion_code;

/// 解码一个运动向量分量并与预测值合成
///
/// `delta = sign(code) * ((|code| - 1) * f + residual + 1)` (r_size > 0 且 code != 0),
/// 否则 `delta = code`; 结果折回 `[-16f, 16f - 1]`.
pub(super) fn decode_motion_component(
    reader: &mut BitReader,
    f_code: u8,
    predictor: i32,
) -> H262Result<i32> {
    if !(1..=9).contains(&f_code) {
        return Err(H262Error::InvalidData(format!("f_code 非法: {}", f_code)));
    }
    let r_size = u32::from(f_code - 1);
    let f = 1i32 << r_size;

    let code = decode_motion_code(reader)?;
    let delta = if r_size > 0 && code != 0 {
        let residual = reader.read_bits(r_size)? as i32;
        let magnitude = (code.abs() - 1) * f + residual + 1;
        if code < 0 { -magnitude } else { magnitude }
    } else {
        code
    };

    let low = -16 * f;
    let high = 16 * f - 1;
    let range = 32 * f;
    let mut value = predictor + delta;
    if value < low {
        value += range;
    } else if value > high {
        value -= range;
    }
    Ok(value)
}

/// 解码一个完整运动向量 (水平, 垂直), 更新并返回预测值
pub(super) fn decode_motion_vector(
    reader: &mut BitReader,
    f_code: [u8; 2],
    predictor: &mut MotionVector,
) -> H262Result<MotionVector> {
    predictor.x = decode_motion_component(reader, f_code[0], predictor.x)?;
    predictor.y = decode_motion_component(reader, f_code[1], predictor.y)?;
    Ok(*predictor)
}

/// 色度运动向量: 亮度向量除以 2, 向 0 截断
pub(super) fn chroma_vector(mv: MotionVector) -> MotionVector {
    MotionVector {
        x: mv.x / 2,
        y: mv.y / 2,
    }
}

/// 从参考帧取 8x8 预测块
///
/// `(x0, y0)` 为目标块在平面中的整像素位置, `mv` 为该平面上的半像素向量.
pub(super) fn predict_block(
    reference: &FrameBuffer,
    plane: usize,
    x0: usize,
    y0: usize,
    mv: MotionVector,
) -> [i32; 64] {
    let base_x = x0 as i32 + (mv.x >> 1);
    let base_y = y0 as i32 + (mv.y >> 1);
    let half_x = mv.x & 1 != 0;
    let half_y = mv.y & 1 != 0;

    let mut out = [0i32; 64];
    for dy in 0..8 {
        let y = base_y + dy as i32;
        for dx in 0..8 {
            let x = base_x + dx as i32;
            let a = reference.sample_clamped(plane, x, y);
            out[dy * 8 + dx] = match (half_x, half_y) {
                (false, false) => a,
                (true, false) => (a + reference.sample_clamped(plane, x + 1, y) + 1) >> 1,
                (false, true) => (a + reference.sample_clamped(plane, x, y + 1) + 1) >> 1,
                (true, true) => {
                    let b = reference.sample_clamped(plane, x + 1, y);
                    let c = reference.sample_clamped(plane, x, y + 1);
                    let d = reference.sample_clamped(plane, x + 1, y + 1);
                    (a + b + c + d + 2) >> 2
                }
            };
        }
    }
    out
}
