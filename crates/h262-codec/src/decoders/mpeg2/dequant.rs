//! 反量化与失配控制

use super::config::MismatchControl;

const COEFF_MIN: i32 = -2048;
const COEFF_MAX: i32 = 2047;

/// 反量化参数
#[derive(Debug, Clone, Copy)]
pub(super) struct QuantParams<'a> {
    /// 光栅顺序的加权矩阵
    pub matrix: &'a [u8; 64],
    /// 实际量化步长 (已按 q_scale_type 查表)
    pub quantiser_scale: i32,
    pub intra: bool,
    pub intra_dc_precision: u8,
    pub mismatch: MismatchControl,
}

/// 将光栅顺序的量化系数 QF 原地反量化为 F
///
/// intra DC: `QF << (3 - intra_dc_precision)`;
/// 其余: `((2QF + k) * W * quantiser_scale) / 32`, 向 0 截断,
/// non-intra 时 k = sign(QF), intra 时 k = 0.
/// 结果饱和到 [-2048, 2047] 后执行失配控制.
pub(super) fn dequantize(coeffs: &mut [i32; 64], params: &QuantParams) {
    let start = if params.intra {
        coeffs[0] <<= 3 - u32::from(params.intra_dc_precision.min(3));
        coeffs[0] = coeffs[0].clamp(COEFF_MIN, COEFF_MAX);
        1
    } else {
        0
    };

    for i in start..64 {
        let qf = coeffs[i];
        if qf == 0 {
            continue;
        }
        let k = if params.intra { 0 } else { qf.signum() };
        let w = i32::from(params.matrix[i]);
        let value = ((2 * qf + k) * w * params.quantiser_scale) / 32;
        coeffs[i] = value.clamp(COEFF_MIN, COEFF_MAX);
    }

    match params.mismatch {
        MismatchControl::Standard => {
            let sum: i32 = coeffs.iter().sum();
            if sum & 1 == 0 {
                coeffs[63] ^= 1;
            }
        }
        MismatchControl::PerCoefficient => {
            for c in coeffs.iter_mut().skip(start) {
                if *c != 0 && *c & 1 == 0 {
                    *c = (*c + c.signum()).clamp(COEFF_MIN, COEFF_MAX);
                }
            }
        }
    }
}
