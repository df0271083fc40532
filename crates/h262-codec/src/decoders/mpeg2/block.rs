//! 8x8 块级 DCT 系数解码
//!
//! 解码 intra DC 差分与 run-level 系数, 按扫描顺序写入光栅位置 (量化域).

use h262_core::bitreader::BitReader;
use h262_core::{H262Error, H262Result};

use super::vlc::{
    DctSymbol, VlcTable, decode_dc_size, dct_first_table, dct_intra_b15_table, dct_next_table,
};

/// 解码 intra 块的 DC 差分值
///
/// `dct_dc_size` 为 0 时差分为 0; 否则读取 size 位, 最高位为 0 表示负数.
pub(super) fn decode_intra_dc_diff(reader: &mut BitReader, luma: bool) -> H262Result<i32> {
    let size = decode_dc_size(reader, luma)?;
    if size == 0 {
        return Ok(0);
    }
    let value = reader.read_bits(size)? as i32;
    if value & (1 << (size - 1)) == 0 {
        Ok(value - ((1 << size) - 1))
    } else {
        Ok(value)
    }
}

/// 读取一个 DCT 系数符号, 返回 `None` 表示块结束
fn read_run_level(
    reader: &mut BitReader,
    table: &VlcTable<DctSymbol>,
) -> H262Result<Option<(usize, i32)>> {
    match table.decode(reader)? {
        DctSymbol::EndOfBlock => Ok(None),
        DctSymbol::Escape => {
            let run = reader.read_bits(6)? as usize;
            let level = reader.read_bits_signed(12)?;
            if level == 0 || level == -2048 {
                return Err(H262Error::InvalidData(format!(
                    "escape 系数 level 非法: {}",
                    level
                )));
            }
            Ok(Some((run, level)))
        }
        DctSymbol::RunLevel(run, level) => {
            let level = i32::from(level);
            let level = if reader.read_flag()? { -level } else { level };
            Ok(Some((usize::from(run), level)))
        }
    }
}

/// 系数解码上下文
#[derive(Debug, Clone, Copy)]
pub(super) struct CoefficientContext<'a> {
    pub intra: bool,
    /// intra 块使用表 B-15
    pub intra_vlc_format: bool,
    /// 扫描顺序 -> 光栅位置
    pub scan: &'a [usize; 64],
}

/// 解码 run-level 系数直到 EOB
///
/// intra 块从扫描位置 1 开始 (DC 已单独解码), non-intra 块从 0 开始且首个符号使用
/// B-14 首系数形式. 写入位置超出 63 视为码流错误.
pub(super) fn decode_coefficients(
    reader: &mut BitReader,
    ctx: &CoefficientContext,
    coeffs: &mut [i32; 64],
) -> H262Result<()> {
    let next_table = if ctx.intra && ctx.intra_vlc_format {
        dct_intra_b15_table()
    } else {
        dct_next_table()
    };

    let (mut index, mut table) = if ctx.intra {
        (1usize, next_table)
    } else {
        (0usize, dct_first_table())
    };

    while let Some((run, level)) = read_run_level(reader, table)? {
        index += run;
        if index > 63 {
            return Err(H262Error::InvalidData(format!(
                "DCT 系数位置越界: {}",
                index
            )));
        }
        coeffs[ctx.scan[index]] = level;
        index += 1;
        table = next_table;
    }
    Ok(())
}
