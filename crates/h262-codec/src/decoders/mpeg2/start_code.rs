//! 起始码定义与查找
//!
//! 起始码是字节对齐的 `00 00 01 xx`, 其中 `xx` 标识随后语法单元的类型.
//! 起始码查找是唯一的重新同步手段: 任何解析失败都通过查找下一个起始码恢复.

use std::ops::Range;

use h262_core::bitreader::BitReader;

pub(super) const PICTURE_START_CODE: u8 = 0x00;
pub(super) const SLICE_START_CODE_MIN: u8 = 0x01;
pub(super) const SLICE_START_CODE_MAX: u8 = 0xAF;
pub(super) const USER_DATA_START_CODE: u8 = 0xB2;
pub(super) const SEQUENCE_HEADER_CODE: u8 = 0xB3;
pub(super) const SEQUENCE_ERROR_CODE: u8 = 0xB4;
pub(super) const EXTENSION_START_CODE: u8 = 0xB5;
pub(super) const SEQUENCE_END_CODE: u8 = 0xB7;
pub(super) const GROUP_START_CODE: u8 = 0xB8;

/// 是否为 slice 起始码
pub(super) fn is_slice_start_code(code: u8) -> bool {
    (SLICE_START_CODE_MIN..=SLICE_START_CODE_MAX).contains(&code)
}

/// 从 `from` 开始查找 `00 00 01` 前缀, 返回其字节偏移
pub(super) fn find_start_code(data: &[u8], from: usize) -> Option<usize> {
    data.get(from..)?
        .windows(3)
        .position(|w| w == [0x00, 0x00, 0x01])
        .map(|p| p + from)
}

/// 对齐到字节边界后查找并消耗下一个起始码 (含类型字节)
///
/// 返回类型字节; 在数据结束前找不到完整起始码时返回 `None`.
pub(super) fn next_start_code(reader: &mut BitReader) -> Option<u8> {
    reader.align_to_byte();
    let data = reader.data();
    let start = reader.byte_position();
    let offset = find_start_code(data, start)?;
    let code = *data.get(offset + 3)?;
    reader.skip_bits((offset + 4 - start) * 8).ok()?;
    Some(code)
}

/// 一个完整的语法单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Unit {
    /// 起始码类型字节
    pub code: u8,
    /// 单元数据 (类型字节之后到下一个起始码之前) 在缓冲区中的范围
    pub payload: Range<usize>,
}

/// 单元切分结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum UnitScan {
    /// 找到完整单元
    Complete(Unit),
    /// 单元可能尚未接收完整, 需要更多数据
    Incomplete,
    /// 缓冲区中再没有起始码
    Exhausted,
}

/// 从 `from` 开始切出下一个语法单元
///
/// 单元以下一个起始码为界; 若未找到下一个起始码且输入未结束, 则视为不完整.
pub(super) fn scan_unit(data: &[u8], from: usize, input_ended: bool) -> UnitScan {
    let Some(tail) = data.get(from..) else {
        return UnitScan::Exhausted;
    };
    let mut reader = BitReader::new(tail);
    let Some(code) = next_start_code(&mut reader) else {
        // 尾部可能是被截断的起始码前缀
        return if input_ended {
            UnitScan::Exhausted
        } else {
            UnitScan::Incomplete
        };
    };
    let payload_start = from + reader.byte_position();
    match find_start_code(data, payload_start) {
        Some(end) => UnitScan::Complete(Unit {
            code,
            payload: payload_start..end,
        }),
        None if input_ended => UnitScan::Complete(Unit {
            code,
            payload: payload_start..data.len(),
        }),
        None => UnitScan::Incomplete,
    }
}
