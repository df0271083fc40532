//! 比特流读取器.
//!
//! 按大端位序 (MSB first) 从字节缓冲区中读取任意位宽的字段, 是所有语法层解析的基础.
//!
//! 读取器只借用输入数据, 读取位置单调递增; `peek_bits` 不会移动读取位置.

use crate::{H262Error, H262Result};

/// 比特流读取器
///
/// # 示例
/// ```
/// use h262_core::bitreader::BitReader;
///
/// let data = [0b1011_0001, 0b0101_0101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.peek_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(12).unwrap(), 0b0001_0101_0101);
/// ```
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 已读取的总位数
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 获取已读取的总位数
    pub fn bits_read(&self) -> usize {
        self.pos
    }

    /// 获取剩余可读位数
    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 当前是否位于字节边界
    pub fn is_aligned(&self) -> bool {
        self.pos % 8 == 0
    }

    /// 获取当前字节位置 (向下取整)
    pub fn byte_position(&self) -> usize {
        self.pos / 8
    }

    /// 窥视 N 个位 (最多 32 位, 不移动位置)
    pub fn peek_bits(&self, n: u32) -> H262Result<u32> {
        if n == 0 {
            return Ok(0);
        }
        if n > 32 {
            return Err(H262Error::InvalidArgument(format!(
                "peek_bits: n={} 超过 32 位",
                n
            )));
        }
        if n as usize > self.bits_left() {
            return Err(H262Error::Eof);
        }

        // 先取出覆盖目标区间的最多 5 个字节, 再移位截取
        let first = self.pos / 8;
        let last = (self.pos + n as usize - 1) / 8;
        let mut window: u64 = 0;
        for &byte in &self.data[first..=last] {
            window = (window << 8) | u64::from(byte);
        }
        let window_bits = (last - first + 1) * 8;
        let shift = window_bits - (self.pos % 8) - n as usize;
        let mask = (1u64 << n) - 1;
        Ok(((window >> shift) & mask) as u32)
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// `n == 0` 时返回 0 且不移动位置.
    pub fn read_bits(&mut self, n: u32) -> H262Result<u32> {
        let value = self.peek_bits(n)?;
        self.pos += n as usize;
        Ok(value)
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> H262Result<u32> {
        self.read_bits(1)
    }

    /// 读取 1 个位并作为布尔标志返回
    pub fn read_flag(&mut self) -> H262Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// 读取有符号整数 (二进制补码)
    pub fn read_bits_signed(&mut self, n: u32) -> H262Result<i32> {
        let val = self.read_bits(n)?;
        if n == 0 {
            return Ok(0);
        }
        if n >= 32 {
            return Ok(val as i32);
        }
        // 符号扩展
        let shift = 32 - n;
        Ok(((val << shift) as i32) >> shift)
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: usize) -> H262Result<()> {
        if n > self.bits_left() {
            return Err(H262Error::Eof);
        }
        self.pos += n;
        Ok(())
    }

    /// 对齐到下一个字节边界
    ///
    /// 如果当前已在字节边界, 则不做任何事.
    pub fn align_to_byte(&mut self) {
        self.pos = self.pos.div_ceil(8) * 8;
    }

    /// 读取并校验 marker_bit (必须为 1)
    pub fn read_marker(&mut self, what: &str) -> H262Result<()> {
        if self.read_bits(1)? != 1 {
            return Err(H262Error::InvalidData(format!("{} 后的 marker_bit 不为 1", what)));
        }
        Ok(())
    }

    /// 剩余的 (最多 n 个) 位是否全为 0
    ///
    /// 用于判断 slice 数据之后是否只剩下起始码前的填充位.
    pub fn next_bits_are_zero(&self, n: u32) -> bool {
        let n = n.min(self.bits_left().min(32) as u32);
        matches!(self.peek_bits(n), Ok(0))
    }

    /// 获取底层数据的引用
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}
