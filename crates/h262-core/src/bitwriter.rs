//! 比特流写入器.
//!
//! 与 [`BitReader`](crate::bitreader::BitReader) 对应, 按大端位序写入.
//! 解码器本身不需要写位流, 该类型用于测试与工具中合成 H.262 码流片段.

/// 比特流写入器
///
/// # 示例
/// ```
/// use h262_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b1011, 4);
/// bw.write_bits(0b0001, 4);
/// bw.write_start_code(0xB3);
/// assert_eq!(bw.finish(), vec![0b1011_0001, 0x00, 0x00, 0x01, 0xB3]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    /// 已完成的字节
    data: Vec<u8>,
    /// 正在填充的字节
    current_byte: u8,
    /// 当前字节中已填充的位数 (0-7)
    bit_count: u8,
}

impl BitWriter {
    /// 创建新的比特流写入器
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.data.len() * 8 + self.bit_count as usize
    }

    /// 写入 1 个位
    pub fn write_bit(&mut self, bit: u32) {
        self.current_byte = (self.current_byte << 1) | (bit & 1) as u8;
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.data.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// 写入布尔标志
    pub fn write_flag(&mut self, flag: bool) {
        self.write_bit(u32::from(flag));
    }

    /// 写入 N 个位 (最多 32 位), 值的低 N 位有效, 高位在前
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={} 超过 32 位", n);
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1);
        }
    }

    /// 写入有符号整数 (二进制补码, 低 N 位)
    pub fn write_bits_signed(&mut self, value: i32, n: u32) {
        let mask = if n >= 32 { u32::MAX } else { (1u32 << n) - 1 };
        self.write_bits(value as u32 & mask, n);
    }

    /// 写入由 '0'/'1' 字符组成的码字 (其他字符忽略)
    ///
    /// 便于直接按码表文本书写 VLC 码字.
    pub fn write_code_str(&mut self, code: &str) {
        for ch in code.chars() {
            match ch {
                '0' => self.write_bit(0),
                '1' => self.write_bit(1),
                _ => {}
            }
        }
    }

    /// 用 0 填充到下一个字节边界
    pub fn align_to_byte(&mut self) {
        while self.bit_count != 0 {
            self.write_bit(0);
        }
    }

    /// 对齐后写入 4 字节起始码 `00 00 01 xx`
    pub fn write_start_code(&mut self, code: u8) {
        self.align_to_byte();
        self.write_bytes(&[0x00, 0x00, 0x01, code]);
    }

    /// 写入整字节 (非对齐时逐位写入)
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bit_count == 0 {
            self.data.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(u32::from(b), 8);
            }
        }
    }

    /// 结束写入, 补齐最后一个字节并返回数据
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.data
    }
}
