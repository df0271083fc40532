//! 集成测试共用的 MPEG-2 基本流合成器.
//!
//! 只生成解码器支持的子集: 4:2:0 逐行帧图像, 8 位 intra DC 精度,
//! 帧内宏块只携带 DC 系数, 预测宏块使用零运动向量且无残差.

#![allow(dead_code)]

use h262::core::bitwriter::BitWriter;

const SEQUENCE_HEADER_CODE: u8 = 0xB3;
const EXTENSION_START_CODE: u8 = 0xB5;
const USER_DATA_START_CODE: u8 = 0xB2;
const SEQUENCE_END_CODE: u8 = 0xB7;
const GROUP_START_CODE: u8 = 0xB8;
const PICTURE_START_CODE: u8 = 0x00;

/// 表 B-12 亮度 dct_dc_size 码字, 按 size 索引
const LUMA_DC_SIZE_CODES: [&str; 9] = [
    "100", "00", "01", "101", "110", "1110", "11110", "111110", "1111110",
];

/// 表 B-1 macroblock_address_increment 码字, 按增量索引 (1..=15)
const ADDRESS_INCREMENT_CODES: [&str; 16] = [
    "", "1", "011", "010", "0011", "0010", "00011", "00010", "0000111", "0000110", "00001011",
    "00001010", "00001001", "00001000", "00000111", "00000110",
];

/// 图像类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingType {
    I = 1,
    P = 2,
    B = 3,
}

/// 基本流合成器
pub struct StreamBuilder {
    bw: BitWriter,
    width: u32,
    height: u32,
}

impl StreamBuilder {
    /// 以序列头 + 序列扩展开始 (25 fps, 方形像素)
    pub fn new(width: u32, height: u32) -> Self {
        let mut builder = Self {
            bw: BitWriter::new(),
            width,
            height,
        };
        builder.sequence_header();
        builder
    }

    pub fn mb_width(&self) -> usize {
        self.width.div_ceil(16) as usize
    }

    pub fn mb_height(&self) -> usize {
        self.height.div_ceil(16) as usize
    }

    /// 写入 (或重复) 序列头与序列扩展
    pub fn sequence_header(&mut self) -> &mut Self {
        let bw = &mut self.bw;
        bw.write_start_code(SEQUENCE_HEADER_CODE);
        bw.write_bits(self.width & 0xFFF, 12);
        bw.write_bits(self.height & 0xFFF, 12);
        bw.write_bits(1, 4);
        bw.write_bits(3, 4);
        bw.write_bits(0x3FFFF, 18);
        bw.write_bit(1);
        bw.write_bits(112, 10);
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_flag(false);

        bw.write_start_code(EXTENSION_START_CODE);
        bw.write_bits(1, 4);
        bw.write_bits(0x48, 8);
        bw.write_flag(true);
        bw.write_bits(1, 2);
        bw.write_bits(self.width >> 12, 2);
        bw.write_bits(self.height >> 12, 2);
        bw.write_bits(0, 12);
        bw.write_bit(1);
        bw.write_bits(0, 8);
        bw.write_flag(false);
        bw.write_bits(0, 2);
        bw.write_bits(0, 5);
        self
    }

    /// 序列显示扩展 (无色彩描述)
    pub fn sequence_display(&mut self, display_width: u32, display_height: u32) -> &mut Self {
        let bw = &mut self.bw;
        bw.write_start_code(EXTENSION_START_CODE);
        bw.write_bits(2, 4);
        bw.write_bits(5, 3);
        bw.write_flag(false);
        bw.write_bits(display_width, 14);
        bw.write_bit(1);
        bw.write_bits(display_height, 14);
        self
    }

    pub fn user_data(&mut self, payload: &[u8]) -> &mut Self {
        self.bw.write_start_code(USER_DATA_START_CODE);
        self.bw.write_bytes(payload);
        self
    }

    /// GOP 头, 时间码 00:00:seconds:00
    pub fn gop(&mut self, seconds: u32, closed: bool) -> &mut Self {
        let bw = &mut self.bw;
        bw.write_start_code(GROUP_START_CODE);
        bw.write_flag(false);
        bw.write_bits(0, 5);
        bw.write_bits(0, 6);
        bw.write_bit(1);
        bw.write_bits(seconds, 6);
        bw.write_bits(0, 6);
        bw.write_flag(closed);
        bw.write_flag(false);
        self
    }

    fn picture_header(&mut self, coding_type: CodingType, temporal_reference: u32, structure: u32) {
        let bw = &mut self.bw;
        bw.write_start_code(PICTURE_START_CODE);
        bw.write_bits(temporal_reference, 10);
        bw.write_bits(coding_type as u32, 3);
        bw.write_bits(0xFFFF, 16);
        if coding_type != CodingType::I {
            bw.write_flag(false);
            bw.write_bits(7, 3);
        }
        if coding_type == CodingType::B {
            bw.write_flag(false);
            bw.write_bits(7, 3);
        }
        bw.write_flag(false);

        let forward = if coding_type == CodingType::I { 15 } else { 1 };
        bw.write_start_code(EXTENSION_START_CODE);
        bw.write_bits(8, 4);
        bw.write_bits(forward, 4);
        bw.write_bits(forward, 4);
        bw.write_bits(15, 4);
        bw.write_bits(15, 4);
        bw.write_bits(0, 2);
        bw.write_bits(structure, 2);
        bw.write_flag(false);
        bw.write_flag(true); // frame_pred_frame_dct
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_flag(false);
        bw.write_flag(true);
        bw.write_flag(true);
        bw.write_flag(false);
    }

    fn slice_start(&mut self, row: usize, quantiser_scale_code: u32) {
        self.bw.write_start_code(row as u8 + 1);
        self.bw.write_bits(quantiser_scale_code, 5);
        self.bw.write_flag(false);
    }

    fn write_luma_dc_diff(&mut self, diff: i32) {
        let size = 32 - diff.unsigned_abs().leading_zeros();
        self.bw.write_code_str(LUMA_DC_SIZE_CODES[size as usize]);
        if size > 0 {
            let bits = if diff > 0 { diff } else { diff + (1 << size) - 1 };
            self.bw.write_bits(bits as u32, size);
        }
    }

    /// 只含 DC 的帧内宏块: 4 个亮度块为 `luma`, 色度为 128
    fn intra_macroblock(&mut self, increment: usize, mb_type: &str, luma: u8, dc_pred: &mut i32) {
        self.bw.write_code_str(ADDRESS_INCREMENT_CODES[increment]);
        self.bw.write_code_str(mb_type);
        let diff = i32::from(luma) - *dc_pred;
        *dc_pred = i32::from(luma);
        self.write_luma_dc_diff(diff);
        self.bw.write_code_str("10");
        for _ in 0..3 {
            self.bw.write_code_str("100 10");
        }
        for _ in 0..2 {
            self.bw.write_code_str("00 10");
        }
    }

    /// I 图像, 每个宏块的亮度由 `luma(mb_x, mb_y)` 给出, 每行一个 slice
    pub fn intra_picture(
        &mut self,
        temporal_reference: u32,
        luma: impl Fn(usize, usize) -> u8,
    ) -> &mut Self {
        self.picture_header(CodingType::I, temporal_reference, 3);
        for row in 0..self.mb_height() {
            self.slice_start(row, 8);
            let mut dc_pred = 128;
            for col in 0..self.mb_width() {
                self.intra_macroblock(1, "1", luma(col, row), &mut dc_pred);
            }
        }
        self
    }

    /// 全平坦 I 图像
    pub fn flat_intra_picture(&mut self, temporal_reference: u32, luma: u8) -> &mut Self {
        self.intra_picture(temporal_reference, move |_, _| luma)
    }

    /// 预测图像: 每个宏块零运动复制参考帧
    ///
    /// `skip_inner` 为真时每行只编码首尾宏块, 中间宏块以跳过表示.
    pub fn copy_picture(
        &mut self,
        coding_type: CodingType,
        temporal_reference: u32,
        skip_inner: bool,
    ) -> &mut Self {
        assert!(coding_type != CodingType::I, "复制图像必须为 P 或 B");
        // P: "001" 前向预测无残差; B: "0010" 前向预测无残差
        let mb_type = if coding_type == CodingType::P { "001" } else { "0010" };
        self.picture_header(coding_type, temporal_reference, 3);
        let mb_width = self.mb_width();
        for row in 0..self.mb_height() {
            self.slice_start(row, 8);
            let increments: Vec<usize> = if skip_inner && mb_width > 1 {
                vec![1, mb_width - 1]
            } else {
                vec![1; mb_width]
            };
            for increment in increments {
                self.bw.write_code_str(ADDRESS_INCREMENT_CODES[increment]);
                self.bw.write_code_str(mb_type);
                self.bw.write_code_str("1 1");
            }
        }
        self
    }

    /// I 图像头 + 一个 quantiser_scale_code 为 0 的损坏 slice
    pub fn corrupt_intra_picture(&mut self, temporal_reference: u32) -> &mut Self {
        self.picture_header(CodingType::I, temporal_reference, 3);
        self.slice_start(0, 0);
        let mut dc_pred = 128;
        self.intra_macroblock(1, "1", 200, &mut dc_pred);
        self
    }

    /// 场图像头 (不支持的特性)
    pub fn field_picture(&mut self, temporal_reference: u32) -> &mut Self {
        self.picture_header(CodingType::I, temporal_reference, 1);
        self
    }

    pub fn sequence_end(&mut self) -> &mut Self {
        self.bw.write_start_code(SEQUENCE_END_CODE);
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bw).finish()
    }
}

/// 4:2:0 帧的字节数
pub fn yuv420_frame_size(width: usize, height: usize) -> usize {
    width * height + 2 * width.div_ceil(2) * height.div_ceil(2)
}
