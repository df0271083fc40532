//! VLC (变长编码) 前缀树与解码函数
//!
//! 每张码表在首次使用时构建为一棵二叉前缀树, 之后在所有解码器实例之间只读共享.
//! 解码时逐位读取并沿树下降, 到达叶子即得到符号; 走到不存在的分支说明码流损坏.

use std::sync::OnceLock;

use log::error;

use h262_core::bitreader::BitReader;
use h262_core::{H262Error, H262Result};

use super::types::{MacroblockFlags, PictureCodingType};

// ============================================================================
// 前缀树
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Node<T> {
    Empty,
    Branch(u32),
    Leaf(T),
}

/// 二叉前缀码表
#[derive(Debug, Clone)]
pub(super) struct VlcTable<T> {
    /// 节点 0 为根, 每个节点保存 0/1 两个分支
    nodes: Vec<[Node<T>; 2]>,
}

impl<T: Copy> VlcTable<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![[Node::Empty; 2]],
        }
    }

    /// 插入一个码字 (高位先行)
    ///
    /// 码字与已有码字构成前缀关系时返回错误, 码表必须是无前缀的.
    pub fn insert(&mut self, len: u8, code: u32, symbol: T) -> H262Result<()> {
        if len == 0 || len > 32 {
            return Err(H262Error::InvalidArgument(format!("VLC 码长非法: {}", len)));
        }
        let mut node = 0usize;
        for i in (0..u32::from(len)).rev() {
            let bit = ((code >> i) & 1) as usize;
            let last = i == 0;
            match self.nodes[node][bit] {
                Node::Leaf(_) => {
                    return Err(H262Error::Internal(format!(
                        "VLC 码字 {:0width$b} 与已有码字冲突",
                        code,
                        width = len as usize
                    )));
                }
                Node::Branch(_) if last => {
                    return Err(H262Error::Internal(format!(
                        "VLC 码字 {:0width$b} 是已有码字的前缀",
                        code,
                        width = len as usize
                    )));
                }
                Node::Branch(next) => node = next as usize,
                Node::Empty if last => self.nodes[node][bit] = Node::Leaf(symbol),
                Node::Empty => {
                    let next = self.nodes.len();
                    self.nodes.push([Node::Empty; 2]);
                    self.nodes[node][bit] = Node::Branch(next as u32);
                    node = next;
                }
            }
        }
        Ok(())
    }

    /// 由若干组 (位数, 码字, 符号) 构建码表, 遇到冲突即失败
    #[cfg(test)]
    pub fn try_from_entries(groups: &[&[(u8, u32, T)]]) -> H262Result<Self> {
        let mut table = Self::new();
        for entries in groups {
            for &(len, code, symbol) in entries.iter() {
                table.insert(len, code, symbol)?;
            }
        }
        Ok(table)
    }

    /// 构建静态码表, 冲突的码字记录错误后跳过
    fn build(name: &str, groups: &[&[(u8, u32, T)]]) -> Self {
        let mut table = Self::new();
        for entries in groups {
            for &(len, code, symbol) in entries.iter() {
                if let Err(e) = table.insert(len, code, symbol) {
                    error!("构建 {} 失败: {}", name, e);
                }
            }
        }
        table
    }

    /// 逐位下降解码一个符号
    pub fn decode(&self, reader: &mut BitReader) -> H262Result<T> {
        let mut node = 0usize;
        loop {
            let bit = reader.read_bit()? as usize;
            match self.nodes[node][bit] {
                Node::Leaf(symbol) => return Ok(symbol),
                Node::Branch(next) => node = next as usize,
                Node::Empty => {
                    return Err(H262Error::InvalidData(format!(
                        "非法 VLC 码字 (位置 {})",
                        reader.bits_read()
                    )));
                }
            }
        }
    }
}

// ============================================================================
// DCT 系数符号
// ============================================================================

/// DCT 系数表解码结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DctSymbol {
    /// 块结束
    EndOfBlock,
    /// 转义: 后随 6 位 run 与 12 位 level
    Escape,
    /// 普通 (run, |level|), 后随 1 位符号
    RunLevel(u8, u8),
}

const fn rl(run: u8, level: u8) -> DctSymbol {
    DctSymbol::RunLevel(run, level)
}

/// macroblock_address_increment 的 escape 符号
pub(super) const MB_ADDRESS_ESCAPE: u8 = 34;

// ============================================================================
// 码表数据 (ISO/IEC 13818-2 附录 B)
// ============================================================================

/// 表 B-1 macroblock_address_increment, 34 为 escape (累加 33)
const MB_ADDRESS_INCREMENT_VLC: &[(u8, u32, u8)] = &[
    (1, 0b1, 1),
    (3, 0b010, 3),
    (3, 0b011, 2),
    (4, 0b0010, 5),
    (4, 0b0011, 4),
    (5, 0b00010, 7),
    (5, 0b00011, 6),
    (7, 0b0000110, 9),
    (7, 0b0000111, 8),
    (8, 0b00000110, 15),
    (8, 0b00000111, 14),
    (8, 0b00001000, 13),
    (8, 0b00001001, 12),
    (8, 0b00001010, 11),
    (8, 0b00001011, 10),
    (10, 0b0000010010, 21),
    (10, 0b0000010011, 20),
    (10, 0b0000010100, 19),
    (10, 0b0000010101, 18),
    (10, 0b0000010110, 17),
    (10, 0b0000010111, 16),
    (11, 0b00000001000, 34),
    (11, 0b00000011000, 33),
    (11, 0b00000011001, 32),
    (11, 0b00000011010, 31),
    (11, 0b00000011011, 30),
    (11, 0b00000011100, 29),
    (11, 0b00000011101, 28),
    (11, 0b00000011110, 27),
    (11, 0b00000011111, 26),
    (11, 0b00000100000, 25),
    (11, 0b00000100001, 24),
    (11, 0b00000100010, 23),
    (11, 0b00000100011, 22),
];

/// 表 B-2 I 图像 macroblock_type
const MB_TYPE_I_VLC: &[(u8, u32, MacroblockFlags)] = &[
    (1, 0b1, MacroblockFlags::INTRA),
    (2, 0b01, MacroblockFlags::QUANT.union(MacroblockFlags::INTRA)),
];

/// 表 B-3 P 图像 macroblock_type
const MB_TYPE_P_VLC: &[(u8, u32, MacroblockFlags)] = &[
    (1, 0b1, MacroblockFlags::MOTION_FORWARD.union(MacroblockFlags::PATTERN)),
    (2, 0b01, MacroblockFlags::PATTERN),
    (3, 0b001, MacroblockFlags::MOTION_FORWARD),
    (5, 0b00001, MacroblockFlags::QUANT.union(MacroblockFlags::PATTERN)),
    (5, 0b00010, MacroblockFlags::QUANT.union(MacroblockFlags::MOTION_FORWARD).union(MacroblockFlags::PATTERN)),
    (5, 0b00011, MacroblockFlags::INTRA),
    (6, 0b000001, MacroblockFlags::QUANT.union(MacroblockFlags::INTRA)),
];

/// 表 B-4 B 图像 macroblock_type
const MB_TYPE_B_VLC: &[(u8, u32, MacroblockFlags)] = &[
    (2, 0b10, MacroblockFlags::MOTION_FORWARD.union(MacroblockFlags::MOTION_BACKWARD)),
    (2, 0b11, MacroblockFlags::MOTION_FORWARD.union(MacroblockFlags::MOTION_BACKWARD).union(MacroblockFlags::PATTERN)),
    (3, 0b010, MacroblockFlags::MOTION_BACKWARD),
    (3, 0b011, MacroblockFlags::MOTION_BACKWARD.union(MacroblockFlags::PATTERN)),
    (4, 0b0010, MacroblockFlags::MOTION_FORWARD),
    (4, 0b0011, MacroblockFlags::MOTION_FORWARD.union(MacroblockFlags::PATTERN)),
    (5, 0b00010, MacroblockFlags::QUANT.union(MacroblockFlags::MOTION_FORWARD).union(MacroblockFlags::MOTION_BACKWARD).union(MacroblockFlags::PATTERN)),
    (5, 0b00011, MacroblockFlags::INTRA),
    (6, 0b000001, MacroblockFlags::QUANT.union(MacroblockFlags::INTRA)),
    (6, 0b000010, MacroblockFlags::QUANT.union(MacroblockFlags::MOTION_BACKWARD).union(MacroblockFlags::PATTERN)),
    (6, 0b000011, MacroblockFlags::QUANT.union(MacroblockFlags::MOTION_FORWARD).union(MacroblockFlags::PATTERN)),
];

/// 表 B-9 coded_block_pattern (4:2:0 部分)
const CODED_BLOCK_PATTERN_VLC: &[(u8, u32, u8)] = &[
    (3, 0b111, 60),
    (4, 0b1010, 32),
    (4, 0b1011, 16),
    (4, 0b1100, 8),
    (4, 0b1101, 4),
    (5, 0b01000, 62),
    (5, 0b01001, 2),
    (5, 0b01010, 61),
    (5, 0b01011, 1),
    (5, 0b01100, 56),
    (5, 0b01101, 52),
    (5, 0b01110, 44),
    (5, 0b01111, 28),
    (5, 0b10000, 40),
    (5, 0b10001, 20),
    (5, 0b10010, 48),
    (5, 0b10011, 12),
    (6, 0b001100, 63),
    (6, 0b001101, 3),
    (6, 0b001110, 36),
    (6, 0b001111, 24),
    (7, 0b0010000, 34),
    (7, 0b0010001, 18),
    (7, 0b0010010, 10),
    (7, 0b0010011, 6),
    (7, 0b0010100, 33),
    (7, 0b0010101, 17),
    (7, 0b0010110, 9),
    (7, 0b0010111, 5),
    (8, 0b00000100, 58),
    (8, 0b00000101, 54),
    (8, 0b00000110, 46),
    (8, 0b00000111, 30),
    (8, 0b00001000, 57),
    (8, 0b00001001, 53),
    (8, 0b00001010, 45),
    (8, 0b00001011, 29),
    (8, 0b00001100, 38),
    (8, 0b00001101, 26),
    (8, 0b00001110, 37),
    (8, 0b00001111, 25),
    (8, 0b00010000, 43),
    (8, 0b00010001, 23),
    (8, 0b00010010, 51),
    (8, 0b00010011, 15),
    (8, 0b00010100, 42),
    (8, 0b00010101, 22),
    (8, 0b00010110, 50),
    (8, 0b00010111, 14),
    (8, 0b00011000, 41),
    (8, 0b00011001, 21),
    (8, 0b00011010, 49),
    (8, 0b00011011, 13),
    (8, 0b00011100, 35),
    (8, 0b00011101, 19),
    (8, 0b00011110, 11),
    (8, 0b00011111, 7),
    (9, 0b000000001, 0),
    (9, 0b000000010, 39),
    (9, 0b000000011, 27),
    (9, 0b000000100, 59),
    (9, 0b000000101, 55),
    (9, 0b000000110, 47),
    (9, 0b000000111, 31),
];

/// 表 B-10 motion_code (符号已包含在码字中)
const MOTION_CODE_VLC: &[(u8, u32, i8)] = &[
    (1, 0b1, 0),
    (3, 0b010, 1),
    (3, 0b011, -1),
    (4, 0b0010, 2),
    (4, 0b0011, -2),
    (5, 0b00010, 3),
    (5, 0b00011, -3),
    (7, 0b0000110, 4),
    (7, 0b0000111, -4),
    (8, 0b00000110, 7),
    (8, 0b00000111, -7),
    (8, 0b00001000, 6),
    (8, 0b00001001, -6),
    (8, 0b00001010, 5),
    (8, 0b00001011, -5),
    (10, 0b0000010010, 10),
    (10, 0b0000010011, -10),
    (10, 0b0000010100, 9),
    (10, 0b0000010101, -9),
    (10, 0b0000010110, 8),
    (10, 0b0000010111, -8),
    (11, 0b00000011000, 16),
    (11, 0b00000011001, -16),
    (11, 0b00000011010, 15),
    (11, 0b00000011011, -15),
    (11, 0b00000011100, 14),
    (11, 0b00000011101, -14),
    (11, 0b00000011110, 13),
    (11, 0b00000011111, -13),
    (11, 0b00000100000, 12),
    (11, 0b00000100001, -12),
    (11, 0b00000100010, 11),
    (11, 0b00000100011, -11),
];

/// 表 B-12 dct_dc_size_luminance
const DCT_DC_SIZE_LUMA_VLC: &[(u8, u32, u8)] = &[
    (2, 0b00, 1),
    (2, 0b01, 2),
    (3, 0b100, 0),
    (3, 0b101, 3),
    (3, 0b110, 4),
    (4, 0b1110, 5),
    (5, 0b11110, 6),
    (6, 0b111110, 7),
    (7, 0b1111110, 8),
    (8, 0b11111110, 9),
    (9, 0b111111110, 10),
    (9, 0b111111111, 11),
];

/// 表 B-13 dct_dc_size_chrominance
const DCT_DC_SIZE_CHROMA_VLC: &[(u8, u32, u8)] = &[
    (2, 0b00, 0),
    (2, 0b01, 1),
    (2, 0b10, 2),
    (3, 0b110, 3),
    (4, 0b1110, 4),
    (5, 0b11110, 5),
    (6, 0b111110, 6),
    (7, 0b1111110, 7),
    (8, 0b11111110, 8),
    (9, 0b111111110, 9),
    (10, 0b1111111110, 10),
    (10, 0b1111111111, 11),
];

/// 表 B-14 中首系数与后续系数共用的码字 (不含符号位)
const DCT_COEFF_B14_COMMON: &[(u8, u32, DctSymbol)] = &[
    (3, 0b011, rl(1, 1)),
    (4, 0b0100, rl(0, 2)),
    (4, 0b0101, rl(2, 1)),
    (5, 0b00101, rl(0, 3)),
    (5, 0b00110, rl(4, 1)),
    (5, 0b00111, rl(3, 1)),
    (6, 0b000001, DctSymbol::Escape),
    (6, 0b000100, rl(7, 1)),
    (6, 0b000101, rl(6, 1)),
    (6, 0b000110, rl(1, 2)),
    (6, 0b000111, rl(5, 1)),
    (7, 0b0000100, rl(2, 2)),
    (7, 0b0000101, rl(9, 1)),
    (7, 0b0000110, rl(0, 4)),
    (7, 0b0000111, rl(8, 1)),
    (8, 0b00100000, rl(13, 1)),
    (8, 0b00100001, rl(0, 6)),
    (8, 0b00100010, rl(12, 1)),
    (8, 0b00100011, rl(11, 1)),
    (8, 0b00100100, rl(3, 2)),
    (8, 0b00100101, rl(1, 3)),
    (8, 0b00100110, rl(0, 5)),
    (8, 0b00100111, rl(10, 1)),
    (10, 0b0000001000, rl(16, 1)),
    (10, 0b0000001001, rl(5, 2)),
    (10, 0b0000001010, rl(0, 7)),
    (10, 0b0000001011, rl(2, 3)),
    (10, 0b0000001100, rl(1, 4)),
    (10, 0b0000001101, rl(15, 1)),
    (10, 0b0000001110, rl(14, 1)),
    (10, 0b0000001111, rl(4, 2)),
    (12, 0b000000010000, rl(0, 11)),
    (12, 0b000000010001, rl(8, 2)),
    (12, 0b000000010010, rl(4, 3)),
    (12, 0b000000010011, rl(0, 10)),
    (12, 0b000000010100, rl(2, 4)),
    (12, 0b000000010101, rl(7, 2)),
    (12, 0b000000010110, rl(21, 1)),
    (12, 0b000000010111, rl(20, 1)),
    (12, 0b000000011000, rl(0, 9)),
    (12, 0b000000011001, rl(19, 1)),
    (12, 0b000000011010, rl(18, 1)),
    (12, 0b000000011011, rl(1, 5)),
    (12, 0b000000011100, rl(3, 3)),
    (12, 0b000000011101, rl(0, 8)),
    (12, 0b000000011110, rl(6, 2)),
    (12, 0b000000011111, rl(17, 1)),
    (13, 0b0000000010000, rl(10, 2)),
    (13, 0b0000000010001, rl(9, 2)),
    (13, 0b0000000010010, rl(5, 3)),
    (13, 0b0000000010011, rl(3, 4)),
    (13, 0b0000000010100, rl(2, 5)),
    (13, 0b0000000010101, rl(1, 7)),
    (13, 0b0000000010110, rl(1, 6)),
    (13, 0b0000000010111, rl(0, 15)),
    (13, 0b0000000011000, rl(0, 14)),
    (13, 0b0000000011001, rl(0, 13)),
    (13, 0b0000000011010, rl(0, 12)),
    (13, 0b0000000011011, rl(26, 1)),
    (13, 0b0000000011100, rl(25, 1)),
    (13, 0b0000000011101, rl(24, 1)),
    (13, 0b0000000011110, rl(23, 1)),
    (13, 0b0000000011111, rl(22, 1)),
    (14, 0b00000000010000, rl(0, 31)),
    (14, 0b00000000010001, rl(0, 30)),
    (14, 0b00000000010010, rl(0, 29)),
    (14, 0b00000000010011, rl(0, 28)),
    (14, 0b00000000010100, rl(0, 27)),
    (14, 0b00000000010101, rl(0, 26)),
    (14, 0b00000000010110, rl(0, 25)),
    (14, 0b00000000010111, rl(0, 24)),
    (14, 0b00000000011000, rl(0, 23)),
    (14, 0b00000000011001, rl(0, 22)),
    (14, 0b00000000011010, rl(0, 21)),
    (14, 0b00000000011011, rl(0, 20)),
    (14, 0b00000000011100, rl(0, 19)),
    (14, 0b00000000011101, rl(0, 18)),
    (14, 0b00000000011110, rl(0, 17)),
    (14, 0b00000000011111, rl(0, 16)),
    (15, 0b000000000010000, rl(0, 40)),
    (15, 0b000000000010001, rl(0, 39)),
    (15, 0b000000000010010, rl(0, 38)),
    (15, 0b000000000010011, rl(0, 37)),
    (15, 0b000000000010100, rl(0, 36)),
    (15, 0b000000000010101, rl(0, 35)),
    (15, 0b000000000010110, rl(0, 34)),
    (15, 0b000000000010111, rl(0, 33)),
    (15, 0b000000000011000, rl(0, 32)),
    (15, 0b000000000011001, rl(1, 14)),
    (15, 0b000000000011010, rl(1, 13)),
    (15, 0b000000000011011, rl(1, 12)),
    (15, 0b000000000011100, rl(1, 11)),
    (15, 0b000000000011101, rl(1, 10)),
    (15, 0b000000000011110, rl(1, 9)),
    (15, 0b000000000011111, rl(1, 8)),
    (16, 0b0000000000010000, rl(1, 18)),
    (16, 0b0000000000010001, rl(1, 17)),
    (16, 0b0000000000010010, rl(1, 16)),
    (16, 0b0000000000010011, rl(1, 15)),
    (16, 0b0000000000010100, rl(6, 3)),
    (16, 0b0000000000010101, rl(16, 2)),
    (16, 0b0000000000010110, rl(15, 2)),
    (16, 0b0000000000010111, rl(14, 2)),
    (16, 0b0000000000011000, rl(13, 2)),
    (16, 0b0000000000011001, rl(12, 2)),
    (16, 0b0000000000011010, rl(11, 2)),
    (16, 0b0000000000011011, rl(31, 1)),
    (16, 0b0000000000011100, rl(30, 1)),
    (16, 0b0000000000011101, rl(29, 1)),
    (16, 0b0000000000011110, rl(28, 1)),
    (16, 0b0000000000011111, rl(27, 1)),
];

/// 表 B-15 (intra_vlc_format = 1 时的 intra 块 AC 系数)
const DCT_COEFF_B15: &[(u8, u32, DctSymbol)] = &[
    (2, 0b10, rl(0, 1)),
    (3, 0b010, rl(1, 1)),
    (3, 0b110, rl(0, 2)),
    (4, 0b0110, DctSymbol::EndOfBlock),
    (4, 0b0111, rl(0, 3)),
    (5, 0b00101, rl(2, 1)),
    (5, 0b00110, rl(1, 2)),
    (5, 0b00111, rl(3, 1)),
    (5, 0b11100, rl(0, 4)),
    (5, 0b11101, rl(0, 5)),
    (6, 0b000001, DctSymbol::Escape),
    (6, 0b000100, rl(0, 7)),
    (6, 0b000101, rl(0, 6)),
    (6, 0b000110, rl(4, 1)),
    (6, 0b000111, rl(5, 1)),
    (7, 0b0000100, rl(7, 1)),
    (7, 0b0000101, rl(8, 1)),
    (7, 0b0000110, rl(6, 1)),
    (7, 0b0000111, rl(2, 2)),
    (7, 0b1111000, rl(9, 1)),
    (7, 0b1111001, rl(1, 3)),
    (7, 0b1111010, rl(10, 1)),
    (7, 0b1111011, rl(0, 8)),
    (7, 0b1111100, rl(0, 9)),
    (8, 0b00100000, rl(1, 5)),
    (8, 0b00100001, rl(11, 1)),
    (8, 0b00100010, rl(0, 11)),
    (8, 0b00100011, rl(0, 10)),
    (8, 0b00100100, rl(13, 1)),
    (8, 0b00100101, rl(12, 1)),
    (8, 0b00100110, rl(3, 2)),
    (8, 0b00100111, rl(1, 4)),
    (8, 0b11111010, rl(0, 12)),
    (8, 0b11111011, rl(0, 13)),
    (8, 0b11111100, rl(2, 3)),
    (8, 0b11111101, rl(4, 2)),
    (8, 0b11111110, rl(0, 14)),
    (8, 0b11111111, rl(0, 15)),
    (9, 0b000000100, rl(5, 2)),
    (9, 0b000000101, rl(14, 1)),
    (9, 0b000000111, rl(15, 1)),
    (10, 0b0000001100, rl(2, 4)),
    (10, 0b0000001101, rl(16, 1)),
    (12, 0b000000010001, rl(8, 2)),
    (12, 0b000000010010, rl(4, 3)),
    (12, 0b000000010101, rl(7, 2)),
    (12, 0b000000010110, rl(21, 1)),
    (12, 0b000000010111, rl(20, 1)),
    (12, 0b000000011001, rl(19, 1)),
    (12, 0b000000011010, rl(18, 1)),
    (12, 0b000000011100, rl(3, 3)),
    (12, 0b000000011110, rl(6, 2)),
    (12, 0b000000011111, rl(17, 1)),
    (13, 0b0000000010000, rl(10, 2)),
    (13, 0b0000000010001, rl(9, 2)),
    (13, 0b0000000010010, rl(5, 3)),
    (13, 0b0000000010011, rl(3, 4)),
    (13, 0b0000000010100, rl(2, 5)),
    (13, 0b0000000010101, rl(1, 7)),
    (13, 0b0000000010110, rl(1, 6)),
    (13, 0b0000000011011, rl(26, 1)),
    (13, 0b0000000011100, rl(25, 1)),
    (13, 0b0000000011101, rl(24, 1)),
    (13, 0b0000000011110, rl(23, 1)),
    (13, 0b0000000011111, rl(22, 1)),
    (14, 0b00000000010000, rl(0, 31)),
    (14, 0b00000000010001, rl(0, 30)),
    (14, 0b00000000010010, rl(0, 29)),
    (14, 0b00000000010011, rl(0, 28)),
    (14, 0b00000000010100, rl(0, 27)),
    (14, 0b00000000010101, rl(0, 26)),
    (14, 0b00000000010110, rl(0, 25)),
    (14, 0b00000000010111, rl(0, 24)),
    (14, 0b00000000011000, rl(0, 23)),
    (14, 0b00000000011001, rl(0, 22)),
    (14, 0b00000000011010, rl(0, 21)),
    (14, 0b00000000011011, rl(0, 20)),
    (14, 0b00000000011100, rl(0, 19)),
    (14, 0b00000000011101, rl(0, 18)),
    (14, 0b00000000011110, rl(0, 17)),
    (14, 0b00000000011111, rl(0, 16)),
    (15, 0b000000000010000, rl(0, 40)),
    (15, 0b000000000010001, rl(0, 39)),
    (15, 0b000000000010010, rl(0, 38)),
    (15, 0b000000000010011, rl(0, 37)),
    (15, 0b000000000010100, rl(0, 36)),
    (15, 0b000000000010101, rl(0, 35)),
    (15, 0b000000000010110, rl(0, 34)),
    (15, 0b000000000010111, rl(0, 33)),
    (15, 0b000000000011000, rl(0, 32)),
    (15, 0b000000000011001, rl(1, 14)),
    (15, 0b000000000011010, rl(1, 13)),
    (15, 0b000000000011011, rl(1, 12)),
    (15, 0b000000000011100, rl(1, 11)),
    (15, 0b000000000011101, rl(1, 10)),
    (15, 0b000000000011110, rl(1, 9)),
    (15, 0b000000000011111, rl(1, 8)),
    (16, 0b0000000000010000, rl(1, 18)),
    (16, 0b0000000000010001, rl(1, 17)),
    (16, 0b0000000000010010, rl(1, 16)),
    (16, 0b0000000000010011, rl(1, 15)),
    (16, 0b0000000000010100, rl(6, 3)),
    (16, 0b0000000000010101, rl(16, 2)),
    (16, 0b0000000000010110, rl(15, 2)),
    (16, 0b0000000000010111, rl(14, 2)),
    (16, 0b0000000000011000, rl(13, 2)),
    (16, 0b0000000000011001, rl(12, 2)),
    (16, 0b0000000000011010, rl(11, 2)),
    (16, 0b0000000000011011, rl(31, 1)),
    (16, 0b0000000000011100, rl(30, 1)),
    (16, 0b0000000000011101, rl(29, 1)),
    (16, 0b0000000000011110, rl(28, 1)),
    (16, 0b0000000000011111, rl(27, 1)),
];

/// 表 B-14 非 intra 块首系数专用码字: `1s` 表示 (0, 1)
const DCT_COEFF_B14_FIRST: &[(u8, u32, DctSymbol)] = &[(1, 0b1, rl(0, 1))];

/// 表 B-14 后续系数专用码字: `10` 为 EOB, `11s` 表示 (0, 1)
const DCT_COEFF_B14_NEXT: &[(u8, u32, DctSymbol)] =
    &[(2, 0b10, DctSymbol::EndOfBlock), (2, 0b11, rl(0, 1))];

// ============================================================================
// 共享码表实例
// ============================================================================

macro_rules! lazy_table {
    ($fn_name:ident, $ty:ty, $name:literal, [$($group:expr),+ $(,)?]) => {
        pub(super) fn $fn_name() -> &'static VlcTable<$ty> {
            static TABLE: OnceLock<VlcTable<$ty>> = OnceLock::new();
            TABLE.get_or_init(|| VlcTable::build($name, &[$($group),+]))
        }
    };
}

lazy_table!(mb_address_increment_table, u8, "B-1", [MB_ADDRESS_INCREMENT_VLC]);
lazy_table!(mb_type_i_table, MacroblockFlags, "B-2", [MB_TYPE_I_VLC]);
lazy_table!(mb_type_p_table, MacroblockFlags, "B-3", [MB_TYPE_P_VLC]);
lazy_table!(mb_type_b_table, MacroblockFlags, "B-4", [MB_TYPE_B_VLC]);
lazy_table!(coded_block_pattern_table, u8, "B-9", [CODED_BLOCK_PATTERN_VLC]);
lazy_table!(motion_code_table, i8, "B-10", [MOTION_CODE_VLC]);
lazy_table!(dc_size_luma_table, u8, "B-12", [DCT_DC_SIZE_LUMA_VLC]);
lazy_table!(dc_size_chroma_table, u8, "B-13", [DCT_DC_SIZE_CHROMA_VLC]);
lazy_table!(
    dct_first_table,
    DctSymbol,
    "B-14 (首系数)",
    [DCT_COEFF_B14_COMMON, DCT_COEFF_B14_FIRST]
);
lazy_table!(
    dct_next_table,
    DctSymbol,
    "B-14",
    [DCT_COEFF_B14_COMMON, DCT_COEFF_B14_NEXT]
);
lazy_table!(dct_intra_b15_table, DctSymbol, "B-15", [DCT_COEFF_B15]);

// ============================================================================
// 解码函数
// ============================================================================

/// 解码 macroblock_address_increment, 吸收 escape (每个 +33)
pub(super) fn decode_mb_address_increment(reader: &mut BitReader) -> H262Result<u32> {
    let table = mb_address_increment_table();
    let mut increment = 0u32;
    loop {
        let value = table.decode(reader)?;
        if value >= MB_ADDRESS_ESCAPE {
            increment += 33;
            continue;
        }
        return Ok(increment + u32::from(value));
    }
}

/// 按图像类型解码 macroblock_type
pub(super) fn decode_mb_type(
    reader: &mut BitReader,
    coding_type: PictureCodingType,
) -> H262Result<MacroblockFlags> {
    match coding_type {
        PictureCodingType::I => mb_type_i_table().decode(reader),
        PictureCodingType::P => mb_type_p_table().decode(reader),
        PictureCodingType::B => mb_type_b_table().decode(reader),
        PictureCodingType::D => Err(H262Error::Unsupported("D 图像".into())),
    }
}

/// 解码 coded_block_pattern (4:2:0 的 6 位部分)
pub(super) fn decode_coded_block_pattern(reader: &mut BitReader) -> H262Result<u32> {
    coded_block_pattern_table().decode(reader).map(u32::from)
}

/// 解码 motion_code (-16..=16)
pub(super) fn decode_motion_code(reader: &mut BitReader) -> H262Result<i32> {
    motion_code_table().decode(reader).map(i32::from)
}

/// 解码 dct_dc_size
pub(super) fn decode_dc_size(reader: &mut BitReader, luma: bool) -> H262Result<u32> {
    let table = if luma {
        dc_size_luma_table()
    } else {
        dc_size_chroma_table()
    };
    table.decode(reader).map(u32::from)
}
