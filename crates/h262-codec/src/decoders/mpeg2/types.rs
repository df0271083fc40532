//! MPEG-2 视频解码器类型定义

use bitflags::bitflags;

use crate::frame::PictureType;

/// picture_coding_type (3 位)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureCodingType {
    /// 帧内编码
    I,
    /// 前向预测
    P,
    /// 双向预测
    B,
    /// 仅 DC 图像 (MPEG-1 遗留)
    D,
}

impl PictureCodingType {
    pub(super) fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::I),
            2 => Some(Self::P),
            3 => Some(Self::B),
            4 => Some(Self::D),
            _ => None,
        }
    }

    /// 是否可作为后续图像的参考 (锚点) 帧
    pub(super) fn is_anchor(self) -> bool {
        matches!(self, Self::I | Self::P)
    }
}

impl From<PictureCodingType> for PictureType {
    fn from(value: PictureCodingType) -> Self {
        match value {
            PictureCodingType::I | PictureCodingType::D => PictureType::I,
            PictureCodingType::P => PictureType::P,
            PictureCodingType::B => PictureType::B,
        }
    }
}

/// picture_structure (2 位)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureStructure {
    TopField,
    BottomField,
    Frame,
}

impl PictureStructure {
    pub(super) fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::TopField),
            2 => Some(Self::BottomField),
            3 => Some(Self::Frame),
            _ => None,
        }
    }
}

/// chroma_format (2 位)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaFormat {
    Yuv420,
    Yuv422,
    Yuv444,
}

impl ChromaFormat {
    pub(super) fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Yuv420),
            2 => Some(Self::Yuv422),
            3 => Some(Self::Yuv444),
            _ => None,
        }
    }

    /// 每个宏块包含的块数 (4 个亮度块 + 色度块)
    pub(super) const fn block_count(self) -> usize {
        match self {
            Self::Yuv420 => 6,
            Self::Yuv422 => 8,
            Self::Yuv444 => 12,
        }
    }
}

bitflags! {
    /// macroblock_type 解码得到的标志集合
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) struct MacroblockFlags: u8 {
        const QUANT = 0x10;
        const MOTION_FORWARD = 0x08;
        const MOTION_BACKWARD = 0x04;
        const PATTERN = 0x02;
        const INTRA = 0x01;
    }
}

impl MacroblockFlags {
    pub(super) fn is_intra(self) -> bool {
        self.contains(Self::INTRA)
    }

    /// 是否带运动补偿 (前向或后向)
    pub(super) fn has_motion(self) -> bool {
        self.intersects(Self::MOTION_FORWARD | Self::MOTION_BACKWARD)
    }
}

/// 运动向量 (半像素单位)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct MotionVector {
    pub x: i32,
    pub y: i32,
}

impl MotionVector {
    pub const ZERO: Self = Self { x: 0, y: 0 };
}

/// 解码器所处的语法阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DecodeState {
    /// 尚未获得序列头与序列扩展
    AwaitingSequence,
    /// 等待下一个 picture 起始码
    AwaitingPicture,
    /// 正在接收当前图像的 slice
    DecodingSlices,
    /// 输入已结束并排空
    End,
    /// 遇到不支持的特性, 停止重建
    Failed(String),
}
