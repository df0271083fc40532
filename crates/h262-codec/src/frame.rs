//! 解码输出帧.

use h262_core::{PixelFormat, Rational};

/// 图像编码类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureType {
    /// 帧内编码
    I,
    /// 前向预测
    P,
    /// 双向预测 (本解码器只重建前向部分)
    B,
}

impl std::fmt::Display for PictureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::I => "I",
            Self::P => "P",
            Self::B => "B",
        })
    }
}

/// 一帧 8 位平面 YUV 图像
///
/// 平面按 Y, Cb, Cr 顺序存放, 已裁剪到序列头给出的显示尺寸.
/// `linesize[i]` 为第 i 个平面的行跨度, 不小于该平面的宽度.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub data: Vec<Vec<u8>>,
    pub linesize: Vec<usize>,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// 显示序号 (GOP 基准 + temporal_reference)
    pub pts: i64,
    /// 由序列帧率导出, 帧率未定义时为 `Rational::UNDEFINED`
    pub time_base: Rational,
    pub picture_type: PictureType,
    /// I 图像为 true
    pub is_keyframe: bool,
    /// 由 aspect_ratio_information 与存储尺寸导出
    pub sample_aspect_ratio: Rational,
    pub temporal_reference: u16,
}

impl VideoFrame {
    /// 由紧凑排列 (行跨度等于平面宽度) 的 4:2:0 平面构造
    pub fn from_planes(width: u32, height: u32, planes: [Vec<u8>; 3]) -> Self {
        let format = PixelFormat::Yuv420p;
        let linesize = (0..3)
            .map(|i| format.plane_dimensions(width, height, i).0 as usize)
            .collect();
        Self {
            data: planes.into(),
            linesize,
            width,
            height,
            pixel_format: format,
            pts: 0,
            time_base: Rational::UNDEFINED,
            picture_type: PictureType::I,
            is_keyframe: true,
            sample_aspect_ratio: Rational::new(1, 1),
            temporal_reference: 0,
        }
    }

    /// 全黑 (各平面填 0) 的 4:2:0 帧
    pub fn blank(width: u32, height: u32) -> Self {
        let format = PixelFormat::Yuv420p;
        let plane = |i| {
            let (w, h) = format.plane_dimensions(width, height, i);
            vec![0u8; w as usize * h as usize]
        };
        Self::from_planes(width, height, [plane(0), plane(1), plane(2)])
    }

    /// 所有平面的字节总数
    pub fn data_size(&self) -> usize {
        self.data.iter().map(Vec::len).sum()
    }
}
