//! 像素格式定义.
//!
//! H.262 的 `chroma_format` 只有 4:2:0, 4:2:2, 4:4:4 三种取值, 均为 8 位平面格式.

use std::fmt;

/// 像素格式 (8 位 YUV 平面格式)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// YUV 4:2:0, 色度平面宽高各减半
    #[default]
    Yuv420p,
    /// YUV 4:2:2, 色度平面宽度减半
    Yuv422p,
    /// YUV 4:4:4, 色度平面与亮度同尺寸
    Yuv444p,
}

impl PixelFormat {
    /// 由序列扩展中的 2 位 chroma_format 字段构造
    ///
    /// 取值 0 为保留值, 返回 `None`.
    pub const fn from_chroma_format(chroma_format: u8) -> Option<Self> {
        match chroma_format {
            1 => Some(Self::Yuv420p),
            2 => Some(Self::Yuv422p),
            3 => Some(Self::Yuv444p),
            _ => None,
        }
    }

    /// 平面数量
    pub const fn plane_count(&self) -> usize {
        3
    }

    /// 色度平面的 (水平, 垂直) 下采样位移
    pub const fn chroma_shift(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p => (1, 1),
            Self::Yuv422p => (1, 0),
            Self::Yuv444p => (0, 0),
        }
    }

    /// 指定平面的 (宽, 高), 下采样时向上取整
    pub fn plane_dimensions(&self, width: u32, height: u32, plane: usize) -> (u32, u32) {
        if plane == 0 {
            return (width, height);
        }
        let (sx, sy) = self.chroma_shift();
        (width.div_ceil(1 << sx), height.div_ceil(1 << sy))
    }

    /// 一帧所有平面的字节总数
    pub fn frame_size(&self, width: u32, height: u32) -> usize {
        (0..self.plane_count())
            .map(|p| {
                let (w, h) = self.plane_dimensions(width, height, p);
                w as usize * h as usize
            })
            .sum()
    }

    /// 格式名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
