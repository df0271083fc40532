//! 解码帧缓冲
//!
//! 平面 YUV 4:2:0 存储, 行跨度等于平面宽度. 色度平面尺寸为亮度的一半 (向上取整).

use h262_core::{PixelFormat, Rational};

use crate::frame::{PictureType, VideoFrame};

/// 平面索引
pub(super) const PLANE_Y: usize = 0;

/// 解码中的帧或已完成的参考帧
#[derive(Debug, Clone)]
pub(super) struct FrameBuffer {
    width: usize,
    height: usize,
    planes: [Vec<u8>; 3],
    dims: [(usize, usize); 3],
}

impl FrameBuffer {
    /// 分配指定尺寸的帧, 所有样本初始化为 `fill`
    pub(super) fn new(width: u32, height: u32, fill: u8) -> Self {
        let mut dims = [(0usize, 0usize); 3];
        let mut planes: [Vec<u8>; 3] = Default::default();
        for (i, plane) in planes.iter_mut().enumerate() {
            let (w, h) = PixelFormat::Yuv420p.plane_dimensions(width, height, i);
            dims[i] = (w as usize, h as usize);
            *plane = vec![fill; w as usize * h as usize];
        }
        Self {
            width: width as usize,
            height: height as usize,
            planes,
            dims,
        }
    }

    pub(super) fn width(&self) -> usize {
        self.width
    }

    pub(super) fn height(&self) -> usize {
        self.height
    }

    /// 平面尺寸 (宽, 高)
    pub(super) fn plane_size(&self, plane: usize) -> (usize, usize) {
        self.dims[plane]
    }

    pub(super) fn plane(&self, plane: usize) -> &[u8] {
        &self.planes[plane]
    }

    /// 读取样本, 坐标截断到平面边缘
    pub(super) fn sample_clamped(&self, plane: usize, x: i32, y: i32) -> i32 {
        let (w, h) = self.dims[plane];
        let x = x.clamp(0, w as i32 - 1) as usize;
        let y = y.clamp(0, h as i32 - 1) as usize;
        i32::from(self.planes[plane][y * w + x])
    }

    /// 写入一个 8x8 块, 值截断到 0..=255, 平面外的样本跳过
    pub(super) fn put_block(&mut self, plane: usize, x0: usize, y0: usize, block: &[i32; 64]) {
        let (w, h) = self.dims[plane];
        let data = &mut self.planes[plane];
        for dy in 0..8 {
            let y = y0 + dy;
            if y >= h {
                break;
            }
            for dx in 0..8 {
                let x = x0 + dx;
                if x >= w {
                    break;
                }
                data[y * w + x] = block[dy * 8 + dx].clamp(0, 255) as u8;
            }
        }
    }

    /// 导出为输出帧
    pub(super) fn to_video_frame(&self, info: &FrameInfo) -> VideoFrame {
        let mut frame =
            VideoFrame::from_planes(self.width as u32, self.height as u32, self.planes.clone());
        frame.pts = info.pts;
        frame.time_base = info.time_base;
        frame.is_keyframe = info.picture_type == PictureType::I;
        frame.picture_type = info.picture_type;
        frame.sample_aspect_ratio = info.sample_aspect_ratio;
        frame.temporal_reference = info.temporal_reference;
        frame
    }
}

/// 输出帧的元数据
#[derive(Debug, Clone, Copy)]
pub(super) struct FrameInfo {
    pub picture_type: PictureType,
    pub temporal_reference: u16,
    pub pts: i64,
    pub time_base: Rational,
    pub sample_aspect_ratio: Rational,
}
