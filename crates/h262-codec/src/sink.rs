//! 帧输出 (Frame sink).
//!
//! 解码得到的帧交给 [`FrameSink`] 处理. 内置两种实现:
//! - [`RawYuvWriter`]: 按 Y, U, V 平面顺序写出原始字节
//! - `Vec<VideoFrame>`: 收集到内存

use std::io::Write;

use log::debug;

use h262_core::{H262Error, H262Result};

use crate::decoder::Decoder;
use crate::decoders::mpeg2::{DecoderOptions, Mpeg2Decoder};
use crate::frame::VideoFrame;
use crate::packet::Packet;

/// 帧输出目标
pub trait FrameSink {
    /// 写出一帧
    fn write_frame(&mut self, frame: &VideoFrame) -> H262Result<()>;
}

impl FrameSink for Vec<VideoFrame> {
    fn write_frame(&mut self, frame: &VideoFrame) -> H262Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// 原始 YUV 写出器
///
/// 每帧依次写出各平面的有效像素 (按平面宽度逐行, 不含行尾填充).
pub struct RawYuvWriter<W: Write> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> RawYuvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    /// 已写出的帧数
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// 刷新并取回内部写入器
    pub fn into_inner(mut self) -> H262Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> FrameSink for RawYuvWriter<W> {
    fn write_frame(&mut self, frame: &VideoFrame) -> H262Result<()> {
        for (i, plane) in frame.data.iter().enumerate() {
            let (width, height) = frame
                .pixel_format
                .plane_dimensions(frame.width, frame.height, i);
            let (width, height) = (width as usize, height as usize);
            if width == 0 || height == 0 {
                continue;
            }
            let stride = frame.linesize[i];
            if stride < width || plane.len() < stride * height {
                return Err(H262Error::InvalidArgument(format!(
                    "平面 {} 数据不足: stride={}, len={}, 需要 {}x{}",
                    i,
                    stride,
                    plane.len(),
                    width,
                    height
                )));
            }
            for row in plane.chunks(stride).take(height) {
                self.writer.write_all(&row[..width])?;
            }
        }
        self.frames_written += 1;
        Ok(())
    }
}

/// 解码整段基本流并写入输出目标, 返回输出帧数
///
/// 码流中的不支持特性会在已输出的帧写完后作为错误返回.
pub fn decode_stream(
    data: &[u8],
    options: DecoderOptions,
    sink: &mut dyn FrameSink,
) -> H262Result<usize> {
    let mut decoder = Mpeg2Decoder::new(options);
    decoder.send_packet(&Packet::from_data(data.to_vec()))?;
    decoder.send_packet(&Packet::empty())?;

    let mut count = 0usize;
    loop {
        match decoder.receive_frame() {
            Ok(frame) => {
                sink.write_frame(&frame)?;
                count += 1;
            }
            Err(H262Error::Eof) => break,
            Err(e) => return Err(e),
        }
    }
    let stats = decoder.stats();
    debug!(
        "解码完成: {} 帧, 跳过图像 {}, 放弃 slice {}",
        count, stats.pictures_skipped, stats.slices_abandoned
    );
    Ok(count)
}
