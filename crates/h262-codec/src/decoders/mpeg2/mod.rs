//! H.262 / MPEG-2 Video 解码器
//!
//! 实现 ISO/IEC 13818-2 基本流解码, 覆盖 Main Profile 的逐行帧图像子集.
//!
//! 已实现:
//! - 序列头, 序列扩展, GOP 头, 图像头, 图像编码扩展解析
//! - 序列显示, 量化矩阵, 版权, 可分级, 图像显示等扩展解析
//! - I/P 图像解码, B 图像仅前向预测
//! - 跳过宏块 (可配置策略), 隐藏运动向量
//! - 表 B-14 / B-15 系数解码, zig-zag 与交替扫描
//! - 线性与非线性量化步长, 失配控制 (可配置)
//! - 半像素运动补偿
//! - 按起始码重新同步, 损坏 slice 不影响其余部分
//!
//! 不支持 (返回 `Unsupported`): 场图像, 场/双基预测, 后向预测, 4:2:2 与 4:4:4, D 图像.
//!
//! ## 模块结构
//!
//! - `types`: 类型定义 (图像类型, 宏块标志, 运动向量等)
//! - `tables`: 常量表 (扫描顺序, 默认量化矩阵, 帧率等)
//! - `vlc`: 前缀码表与解码函数
//! - `start_code`: 起始码查找与单元切分
//! - `header`: 序列/GOP/图像头与扩展解析
//! - `slice`: slice 与宏块解码
//! - `block`: 8x8 块系数解码
//! - `dequant`: 反量化与失配控制
//! - `idct`: 逆 DCT
//! - `motion`: 运动向量与运动补偿
//! - `frame_buffer`: 解码帧缓冲
//! - `config`: 解码器选项

mod block;
mod config;
mod dequant;
mod frame_buffer;
mod header;
mod idct;
mod motion;
mod slice;
mod start_code;
mod tables;
#[cfg(test)]
mod tests;
mod types;
mod vlc;

use std::collections::VecDeque;

use log::{debug, error, trace, warn};

use h262_core::{H262Error, H262Result, Rational};

use crate::decoder::Decoder;
use crate::frame::{PictureType, VideoFrame};
use crate::packet::Packet;

pub use config::{DecoderOptions, MismatchControl, SkipPolicy};
pub use header::{
    ColourDescription, CompositeDisplay, CopyrightExtension, Extension, GopHeader,
    PictureCodingExtension, PictureDisplayExtension, PictureHeader,
    PictureSpatialScalableExtension, PictureTemporalScalableExtension, QuantMatrixExtension,
    ScalableMode, SequenceDisplayExtension, SequenceExtension, SequenceHeader,
    SequenceScalableExtension, TimeCode,
};
pub use idct::idct_8x8;
pub use types::{ChromaFormat, PictureCodingType, PictureStructure};

use frame_buffer::{FrameBuffer, FrameInfo};
use header::{
    frame_centre_offset_count, parse_extension, parse_gop_header, parse_picture_header,
    parse_sequence_header,
};
use slice::{PictureParams, SliceDecoder};
use start_code::{
    EXTENSION_START_CODE, GROUP_START_CODE, PICTURE_START_CODE, SEQUENCE_END_CODE,
    SEQUENCE_ERROR_CODE, SEQUENCE_HEADER_CODE, USER_DATA_START_CODE, UnitScan,
    is_slice_start_code, scan_unit,
};
use types::DecodeState;

/// 缺失参考帧告警的最大输出次数
const MAX_MISSING_REFERENCE_WARNINGS: u32 = 8;

// ============================================================================
// 统计信息
// ============================================================================

/// 解码统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// 已完成的图像数
    pub pictures_decoded: u64,
    /// 因缺少序列参数而跳过的图像数
    pub pictures_skipped: u64,
    /// 因码流错误而放弃的 slice 数
    pub slices_abandoned: u64,
    /// 已解码的 (非跳过) 宏块数
    pub macroblocks_decoded: u64,
    /// 跳过宏块数
    pub macroblocks_skipped: u64,
    /// 最近一个 GOP 头的时间码
    pub last_time_code: Option<TimeCode>,
}

// ============================================================================
// 解码器
// ============================================================================

/// 正在解码的图像
#[derive(Debug)]
struct CurrentPicture {
    buffer: FrameBuffer,
    header: PictureHeader,
    info: FrameInfo,
    /// 缺少参考帧时使用的中灰参考
    fallback_reference: Option<FrameBuffer>,
}

/// MPEG-2 视频解码器
pub struct Mpeg2Decoder {
    options: DecoderOptions,
    state: DecodeState,

    /// 已接收但尚未处理的字节
    buffer: Vec<u8>,
    /// 下一个待处理单元在 `buffer` 中的起点
    cursor: usize,
    /// 已收到空包, 缓冲区尾部即为输入结尾
    input_ended: bool,

    sequence_header: Option<SequenceHeader>,
    sequence_extension: Option<SequenceExtension>,
    sequence_display: Option<SequenceDisplayExtension>,
    sequence_scalable: Option<SequenceScalableExtension>,
    intra_matrix: [u8; 64],
    non_intra_matrix: [u8; 64],
    picture_coding: Option<PictureCodingExtension>,

    current: Option<CurrentPicture>,
    /// 较早的锚点帧 (B 图像的前向参考)
    older_anchor: Option<FrameBuffer>,
    /// 最近的锚点帧 (P 图像的前向参考)
    newer_anchor: Option<FrameBuffer>,
    output: VecDeque<VideoFrame>,

    /// 当前 GOP 显示序号基准
    gop_pts_base: i64,
    /// 当前 GOP 内出现过的最大 temporal_reference
    gop_max_temporal_reference: Option<i64>,

    stats: DecoderStats,
    missing_reference_warnings: u32,
}

impl Default for Mpeg2Decoder {
    fn default() -> Self {
        Self::new(DecoderOptions::default())
    }
}

impl Mpeg2Decoder {
    /// 创建解码器实例
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            state: DecodeState::AwaitingSequence,
            buffer: Vec::new(),
            cursor: 0,
            input_ended: false,
            sequence_header: None,
            sequence_extension: None,
            sequence_display: None,
            sequence_scalable: None,
            intra_matrix: tables::DEFAULT_INTRA_MATRIX,
            non_intra_matrix: tables::DEFAULT_NON_INTRA_MATRIX,
            picture_coding: None,
            current: None,
            older_anchor: None,
            newer_anchor: None,
            output: VecDeque::new(),
            gop_pts_base: 0,
            gop_max_temporal_reference: None,
            stats: DecoderStats::default(),
            missing_reference_warnings: 0,
        }
    }

    /// 以默认选项创建解码器 trait 对象
    pub fn create() -> H262Result<Box<dyn Decoder>> {
        Ok(Box::new(Self::default()))
    }

    /// 以指定选项创建解码器 trait 对象
    pub fn create_with_options(options: DecoderOptions) -> H262Result<Box<dyn Decoder>> {
        Ok(Box::new(Self::new(options)))
    }

    /// 解码器选项
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// 解码统计
    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// 当前生效的序列头
    pub fn sequence_header(&self) -> Option<&SequenceHeader> {
        self.sequence_header.as_ref()
    }

    /// 当前生效的序列扩展
    pub fn sequence_extension(&self) -> Option<&SequenceExtension> {
        self.sequence_extension.as_ref()
    }

    /// 最近解析的序列显示扩展
    pub fn sequence_display_extension(&self) -> Option<&SequenceDisplayExtension> {
        self.sequence_display.as_ref()
    }

    /// 解码器是否已因不支持的特性停止
    pub fn is_failed(&self) -> bool {
        matches!(self.state, DecodeState::Failed(_))
    }

    // ========================================================================
    // 单元处理
    // ========================================================================

    /// 处理一个完整单元. 可恢复的错误在此吸收, 只有不支持的特性向上返回.
    fn process_unit(&mut self, code: u8, data: &[u8]) -> H262Result<()> {
        let result = match code {
            SEQUENCE_HEADER_CODE => self.handle_sequence_header(data),
            EXTENSION_START_CODE => self.handle_extension(data),
            GROUP_START_CODE => self.handle_gop_header(data),
            PICTURE_START_CODE => self.handle_picture_header(data),
            USER_DATA_START_CODE => {
                trace!("跳过 user_data, {} 字节", data.len());
                Ok(())
            }
            SEQUENCE_ERROR_CODE => {
                debug!("忽略 sequence_error 起始码");
                Ok(())
            }
            SEQUENCE_END_CODE => {
                debug!("序列结束");
                self.finish_picture();
                if self.sequence_header.is_some() && self.sequence_extension.is_some() {
                    self.state = DecodeState::AwaitingPicture;
                }
                Ok(())
            }
            c if is_slice_start_code(c) => self.handle_slice(c, data),
            other => {
                trace!("跳过未识别的起始码 0x{:02X}", other);
                Ok(())
            }
        };

        match result {
            Err(H262Error::Unsupported(msg)) => Err(H262Error::Unsupported(msg)),
            Err(e) => {
                warn!("起始码 0x{:02X} 的单元解析失败, 跳过: {}", code, e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    fn handle_sequence_header(&mut self, data: &[u8]) -> H262Result<()> {
        self.finish_picture();
        let seq = parse_sequence_header(data)?;
        debug!(
            "序列头: {}x{}, aspect={}, frame_rate_code={}, bit_rate={}",
            seq.horizontal_size_value,
            seq.vertical_size_value,
            seq.aspect_ratio_information,
            seq.frame_rate_code,
            seq.bit_rate_value
        );
        self.intra_matrix = seq.intra_quantiser_matrix;
        self.non_intra_matrix = seq.non_intra_quantiser_matrix;
        self.sequence_header = Some(seq);
        self.sequence_extension = None;
        self.sequence_scalable = None;
        self.state = DecodeState::AwaitingSequence;
        Ok(())
    }

    fn handle_extension(&mut self, data: &[u8]) -> H262Result<()> {
        let progressive = self
            .sequence_extension
            .map(|e| e.progressive_sequence)
            .unwrap_or(true);
        let offsets = frame_centre_offset_count(progressive, self.picture_coding.as_ref());

        match parse_extension(data, offsets)? {
            Extension::Sequence(ext) => {
                debug!(
                    "序列扩展: profile_level=0x{:02X}, progressive={}, chroma={:?}, low_delay={}",
                    ext.profile_and_level_indication,
                    ext.progressive_sequence,
                    ext.chroma_format,
                    ext.low_delay
                );
                self.sequence_extension = Some(ext);
                if self.sequence_header.is_some() {
                    self.state = DecodeState::AwaitingPicture;
                }
            }
            Extension::SequenceDisplay(ext) => {
                debug!(
                    "序列显示扩展: video_format={}, 显示尺寸 {}x{}",
                    ext.video_format, ext.display_horizontal_size, ext.display_vertical_size
                );
                self.sequence_display = Some(ext);
            }
            Extension::QuantMatrix(ext) => {
                debug!("量化矩阵扩展");
                if let Some(m) = ext.intra_quantiser_matrix {
                    self.intra_matrix = m;
                }
                if let Some(m) = ext.non_intra_quantiser_matrix {
                    self.non_intra_matrix = m;
                }
            }
            Extension::Copyright(ext) => {
                debug!(
                    "版权扩展: flag={}, identifier={}",
                    ext.copyright_flag, ext.copyright_identifier
                );
            }
            Extension::SequenceScalable(ext) => {
                debug!(
                    "序列可分级扩展: mode={:?}, layer_id={}",
                    ext.scalable_mode, ext.layer_id
                );
                self.sequence_scalable = Some(ext);
            }
            Extension::PictureDisplay(ext) => {
                trace!("图像显示扩展: {:?}", ext.frame_centre_offsets);
            }
            Extension::PictureCoding(ext) => {
                if ext.picture_structure != PictureStructure::Frame {
                    return Err(H262Error::Unsupported(format!(
                        "场图像 ({:?})",
                        ext.picture_structure
                    )));
                }
                trace!(
                    "图像编码扩展: f_code={:?}, dc_precision={}, q_scale_type={}, intra_vlc={}",
                    ext.f_code,
                    ext.intra_dc_precision,
                    ext.q_scale_type,
                    ext.intra_vlc_format
                );
                self.picture_coding = Some(ext);
            }
            Extension::PictureSpatialScalable(_) | Extension::PictureTemporalScalable(_) => {
                debug!("忽略图像可分级扩展");
            }
            Extension::Unknown(id) => {
                trace!("跳过未知扩展 id={}", id);
            }
        }
        Ok(())
    }

    fn handle_gop_header(&mut self, data: &[u8]) -> H262Result<()> {
        let gop = parse_gop_header(data)?;
        debug!(
            "GOP: time_code={}, closed={}, broken_link={}",
            gop.time_code, gop.closed_gop, gop.broken_link
        );
        if let Some(max) = self.gop_max_temporal_reference.take() {
            self.gop_pts_base += max + 1;
        }
        self.stats.last_time_code = Some(gop.time_code);
        Ok(())
    }

    fn handle_picture_header(&mut self, data: &[u8]) -> H262Result<()> {
        self.finish_picture();
        self.picture_coding = None;

        let header = parse_picture_header(data)?;
        let (Some(seq), Some(ext)) = (self.sequence_header.as_ref(), self.sequence_extension)
        else {
            warn!(
                "缺少序列头或序列扩展, 跳过图像 (temporal_reference={})",
                header.temporal_reference
            );
            self.stats.pictures_skipped += 1;
            return Ok(());
        };

        if header.picture_coding_type == PictureCodingType::D {
            return Err(H262Error::Unsupported("D 图像".into()));
        }
        if ext.chroma_format != ChromaFormat::Yuv420 {
            return Err(H262Error::Unsupported(format!(
                "色度格式 {:?}",
                ext.chroma_format
            )));
        }

        let width = seq.horizontal_size_value | (u32::from(ext.horizontal_size_extension) << 12);
        let height = seq.vertical_size_value | (u32::from(ext.vertical_size_extension) << 12);

        let temporal_reference = i64::from(header.temporal_reference);
        let pts = self.gop_pts_base + temporal_reference;
        self.gop_max_temporal_reference = Some(
            self.gop_max_temporal_reference
                .map_or(temporal_reference, |m| m.max(temporal_reference)),
        );

        let info = FrameInfo {
            picture_type: PictureType::from(header.picture_coding_type),
            temporal_reference: header.temporal_reference,
            pts,
            time_base: time_base(seq, &ext),
            sample_aspect_ratio: seq.sample_aspect_ratio(width, height),
        };

        let missing = match header.picture_coding_type {
            PictureCodingType::P => self.newer_anchor.is_none(),
            PictureCodingType::B => self.older_anchor.is_none(),
            _ => false,
        };
        let fallback_reference = if missing {
            self.warn_missing_reference(header.picture_coding_type);
            Some(FrameBuffer::new(width, height, 128))
        } else {
            None
        };

        trace!(
            "图像: type={:?}, temporal_reference={}, {}x{}",
            header.picture_coding_type, header.temporal_reference, width, height
        );
        self.current = Some(CurrentPicture {
            buffer: FrameBuffer::new(width, height, 0),
            header,
            info,
            fallback_reference,
        });
        self.state = DecodeState::DecodingSlices;
        Ok(())
    }

    fn warn_missing_reference(&mut self, coding_type: PictureCodingType) {
        self.missing_reference_warnings = self.missing_reference_warnings.saturating_add(1);
        if self.missing_reference_warnings <= MAX_MISSING_REFERENCE_WARNINGS {
            warn!("{:?} 图像缺少参考帧, 使用中灰参考", coding_type);
        } else if self.missing_reference_warnings == MAX_MISSING_REFERENCE_WARNINGS + 1 {
            warn!("缺失参考帧日志过多, 后续同类日志省略");
        }
    }

    fn handle_slice(&mut self, code: u8, data: &[u8]) -> H262Result<()> {
        let Some(current) = self.current.as_mut() else {
            trace!("无当前图像, 跳过 slice 0x{:02X}", code);
            return Ok(());
        };
        let Some(pic) = self.picture_coding else {
            return Err(H262Error::InvalidData("slice 之前缺少图像编码扩展".into()));
        };
        let height = current.buffer.height();

        let params = PictureParams {
            coding_type: current.header.picture_coding_type,
            f_code: pic.f_code,
            intra_dc_precision: pic.intra_dc_precision,
            frame_pred_frame_dct: pic.frame_pred_frame_dct,
            concealment_motion_vectors: pic.concealment_motion_vectors,
            q_scale_type: pic.q_scale_type,
            intra_vlc_format: pic.intra_vlc_format,
            alternate_scan: pic.alternate_scan,
            mb_width: current.buffer.width().div_ceil(16),
            mb_height: height.div_ceil(16),
            vertical_size: height as u32,
            data_partitioning: matches!(
                self.sequence_scalable,
                Some(SequenceScalableExtension {
                    scalable_mode: ScalableMode::DataPartitioning,
                    ..
                })
            ),
        };

        let anchor = match params.coding_type {
            PictureCodingType::P => self.newer_anchor.as_ref(),
            PictureCodingType::B => self.older_anchor.as_ref(),
            _ => None,
        };
        let reference = anchor.or(current.fallback_reference.as_ref());

        let mut slice = SliceDecoder {
            params,
            frame: &mut current.buffer,
            reference,
            intra_matrix: &self.intra_matrix,
            non_intra_matrix: &self.non_intra_matrix,
            options: &self.options,
            stats: &mut self.stats,
        };
        match slice.decode(code, data) {
            Ok(()) => Ok(()),
            Err(e) if e.is_recoverable() => {
                warn!("slice 0x{:02X} 解码失败, 放弃该 slice: {}", code, e);
                self.stats.slices_abandoned += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// 完成当前图像: 输出帧, I/P 图像成为新的锚点
    fn finish_picture(&mut self) {
        let Some(picture) = self.current.take() else {
            return;
        };
        let frame = picture.buffer.to_video_frame(&picture.info);
        self.output.push_back(frame);
        self.stats.pictures_decoded += 1;
        if picture.header.picture_coding_type.is_anchor() {
            self.older_anchor = self.newer_anchor.take();
            self.newer_anchor = Some(picture.buffer);
        }
        if self.state == DecodeState::DecodingSlices {
            self.state = DecodeState::AwaitingPicture;
        }
    }

    fn fail(&mut self, err: H262Error) {
        error!("MPEG-2 解码终止: {}", err);
        self.current = None;
        let msg = match err {
            H262Error::Unsupported(msg) => msg,
            other => other.to_string(),
        };
        self.state = DecodeState::Failed(msg);
    }

    /// 丢弃已处理的字节
    fn compact_buffer(&mut self) {
        if self.cursor > 0 {
            self.buffer.drain(..self.cursor);
            self.cursor = 0;
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.options);
    }
}

/// 帧率推导的时间基 (含 frame_rate_extension)
fn time_base(seq: &SequenceHeader, ext: &SequenceExtension) -> Rational {
    match seq.frame_rate() {
        Some(rate) => Rational::new(
            rate.num * (i32::from(ext.frame_rate_extension_n) + 1),
            rate.den * (i32::from(ext.frame_rate_extension_d) + 1),
        )
        .invert()
        .reduce(),
        None => Rational::UNDEFINED,
    }
}

impl Decoder for Mpeg2Decoder {
    fn name(&self) -> &str {
        "mpeg2video"
    }

    fn send_packet(&mut self, packet: &Packet) -> H262Result<()> {
        if packet.is_empty() {
            debug!("收到输入结束信号");
            self.input_ended = true;
            return Ok(());
        }
        if self.input_ended {
            return Err(H262Error::InvalidArgument(
                "输入已结束, 需要先调用 flush".into(),
            ));
        }
        if let Some(pos) = packet.pos {
            trace!("数据包: offset={}, size={}", pos, packet.size());
        }
        self.buffer.extend_from_slice(&packet.data);
        Ok(())
    }

    fn receive_frame(&mut self) -> H262Result<VideoFrame> {
        loop {
            if let Some(frame) = self.output.pop_front() {
                return Ok(frame);
            }
            match &self.state {
                DecodeState::Failed(msg) => return Err(H262Error::Unsupported(msg.clone())),
                DecodeState::End => return Err(H262Error::Eof),
                _ => {}
            }

            match scan_unit(&self.buffer, self.cursor, self.input_ended) {
                UnitScan::Complete(unit) => {
                    self.cursor = unit.payload.end;
                    let buffer = std::mem::take(&mut self.buffer);
                    let result = self.process_unit(unit.code, &buffer[unit.payload]);
                    self.buffer = buffer;
                    if let Err(e) = result {
                        self.fail(e);
                    }
                }
                UnitScan::Incomplete => {
                    self.compact_buffer();
                    return Err(H262Error::NeedMoreData);
                }
                UnitScan::Exhausted => {
                    self.finish_picture();
                    self.buffer.clear();
                    self.cursor = 0;
                    self.state = DecodeState::End;
                }
            }
        }
    }

    fn flush(&mut self) {
        debug!("MPEG-2 解码器已刷新, 清空参考帧与缓冲数据");
        self.reset();
    }
}
