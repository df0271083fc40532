//! 序列层 / GOP 层 / 图像层头部与扩展解析
//!
//! 所有解析函数只读取单元数据 (起始码类型字节之后的部分) 并返回不可变记录,
//! 不修改解码器状态; 由调用方决定如何安装到解码器中.

use h262_core::bitreader::BitReader;
use h262_core::{H262Error, H262Result, Rational};

use super::tables::{
    DEFAULT_INTRA_MATRIX, DEFAULT_NON_INTRA_MATRIX, ZIGZAG_SCAN, display_aspect_ratio, frame_rate,
};
use super::types::{ChromaFormat, PictureCodingType, PictureStructure};

// ============================================================================
// 扩展标识
// ============================================================================

pub(super) const SEQUENCE_EXTENSION_ID: u32 = 1;
pub(super) const SEQUENCE_DISPLAY_EXTENSION_ID: u32 = 2;
pub(super) const QUANT_MATRIX_EXTENSION_ID: u32 = 3;
pub(super) const COPYRIGHT_EXTENSION_ID: u32 = 4;
pub(super) const SEQUENCE_SCALABLE_EXTENSION_ID: u32 = 5;
pub(super) const PICTURE_DISPLAY_EXTENSION_ID: u32 = 7;
pub(super) const PICTURE_CODING_EXTENSION_ID: u32 = 8;
pub(super) const PICTURE_SPATIAL_SCALABLE_EXTENSION_ID: u32 = 9;
pub(super) const PICTURE_TEMPORAL_SCALABLE_EXTENSION_ID: u32 = 10;

// ============================================================================
// 记录类型
// ============================================================================

/// 序列头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeader {
    pub horizontal_size_value: u32,
    pub vertical_size_value: u32,
    pub aspect_ratio_information: u8,
    pub frame_rate_code: u8,
    pub bit_rate_value: u32,
    pub vbv_buffer_size_value: u32,
    pub constrained_parameters_flag: bool,
    /// intra 量化矩阵 (光栅顺序, 未加载时为默认矩阵)
    pub intra_quantiser_matrix: [u8; 64],
    /// non-intra 量化矩阵 (光栅顺序, 未加载时为默认矩阵)
    pub non_intra_quantiser_matrix: [u8; 64],
    pub load_intra_quantiser_matrix: bool,
    pub load_non_intra_quantiser_matrix: bool,
}

impl SequenceHeader {
    /// 帧率 (未考虑序列扩展中的 frame_rate_extension)
    pub fn frame_rate(&self) -> Option<Rational> {
        frame_rate(self.frame_rate_code)
    }

    /// 采样宽高比 (SAR), 由显示宽高比与存储尺寸推导
    pub fn sample_aspect_ratio(&self, width: u32, height: u32) -> Rational {
        match display_aspect_ratio(self.aspect_ratio_information) {
            Some(dar) if width > 0 && height > 0 => {
                dar * Rational::new(height as i32, width as i32)
            }
            _ => Rational::new(1, 1),
        }
    }
}

/// 序列扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceExtension {
    pub profile_and_level_indication: u8,
    pub progressive_sequence: bool,
    pub chroma_format: ChromaFormat,
    pub horizontal_size_extension: u8,
    pub vertical_size_extension: u8,
    pub bit_rate_extension: u16,
    pub vbv_buffer_size_extension: u8,
    pub low_delay: bool,
    pub frame_rate_extension_n: u8,
    pub frame_rate_extension_d: u8,
}

/// 色彩描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourDescription {
    pub colour_primaries: u8,
    pub transfer_characteristics: u8,
    pub matrix_coefficients: u8,
}

/// 序列显示扩展 (解析但不参与重建)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceDisplayExtension {
    pub video_format: u8,
    pub colour_description: Option<ColourDescription>,
    pub display_horizontal_size: u16,
    pub display_vertical_size: u16,
}

/// 量化矩阵扩展, 矩阵均为光栅顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantMatrixExtension {
    pub intra_quantiser_matrix: Option<[u8; 64]>,
    pub non_intra_quantiser_matrix: Option<[u8; 64]>,
    pub chroma_intra_quantiser_matrix: Option<[u8; 64]>,
    pub chroma_non_intra_quantiser_matrix: Option<[u8; 64]>,
}

/// 版权扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyrightExtension {
    pub copyright_flag: bool,
    pub copyright_identifier: u8,
    pub original_or_copy: bool,
    /// 64 位版权号 (20 + 22 + 22 位拼接)
    pub copyright_number: u64,
}

/// scalable_mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalableMode {
    DataPartitioning,
    Spatial,
    Snr,
    Temporal,
}

/// 序列可分级扩展 (仅记录模式, 分级解码不支持)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceScalableExtension {
    pub scalable_mode: ScalableMode,
    pub layer_id: u8,
}

/// 合成显示信息 (composite_display_flag = 1 时存在)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeDisplay {
    pub v_axis: bool,
    pub field_sequence: u8,
    pub sub_carrier: bool,
    pub burst_amplitude: u8,
    pub sub_carrier_phase: u8,
}

/// 图像编码扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureCodingExtension {
    /// f_code[s][t]: s = 0 前向 / 1 后向, t = 0 水平 / 1 垂直
    pub f_code: [[u8; 2]; 2],
    pub intra_dc_precision: u8,
    pub picture_structure: PictureStructure,
    pub top_field_first: bool,
    pub frame_pred_frame_dct: bool,
    pub concealment_motion_vectors: bool,
    pub q_scale_type: bool,
    pub intra_vlc_format: bool,
    pub alternate_scan: bool,
    pub repeat_first_field: bool,
    pub chroma_420_type: bool,
    pub progressive_frame: bool,
    pub composite_display: Option<CompositeDisplay>,
}

/// 图像显示扩展 (帧中心偏移, 1/16 像素单位)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureDisplayExtension {
    pub frame_centre_offsets: Vec<(i16, i16)>,
}

/// 图像空间可分级扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureSpatialScalableExtension {
    pub lower_layer_temporal_reference: u16,
    pub lower_layer_horizontal_offset: i16,
    pub lower_layer_vertical_offset: i16,
    pub spatial_temporal_weight_code_table_index: u8,
    pub lower_layer_progressive_frame: bool,
    pub lower_layer_deinterlaced_field_select: bool,
}

/// 图像时间可分级扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureTemporalScalableExtension {
    pub reference_select_code: u8,
    pub forward_temporal_reference: u16,
    pub backward_temporal_reference: u16,
}

/// 扩展单元, 按 4 位 extension_start_code_identifier 区分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    Sequence(SequenceExtension),
    SequenceDisplay(SequenceDisplayExtension),
    QuantMatrix(Box<QuantMatrixExtension>),
    Copyright(CopyrightExtension),
    SequenceScalable(SequenceScalableExtension),
    PictureDisplay(PictureDisplayExtension),
    PictureCoding(PictureCodingExtension),
    PictureSpatialScalable(PictureSpatialScalableExtension),
    PictureTemporalScalable(PictureTemporalScalableExtension),
    /// 保留或未知标识
    Unknown(u8),
}

/// GOP 时间码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeCode {
    pub drop_frame: bool,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub pictures: u8,
}

impl std::fmt::Display for TimeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sep = if self.drop_frame { ';' } else { ':' };
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours, self.minutes, self.seconds, sep, self.pictures
        )
    }
}

/// GOP 头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GopHeader {
    pub time_code: TimeCode,
    pub closed_gop: bool,
    pub broken_link: bool,
}

/// 图像头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureHeader {
    pub temporal_reference: u16,
    pub picture_coding_type: PictureCodingType,
    pub vbv_delay: u16,
    pub full_pel_forward_vector: bool,
    pub forward_f_code: u8,
    pub full_pel_backward_vector: bool,
    pub backward_f_code: u8,
    /// extra_information_picture 字节
    pub extra_information: Vec<u8>,
}

// ============================================================================
// 解析函数
// ============================================================================

/// 按 zig-zag 顺序读取 64 个 8 位矩阵元素, 返回光栅顺序矩阵
fn read_quant_matrix(reader: &mut BitReader) -> H262Result<[u8; 64]> {
    let mut matrix = [0u8; 64];
    for &pos in ZIGZAG_SCAN.iter() {
        let value = reader.read_bits(8)? as u8;
        if value == 0 {
            return Err(H262Error::InvalidData("量化矩阵元素不能为 0".into()));
        }
        matrix[pos] = value;
    }
    Ok(matrix)
}

fn read_optional_matrix(reader: &mut BitReader) -> H262Result<Option<[u8; 64]>> {
    if reader.read_flag()? {
        Ok(Some(read_quant_matrix(reader)?))
    } else {
        Ok(None)
    }
}

/// 解析序列头 (sequence_header_code 之后)
pub fn parse_sequence_header(data: &[u8]) -> H262Result<SequenceHeader> {
    let mut reader = BitReader::new(data);
    let horizontal_size_value = reader.read_bits(12)?;
    let vertical_size_value = reader.read_bits(12)?;
    if horizontal_size_value == 0 || vertical_size_value == 0 {
        return Err(H262Error::InvalidData(format!(
            "序列头尺寸非法: {}x{}",
            horizontal_size_value, vertical_size_value
        )));
    }
    let aspect_ratio_information = reader.read_bits(4)? as u8;
    let frame_rate_code = reader.read_bits(4)? as u8;
    let bit_rate_value = reader.read_bits(18)?;
    reader.read_marker("bit_rate_value")?;
    let vbv_buffer_size_value = reader.read_bits(10)?;
    let constrained_parameters_flag = reader.read_flag()?;

    let intra = read_optional_matrix(&mut reader)?;
    let non_intra = read_optional_matrix(&mut reader)?;

    Ok(SequenceHeader {
        horizontal_size_value,
        vertical_size_value,
        aspect_ratio_information,
        frame_rate_code,
        bit_rate_value,
        vbv_buffer_size_value,
        constrained_parameters_flag,
        intra_quantiser_matrix: intra.unwrap_or(DEFAULT_INTRA_MATRIX),
        non_intra_quantiser_matrix: non_intra.unwrap_or(DEFAULT_NON_INTRA_MATRIX),
        load_intra_quantiser_matrix: intra.is_some(),
        load_non_intra_quantiser_matrix: non_intra.is_some(),
    })
}

/// 解析 GOP 头 (group_start_code 之后)
pub fn parse_gop_header(data: &[u8]) -> H262Result<GopHeader> {
    let mut reader = BitReader::new(data);
    let drop_frame = reader.read_flag()?;
    let hours = reader.read_bits(5)? as u8;
    let minutes = reader.read_bits(6)? as u8;
    reader.read_marker("time_code_minutes")?;
    let seconds = reader.read_bits(6)? as u8;
    let pictures = reader.read_bits(6)? as u8;
    let closed_gop = reader.read_flag()?;
    let broken_link = reader.read_flag()?;
    Ok(GopHeader {
        time_code: TimeCode {
            drop_frame,
            hours,
            minutes,
            seconds,
            pictures,
        },
        closed_gop,
        broken_link,
    })
}

/// 解析图像头 (picture_start_code 之后)
pub fn parse_picture_header(data: &[u8]) -> H262Result<PictureHeader> {
    let mut reader = BitReader::new(data);
    let temporal_reference = reader.read_bits(10)? as u16;
    let code = reader.read_bits(3)?;
    let picture_coding_type = PictureCodingType::from_code(code).ok_or_else(|| {
        H262Error::InvalidData(format!("非法 picture_coding_type: {}", code))
    })?;
    let vbv_delay = reader.read_bits(16)? as u16;

    let mut header = PictureHeader {
        temporal_reference,
        picture_coding_type,
        vbv_delay,
        full_pel_forward_vector: false,
        forward_f_code: 0,
        full_pel_backward_vector: false,
        backward_f_code: 0,
        extra_information: Vec::new(),
    };

    if matches!(
        picture_coding_type,
        PictureCodingType::P | PictureCodingType::B
    ) {
        header.full_pel_forward_vector = reader.read_flag()?;
        header.forward_f_code = reader.read_bits(3)? as u8;
    }
    if picture_coding_type == PictureCodingType::B {
        header.full_pel_backward_vector = reader.read_flag()?;
        header.backward_f_code = reader.read_bits(3)? as u8;
    }

    while reader.read_flag()? {
        header.extra_information.push(reader.read_bits(8)? as u8);
    }

    Ok(header)
}

/// 解析扩展单元 (extension_start_code 之后)
///
/// `frame_centre_offsets` 为图像显示扩展中的偏移个数, 取决于当前序列与图像参数,
/// 由调用方计算.
pub fn parse_extension(data: &[u8], frame_centre_offsets: usize) -> H262Result<Extension> {
    let mut reader = BitReader::new(data);
    let id = reader.read_bits(4)?;
    let ext = match id {
        SEQUENCE_EXTENSION_ID => Extension::Sequence(parse_sequence_extension(&mut reader)?),
        SEQUENCE_DISPLAY_EXTENSION_ID => {
            Extension::SequenceDisplay(parse_sequence_display_extension(&mut reader)?)
        }
        QUANT_MATRIX_EXTENSION_ID => Extension::QuantMatrix(Box::new(QuantMatrixExtension {
            intra_quantiser_matrix: read_optional_matrix(&mut reader)?,
            non_intra_quantiser_matrix: read_optional_matrix(&mut reader)?,
            chroma_intra_quantiser_matrix: read_optional_matrix(&mut reader)?,
            chroma_non_intra_quantiser_matrix: read_optional_matrix(&mut reader)?,
        })),
        COPYRIGHT_EXTENSION_ID => Extension::Copyright(parse_copyright_extension(&mut reader)?),
        SEQUENCE_SCALABLE_EXTENSION_ID => {
            let scalable_mode = match reader.read_bits(2)? {
                0 => ScalableMode::DataPartitioning,
                1 => ScalableMode::Spatial,
                2 => ScalableMode::Snr,
                _ => ScalableMode::Temporal,
            };
            let layer_id = reader.read_bits(4)? as u8;
            Extension::SequenceScalable(SequenceScalableExtension {
                scalable_mode,
                layer_id,
            })
        }
        PICTURE_DISPLAY_EXTENSION_ID => {
            let mut offsets = Vec::with_capacity(frame_centre_offsets);
            for _ in 0..frame_centre_offsets {
                let h = reader.read_bits_signed(16)? as i16;
                reader.read_marker("frame_centre_horizontal_offset")?;
                let v = reader.read_bits_signed(16)? as i16;
                reader.read_marker("frame_centre_vertical_offset")?;
                offsets.push((h, v));
            }
            Extension::PictureDisplay(PictureDisplayExtension {
                frame_centre_offsets: offsets,
            })
        }
        PICTURE_CODING_EXTENSION_ID => {
            Extension::PictureCoding(parse_picture_coding_extension(&mut reader)?)
        }
        PICTURE_SPATIAL_SCALABLE_EXTENSION_ID => {
            let lower_layer_temporal_reference = reader.read_bits(10)? as u16;
            reader.read_marker("lower_layer_temporal_reference")?;
            let lower_layer_horizontal_offset = reader.read_bits_signed(15)? as i16;
            reader.read_marker("lower_layer_horizontal_offset")?;
            let lower_layer_vertical_offset = reader.read_bits_signed(15)? as i16;
            Extension::PictureSpatialScalable(PictureSpatialScalableExtension {
                lower_layer_temporal_reference,
                lower_layer_horizontal_offset,
                lower_layer_vertical_offset,
                spatial_temporal_weight_code_table_index: reader.read_bits(2)? as u8,
                lower_layer_progressive_frame: reader.read_flag()?,
                lower_layer_deinterlaced_field_select: reader.read_flag()?,
            })
        }
        PICTURE_TEMPORAL_SCALABLE_EXTENSION_ID => {
            let reference_select_code = reader.read_bits(2)? as u8;
            let forward_temporal_reference = reader.read_bits(10)? as u16;
            reader.read_marker("forward_temporal_reference")?;
            let backward_temporal_reference = reader.read_bits(10)? as u16;
            Extension::PictureTemporalScalable(PictureTemporalScalableExtension {
                reference_select_code,
                forward_temporal_reference,
                backward_temporal_reference,
            })
        }
        other => Extension::Unknown(other as u8),
    };
    Ok(ext)
}

fn parse_sequence_extension(reader: &mut BitReader) -> H262Result<SequenceExtension> {
    let profile_and_level_indication = reader.read_bits(8)? as u8;
    let progressive_sequence = reader.read_flag()?;
    let code = reader.read_bits(2)?;
    let chroma_format = ChromaFormat::from_code(code)
        .ok_or_else(|| H262Error::InvalidData(format!("保留的 chroma_format: {}", code)))?;
    let horizontal_size_extension = reader.read_bits(2)? as u8;
    let vertical_size_extension = reader.read_bits(2)? as u8;
    let bit_rate_extension = reader.read_bits(12)? as u16;
    reader.read_marker("bit_rate_extension")?;
    let vbv_buffer_size_extension = reader.read_bits(8)? as u8;
    let low_delay = reader.read_flag()?;
    let frame_rate_extension_n = reader.read_bits(2)? as u8;
    let frame_rate_extension_d = reader.read_bits(5)? as u8;
    Ok(SequenceExtension {
        profile_and_level_indication,
        progressive_sequence,
        chroma_format,
        horizontal_size_extension,
        vertical_size_extension,
        bit_rate_extension,
        vbv_buffer_size_extension,
        low_delay,
        frame_rate_extension_n,
        frame_rate_extension_d,
    })
}

fn parse_sequence_display_extension(reader: &mut BitReader) -> H262Result<SequenceDisplayExtension> {
    let video_format = reader.read_bits(3)? as u8;
    let colour_description = if reader.read_flag()? {
        Some(ColourDescription {
            colour_primaries: reader.read_bits(8)? as u8,
            transfer_characteristics: reader.read_bits(8)? as u8,
            matrix_coefficients: reader.read_bits(8)? as u8,
        })
    } else {
        None
    };
    let display_horizontal_size = reader.read_bits(14)? as u16;
    reader.read_marker("display_horizontal_size")?;
    let display_vertical_size = reader.read_bits(14)? as u16;
    Ok(SequenceDisplayExtension {
        video_format,
        colour_description,
        display_horizontal_size,
        display_vertical_size,
    })
}

fn parse_copyright_extension(reader: &mut BitReader) -> H262Result<CopyrightExtension> {
    let copyright_flag = reader.read_flag()?;
    let copyright_identifier = reader.read_bits(8)? as u8;
    let original_or_copy = reader.read_flag()?;
    reader.skip_bits(7)?;
    reader.read_marker("copyright reserved")?;
    let part1 = u64::from(reader.read_bits(20)?);
    reader.read_marker("copyright_number_1")?;
    let part2 = u64::from(reader.read_bits(22)?);
    reader.read_marker("copyright_number_2")?;
    let part3 = u64::from(reader.read_bits(22)?);
    Ok(CopyrightExtension {
        copyright_flag,
        copyright_identifier,
        original_or_copy,
        copyright_number: (part1 << 44) | (part2 << 22) | part3,
    })
}

fn parse_picture_coding_extension(reader: &mut BitReader) -> H262Result<PictureCodingExtension> {
    let mut f_code = [[0u8; 2]; 2];
    for row in f_code.iter_mut() {
        for value in row.iter_mut() {
            *value = reader.read_bits(4)? as u8;
        }
    }
    let intra_dc_precision = reader.read_bits(2)? as u8;
    let code = reader.read_bits(2)?;
    let picture_structure = PictureStructure::from_code(code)
        .ok_or_else(|| H262Error::InvalidData("保留的 picture_structure: 0".into()))?;
    let top_field_first = reader.read_flag()?;
    let frame_pred_frame_dct = reader.read_flag()?;
    let concealment_motion_vectors = reader.read_flag()?;
    let q_scale_type = reader.read_flag()?;
    let intra_vlc_format = reader.read_flag()?;
    let alternate_scan = reader.read_flag()?;
    let repeat_first_field = reader.read_flag()?;
    let chroma_420_type = reader.read_flag()?;
    let progressive_frame = reader.read_flag()?;
    let composite_display = if reader.read_flag()? {
        Some(CompositeDisplay {
            v_axis: reader.read_flag()?,
            field_sequence: reader.read_bits(3)? as u8,
            sub_carrier: reader.read_flag()?,
            burst_amplitude: reader.read_bits(7)? as u8,
            sub_carrier_phase: reader.read_bits(8)? as u8,
        })
    } else {
        None
    };
    Ok(PictureCodingExtension {
        f_code,
        intra_dc_precision,
        picture_structure,
        top_field_first,
        frame_pred_frame_dct,
        concealment_motion_vectors,
        q_scale_type,
        intra_vlc_format,
        alternate_scan,
        repeat_first_field,
        chroma_420_type,
        progressive_frame,
        composite_display,
    })
}

/// 图像显示扩展中帧中心偏移的个数
pub(super) fn frame_centre_offset_count(
    progressive_sequence: bool,
    picture: Option<&PictureCodingExtension>,
) -> usize {
    let Some(pic) = picture else {
        return 1;
    };
    if progressive_sequence {
        match (pic.repeat_first_field, pic.top_field_first) {
            (true, true) => 3,
            (true, false) => 2,
            _ => 1,
        }
    } else if pic.picture_structure != PictureStructure::Frame {
        1
    } else if pic.repeat_first_field {
        3
    } else {
        2
    }
}
