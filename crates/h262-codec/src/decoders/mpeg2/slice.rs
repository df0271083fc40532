//! Slice 与宏块解码
//!
//! 一个 slice 从起始码低字节给出的宏块行开始, 按 macroblock_address_increment
//! 依次推进. 宏块内依次解码类型, 量化步长, 运动向量, 编码块模式与 6 个 8x8 块,
//! 重建结果直接写入当前帧.
//!
//! 解码错误通过 `Result` 返回到 slice 边界, 由调用方决定放弃本 slice 还是终止解码.

use h262_core::bitreader::BitReader;
use h262_core::{H262Error, H262Result};
use log::trace;

use super::DecoderStats;
use super::block::{CoefficientContext, decode_coefficients, decode_intra_dc_diff};
use super::config::{DecoderOptions, SkipPolicy};
use super::dequant::{QuantParams, dequantize};
use super::frame_buffer::FrameBuffer;
use super::idct::idct_8x8;
use super::motion::{chroma_vector, decode_motion_vector, predict_block};
use super::tables::{ALTERNATE_SCAN, ZIGZAG_SCAN, quantiser_scale};
use super::types::{ChromaFormat, MacroblockFlags, MotionVector, PictureCodingType};
use super::vlc::{decode_coded_block_pattern, decode_mb_address_increment, decode_mb_type};

/// frame_motion_type 中唯一支持的 "帧预测"
const FRAME_MOTION_TYPE_FRAME: u32 = 2;

/// 每个宏块的块数, 只重建 4:2:0
const BLOCK_COUNT: usize = ChromaFormat::Yuv420.block_count();

/// 当前图像中 slice 解码所需的参数 (来自图像头, 图像编码扩展与序列参数)
#[derive(Debug, Clone, Copy)]
pub(super) struct PictureParams {
    pub coding_type: PictureCodingType,
    /// f_code[s][t]: s = 0 前向 / 1 后向, t = 0 水平 / 1 垂直
    pub f_code: [[u8; 2]; 2],
    pub intra_dc_precision: u8,
    pub frame_pred_frame_dct: bool,
    pub concealment_motion_vectors: bool,
    pub q_scale_type: bool,
    pub intra_vlc_format: bool,
    pub alternate_scan: bool,
    pub mb_width: usize,
    pub mb_height: usize,
    pub vertical_size: u32,
    /// 序列可分级扩展处于数据分区模式, slice 头含 priority_breakpoint
    pub data_partitioning: bool,
}

impl PictureParams {
    fn mb_count(&self) -> usize {
        self.mb_width * self.mb_height
    }

    fn dc_reset_value(&self) -> i32 {
        1 << (self.intra_dc_precision + 7)
    }

    /// intra DC 重建值的上界 (不含)
    fn dc_limit(&self) -> i32 {
        1 << (self.intra_dc_precision + 8)
    }
}

/// 前一个宏块的预测信息 (B 图像跳过宏块沿用)
#[derive(Debug, Clone, Copy)]
struct PreviousMacroblock {
    intra: bool,
    forward: MotionVector,
}

/// 单个 slice 的解码上下文
///
/// 借用解码器中互不重叠的字段: 当前帧可写, 参考帧只读.
pub(super) struct SliceDecoder<'a> {
    pub params: PictureParams,
    pub frame: &'a mut FrameBuffer,
    pub reference: Option<&'a FrameBuffer>,
    pub intra_matrix: &'a [u8; 64],
    pub non_intra_matrix: &'a [u8; 64],
    pub options: &'a DecoderOptions,
    pub stats: &'a mut DecoderStats,
}

/// slice 内随宏块推进的状态
#[derive(Debug, Clone)]
struct SliceState {
    quantiser_scale_code: u8,
    dc_pred: [i32; 3],
    mv_pred: MotionVector,
    /// 当前宏块地址, slice 开始时为首个宏块地址减 1
    mb_address: isize,
    previous: Option<PreviousMacroblock>,
}

impl<'a> SliceDecoder<'a> {
    /// 解码一个 slice 单元
    ///
    /// `code` 为起始码类型字节 (slice_vertical_position), `data` 为其后的单元数据.
    pub(super) fn decode(&mut self, code: u8, data: &[u8]) -> H262Result<()> {
        let mut reader = BitReader::new(data);
        let mut state = self.read_slice_header(&mut reader, code)?;

        let mut first = true;
        loop {
            self.decode_macroblock(&mut reader, &mut state, first)?;
            first = false;
            if reader.next_bits_are_zero(23) {
                break;
            }
        }
        Ok(())
    }

    fn read_slice_header(&self, reader: &mut BitReader, code: u8) -> H262Result<SliceState> {
        let mut row = u32::from(code) - 1;
        if self.params.vertical_size > 2800 {
            row += reader.read_bits(3)? << 7;
        }
        if row as usize >= self.params.mb_height {
            return Err(H262Error::InvalidData(format!(
                "slice 行号越界: {} (共 {} 行)",
                row, self.params.mb_height
            )));
        }
        if self.params.data_partitioning {
            let _priority_breakpoint = reader.read_bits(7)?;
        }

        let quantiser_scale_code = read_quantiser_scale_code(reader)?;

        // slice_extension_flag: intra_slice, slice_picture_id_enable, slice_picture_id,
        // 随后为 extra_bit_slice 引导的附加信息字节
        if reader.read_flag()? {
            let intra_slice = reader.read_flag()?;
            reader.skip_bits(7)?;
            let mut extra = 0usize;
            while reader.read_flag()? {
                reader.skip_bits(8)?;
                extra += 1;
            }
            trace!("slice 扩展: intra_slice={}, 附加字节 {}", intra_slice, extra);
        }

        let dc = self.params.dc_reset_value();
        Ok(SliceState {
            quantiser_scale_code,
            dc_pred: [dc; 3],
            mv_pred: MotionVector::ZERO,
            mb_address: (row as usize * self.params.mb_width) as isize - 1,
            previous: None,
        })
    }

    fn decode_macroblock(
        &mut self,
        reader: &mut BitReader,
        state: &mut SliceState,
        first: bool,
    ) -> H262Result<()> {
        let increment = decode_mb_address_increment(reader)? as isize;
        let address = state.mb_address + increment;
        if address < 0 || address as usize >= self.params.mb_count() {
            return Err(H262Error::InvalidData(format!(
                "宏块地址越界: {} (共 {} 个)",
                address,
                self.params.mb_count()
            )));
        }

        if !first && increment > 1 {
            state.dc_pred = [self.params.dc_reset_value(); 3];
            if self.params.coding_type == PictureCodingType::P {
                state.mv_pred = MotionVector::ZERO;
            }
            for skipped in (state.mb_address + 1)..address {
                self.reconstruct_skipped(skipped as usize, state)?;
            }
        }
        state.mb_address = address;

        let flags = decode_mb_type(reader, self.params.coding_type)?;
        if flags.contains(MacroblockFlags::MOTION_BACKWARD) {
            return Err(H262Error::Unsupported("后向预测宏块".into()));
        }
        let intra = flags.is_intra();

        if flags.has_motion() && !self.params.frame_pred_frame_dct {
            let frame_motion_type = reader.read_bits(2)?;
            if frame_motion_type != FRAME_MOTION_TYPE_FRAME {
                return Err(H262Error::Unsupported(format!(
                    "frame_motion_type {}",
                    frame_motion_type
                )));
            }
        }
        if !self.params.frame_pred_frame_dct
            && (intra || flags.contains(MacroblockFlags::PATTERN))
        {
            // 帧/场 DCT 选择, 按帧 DCT 重建
            let _dct_type = reader.read_flag()?;
        }

        if !intra {
            state.dc_pred = [self.params.dc_reset_value(); 3];
        }
        if (intra && !self.params.concealment_motion_vectors)
            || (self.params.coding_type == PictureCodingType::P
                && !intra
                && !flags.contains(MacroblockFlags::MOTION_FORWARD))
        {
            state.mv_pred = MotionVector::ZERO;
        }

        if flags.contains(MacroblockFlags::QUANT) {
            state.quantiser_scale_code = read_quantiser_scale_code(reader)?;
        }

        let mut forward = MotionVector::ZERO;
        if flags.contains(MacroblockFlags::MOTION_FORWARD)
            || (intra && self.params.concealment_motion_vectors)
        {
            forward = decode_motion_vector(reader, self.params.f_code[0], &mut state.mv_pred)?;
        }
        if intra && self.params.concealment_motion_vectors {
            reader.read_marker("concealment motion vectors")?;
        }

        let cbp = if flags.contains(MacroblockFlags::PATTERN) {
            decode_coded_block_pattern(reader)?
        } else if intra {
            0b11_1111
        } else {
            0
        };

        let mb_x = address as usize % self.params.mb_width;
        let mb_y = address as usize / self.params.mb_width;
        let qscale = quantiser_scale(self.params.q_scale_type, state.quantiser_scale_code);

        for i in 0..BLOCK_COUNT {
            let coded = intra || (cbp >> (BLOCK_COUNT - 1 - i)) & 1 != 0;
            let (plane, x0, y0) = block_position(i, mb_x, mb_y);

            let mut coeffs = [0i32; 64];
            if coded {
                self.decode_block(reader, state, &mut coeffs, plane, intra, qscale)?;
            }

            if intra {
                self.frame.put_block(plane, x0, y0, &coeffs);
            } else {
                let mv = if plane == 0 { forward } else { chroma_vector(forward) };
                let reference = self.reference_frame()?;
                let mut pred = predict_block(reference, plane, x0, y0, mv);
                if coded {
                    for (p, r) in pred.iter_mut().zip(coeffs.iter()) {
                        *p += r;
                    }
                }
                self.frame.put_block(plane, x0, y0, &pred);
            }
        }

        state.previous = Some(PreviousMacroblock { intra, forward });
        self.stats.macroblocks_decoded += 1;
        Ok(())
    }

    /// 解码, 反量化并逆变换一个块, 结果留在 `coeffs` 中
    fn decode_block(
        &self,
        reader: &mut BitReader,
        state: &mut SliceState,
        coeffs: &mut [i32; 64],
        plane: usize,
        intra: bool,
        qscale: i32,
    ) -> H262Result<()> {
        if intra {
            let diff = decode_intra_dc_diff(reader, plane == 0)?;
            let dc = state.dc_pred[plane] + diff;
            if !(0..self.params.dc_limit()).contains(&dc) {
                return Err(H262Error::InvalidData(format!(
                    "intra DC 越界: {} (精度 {} 位)",
                    dc,
                    self.params.intra_dc_precision + 8
                )));
            }
            state.dc_pred[plane] = dc;
            coeffs[0] = dc;
        }

        let scan = if self.params.alternate_scan {
            &ALTERNATE_SCAN
        } else {
            &ZIGZAG_SCAN
        };
        let ctx = CoefficientContext {
            intra,
            intra_vlc_format: self.params.intra_vlc_format,
            scan,
        };
        decode_coefficients(reader, &ctx, coeffs)?;

        let quant = QuantParams {
            matrix: if intra {
                self.intra_matrix
            } else {
                self.non_intra_matrix
            },
            quantiser_scale: qscale,
            intra,
            intra_dc_precision: self.params.intra_dc_precision,
            mismatch: self.options.mismatch_control,
        };
        dequantize(coeffs, &quant);
        idct_8x8(coeffs);
        Ok(())
    }

    /// 重建一个跳过的宏块
    ///
    /// P 图像以零向量复制参考帧; B 图像沿用前一宏块的前向向量.
    fn reconstruct_skipped(&mut self, address: usize, state: &SliceState) -> H262Result<()> {
        let mv = match self.params.coding_type {
            PictureCodingType::P => MotionVector::ZERO,
            PictureCodingType::B => match state.previous {
                Some(prev) if !prev.intra => prev.forward,
                _ => {
                    return Err(H262Error::InvalidData(
                        "B 图像跳过宏块之前不是预测宏块".into(),
                    ));
                }
            },
            _ => {
                return Err(H262Error::InvalidData("I 图像中出现跳过宏块".into()));
            }
        };

        self.stats.macroblocks_skipped += 1;
        if self.options.skip_policy == SkipPolicy::Leave {
            return Ok(());
        }

        let mb_x = address % self.params.mb_width;
        let mb_y = address / self.params.mb_width;
        let reference = self.reference_frame()?;
        for i in 0..BLOCK_COUNT {
            let (plane, x0, y0) = block_position(i, mb_x, mb_y);
            let block_mv = if plane == 0 { mv } else { chroma_vector(mv) };
            let pred = predict_block(reference, plane, x0, y0, block_mv);
            self.frame.put_block(plane, x0, y0, &pred);
        }
        Ok(())
    }

    fn reference_frame(&self) -> H262Result<&'a FrameBuffer> {
        self.reference
            .ok_or_else(|| H262Error::InvalidData("预测宏块缺少参考帧".into()))
    }
}

/// 读取 5 位 quantiser_scale_code, 0 为非法值
fn read_quantiser_scale_code(reader: &mut BitReader) -> H262Result<u8> {
    let code = reader.read_bits(5)? as u8;
    if code == 0 {
        return Err(H262Error::InvalidData("quantiser_scale_code 为 0".into()));
    }
    Ok(code)
}

/// 块 i 所在平面及其左上角坐标 (4:2:0: Y0..Y3, Cb, Cr)
fn block_position(i: usize, mb_x: usize, mb_y: usize) -> (usize, usize, usize) {
    if i < 4 {
        (0, mb_x * 16 + (i & 1) * 8, mb_y * 16 + (i >> 1) * 8)
    } else {
        (i - 3, mb_x * 8, mb_y * 8)
    }
}
