//! MPEG-2 解码器端到端测试
//!
//! 测试码流由 `StreamWriter` 按语法逐字段合成. 多数宏块只使用 DC 系数,
//! 便于直接断言重建后的平坦像素值; 少数用例带一个 AC 系数, 断言块内的明暗方向.

use h262_core::bitwriter::BitWriter;
use h262_core::{H262Error, Rational};

use super::*;

// ============================================================================
// 码流合成
// ============================================================================

/// I 图像: 宏块类型 "帧内"
const MB_I_INTRA: &str = "1";
/// P 图像: 宏块类型 "帧内"
const MB_P_INTRA: &str = "00011";
/// B 图像: 宏块类型 "前向预测, 无残差"
const MB_B_FORWARD: &str = "0010";
/// 零运动向量 (水平与垂直 motion_code 均为 0)
const ZERO_MOTION: &str = "11";

/// 亮度 DC 差值 0
const LUMA_DC_ZERO: &str = "100";
/// 亮度 DC 差值 +7 (dct_dc_size = 3)
const LUMA_DC_PLUS_7: &str = "101111";

/// 地址增量 1 / 2
const ADDR_1: &str = "1";
const ADDR_2: &str = "011";

/// 只含 DC 系数的 6 个块: 首个亮度块使用 `first_luma_dc`, 其余差值为 0
fn dc_blocks(first_luma_dc: &str) -> String {
    let mut bits = String::new();
    bits.push_str(first_luma_dc);
    bits.push_str("10");
    for _ in 0..3 {
        bits.push_str(LUMA_DC_ZERO);
        bits.push_str("10");
    }
    for _ in 0..2 {
        // 色度 DC 差值 0 + EOB
        bits.push_str("0010");
    }
    bits
}

/// DC 差值均为 0 的 6 个块, 第一个亮度块在 DC 后追加 `y0_ac` 系数码字, 每块以 `eob` 结束
fn ac_blocks(y0_ac: &str, eob: &str) -> String {
    let mut bits = format!("{}{}{}", LUMA_DC_ZERO, y0_ac, eob);
    for _ in 0..3 {
        bits.push_str(LUMA_DC_ZERO);
        bits.push_str(eob);
    }
    for _ in 0..2 {
        bits.push_str("00");
        bits.push_str(eob);
    }
    bits
}

/// 平坦帧内宏块 (所有样本为 128)
fn intra_mb(addr: &str, mb_type: &str) -> String {
    format!("{}{}{}", addr, mb_type, dc_blocks(LUMA_DC_ZERO))
}

/// 亮度为 135, 色度为 128 的帧内宏块
fn bright_intra_mb(addr: &str, mb_type: &str) -> String {
    format!("{}{}{}", addr, mb_type, dc_blocks(LUMA_DC_PLUS_7))
}

/// 图像编码扩展的可变部分
#[derive(Clone, Copy)]
struct PictureCoding {
    forward_f_code: [u8; 2],
    picture_structure: u32,
    frame_pred_frame_dct: bool,
    concealment_motion_vectors: bool,
    intra_vlc_format: bool,
    alternate_scan: bool,
}

impl PictureCoding {
    const INTRA: Self = Self {
        forward_f_code: [15, 15],
        picture_structure: 3,
        frame_pred_frame_dct: true,
        concealment_motion_vectors: false,
        intra_vlc_format: false,
        alternate_scan: false,
    };
    const PREDICTED: Self = Self {
        forward_f_code: [1, 1],
        ..Self::INTRA
    };
}

/// 基本流合成器
struct StreamWriter {
    bw: BitWriter,
}

impl StreamWriter {
    fn new() -> Self {
        Self {
            bw: BitWriter::new(),
        }
    }

    /// 序列头 + 序列扩展 (4:2:0, 逐行, 25 fps)
    fn sequence(&mut self, width: u32, height: u32) -> &mut Self {
        self.sequence_with_chroma(width, height, 1)
    }

    fn sequence_with_chroma(&mut self, width: u32, height: u32, chroma: u32) -> &mut Self {
        let bw = &mut self.bw;
        bw.write_start_code(start_code::SEQUENCE_HEADER_CODE);
        bw.write_bits(width, 12);
        bw.write_bits(height, 12);
        bw.write_bits(1, 4); // 方形像素
        bw.write_bits(3, 4); // 25 fps
        bw.write_bits(1000, 18);
        bw.write_bit(1);
        bw.write_bits(16, 10);
        bw.write_flag(false);
        bw.write_flag(false); // load_intra_quantiser_matrix
        bw.write_flag(false); // load_non_intra_quantiser_matrix

        bw.write_start_code(start_code::EXTENSION_START_CODE);
        bw.write_bits(1, 4);
        bw.write_bits(0x48, 8); // Main Profile @ Main Level
        bw.write_flag(true); // progressive_sequence
        bw.write_bits(chroma, 2);
        bw.write_bits(0, 2);
        bw.write_bits(0, 2);
        bw.write_bits(0, 12);
        bw.write_bit(1);
        bw.write_bits(0, 8);
        bw.write_flag(false); // low_delay
        bw.write_bits(0, 2);
        bw.write_bits(0, 5);
        self
    }

    fn gop(&mut self, closed: bool) -> &mut Self {
        let bw = &mut self.bw;
        bw.write_start_code(start_code::GROUP_START_CODE);
        bw.write_flag(false);
        bw.write_bits(1, 5); // 01:02:03:04
        bw.write_bits(2, 6);
        bw.write_bit(1);
        bw.write_bits(3, 6);
        bw.write_bits(4, 6);
        bw.write_flag(closed);
        bw.write_flag(false);
        self
    }

    /// 图像头 + 图像编码扩展
    fn picture(
        &mut self,
        coding_type: u32,
        temporal_reference: u32,
        coding: PictureCoding,
    ) -> &mut Self {
        let bw = &mut self.bw;
        bw.write_start_code(start_code::PICTURE_START_CODE);
        bw.write_bits(temporal_reference, 10);
        bw.write_bits(coding_type, 3);
        bw.write_bits(0xFFFF, 16);
        if coding_type == 2 || coding_type == 3 {
            bw.write_flag(false);
            bw.write_bits(7, 3);
        }
        if coding_type == 3 {
            bw.write_flag(false);
            bw.write_bits(7, 3);
        }
        bw.write_flag(false); // extra_bit_picture

        bw.write_start_code(start_code::EXTENSION_START_CODE);
        bw.write_bits(8, 4);
        bw.write_bits(u32::from(coding.forward_f_code[0]), 4);
        bw.write_bits(u32::from(coding.forward_f_code[1]), 4);
        bw.write_bits(15, 4);
        bw.write_bits(15, 4);
        bw.write_bits(0, 2); // intra_dc_precision: 8 位
        bw.write_bits(coding.picture_structure, 2);
        bw.write_flag(false); // top_field_first
        bw.write_flag(coding.frame_pred_frame_dct);
        bw.write_flag(coding.concealment_motion_vectors);
        bw.write_flag(false); // q_scale_type
        bw.write_flag(coding.intra_vlc_format);
        bw.write_flag(coding.alternate_scan);
        bw.write_flag(false); // repeat_first_field
        bw.write_flag(true); // chroma_420_type
        bw.write_flag(true); // progressive_frame
        bw.write_flag(false); // composite_display_flag
        self
    }

    /// slice: 起始码, quantiser_scale_code, 无 slice 扩展, 随后为宏块位串
    fn slice(&mut self, row: u8, quantiser_scale_code: u32, macroblocks: &[String]) -> &mut Self {
        let bw = &mut self.bw;
        bw.write_start_code(row + 1);
        bw.write_bits(quantiser_scale_code, 5);
        bw.write_flag(false);
        for mb in macroblocks {
            bw.write_code_str(mb);
        }
        self
    }

    fn sequence_end(&mut self) -> &mut Self {
        self.bw.write_start_code(start_code::SEQUENCE_END_CODE);
        self
    }

    fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bw).finish()
    }
}

/// 16x16 单宏块 I 图像, 所有样本为 128
fn flat_intra_stream() -> Vec<u8> {
    let mut sw = StreamWriter::new();
    sw.sequence(16, 16)
        .gop(true)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)])
        .sequence_end();
    sw.finish()
}

// ============================================================================
// 驱动辅助
// ============================================================================

/// 按 `chunk` 字节分包送入, 取出全部帧, 返回帧与终止错误
fn decode_chunks(
    decoder: &mut Mpeg2Decoder,
    data: &[u8],
    chunk: usize,
) -> (Vec<VideoFrame>, H262Error) {
    let mut frames = Vec::new();
    for part in data.chunks(chunk) {
        decoder
            .send_packet(&Packet::from_data(part.to_vec()))
            .expect("送入数据包失败");
        loop {
            match decoder.receive_frame() {
                Ok(frame) => frames.push(frame),
                Err(H262Error::NeedMoreData) => break,
                Err(e) => return (frames, e),
            }
        }
    }
    decoder
        .send_packet(&Packet::empty())
        .expect("送入结束包失败");
    loop {
        match decoder.receive_frame() {
            Ok(frame) => frames.push(frame),
            Err(e) => return (frames, e),
        }
    }
}

fn decode_stream(decoder: &mut Mpeg2Decoder, data: &[u8]) -> (Vec<VideoFrame>, H262Error) {
    decode_chunks(decoder, data, data.len().max(1))
}

fn luma_at(frame: &VideoFrame, x: usize, y: usize) -> u8 {
    frame.data[0][y * frame.linesize[0] + x]
}

fn plane_is(frame: &VideoFrame, plane: usize, value: u8) -> bool {
    frame.data[plane].iter().all(|&v| v == value)
}

// ============================================================================
// 测试
// ============================================================================

#[test]
fn test_flat_intra_frame() {
    let data = flat_intra_stream();
    let mut decoder = Mpeg2Decoder::default();
    let (frames, end) = decode_stream(&mut decoder, &data);

    assert!(matches!(end, H262Error::Eof), "结束应为 Eof, 实际 {:?}", end);
    assert_eq!(frames.len(), 1, "应输出一帧");
    let frame = &frames[0];
    assert_eq!((frame.width, frame.height), (16, 16));
    assert_eq!(frame.picture_type, PictureType::I);
    assert!(frame.is_keyframe);
    assert_eq!(frame.time_base, Rational::new(1, 25));
    assert_eq!(frame.sample_aspect_ratio, Rational::new(1, 1));
    for plane in 0..3 {
        assert!(plane_is(frame, plane, 128), "平面 {} 应全部为 128", plane);
    }

    let stats = decoder.stats();
    assert_eq!(stats.pictures_decoded, 1);
    assert_eq!(stats.macroblocks_decoded, 1);
    assert_eq!(stats.slices_abandoned, 0);
    assert_eq!(
        stats.last_time_code.map(|tc| tc.to_string()),
        Some("01:02:03:04".to_string())
    );
    assert_eq!(decoder.sequence_header().map(|s| s.frame_rate_code), Some(3));
}

#[test]
fn test_intra_dc_difference() {
    let mut sw = StreamWriter::new();
    sw.sequence(16, 16)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(0, 8, &[bright_intra_mb(ADDR_1, MB_I_INTRA)]);
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, _) = decode_stream(&mut decoder, &data);
    assert_eq!(frames.len(), 1);
    // 其余亮度块的 DC 预测沿用 135
    assert!(plane_is(&frames[0], 0, 135), "亮度应全部为 135");
    assert!(plane_is(&frames[0], 1, 128), "色度应保持 128");
}

#[test]
fn test_picture_without_sequence_is_skipped() {
    let mut sw = StreamWriter::new();
    sw.picture(1, 0, PictureCoding::INTRA)
        .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)]);
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, end) = decode_stream(&mut decoder, &data);
    assert!(frames.is_empty(), "缺少序列头时不应输出帧");
    assert!(matches!(end, H262Error::Eof));
    assert_eq!(decoder.stats().pictures_skipped, 1);
    assert!(!decoder.is_failed());
}

#[test]
fn test_field_picture_is_unsupported_and_sticky() {
    let mut sw = StreamWriter::new();
    sw.sequence(16, 16)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)])
        .picture(
            1,
            1,
            PictureCoding {
                picture_structure: 1,
                ..PictureCoding::INTRA
            },
        )
        .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)]);
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, end) = decode_stream(&mut decoder, &data);
    assert_eq!(frames.len(), 1, "失败前完成的帧仍应输出");
    assert!(matches!(end, H262Error::Unsupported(_)), "实际 {:?}", end);
    assert!(decoder.is_failed());
    assert!(matches!(
        decoder.receive_frame(),
        Err(H262Error::Unsupported(_))
    ));
}

#[test]
fn test_unsupported_chroma_format() {
    let mut sw = StreamWriter::new();
    sw.sequence_with_chroma(16, 16, 2)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)]);
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, end) = decode_stream(&mut decoder, &data);
    assert!(frames.is_empty());
    assert!(matches!(end, H262Error::Unsupported(_)), "实际 {:?}", end);
}

#[test]
fn test_corrupt_slice_is_abandoned() {
    let mut sw = StreamWriter::new();
    sw.sequence(16, 16)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(0, 0, &[intra_mb(ADDR_1, MB_I_INTRA)]);
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, end) = decode_stream(&mut decoder, &data);
    assert!(matches!(end, H262Error::Eof));
    assert_eq!(frames.len(), 1, "损坏 slice 所在图像仍应输出");
    assert_eq!(decoder.stats().slices_abandoned, 1);
    assert_eq!(decoder.stats().macroblocks_decoded, 0);
}

#[test]
fn test_byte_by_byte_matches_whole_buffer() {
    let mut sw = StreamWriter::new();
    sw.sequence(32, 16)
        .gop(true)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(
            0,
            8,
            &[
                bright_intra_mb(ADDR_1, MB_I_INTRA),
                intra_mb(ADDR_1, MB_I_INTRA),
            ],
        )
        .picture(2, 1, PictureCoding::PREDICTED)
        .slice(
            0,
            8,
            &[
                intra_mb(ADDR_1, MB_P_INTRA),
                bright_intra_mb(ADDR_1, MB_P_INTRA),
            ],
        )
        .sequence_end();
    let data = sw.finish();

    let (whole, _) = decode_stream(&mut Mpeg2Decoder::default(), &data);
    let (split, end) = decode_chunks(&mut Mpeg2Decoder::default(), &data, 1);
    assert!(matches!(end, H262Error::Eof));
    assert_eq!(whole.len(), 2);
    assert_eq!(split.len(), whole.len(), "逐字节送入的帧数应一致");
    for (a, b) in whole.iter().zip(split.iter()) {
        assert_eq!(a.data, b.data, "逐字节送入的像素应一致");
        assert_eq!(a.pts, b.pts);
        assert_eq!(a.picture_type, b.picture_type);
    }
}

#[test]
fn test_pts_follows_gop_and_temporal_reference() {
    let mut sw = StreamWriter::new();
    sw.sequence(16, 16).gop(true);
    for tr in [1, 0] {
        sw.picture(1, tr, PictureCoding::INTRA)
            .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)]);
    }
    sw.gop(false)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)]);
    let data = sw.finish();

    let (frames, _) = decode_stream(&mut Mpeg2Decoder::default(), &data);
    let pts: Vec<i64> = frames.iter().map(|f| f.pts).collect();
    assert_eq!(pts, vec![1, 0, 2], "输出按解码顺序, pts 为显示序号");
    let trs: Vec<u16> = frames.iter().map(|f| f.temporal_reference).collect();
    assert_eq!(trs, vec![1, 0, 0]);
}

/// 48x16: I 图像全部为 128; P 图像宏块 0/2 为亮度 135 的帧内宏块, 宏块 1 跳过
fn skip_stream() -> Vec<u8> {
    let mut sw = StreamWriter::new();
    sw.sequence(48, 16)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(
            0,
            8,
            &[
                intra_mb(ADDR_1, MB_I_INTRA),
                intra_mb(ADDR_1, MB_I_INTRA),
                intra_mb(ADDR_1, MB_I_INTRA),
            ],
        )
        .picture(2, 1, PictureCoding::PREDICTED)
        .slice(
            0,
            8,
            &[
                bright_intra_mb(ADDR_1, MB_P_INTRA),
                bright_intra_mb(ADDR_2, MB_P_INTRA),
            ],
        );
    sw.finish()
}

#[test]
fn test_skipped_macroblock_copies_reference() {
    let mut decoder = Mpeg2Decoder::default();
    let (frames, _) = decode_stream(&mut decoder, &skip_stream());
    assert_eq!(frames.len(), 2);
    let p = &frames[1];
    assert_eq!(p.picture_type, PictureType::P);
    assert_eq!(luma_at(p, 0, 0), 135);
    assert_eq!(luma_at(p, 16, 0), 128, "跳过宏块应复制参考帧");
    assert_eq!(luma_at(p, 31, 15), 128);
    // 跳过后 DC 预测复位, 第三个宏块同样为 135 而不是 142
    assert_eq!(luma_at(p, 32, 0), 135);
    assert_eq!(luma_at(p, 47, 15), 135);
    assert_eq!(decoder.stats().macroblocks_skipped, 1);
}

#[test]
fn test_skipped_macroblock_leave_policy() {
    let options = DecoderOptions {
        skip_policy: SkipPolicy::Leave,
        ..DecoderOptions::default()
    };
    let mut decoder = Mpeg2Decoder::new(options);
    let (frames, _) = decode_stream(&mut decoder, &skip_stream());
    assert_eq!(frames.len(), 2);
    let p = &frames[1];
    assert_eq!(luma_at(p, 16, 0), 0, "Leave 策略不写入跳过宏块");
    assert_eq!(luma_at(p, 32, 0), 135);
    assert_eq!(decoder.stats().macroblocks_skipped, 1);
}

#[test]
fn test_b_picture_uses_older_anchor() {
    let mut sw = StreamWriter::new();
    sw.sequence(16, 16)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)])
        .picture(2, 2, PictureCoding::PREDICTED)
        .slice(0, 8, &[bright_intra_mb(ADDR_1, MB_P_INTRA)])
        .picture(3, 1, PictureCoding::PREDICTED)
        .slice(
            0,
            8,
            &[format!("{}{}{}", ADDR_1, MB_B_FORWARD, ZERO_MOTION)],
        );
    let data = sw.finish();

    let (frames, _) = decode_stream(&mut Mpeg2Decoder::default(), &data);
    assert_eq!(frames.len(), 3);
    assert!(plane_is(&frames[1], 0, 135), "P 图像亮度应为 135");
    let b = &frames[2];
    assert_eq!(b.picture_type, PictureType::B);
    assert!(!b.is_keyframe);
    assert!(plane_is(b, 0, 128), "B 图像应参考较早的 I 锚点");
}

#[test]
fn test_p_picture_without_reference_uses_gray() {
    let mut sw = StreamWriter::new();
    sw.sequence(16, 16)
        .picture(2, 0, PictureCoding::PREDICTED)
        .slice(
            0,
            8,
            &[format!("{}{}{}", ADDR_1, "001", ZERO_MOTION)],
        );
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, _) = decode_stream(&mut decoder, &data);
    assert_eq!(frames.len(), 1);
    assert!(plane_is(&frames[0], 0, 128), "缺少参考帧时以中灰预测");
    assert_eq!(decoder.stats().slices_abandoned, 0);
}

#[test]
fn test_flush_resets_state() {
    let mut decoder = Mpeg2Decoder::default();
    let (frames, _) = decode_stream(&mut decoder, &flat_intra_stream());
    assert_eq!(frames.len(), 1);

    decoder.flush();
    assert!(decoder.sequence_header().is_none());
    assert_eq!(decoder.stats(), &DecoderStats::default());

    // 刷新后需要新的序列头
    let mut sw = StreamWriter::new();
    sw.picture(1, 0, PictureCoding::INTRA)
        .slice(0, 8, &[intra_mb(ADDR_1, MB_I_INTRA)]);
    let (frames, end) = decode_stream(&mut decoder, &sw.finish());
    assert!(frames.is_empty());
    assert!(matches!(end, H262Error::Eof));
    assert_eq!(decoder.stats().pictures_skipped, 1);
}

#[test]
fn test_data_after_end_of_input_is_rejected() {
    let mut decoder = Mpeg2Decoder::default();
    decoder.send_packet(&Packet::empty()).unwrap();
    let err = decoder
        .send_packet(&Packet::from_data(vec![0u8, 0, 1, 0xB3]))
        .unwrap_err();
    assert!(matches!(err, H262Error::InvalidArgument(_)));
    assert!(matches!(decoder.receive_frame(), Err(H262Error::Eof)));
}

#[test]
fn test_decoder_trait_object() {
    let mut decoder = Mpeg2Decoder::create().unwrap();
    assert_eq!(decoder.name(), "mpeg2video");
    decoder
        .send_packet(&Packet::from_data(flat_intra_stream()))
        .unwrap();
    decoder.send_packet(&Packet::empty()).unwrap();
    let frame = decoder.receive_frame().unwrap();
    assert_eq!(frame.data_size(), 16 * 16 + 2 * 8 * 8);
    assert!(matches!(decoder.receive_frame(), Err(H262Error::Eof)));
}

/// 64x16 的 I 参考帧, 四个宏块亮度依次为 128/135/142/149
fn staircase_reference(sw: &mut StreamWriter) {
    sw.sequence(64, 16)
        .picture(1, 0, PictureCoding::INTRA)
        .slice(
            0,
            8,
            &[
                intra_mb(ADDR_1, MB_I_INTRA),
                bright_intra_mb(ADDR_1, MB_I_INTRA),
                bright_intra_mb(ADDR_1, MB_I_INTRA),
                bright_intra_mb(ADDR_1, MB_I_INTRA),
            ],
        );
}

#[test]
fn test_motion_vectors_and_coded_residual() {
    let mut sw = StreamWriter::new();
    staircase_reference(&mut sw);
    // f_code 3: f = 4, 向量范围 [-64, 63] 半像素; 帧预测类型与 DCT 类型逐宏块读取
    let coding = PictureCoding {
        forward_f_code: [3, 3],
        frame_pred_frame_dct: false,
        ..PictureCoding::PREDICTED
    };
    // 地址 / 类型 / frame_motion_type '10' / [dct_type] / 水平 / 垂直 / [CBP + 块]
    let macroblocks = [
        // 前向预测 + 残差: +32 半像素, 仅 Y0 带一个 DC 系数 (+1)
        format!(
            "{} 1 10 0 {} 1 {} {}",
            ADDR_1, "0000010110 11", "1010", "10 10"
        ),
        // 仅前向预测: motion_code 0, 沿用 +32
        format!("{} 001 10 1 1", ADDR_1),
        // 差值 -64, 得到 -32
        format!("{} 001 10 {} 1", ADDR_1, "00000011001 11"),
        // +32 回到 0
        format!("{} 001 10 {} 1", ADDR_1, "0000010110 11"),
    ];
    sw.picture(2, 1, coding).slice(0, 8, &macroblocks);
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, end) = decode_stream(&mut decoder, &data);
    assert!(matches!(end, H262Error::Eof), "实际 {:?}", end);
    assert_eq!(frames.len(), 2);
    let p = &frames[1];
    assert_eq!(p.picture_type, PictureType::P);

    // 预测取自参考帧第二个宏块 (135), Y0 叠加 (3*16*16/32 = 24 -> 25) / 8 = 3
    assert_eq!(luma_at(p, 0, 0), 138, "Y0 应为预测值加残差");
    assert_eq!(luma_at(p, 7, 7), 138);
    assert_eq!(luma_at(p, 8, 0), 135, "未编码的 Y1 只有预测值");
    assert_eq!(luma_at(p, 0, 8), 135);
    assert_eq!(luma_at(p, 15, 15), 135);
    assert_eq!(luma_at(p, 16, 0), 142, "运动向量预测应沿用上一宏块");
    assert_eq!(luma_at(p, 31, 15), 142);
    assert_eq!(luma_at(p, 32, 0), 135, "向量应回到 -32");
    assert_eq!(luma_at(p, 47, 15), 135);
    assert_eq!(luma_at(p, 48, 0), 149, "零向量应取同位置参考");
    assert_eq!(luma_at(p, 63, 15), 149);
    assert!(plane_is(p, 1, 128), "色度应保持 128");
    assert!(plane_is(p, 2, 128));
    assert_eq!(decoder.stats().slices_abandoned, 0);
    assert_eq!(decoder.stats().macroblocks_decoded, 8);
}

#[test]
fn test_field_motion_type_is_unsupported() {
    let mut sw = StreamWriter::new();
    staircase_reference(&mut sw);
    let coding = PictureCoding {
        frame_pred_frame_dct: false,
        ..PictureCoding::PREDICTED
    };
    // frame_motion_type '01' 为场预测
    sw.picture(2, 1, coding)
        .slice(0, 8, &[format!("{} 001 01 1 1", ADDR_1)]);
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, end) = decode_stream(&mut decoder, &data);
    assert_eq!(frames.len(), 1, "I 帧应已输出");
    assert!(matches!(end, H262Error::Unsupported(_)), "实际 {:?}", end);
}

#[test]
fn test_quantiser_scale_update_in_macroblock() {
    let mut sw = StreamWriter::new();
    let coding = PictureCoding {
        frame_pred_frame_dct: false,
        ..PictureCoding::INTRA
    };
    // 类型 '01' (帧内 + QUANT), dct_type 0, 新 quantiser_scale_code 16,
    // Y0 带一个 (0,1) 系数: 2*16*32/32 = 32 -> 33
    sw.sequence(16, 16).picture(1, 0, coding).slice(
        0,
        8,
        &[format!("{} 01 0 10000 {}", ADDR_1, ac_blocks("110", "10"))],
    );
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, _) = decode_stream(&mut decoder, &data);
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    // 33 / (4√2) * cos(π/16) ≈ 5.72
    assert_eq!(luma_at(frame, 0, 0), 134, "应使用宏块内更新的量化步长");
    assert_eq!(luma_at(frame, 7, 0), 122);
    assert_eq!(luma_at(frame, 0, 7), 134, "水平频率系数各行相同");
    assert_eq!(luma_at(frame, 8, 0), 128, "其余亮度块保持平坦");
    assert_eq!(decoder.stats().slices_abandoned, 0);
}

#[test]
fn test_concealment_motion_vector_is_consumed() {
    let mut sw = StreamWriter::new();
    let coding = PictureCoding {
        forward_f_code: [1, 1],
        concealment_motion_vectors: true,
        ..PictureCoding::INTRA
    };
    // 帧内宏块后接隐藏向量 (+1, 0) 与标记位, 再接块数据
    sw.sequence(32, 16).picture(1, 0, coding).slice(
        0,
        8,
        &[
            format!("{} {} 010 1 1 {}", ADDR_1, MB_I_INTRA, dc_blocks(LUMA_DC_PLUS_7)),
            format!("{} {} 1 1 1 {}", ADDR_1, MB_I_INTRA, dc_blocks(LUMA_DC_PLUS_7)),
        ],
    );
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, _) = decode_stream(&mut decoder, &data);
    assert_eq!(frames.len(), 1);
    assert_eq!(luma_at(&frames[0], 0, 0), 135, "隐藏向量不影响帧内重建");
    assert_eq!(luma_at(&frames[0], 16, 0), 142);
    assert!(plane_is(&frames[0], 1, 128));
    assert_eq!(decoder.stats().slices_abandoned, 0);
    assert_eq!(decoder.stats().macroblocks_decoded, 2);
}

#[test]
fn test_intra_vlc_format_selects_b15() {
    let mut sw = StreamWriter::new();
    let coding = PictureCoding {
        intra_vlc_format: true,
        ..PictureCoding::INTRA
    };
    // B-15: (0,1) 为 '10s', EOB 为 '0110'
    sw.sequence(16, 16).picture(1, 0, coding).slice(
        0,
        8,
        &[format!("{}{}{}", ADDR_1, MB_I_INTRA, ac_blocks("100", "0110"))],
    );
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, _) = decode_stream(&mut decoder, &data);
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    // 2*16*16/32 = 16 -> 17, 17 / (4√2) * cos(π/16) ≈ 2.95
    assert_eq!(luma_at(frame, 0, 0), 131, "左侧应偏亮");
    assert_eq!(luma_at(frame, 7, 0), 125, "右侧应偏暗");
    assert_eq!(luma_at(frame, 0, 7), 131);
    assert_eq!(luma_at(frame, 8, 8), 128);
    assert!(plane_is(frame, 1, 128));
    assert_eq!(decoder.stats().slices_abandoned, 0);
}

#[test]
fn test_alternate_scan_places_coefficient_vertically() {
    let decode_with = |alternate_scan: bool| {
        let mut sw = StreamWriter::new();
        let coding = PictureCoding {
            alternate_scan,
            ..PictureCoding::INTRA
        };
        // 扫描序号 1 的系数 (0,1): B-14 '11s'
        sw.sequence(16, 16).picture(1, 0, coding).slice(
            0,
            8,
            &[format!("{}{}{}", ADDR_1, MB_I_INTRA, ac_blocks("110", "10"))],
        );
        let mut decoder = Mpeg2Decoder::default();
        let (mut frames, _) = decode_stream(&mut decoder, &sw.finish());
        assert_eq!(frames.len(), 1);
        assert_eq!(decoder.stats().slices_abandoned, 0);
        frames.remove(0)
    };

    let zigzag = decode_with(false);
    assert_eq!(luma_at(&zigzag, 0, 0), 131);
    assert_eq!(luma_at(&zigzag, 7, 0), 125, "之字形扫描下为水平频率");
    assert_eq!(luma_at(&zigzag, 0, 7), 131);

    let alternate = decode_with(true);
    assert_eq!(luma_at(&alternate, 0, 0), 131);
    assert_eq!(luma_at(&alternate, 7, 0), 131, "交替扫描下为垂直频率");
    assert_eq!(luma_at(&alternate, 0, 7), 125);
}

#[test]
fn test_intra_dc_out_of_range_abandons_slice() {
    let mut sw = StreamWriter::new();
    // 128 + 255 = 383, 超出 8 位精度的 [0, 256)
    sw.sequence(16, 16).picture(1, 0, PictureCoding::INTRA).slice(
        0,
        8,
        &[format!("{}{}{}", ADDR_1, MB_I_INTRA, dc_blocks("1111110 11111111"))],
    );
    let data = sw.finish();

    let mut decoder = Mpeg2Decoder::default();
    let (frames, end) = decode_stream(&mut decoder, &data);
    assert!(matches!(end, H262Error::Eof), "越界 DC 只放弃当前 slice");
    assert_eq!(frames.len(), 1);
    assert_eq!(decoder.stats().slices_abandoned, 1);
    assert_eq!(decoder.stats().macroblocks_decoded, 0);
}
