//! 解码流程: 读取基本流文件, 分包送入解码器, 写出原始 YUV.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use h262_codec::decoders::mpeg2::{DecoderOptions, DecoderStats, Mpeg2Decoder};
use h262_codec::{Decoder, FrameSink, Packet, RawYuvWriter};
use h262_core::H262Error;

/// 每次送入解码器的字节数
pub(crate) const PACKET_SIZE: usize = 64 * 1024;

/// 解码结果摘要
#[derive(Debug, Clone, Default)]
pub(crate) struct DecodeSummary {
    pub input_bytes: usize,
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub stats: DecoderStats,
}

/// 解码 `input`, 原始 YUV 写入 `output` (None 时写到 stdout)
pub(crate) fn decode_file(
    input: &Path,
    output: Option<&Path>,
    options: DecoderOptions,
) -> Result<DecodeSummary> {
    let data =
        std::fs::read(input).with_context(|| format!("读取输入文件失败: {}", input.display()))?;
    info!("输入 {}, {} 字节", input.display(), data.len());

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("创建输出文件失败: {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut writer = RawYuvWriter::new(sink);

    let mut decoder = Mpeg2Decoder::new(options);
    let mut summary = DecodeSummary {
        input_bytes: data.len(),
        ..DecodeSummary::default()
    };

    let result = run_decoder(&mut decoder, &data, &mut writer, &mut summary);
    summary.stats = decoder.stats().clone();
    writer.into_inner().context("刷新输出失败")?;
    result?;
    Ok(summary)
}

fn run_decoder(
    decoder: &mut dyn Decoder,
    data: &[u8],
    writer: &mut dyn FrameSink,
    summary: &mut DecodeSummary,
) -> Result<()> {
    for (i, chunk) in data.chunks(PACKET_SIZE).enumerate() {
        let offset = (i * PACKET_SIZE) as u64;
        decoder.send_packet(&Packet::at_offset(chunk.to_vec(), offset))?;
        if drain(decoder, writer, summary)? {
            return Ok(());
        }
    }
    decoder.send_packet(&Packet::empty())?;
    if !drain(decoder, writer, summary)? {
        warn!("输入结束后解码器仍在等待数据");
    }
    Ok(())
}

/// 取出当前可用的帧, 返回是否已到达流末尾
fn drain(
    decoder: &mut dyn Decoder,
    writer: &mut dyn FrameSink,
    summary: &mut DecodeSummary,
) -> Result<bool> {
    loop {
        match decoder.receive_frame() {
            Ok(frame) => {
                debug!(
                    "帧 #{}: type={}, pts={}, {}x{}",
                    summary.frames, frame.picture_type, frame.pts, frame.width, frame.height
                );
                let size = (frame.width, frame.height);
                if summary.frames > 0 && size != (summary.width, summary.height) {
                    warn!(
                        "帧尺寸变化: {}x{} -> {}x{}",
                        summary.width, summary.height, frame.width, frame.height
                    );
                }
                summary.width = frame.width;
                summary.height = frame.height;
                writer.write_frame(&frame).context("写出帧失败")?;
                summary.frames += 1;
            }
            Err(H262Error::NeedMoreData) => return Ok(false),
            Err(H262Error::Eof) => return Ok(true),
            Err(H262Error::Unsupported(msg)) => {
                bail!("码流包含不支持的特性 (已输出 {} 帧): {}", summary.frames, msg)
            }
            Err(e) => return Err(e).context("解码失败"),
        }
    }
}
