//! # h262-codec
//!
//! H.262 (MPEG-2 Video) 基本流解码器, 提供 Packet/Frame 抽象与解码流程.
//!
//! 解码器按起始码切分送入的字节流, 逐个单元解析并重建图像, 输出平面 YUV 4:2:0 帧.
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use h262_codec::decoders::mpeg2::DecoderOptions;
//! use h262_codec::sink::decode_stream;
//! use h262_codec::VideoFrame;
//!
//! let data = std::fs::read("input.m2v").unwrap();
//! let mut frames: Vec<VideoFrame> = Vec::new();
//! let count = decode_stream(&data, DecoderOptions::default(), &mut frames).unwrap();
//! println!("解码 {} 帧", count);
//! ```

pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod packet;
pub mod sink;

// 重导出常用类型
pub use decoder::Decoder;
pub use decoders::mpeg2::{DecoderOptions, DecoderStats, Mpeg2Decoder};
pub use frame::{PictureType, VideoFrame};
pub use packet::Packet;
pub use sink::{FrameSink, RawYuvWriter, decode_stream};
