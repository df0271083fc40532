//! 解码器实现模块.

pub mod mpeg2;

use h262_core::{H262Error, H262Result};

use crate::decoder::Decoder;

/// 按名称创建解码器
pub fn create_decoder(name: &str) -> H262Result<Box<dyn Decoder>> {
    match name {
        "mpeg2video" | "h262" => mpeg2::Mpeg2Decoder::create(),
        other => Err(H262Error::InvalidArgument(format!("未知的解码器: {}", other))),
    }
}
