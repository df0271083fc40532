//! # h262
//!
//! 纯 Rust 实现的 H.262 (MPEG-2 Video) 基本流解码器.
//!
//! - **解码**: 序列/GOP/图像头解析, slice 与宏块重建, 输出平面 YUV 4:2:0 帧
//! - **日志**: 控制台 + 按天滚动的文件日志, 历史日志自动清理与压缩
//! - **配置**: JSON 配置文件 (日志与解码器选项)
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use h262::codec::{RawYuvWriter, decode_stream};
//! use h262::config::AppConfig;
//!
//! let config = AppConfig::default();
//! let data = std::fs::read("input.m2v").unwrap();
//! let mut writer = RawYuvWriter::new(std::fs::File::create("out.yuv").unwrap());
//! let frames = decode_stream(&data, config.decoder, &mut writer).unwrap();
//! println!("解码 {frames} 帧");
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `h262-core` | 错误类型, 位流读写, 像素格式, 有理数 |
//! | `h262-codec` | MPEG-2 视频解码器与帧输出 |

/// 核心类型与工具
pub use h262_core as core;

/// 解码器
pub use h262_codec as codec;

pub mod config;
pub mod logging;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
