//! # h262-core
//!
//! H.262 (MPEG-2 Video) 解码器的核心库, 提供基础类型定义、错误处理和位流读写工具.
//!
//! 本 crate 不包含任何语法解析逻辑, 只提供被解码器各层共享的底层设施.

pub mod bitreader;
pub mod bitwriter;
pub mod error;
pub mod pixel_format;
pub mod rational;

// 重导出常用类型
pub use error::{H262Error, H262Result};
pub use pixel_format::PixelFormat;
pub use rational::Rational;
