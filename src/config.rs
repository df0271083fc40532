//! 应用配置.
//!
//! JSON 格式, 所有字段可省略, 缺省时取默认值:
//!
//! ```json
//! {
//!   "logging": { "level": "debug", "directory": "logs" },
//!   "decoder": { "skip_policy": "copy", "mismatch_control": "per-coefficient" }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use h262_codec::decoders::mpeg2::DecoderOptions;

use crate::logging::LoggingConfig;

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 日志配置
    pub logging: LoggingConfig,
    /// 解码器选项
    pub decoder: DecoderOptions,
}

impl AppConfig {
    /// 从 JSON 文本解析
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("解析配置 JSON 失败")
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败, path={}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("配置文件格式错误, path={}", path.display()))
    }

    /// 序列化为格式化的 JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("序列化配置失败")
    }
}
