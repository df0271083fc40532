//! 解码器可配置项
//!
//! 不同实现行为不一的地方以选项形式暴露.

use serde::{Deserialize, Serialize};

/// 跳过宏块的重建策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipPolicy {
    /// P 图像复制参考帧同位置宏块, B 图像沿用前一宏块的前向运动向量
    #[default]
    #[serde(alias = "copy-reference")]
    Copy,
    /// 不写入 (保留帧缓冲初始内容), 仍重置预测状态
    Leave,
}

/// 反量化失配控制方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchControl {
    /// 每个非零偶数系数向远离 0 的方向调整 1 (intra DC 除外), 再钳位
    #[default]
    PerCoefficient,
    /// ISO/IEC 13818-2 7.4.4: 64 个系数之和为偶数时翻转第 63 个系数的最低位
    Standard,
}

/// MPEG-2 解码器选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// 跳过宏块策略
    pub skip_policy: SkipPolicy,
    /// 失配控制方式
    pub mismatch_control: MismatchControl,
}

impl std::str::FromStr for SkipPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" | "copy-reference" => Ok(Self::Copy),
            "leave" => Ok(Self::Leave),
            other => Err(format!("未知的跳过宏块策略: {}", other)),
        }
    }
}

impl std::str::FromStr for MismatchControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "per-coefficient" => Ok(Self::PerCoefficient),
            other => Err(format!("未知的失配控制方式: {}", other)),
        }
    }
}
