//! 日志初始化模块.
//!
//! 在配置文件的日志设置上叠加命令行 -v/-vv:
//! - file: 0=配置值, 1=debug, 2+=trace (H262_LOG 环境变量优先)
//! - console: -v 起输出 info, 否则沿用配置值
//!
//! 日志文件输出到 {directory}/{prefix}.{date}.log

use anyhow::Result;
use h262::logging::{self, LoggingConfig};

/// CLI 日志文件前缀
const FILE_PREFIX: &str = "h262-cli";

/// 合并配置与命令行详细级别
pub fn effective_config(base: &LoggingConfig, verbosity: u8) -> LoggingConfig {
    let mut config = base.clone();
    if config.file_prefix == LoggingConfig::default().file_prefix {
        config.file_prefix = FILE_PREFIX.to_string();
    }
    match verbosity {
        0 => {}
        1 => {
            config.level = "debug".to_string();
            config.console_level = "info".to_string();
        }
        _ => {
            config.level = "trace".to_string();
            config.console_level = "info".to_string();
        }
    }
    config
}

/// 初始化日志系统
pub fn init(base: &LoggingConfig, verbosity: u8) -> Result<()> {
    logging::init(&effective_config(base, verbosity))
}
