//! h262-cli - H.262 / MPEG-2 Video 基本流解码工具
//!
//! 将 .m2v 基本流解码为原始 YUV420p 帧序列.

mod decode;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;

use h262::config::AppConfig;
use h262_codec::decoders::mpeg2::{MismatchControl, SkipPolicy};

use decode::decode_file;

#[derive(Parser, Debug)]
#[command(name = "h262-cli", version, about = "纯 Rust H.262 (MPEG-2 Video) 解码工具")]
struct Cli {
    /// 输入基本流文件 (.m2v)
    input: PathBuf,

    /// 输出原始 YUV420p 文件, 省略时写到 stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON 配置文件 (日志与解码器选项)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 跳过宏块策略: copy | leave
    #[arg(long = "skip-policy")]
    skip_policy: Option<SkipPolicy>,

    /// 失配控制方式: standard | per-coefficient
    #[arg(long = "mismatch")]
    mismatch: Option<MismatchControl>,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(policy) = cli.skip_policy {
        config.decoder.skip_policy = policy;
    }
    if let Some(mismatch) = cli.mismatch {
        config.decoder.mismatch_control = mismatch;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    logging::init(&config.logging, cli.verbose).context("初始化日志失败")?;
    log::debug!("解码器选项: {:?}", config.decoder);

    let summary = decode_file(&cli.input, cli.output.as_deref(), config.decoder)?;
    let stats = &summary.stats;
    eprintln!(
        "完成: {} 帧 ({}x{}), 输入 {} 字节",
        summary.frames, summary.width, summary.height, summary.input_bytes
    );
    eprintln!(
        "图像 {} (跳过 {}), 宏块 {} (跳过 {}), 放弃 slice {}",
        stats.pictures_decoded,
        stats.pictures_skipped,
        stats.macroblocks_decoded,
        stats.macroblocks_skipped,
        stats.slices_abandoned
    );
    if let Some(tc) = stats.last_time_code {
        eprintln!("最后时间码: {}", tc);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("错误: {:#}", e);
        process::exit(1);
    }
}
