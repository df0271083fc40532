//! 统一错误类型定义.
//!
//! 解码流程中的错误分为四类:
//! - 流结束 (`Eof`): 单元边界处视为正常结束, 单元内部视为截断
//! - 码流损坏 (`InvalidData`): 在 slice 粒度恢复, 重新同步到下一个起始码
//! - 不支持的特性 (`Unsupported`): 对该码流的重建是致命的
//! - 其余为调用方使用错误或 I/O 错误

use thiserror::Error;

/// H.262 解码器统一错误类型
#[derive(Debug, Error)]
pub enum H262Error {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的码流特性
    #[error("不支持的特性: {0}")]
    Unsupported(String),

    /// 无效数据 (损坏的码流, 非法 VLC 码字等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

impl H262Error {
    /// 是否为可在 slice 粒度恢复的错误
    ///
    /// 码流损坏与单元内截断都只放弃当前 slice, 其余错误向上传播.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidData(_) | Self::Eof)
    }
}

/// H.262 解码器统一 Result 类型
pub type H262Result<T> = Result<T, H262Error>;
