//! 输入数据包.
//!
//! 一个数据包是基本流中任意一段连续字节, 边界不必与起始码对齐.
//! 解码器内部缓存并按起始码重新切分.

use bytes::Bytes;

/// 基本流数据包
#[derive(Debug, Clone, Default)]
pub struct Packet {
    /// 流字节
    pub data: Bytes,
    /// 首字节在整个输入中的偏移, 未知时为 None
    pub pos: Option<u64>,
}

impl Packet {
    /// 空数据包, 表示输入结束
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: None,
        }
    }

    /// 带输入偏移的数据包
    pub fn at_offset(data: impl Into<Bytes>, pos: u64) -> Self {
        Self {
            data: data.into(),
            pos: Some(pos),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为结束包
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
