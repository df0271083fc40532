//! 拉取式解码接口.

use h262_core::H262Result;

use crate::frame::VideoFrame;
use crate::packet::Packet;

/// 视频解码器
///
/// 调用方反复 `send_packet` 送入字节, 每次送入后用 `receive_frame` 取空已完成的帧,
/// 直到返回 `NeedMoreData`. 输入结束时送入空包, 再取到 `Eof` 为止.
///
/// 错误约定:
/// - `NeedMoreData`: 缓存中没有完整的单元
/// - `Eof`: 输入已结束且全部帧已取出
/// - `Unsupported`: 码流使用了未实现的特性, 之后持续返回该错误直到 `flush`
pub trait Decoder: Send {
    /// 解码器名称, 与 `create_decoder` 使用的名称一致
    fn name(&self) -> &str;

    /// 追加一段输入; 空包表示输入结束
    fn send_packet(&mut self, packet: &Packet) -> H262Result<()>;

    /// 取出下一帧 (解码顺序)
    fn receive_frame(&mut self) -> H262Result<VideoFrame>;

    /// 丢弃缓存与全部解码状态, 回到初始状态
    fn flush(&mut self);
}
