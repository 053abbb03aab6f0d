//! 通道协作方契约与出站操作完成通知。
//!
//! 具体传输（socket、datagram 等）在核心之外实现；核心只依赖
//! [`Channel`] 暴露的身份与开闭状态，以及 [`ChannelPromise`] /
//! [`ChannelFuture`] 这对出站操作完成原语。

pub mod future;

pub use future::{ChannelFuture, ChannelPromise};

use std::net::SocketAddr;

/// `Channel` 是传输层在核心中的最小投影。
///
/// # 契约说明（What）
/// - `is_open`：通道自创建起为真，关闭后永久为假；流水线据此把
///   关闭后的写入归一化为 `channel.closed` 失败。
/// - `is_active`：传输已连通且可收发；
/// - 地址访问为可选能力，未连接的传输返回 `None`。
///
/// # 前置/后置条件（Contract）
/// - 实现必须线程安全；状态翻转由传输自身驱动（核心从不主动修改）。
pub trait Channel: Send + Sync + 'static {
    /// 通道标识，用于日志关联。
    fn id(&self) -> u64;

    /// 通道是否仍处于打开状态。
    fn is_open(&self) -> bool;

    /// 传输是否已连通。
    fn is_active(&self) -> bool;

    /// 本端地址。
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// 对端地址。
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}
