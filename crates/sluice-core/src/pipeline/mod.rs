//! 单连接 Handler 流水线：链路拓扑、事件传播与跨执行器接力。
//!
//! ## 设计溯源（Why）
//! - 借鉴 Netty ChannelPipeline 的双向链表 + 哨兵模型：入站事件自
//!   链首正向流向链尾，出站操作自链尾逆向流向链首（传输侧）；
//! - 上下文分属不同执行器时，相邻阶段间的数据经 [`bridge`] 的交换
//!   队列移交，私有缓冲绝不跨线程暴露。
//!
//! ## 模块说明（What）
//! - [`handler`]：能力标签与 Handler 合约族（STATE / INBOUND /
//!   OUTBOUND / OPERATION）。
//! - [`context`]：阶段节点 [`HandlerContext`]，绑定 Handler、执行器、
//!   本地缓冲与桥接。
//! - [`pipeline`]：链路控制面 [`LinkedPipeline`]，拓扑操作与事件
//!   入口。
//! - [`bridge`]：跨执行器的字节/消息接力结构。
//! - [`extensions`]：上下文属性表。

pub mod bridge;
pub mod context;
pub mod extensions;
pub mod handler;
#[allow(clippy::module_inception)]
pub mod pipeline;

pub use bridge::{MessageBridge, StreamBridge};
pub use context::HandlerContext;
pub use extensions::Attributes;
pub use handler::{
    Capabilities, Handler, InboundHandler, OperationHandler, OutboundHandler, StateHandler,
    UserEvent,
};
pub use pipeline::{LinkedPipeline, NodeId};
