//! 缓冲基座：索引式可变字节容器与流水线消息载体。
//!
//! ## 设计溯源（Why）
//! - 参考 Netty `ByteBuf` 的双游标模型（readerIndex/writerIndex）、Tokio
//!   `bytes` 的视图共享语义，提炼出适合 Handler 流水线的统一缓冲契约。
//! - 切片、副本、拷贝三种派生形态允许各阶段在尽量不复制的前提下
//!   消费与生产字节。
//!
//! ## 模块说明（What）
//! - [`byte_buf`]：对象安全的 [`ByteBuf`] 契约，覆盖游标、绝对/相对
//!   存取、批量搬运、视图派生与压缩。
//! - [`heap`]：唯一的具体实现族 [`HeapByteBuf`]，以共享堆存储 + 独立
//!   窗口/游标统一表达根缓冲、切片、副本、包装缓冲与空缓冲。
//! - [`factory`]：可插拔缓冲工厂，流水线与桥接据此租借缓冲。
//! - [`message`]：字节与业务对象的统一消息载体 [`Message`]。
//! - [`holder`]：阶段按方向声明的缓冲形态 [`BufferHolder`]。

pub mod byte_buf;
pub mod factory;
pub mod heap;
pub mod holder;
pub mod message;

pub use byte_buf::ByteBuf;
pub use factory::{BufferFactory, HeapBufferFactory};
pub use heap::HeapByteBuf;
pub use holder::{BufferHolder, HolderKind, MessageQueue};
pub use message::Message;

/// 多字节原语存取所遵循的字节序。
///
/// 声明于缓冲创建时，此后所有 `get_u16`/`write_u32` 等多字节访问
/// 一律按此序编解码。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// 网络序（大端），缺省值。
    #[default]
    Big,
    /// 小端。
    Little,
}
