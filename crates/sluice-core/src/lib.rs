#![doc = "sluice-core: 单连接 Handler 流水线与索引式字节缓冲基座。"]
#![doc = ""]
#![doc = "核心由三部分组成:缓冲基座([`buffer`],读写双游标的字节容器与"]
#![doc = "视图派生)、流水线([`pipeline`],可动态编辑的阶段链与事件传播)、"]
#![doc = "以及执行器契约([`executor`],上下文与事件循环的绑定)。具体传输、"]
#![doc = "编解码器与引导逻辑均在本 crate 之外以协作方接口接入。"]

pub mod buffer;
pub mod channel;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod test_stubs;

pub use buffer::{
    BufferFactory, BufferHolder, ByteBuf, ByteOrder, HeapBufferFactory, HeapByteBuf, HolderKind,
    Message, MessageQueue,
};
pub use channel::{Channel, ChannelFuture, ChannelPromise};
pub use error::{ErrorCause, Result, SluiceError, codes};
pub use executor::{EventExecutor, ExecutorGroup, MultiThreadGroup, SingleThreadExecutor};
pub use pipeline::{
    Attributes, Capabilities, Handler, HandlerContext, InboundHandler, LinkedPipeline,
    MessageBridge, OperationHandler, OutboundHandler, StateHandler, StreamBridge, UserEvent,
};

/// 常用契约的一站式导入面。
///
/// 上层 crate 只需 `use sluice_core::prelude::*;` 即可获得缓冲、
/// 流水线与执行器的高频类型，避免深层路径在业务代码中扩散。
pub mod prelude {
    pub use crate::buffer::{
        BufferFactory, BufferHolder, ByteBuf, ByteOrder, HeapBufferFactory, HeapByteBuf,
        HolderKind, Message, MessageQueue,
    };
    pub use crate::channel::{Channel, ChannelFuture, ChannelPromise};
    pub use crate::error::{Result, SluiceError, codes};
    pub use crate::executor::{EventExecutor, ExecutorGroup, MultiThreadGroup, SingleThreadExecutor};
    pub use crate::pipeline::{
        Capabilities, Handler, HandlerContext, InboundHandler, LinkedPipeline, OperationHandler,
        OutboundHandler, StateHandler, UserEvent,
    };
}
