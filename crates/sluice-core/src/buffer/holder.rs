use std::collections::VecDeque;

use crate::error::{Result, SluiceError};

use super::{ByteBuf, Message};

/// 消息形态缓冲的队列类型。
pub type MessageQueue = VecDeque<Message>;

/// 缓冲形态标签，上下文据此在不加锁的情况下路由事件。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HolderKind {
    /// 字节流形态。
    Bytes,
    /// 消息队列形态。
    Messages,
}

/// `BufferHolder` 是阶段按方向二选一声明的缓冲形态。
///
/// 流式阶段（分帧前）声明 [`BufferHolder::Bytes`]，对象阶段（分帧后）
/// 声明 [`BufferHolder::Messages`]；同一方向只允许一种形态，查询
/// 另一种形态以 `pipeline.no_such_buffer` 失败。
pub enum BufferHolder {
    /// 字节缓冲。
    Bytes(Box<dyn ByteBuf>),
    /// 消息队列。
    Messages(MessageQueue),
}

impl BufferHolder {
    /// 声明一个空的消息队列形态。
    pub fn messages() -> Self {
        BufferHolder::Messages(MessageQueue::new())
    }

    /// 当前形态标签。
    pub fn kind(&self) -> HolderKind {
        match self {
            BufferHolder::Bytes(_) => HolderKind::Bytes,
            BufferHolder::Messages(_) => HolderKind::Messages,
        }
    }

    /// 以字节形态访问，形态不符时报错。
    pub fn byte_buf(&mut self, ctx_name: &str) -> Result<&mut Box<dyn ByteBuf>> {
        match self {
            BufferHolder::Bytes(buf) => Ok(buf),
            BufferHolder::Messages(_) => Err(SluiceError::no_such_buffer(ctx_name, "byte")),
        }
    }

    /// 以消息形态访问，形态不符时报错。
    pub fn message_queue(&mut self, ctx_name: &str) -> Result<&mut MessageQueue> {
        match self {
            BufferHolder::Messages(queue) => Ok(queue),
            BufferHolder::Bytes(_) => Err(SluiceError::no_such_buffer(ctx_name, "message")),
        }
    }
}
