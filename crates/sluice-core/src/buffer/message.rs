use std::any::Any;
use std::fmt;

use super::ByteBuf;

/// `Message` 统一承载字节缓冲与业务对象两类流水线负载。
///
/// # 设计背景（Why）
/// - 分帧之后的阶段处理的往往不再是裸字节，而是帧或业务结构；
///   消息队列形态的缓冲需要一个统一载体在阶段间穿梭。
/// - `User` 变体通过 `Any` 支持运行时下转型，管道无需感知具体类型。
///
/// # 契约说明（What）
/// - `User` 内部类型必须满足 `Send + Sync + 'static`；
/// - 消费方在下转型失败时必须显式处理，不得假定类型。
pub enum Message {
    /// 字节缓冲负载。
    Buffer(Box<dyn ByteBuf>),
    /// 业务对象负载。
    User(Box<dyn Any + Send + Sync>),
}

impl Message {
    /// 包装业务对象。
    pub fn from_user<T: Any + Send + Sync>(value: T) -> Self {
        Message::User(Box::new(value))
    }

    /// 是否为字节缓冲负载。
    pub fn is_buffer(&self) -> bool {
        matches!(self, Message::Buffer(_))
    }

    /// 尝试取出字节缓冲，失败时原样退还。
    pub fn into_buffer(self) -> Result<Box<dyn ByteBuf>, Message> {
        match self {
            Message::Buffer(buf) => Ok(buf),
            other => Err(other),
        }
    }

    /// 尝试下转型业务对象，失败时原样退还。
    pub fn downcast<T: Any + Send + Sync>(self) -> Result<Box<T>, Message> {
        match self {
            Message::User(any) => any.downcast::<T>().map_err(Message::User),
            other => Err(other),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 刻意隐藏负载内容,避免日志泄漏业务数据。
        match self {
            Message::Buffer(buf) => f
                .debug_struct("Message::Buffer")
                .field("readable", &buf.readable_bytes())
                .finish(),
            Message::User(_) => f.debug_tuple("Message::User").field(&"<erased>").finish(),
        }
    }
}
