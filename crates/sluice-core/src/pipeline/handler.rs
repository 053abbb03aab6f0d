use std::any::Any;
use std::fmt;
use std::net::SocketAddr;

use crate::buffer::BufferHolder;
use crate::channel::ChannelPromise;
use crate::error::{Result, SluiceError};

use super::context::HandlerContext;

/// 沿链路原样透传的用户事件载体。
pub type UserEvent = Box<dyn Any + Send + Sync>;

/// 能力标签集：上下文按此过滤正向/逆向遍历。
///
/// # 设计背景（Why）
/// - 以注册时计算好的小位集替代运行期类型探测，遍历热路径只做一次
///   位运算；
/// - INBOUND 蕴含 STATE、OUTBOUND 蕴含 OPERATION，与 Handler 合约的
///   父子关系一致。
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    /// 空集；作为过滤条件时匹配任意上下文。
    pub const NONE: Capabilities = Capabilities(0);
    /// 生命周期与入站通知回调。
    pub const STATE: Capabilities = Capabilities(1);
    /// 声明入站缓冲。
    pub const INBOUND: Capabilities = Capabilities(2);
    /// 声明出站缓冲。
    pub const OUTBOUND: Capabilities = Capabilities(4);
    /// 出站操作回调。
    pub const OPERATION: Capabilities = Capabilities(8);

    /// 由 Handler 的能力视图推导标签集。
    pub fn of(handler: &dyn Handler) -> Capabilities {
        let mut caps = Capabilities::NONE;
        if handler.as_state().is_some() {
            caps = caps.with(Capabilities::STATE);
        }
        if handler.as_inbound().is_some() {
            caps = caps.with(Capabilities::INBOUND).with(Capabilities::STATE);
        }
        if handler.as_operation().is_some() {
            caps = caps.with(Capabilities::OPERATION);
        }
        if handler.as_outbound().is_some() {
            caps = caps.with(Capabilities::OUTBOUND).with(Capabilities::OPERATION);
        }
        caps
    }

    /// 并入另一组标签。
    pub fn with(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    /// 是否包含给定标签组（空集恒为真）。
    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    /// 是否为空集。
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.contains(Capabilities::STATE) {
            set.entry(&"state");
        }
        if self.contains(Capabilities::INBOUND) {
            set.entry(&"inbound");
        }
        if self.contains(Capabilities::OUTBOUND) {
            set.entry(&"outbound");
        }
        if self.contains(Capabilities::OPERATION) {
            set.entry(&"operation");
        }
        set.finish()
    }
}

/// `Handler` 是所有流水线阶段的根合约。
///
/// # 设计背景（Why）
/// - 事件沿链路穿梭时需要统一的转发缺省：未覆写的回调自动把事件
///   交给后继，链路语义由覆写者显式打断；
/// - 能力通过 `as_state` 等视图方法声明——返回 `Some(self)` 即声明
///   对应能力，上下文据此计算标签集并分配本地缓冲。
///
/// # 契约说明（What）
/// - 所有回调都在宿主上下文绑定的执行器上串行调用，不得阻塞；
/// - 回调返回 `Err` 时由调度点捕获，经 `exception_caught` 沿链路
///   投递，绝不同步抛回执行器；
/// - `exception_caught` / `user_event` 的缺省实现向后转发；链尾的
///   终结 Handler 负责记录并丢弃。
///
/// # 风险提示（Trade-offs）
/// - 请勿在回调外长期保留 `HandlerContext` 引用；跨事件状态应放入
///   Handler 自身（以内部可变性保护）或上下文属性表。
pub trait Handler: Send + Sync + 'static {
    /// Handler 接入链路后的回调。
    fn handler_added(&self, ctx: &HandlerContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Handler 摘除后的回调，本地缓冲已被释放。
    fn handler_removed(&self, ctx: &HandlerContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// 异常事件；缺省向后转发。
    fn exception_caught(&self, ctx: &HandlerContext, cause: SluiceError) -> Result<()> {
        ctx.fire_exception_caught(cause);
        Ok(())
    }

    /// 用户事件；缺省原样向后转发。
    fn user_event(&self, ctx: &HandlerContext, event: UserEvent) -> Result<()> {
        ctx.fire_user_event(event);
        Ok(())
    }

    /// 声明 STATE 能力。
    fn as_state(&self) -> Option<&dyn StateHandler> {
        None
    }

    /// 声明 INBOUND 能力（蕴含 STATE）。
    fn as_inbound(&self) -> Option<&dyn InboundHandler> {
        None
    }

    /// 声明 OPERATION 能力。
    fn as_operation(&self) -> Option<&dyn OperationHandler> {
        None
    }

    /// 声明 OUTBOUND 能力（蕴含 OPERATION）。
    fn as_outbound(&self) -> Option<&dyn OutboundHandler> {
        None
    }
}

/// 生命周期与入站通知合约。
///
/// 缺省实现全部向后转发，使纯观察型阶段零成本接入；覆写而不转发
/// 即截断传播。
pub trait StateHandler: Send + Sync {
    /// 通道注册到执行器。
    fn channel_registered(&self, ctx: &HandlerContext) -> Result<()> {
        ctx.fire_channel_registered();
        Ok(())
    }

    /// 通道从执行器注销。
    fn channel_unregistered(&self, ctx: &HandlerContext) -> Result<()> {
        ctx.fire_channel_unregistered();
        Ok(())
    }

    /// 传输连通。
    fn channel_active(&self, ctx: &HandlerContext) -> Result<()> {
        ctx.fire_channel_active();
        Ok(())
    }

    /// 传输断开。
    fn channel_inactive(&self, ctx: &HandlerContext) -> Result<()> {
        ctx.fire_channel_inactive();
        Ok(())
    }

    /// 入站缓冲有新数据可消费。
    fn inbound_buffer_updated(&self, ctx: &HandlerContext) -> Result<()> {
        ctx.fire_inbound_buffer_updated();
        Ok(())
    }
}

/// 声明入站缓冲的阶段合约。
///
/// 注册时被询问一次缓冲形态；`inbound_buffer_updated` 触发前，
/// 跨执行器桥接中的数据已被排入本地缓冲。
pub trait InboundHandler: StateHandler {
    /// 声明入站缓冲形态，注册期调用一次。
    fn new_inbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder>;
}

/// 出站操作合约，逆向（朝传输方向）传播。
///
/// 缺省实现向前继（更靠近传输的一侧）转发；链首的传输 Handler
/// 执行真实动作并完成 promise。
pub trait OperationHandler: Send + Sync {
    /// 绑定本地地址。
    fn bind(&self, ctx: &HandlerContext, addr: SocketAddr, promise: ChannelPromise) -> Result<()> {
        ctx.bind(addr, promise);
        Ok(())
    }

    /// 连接远端。
    fn connect(
        &self,
        ctx: &HandlerContext,
        remote: SocketAddr,
        promise: ChannelPromise,
    ) -> Result<()> {
        ctx.connect(remote, promise);
        Ok(())
    }

    /// 断开连接。
    fn disconnect(&self, ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        ctx.disconnect(promise);
        Ok(())
    }

    /// 关闭通道。
    fn close(&self, ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        ctx.close(promise);
        Ok(())
    }

    /// 从执行器注销。
    fn deregister(&self, ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        ctx.deregister(promise);
        Ok(())
    }

    /// 冲刷出站缓冲；调用时本上下文的出站桥接已排空到本地缓冲。
    fn flush(&self, ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        ctx.flush(promise);
        Ok(())
    }
}

/// 声明出站缓冲的阶段合约。
pub trait OutboundHandler: OperationHandler {
    /// 声明出站缓冲形态，注册期调用一次。
    fn new_outbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder>;
}
