//! 测试桩集合：执行器、通道与传输 Handler 的最小实现。
//!
//! # 设计定位（Why）
//! - 流水线的端到端验证需要一个可控的“传输”：内存 sink 取代套接字，
//!   关闭语义可显式翻转；
//! - 各测试文件重复手写这些桩既增加维护成本，也容易在合约调整时
//!   漏改，统一出口后接口变更会集中暴露为编译错误。
//!
//! # 使用方式（How）
//! - [`ImmediateExecutor`]：恒在环内、内联执行，适合单线程场景的
//!   确定性断言；
//! - [`TestChannel`] + [`MemoryTransportHandler`]：组成链首传输——
//!   冲刷落入内存 sink，通道关闭后写入按 `channel.closed` 归一化。
//!
//! # 契约说明（What）
//! - 桩对象仅面向测试与示例；生产代码依赖它们时应显式说明原因。

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::buffer::BufferHolder;
use crate::channel::{Channel, ChannelPromise};
use crate::error::{Result, SluiceError};
use crate::executor::{EventExecutor, Task};
use crate::pipeline::{Handler, HandlerContext, OperationHandler, OutboundHandler};

/// 内联执行器：任务在提交线程立即执行，`in_event_loop` 恒真。
///
/// 单线程测试里让全部调度路径退化为同步调用，断言无须等待。
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateExecutor;

impl EventExecutor for ImmediateExecutor {
    fn in_event_loop(&self) -> bool {
        true
    }

    fn execute(&self, task: Task) {
        task();
    }
}

/// 开闭状态可显式翻转的测试通道。
pub struct TestChannel {
    id: u64,
    open: AtomicBool,
    active: AtomicBool,
}

impl TestChannel {
    /// 创建处于打开、未连通状态的通道。
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            open: AtomicBool::new(true),
            active: AtomicBool::new(false),
        })
    }

    /// 翻转连通状态。
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// 强制进入关闭状态。
    pub fn force_close(&self) {
        self.open.store(false, Ordering::Release);
        self.active.store(false, Ordering::Release);
    }
}

impl Channel for TestChannel {
    fn id(&self) -> u64 {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// 记录出站操作调用的条目。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportOp {
    /// 绑定请求及地址。
    Bind(SocketAddr),
    /// 连接请求及远端地址。
    Connect(SocketAddr),
    /// 断开请求。
    Disconnect,
    /// 关闭请求。
    Close,
    /// 注销请求。
    Deregister,
}

/// 链首传输桩：出站字节落入内存 sink，操作调用记入日志。
///
/// 关闭后的冲刷以 `channel.closed` 失败，复现真实传输对
/// “写已关闭连接”的归一化。
pub struct MemoryTransportHandler {
    channel: Arc<TestChannel>,
    sink: Mutex<Vec<u8>>,
    ops: Mutex<Vec<TransportOp>>,
}

impl MemoryTransportHandler {
    /// 绑定到给定测试通道。
    pub fn new(channel: Arc<TestChannel>) -> Arc<Self> {
        Arc::new(Self {
            channel,
            sink: Mutex::new(Vec::new()),
            ops: Mutex::new(Vec::new()),
        })
    }

    /// 已冲刷字节的快照。
    pub fn flushed(&self) -> Vec<u8> {
        self.sink.lock().clone()
    }

    /// 清空 sink，便于多轮断言。
    pub fn clear_flushed(&self) {
        self.sink.lock().clear();
    }

    /// 操作日志快照。
    pub fn operations(&self) -> Vec<TransportOp> {
        self.ops.lock().clone()
    }
}

impl Handler for MemoryTransportHandler {
    fn as_operation(&self) -> Option<&dyn OperationHandler> {
        Some(self)
    }

    fn as_outbound(&self) -> Option<&dyn OutboundHandler> {
        Some(self)
    }
}

impl OperationHandler for MemoryTransportHandler {
    fn bind(&self, _ctx: &HandlerContext, addr: SocketAddr, promise: ChannelPromise) -> Result<()> {
        self.ops.lock().push(TransportOp::Bind(addr));
        promise.succeed();
        Ok(())
    }

    fn connect(
        &self,
        _ctx: &HandlerContext,
        remote: SocketAddr,
        promise: ChannelPromise,
    ) -> Result<()> {
        self.ops.lock().push(TransportOp::Connect(remote));
        self.channel.set_active(true);
        promise.succeed();
        Ok(())
    }

    fn disconnect(&self, _ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        self.ops.lock().push(TransportOp::Disconnect);
        self.channel.set_active(false);
        promise.succeed();
        Ok(())
    }

    fn close(&self, _ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        self.ops.lock().push(TransportOp::Close);
        self.channel.force_close();
        promise.succeed();
        Ok(())
    }

    fn deregister(&self, _ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        self.ops.lock().push(TransportOp::Deregister);
        promise.succeed();
        Ok(())
    }

    fn flush(&self, ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        if !self.channel.is_open() {
            promise.fail(SluiceError::closed_channel());
            return Ok(());
        }
        let drained = ctx.with_outbound_byte_buffer(|buf| {
            let bytes = buf.to_vec();
            buf.clear();
            Ok(bytes)
        })?;
        self.sink.lock().extend_from_slice(&drained);
        promise.succeed();
        Ok(())
    }
}

impl OutboundHandler for MemoryTransportHandler {
    fn new_outbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}
