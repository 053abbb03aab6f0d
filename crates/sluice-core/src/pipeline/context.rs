use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use crate::buffer::{BufferFactory, BufferHolder, ByteBuf, HolderKind, Message, MessageQueue};
use crate::channel::{Channel, ChannelFuture, ChannelPromise};
use crate::error::{Result, SluiceError, codes};
use crate::executor::EventExecutor;

use super::bridge::{MessageBridge, StreamBridge};
use super::extensions::Attributes;
use super::handler::{Capabilities, Handler, OperationHandler, StateHandler, UserEvent};
use super::pipeline::{LinkedPipeline, NodeId};

/// 按缓冲形态二选一的桥接句柄。
#[derive(Clone)]
pub(crate) enum BridgeKind {
    Stream(Arc<StreamBridge>),
    Message(Arc<MessageBridge>),
}

/// 生命周期事件的内部标签，统一调度路径。
#[derive(Clone, Copy, Debug)]
pub(crate) enum LifecycleEvent {
    Registered,
    Unregistered,
    Active,
    Inactive,
}

/// `HandlerContext` 是流水线中的阶段节点。
///
/// # 设计背景（Why）
/// - 把 Handler 与其身份、能力集、执行器绑定、本地缓冲和跨线程桥接
///   捆绑为一个节点，链表只存储节点的代际句柄（[`NodeId`]），避免
///   环状所有权；
/// - Handler 回调经由本节点访问链路：本地缓冲直接上锁，后继/前驱
///   缓冲按执行器亲和性在“直访”与“桥接中转”之间自动切换。
///
/// # 契约说明（What）
/// - 执行器绑定一经写入不再变化（`OnceLock`）；未注册时事件内联
///   执行，注册后严格按执行器串行投递；
/// - `removed` 标记与链表摘除在同一把链锁内完成，摘除后在途任务
///   观察到标记即放弃投递；
/// - 缓冲访问一律通过闭包（`with_*`），锁粒度与回调边界一致；
///   闭包内不得再进入其它缓冲闭包，以免交叉持锁。
pub struct HandlerContext {
    pub(crate) id: NodeId,
    name: String,
    handler: Arc<dyn Handler>,
    caps: Capabilities,
    pipeline: Weak<LinkedPipeline>,
    channel: Arc<dyn Channel>,
    executor: OnceLock<Arc<dyn EventExecutor>>,
    in_kind: OnceLock<HolderKind>,
    out_kind: OnceLock<HolderKind>,
    in_holder: Mutex<Option<BufferHolder>>,
    out_holder: Mutex<Option<BufferHolder>>,
    in_bridge: Mutex<Option<BridgeKind>>,
    out_bridge: Mutex<Option<BridgeKind>>,
    removed: AtomicBool,
    attributes: Attributes,
    self_ref: OnceLock<Weak<HandlerContext>>,
}

/// 在目标上下文的执行器上运行闭包；已在环内或尚未注册时内联执行。
///
/// 绝不从其它线程同步重入目标执行器：不在环内一律改为提交任务。
pub(crate) fn run_on(ctx: &Arc<HandlerContext>, f: impl FnOnce(&HandlerContext) + Send + 'static) {
    match ctx.executor.get() {
        None => f(ctx),
        Some(executor) => {
            if executor.in_event_loop() {
                f(ctx);
            } else {
                let target = Arc::clone(ctx);
                executor.execute(Box::new(move || f(&target)));
            }
        }
    }
}

impl HandlerContext {
    /// 构建节点：计算能力集、绑定执行器、向 Handler 索取缓冲形态。
    ///
    /// 缓冲创建失败对注册是致命的，以 `pipeline.init_failed` 上抛。
    pub(crate) fn build(
        id: NodeId,
        name: &str,
        handler: Arc<dyn Handler>,
        pipeline: Weak<LinkedPipeline>,
        channel: Arc<dyn Channel>,
        executor: Option<Arc<dyn EventExecutor>>,
    ) -> Result<Arc<HandlerContext>> {
        let caps = Capabilities::of(handler.as_ref());
        let ctx = Arc::new(HandlerContext {
            id,
            name: name.to_string(),
            handler,
            caps,
            pipeline,
            channel,
            executor: OnceLock::new(),
            in_kind: OnceLock::new(),
            out_kind: OnceLock::new(),
            in_holder: Mutex::new(None),
            out_holder: Mutex::new(None),
            in_bridge: Mutex::new(None),
            out_bridge: Mutex::new(None),
            removed: AtomicBool::new(false),
            attributes: Attributes::new(),
            self_ref: OnceLock::new(),
        });
        let _ = ctx.self_ref.set(Arc::downgrade(&ctx));
        if let Some(executor) = executor {
            ctx.pin_executor(executor);
        }

        if let Some(inbound) = ctx.handler.as_inbound() {
            let holder = inbound.new_inbound_holder(&ctx).map_err(|err| {
                SluiceError::new(
                    codes::PIPELINE_INIT_FAILED,
                    format!("handler `{name}` failed to create its inbound buffer"),
                )
                .with_cause(err)
            })?;
            let _ = ctx.in_kind.set(holder.kind());
            *ctx.in_holder.lock() = Some(holder);
        }
        if let Some(outbound) = ctx.handler.as_outbound() {
            let holder = outbound.new_outbound_holder(&ctx).map_err(|err| {
                SluiceError::new(
                    codes::PIPELINE_INIT_FAILED,
                    format!("handler `{name}` failed to create its outbound buffer"),
                )
                .with_cause(err)
            })?;
            let _ = ctx.out_kind.set(holder.kind());
            *ctx.out_holder.lock() = Some(holder);
        }
        Ok(ctx)
    }

    /// 节点名称，链路内唯一。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册时计算的能力标签集。
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// 所属通道。
    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    /// 所属流水线。
    pub fn pipeline(&self) -> Arc<LinkedPipeline> {
        self.pipeline
            .upgrade()
            .expect("pipeline must outlive its contexts")
    }

    /// 绑定的执行器；通道尚未注册时返回 `pipeline.not_registered`。
    pub fn executor(&self) -> Result<Arc<dyn EventExecutor>> {
        self.executor.get().cloned().ok_or_else(|| {
            SluiceError::new(codes::PIPELINE_NOT_REGISTERED, "channel not registered yet")
        })
    }

    /// 缓冲工厂入口。
    pub fn alloc(&self) -> Arc<dyn BufferFactory> {
        self.pipeline().factory()
    }

    /// 类型安全属性表。
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// 新建出站操作完成对。
    pub fn new_promise(&self) -> (ChannelPromise, ChannelFuture) {
        ChannelPromise::new()
    }

    /// 节点是否已被摘除。
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_removed(&self) {
        self.removed.store(true, Ordering::Release);
    }

    pub(crate) fn pin_executor(&self, executor: Arc<dyn EventExecutor>) {
        let _ = self.executor.set(executor);
    }

    pub(crate) fn handler_arc(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }

    pub(crate) fn in_kind(&self) -> Option<HolderKind> {
        self.in_kind.get().copied()
    }

    pub(crate) fn out_kind(&self) -> Option<HolderKind> {
        self.out_kind.get().copied()
    }

    fn arc(&self) -> Arc<HandlerContext> {
        self.self_ref
            .get()
            .and_then(Weak::upgrade)
            .expect("context weak self must be initialized")
    }

    fn state_view(&self) -> Option<&dyn StateHandler> {
        self.handler
            .as_state()
            .or_else(|| self.handler.as_inbound().map(|h| h as &dyn StateHandler))
    }

    fn operation_view(&self) -> Option<&dyn OperationHandler> {
        self.handler
            .as_operation()
            .or_else(|| self.handler.as_outbound().map(|h| h as &dyn OperationHandler))
    }

    /// 目标上下文当前是否可被本线程直接访问。
    fn direct_access(&self) -> bool {
        match self.executor.get() {
            None => true,
            Some(executor) => executor.in_event_loop(),
        }
    }

    // ---- 本地缓冲 ----

    /// 访问本地入站字节缓冲。
    pub fn with_inbound_byte_buffer<R>(
        &self,
        f: impl FnOnce(&mut dyn ByteBuf) -> Result<R>,
    ) -> Result<R> {
        let mut holder = self.in_holder.lock();
        match holder.as_mut() {
            Some(holder) => f(holder.byte_buf(&self.name)?.as_mut()),
            None => Err(SluiceError::no_such_buffer(&self.name, "inbound byte")),
        }
    }

    /// 访问本地入站消息缓冲。
    pub fn with_inbound_messages<R>(
        &self,
        f: impl FnOnce(&mut MessageQueue) -> Result<R>,
    ) -> Result<R> {
        let mut holder = self.in_holder.lock();
        match holder.as_mut() {
            Some(holder) => f(holder.message_queue(&self.name)?),
            None => Err(SluiceError::no_such_buffer(&self.name, "inbound message")),
        }
    }

    /// 访问本地出站字节缓冲。
    pub fn with_outbound_byte_buffer<R>(
        &self,
        f: impl FnOnce(&mut dyn ByteBuf) -> Result<R>,
    ) -> Result<R> {
        let mut holder = self.out_holder.lock();
        match holder.as_mut() {
            Some(holder) => f(holder.byte_buf(&self.name)?.as_mut()),
            None => Err(SluiceError::no_such_buffer(&self.name, "outbound byte")),
        }
    }

    /// 访问本地出站消息缓冲。
    pub fn with_outbound_messages<R>(
        &self,
        f: impl FnOnce(&mut MessageQueue) -> Result<R>,
    ) -> Result<R> {
        let mut holder = self.out_holder.lock();
        match holder.as_mut() {
            Some(holder) => f(holder.message_queue(&self.name)?),
            None => Err(SluiceError::no_such_buffer(&self.name, "outbound message")),
        }
    }

    // ---- 缓冲发现 ----

    /// 正向是否存在声明入站字节缓冲的后继。
    pub fn has_next_inbound_byte_buffer(&self) -> bool {
        self.pipeline()
            .next_with_inbound(self.id, HolderKind::Bytes)
            .is_some()
    }

    /// 正向是否存在声明入站消息缓冲的后继。
    pub fn has_next_inbound_message_buffer(&self) -> bool {
        self.pipeline()
            .next_with_inbound(self.id, HolderKind::Messages)
            .is_some()
    }

    /// 逆向是否存在声明出站字节缓冲的前驱。
    pub fn has_prev_outbound_byte_buffer(&self) -> bool {
        self.pipeline()
            .prev_with_outbound(self.id, HolderKind::Bytes)
            .is_some()
    }

    /// 逆向是否存在声明出站消息缓冲的前驱。
    pub fn has_prev_outbound_message_buffer(&self) -> bool {
        self.pipeline()
            .prev_with_outbound(self.id, HolderKind::Messages)
            .is_some()
    }

    // ---- 路由缓冲访问 ----

    /// 写入下一个入站字节缓冲：同执行器直访，跨执行器写入其桥接
    /// 中转缓冲（遵循相邻上下文隔离）。
    pub fn with_next_inbound_byte_buffer<R>(
        &self,
        f: impl FnOnce(&mut dyn ByteBuf) -> Result<R>,
    ) -> Result<R> {
        let target = self
            .pipeline()
            .next_with_inbound(self.id, HolderKind::Bytes)
            .ok_or_else(|| SluiceError::no_such_buffer(&self.name, "next inbound byte"))?;
        if target.direct_access() {
            target.with_inbound_byte_buffer(f)
        } else {
            target.inbound_stream_bridge()?.with_intake(f)
        }
    }

    /// 写入下一个入站消息缓冲。
    pub fn with_next_inbound_messages<R>(
        &self,
        f: impl FnOnce(&mut MessageQueue) -> Result<R>,
    ) -> Result<R> {
        let target = self
            .pipeline()
            .next_with_inbound(self.id, HolderKind::Messages)
            .ok_or_else(|| SluiceError::no_such_buffer(&self.name, "next inbound message"))?;
        if target.direct_access() {
            target.with_inbound_messages(f)
        } else {
            target.inbound_message_bridge()?.with_intake(f)
        }
    }

    /// 写入前一个出站字节缓冲。
    pub fn with_prev_outbound_byte_buffer<R>(
        &self,
        f: impl FnOnce(&mut dyn ByteBuf) -> Result<R>,
    ) -> Result<R> {
        let target = self
            .pipeline()
            .prev_with_outbound(self.id, HolderKind::Bytes)
            .ok_or_else(|| SluiceError::no_such_buffer(&self.name, "previous outbound byte"))?;
        if target.direct_access() {
            target.with_outbound_byte_buffer(f)
        } else {
            target.outbound_stream_bridge()?.with_intake(f)
        }
    }

    /// 写入前一个出站消息缓冲。
    pub fn with_prev_outbound_messages<R>(
        &self,
        f: impl FnOnce(&mut MessageQueue) -> Result<R>,
    ) -> Result<R> {
        let target = self
            .pipeline()
            .prev_with_outbound(self.id, HolderKind::Messages)
            .ok_or_else(|| SluiceError::no_such_buffer(&self.name, "previous outbound message"))?;
        if target.direct_access() {
            target.with_outbound_messages(f)
        } else {
            target.outbound_message_bridge()?.with_intake(f)
        }
    }

    // ---- 桥接管理 ----

    fn inbound_stream_bridge(&self) -> Result<Arc<StreamBridge>> {
        let factory = self.pipeline().factory();
        let mut slot = self.in_bridge.lock();
        match &*slot {
            Some(BridgeKind::Stream(bridge)) => Ok(Arc::clone(bridge)),
            Some(BridgeKind::Message(_)) => {
                Err(SluiceError::no_such_buffer(&self.name, "inbound byte"))
            }
            None => {
                let bridge = Arc::new(StreamBridge::new(factory.new_byte_buffer()));
                *slot = Some(BridgeKind::Stream(Arc::clone(&bridge)));
                Ok(bridge)
            }
        }
    }

    fn inbound_message_bridge(&self) -> Result<Arc<MessageBridge>> {
        let mut slot = self.in_bridge.lock();
        match &*slot {
            Some(BridgeKind::Message(bridge)) => Ok(Arc::clone(bridge)),
            Some(BridgeKind::Stream(_)) => {
                Err(SluiceError::no_such_buffer(&self.name, "inbound message"))
            }
            None => {
                let bridge = Arc::new(MessageBridge::new());
                *slot = Some(BridgeKind::Message(Arc::clone(&bridge)));
                Ok(bridge)
            }
        }
    }

    fn outbound_stream_bridge(&self) -> Result<Arc<StreamBridge>> {
        let factory = self.pipeline().factory();
        let mut slot = self.out_bridge.lock();
        match &*slot {
            Some(BridgeKind::Stream(bridge)) => Ok(Arc::clone(bridge)),
            Some(BridgeKind::Message(_)) => {
                Err(SluiceError::no_such_buffer(&self.name, "outbound byte"))
            }
            None => {
                let bridge = Arc::new(StreamBridge::new(factory.new_byte_buffer()));
                *slot = Some(BridgeKind::Stream(Arc::clone(&bridge)));
                Ok(bridge)
            }
        }
    }

    fn outbound_message_bridge(&self) -> Result<Arc<MessageBridge>> {
        let mut slot = self.out_bridge.lock();
        match &*slot {
            Some(BridgeKind::Message(bridge)) => Ok(Arc::clone(bridge)),
            Some(BridgeKind::Stream(_)) => {
                Err(SluiceError::no_such_buffer(&self.name, "outbound message"))
            }
            None => {
                let bridge = Arc::new(MessageBridge::new());
                *slot = Some(BridgeKind::Message(Arc::clone(&bridge)));
                Ok(bridge)
            }
        }
    }

    /// 装填入站桥接（生产方执行器专用）。
    pub(crate) fn fill_in_bridge(&self) {
        let bridge = self.in_bridge.lock().clone();
        match bridge {
            Some(BridgeKind::Stream(bridge)) => bridge.fill(),
            Some(BridgeKind::Message(bridge)) => bridge.fill(),
            None => {}
        }
    }

    /// 装填出站桥接（生产方执行器专用）。
    pub(crate) fn fill_out_bridge(&self) {
        let bridge = self.out_bridge.lock().clone();
        match bridge {
            Some(BridgeKind::Stream(bridge)) => bridge.fill(),
            Some(BridgeKind::Message(bridge)) => bridge.fill(),
            None => {}
        }
    }

    /// 将入站桥接排入本地缓冲（消费方执行器专用）。
    fn drain_in_bridge(&self) -> Result<()> {
        let bridge = self.in_bridge.lock().clone();
        match bridge {
            Some(BridgeKind::Stream(bridge)) => {
                self.with_inbound_byte_buffer(|buf| bridge.flush_into(buf))
            }
            Some(BridgeKind::Message(bridge)) => self.with_inbound_messages(|queue| {
                bridge.flush_into(queue);
                Ok(())
            }),
            None => Ok(()),
        }
    }

    /// 将出站桥接排入本地缓冲（消费方执行器专用）。
    fn drain_out_bridge(&self) -> Result<()> {
        let bridge = self.out_bridge.lock().clone();
        match bridge {
            Some(BridgeKind::Stream(bridge)) => {
                self.with_outbound_byte_buffer(|buf| bridge.flush_into(buf))
            }
            Some(BridgeKind::Message(bridge)) => self.with_outbound_messages(|queue| {
                bridge.flush_into(queue);
                Ok(())
            }),
            None => Ok(()),
        }
    }

    // ---- 正向事件 ----

    /// 通道注册事件，投递给下一个 STATE 节点。
    pub fn fire_channel_registered(&self) {
        self.fire_lifecycle(LifecycleEvent::Registered);
    }

    /// 通道注销事件。
    pub fn fire_channel_unregistered(&self) {
        self.fire_lifecycle(LifecycleEvent::Unregistered);
    }

    /// 通道连通事件。
    pub fn fire_channel_active(&self) {
        self.fire_lifecycle(LifecycleEvent::Active);
    }

    /// 通道断开事件。
    pub fn fire_channel_inactive(&self) {
        self.fire_lifecycle(LifecycleEvent::Inactive);
    }

    fn fire_lifecycle(&self, event: LifecycleEvent) {
        let Some(next) = self.pipeline().next_context(self.id, Capabilities::STATE) else {
            return;
        };
        run_on(&next, move |ctx| ctx.invoke_lifecycle(event));
    }

    pub(crate) fn invoke_lifecycle(&self, event: LifecycleEvent) {
        if self.is_removed() {
            return;
        }
        let Some(state) = self.state_view() else {
            return;
        };
        let result = match event {
            LifecycleEvent::Registered => state.channel_registered(self),
            LifecycleEvent::Unregistered => state.channel_unregistered(self),
            LifecycleEvent::Active => state.channel_active(self),
            LifecycleEvent::Inactive => state.channel_inactive(self),
        };
        if let Err(err) = result {
            self.notify_failure(err);
        }
    }

    /// 入站缓冲更新事件：在本执行器上装填下一个 STATE 节点的桥接，
    /// 再调度其执行器排空并回调。
    pub fn fire_inbound_buffer_updated(&self) {
        if let Some(executor) = self.executor.get()
            && !executor.in_event_loop()
        {
            let this = self.arc();
            executor.execute(Box::new(move || this.fire_inbound_buffer_updated()));
            return;
        }
        let Some(next) = self.pipeline().next_context(self.id, Capabilities::STATE) else {
            return;
        };
        next.fill_in_bridge();
        run_on(&next, |ctx| ctx.invoke_inbound_buffer_updated());
    }

    pub(crate) fn invoke_inbound_buffer_updated(&self) {
        if self.is_removed() {
            return;
        }
        if let Err(err) = self.drain_in_bridge() {
            self.notify_failure(err);
            return;
        }
        let result = match self.state_view() {
            Some(state) => state.inbound_buffer_updated(self),
            None => {
                self.fire_inbound_buffer_updated();
                Ok(())
            }
        };
        // 回调结束后丢弃已读字节,约束本地缓冲占用。
        if self.in_kind() == Some(HolderKind::Bytes) {
            let _ = self.with_inbound_byte_buffer(|buf| {
                buf.discard_read_bytes();
                Ok(())
            });
        }
        if let Err(err) = result {
            self.notify_failure(err);
        }
    }

    /// 异常事件：投递给下一个节点（类型不限）；无后继时记录并丢弃。
    pub fn fire_exception_caught(&self, cause: SluiceError) {
        match self.pipeline().next_context(self.id, Capabilities::NONE) {
            Some(next) => run_on(&next, move |ctx| ctx.invoke_exception_caught(cause)),
            None => {
                tracing::error!(ctx = %self.name, error = %cause, "exception reached pipeline tail, dropping");
            }
        }
    }

    pub(crate) fn invoke_exception_caught(&self, cause: SluiceError) {
        if self.is_removed() {
            tracing::debug!(ctx = %self.name, error = %cause, "dropping exception for removed context");
            return;
        }
        if let Err(err) = self.handler.exception_caught(self, cause) {
            // 异常处理器自身失败不再回圈,直接落日志。
            tracing::error!(ctx = %self.name, error = %err, "exception handler failed");
        }
    }

    /// 用户事件：原样投递给下一个节点。
    pub fn fire_user_event(&self, event: UserEvent) {
        match self.pipeline().next_context(self.id, Capabilities::NONE) {
            Some(next) => run_on(&next, move |ctx| ctx.invoke_user_event(event)),
            None => {
                tracing::debug!(ctx = %self.name, "user event reached pipeline tail, dropping");
            }
        }
    }

    pub(crate) fn invoke_user_event(&self, event: UserEvent) {
        if self.is_removed() {
            return;
        }
        if let Err(err) = self.handler.user_event(self, event) {
            self.notify_failure(err);
        }
    }

    // ---- 逆向操作 ----

    /// 绑定本地地址，逆向投递给前一个 OPERATION 节点。
    pub fn bind(&self, addr: SocketAddr, promise: ChannelPromise) {
        self.relay_operation(promise, move |op, ctx, promise| op.bind(ctx, addr, promise));
    }

    /// 连接远端。
    pub fn connect(&self, remote: SocketAddr, promise: ChannelPromise) {
        self.relay_operation(promise, move |op, ctx, promise| {
            op.connect(ctx, remote, promise)
        });
    }

    /// 断开连接。
    pub fn disconnect(&self, promise: ChannelPromise) {
        self.relay_operation(promise, |op, ctx, promise| op.disconnect(ctx, promise));
    }

    /// 关闭通道。
    pub fn close(&self, promise: ChannelPromise) {
        self.relay_operation(promise, |op, ctx, promise| op.close(ctx, promise));
    }

    /// 从执行器注销。
    pub fn deregister(&self, promise: ChannelPromise) {
        self.relay_operation(promise, |op, ctx, promise| op.deregister(ctx, promise));
    }

    /// 冲刷：先在本执行器上装填前驱的出站桥接，保证本阶段写出的
    /// 数据在其操作回调执行前可见，再调度其执行器排空并回调。
    pub fn flush(&self, promise: ChannelPromise) {
        if let Some(executor) = self.executor.get()
            && !executor.in_event_loop()
        {
            let this = self.arc();
            executor.execute(Box::new(move || this.flush(promise)));
            return;
        }
        let Some(prev) = self
            .pipeline()
            .prev_context(self.id, Capabilities::OPERATION)
        else {
            promise.fail(SluiceError::new(
                codes::PIPELINE_UNKNOWN_HANDLER,
                "no operation handler towards the transport",
            ));
            return;
        };
        prev.fill_out_bridge();
        run_on(&prev, move |ctx| ctx.invoke_flush(promise));
    }

    pub(crate) fn invoke_flush(&self, promise: ChannelPromise) {
        if self.is_removed() {
            promise.fail(SluiceError::new(
                codes::PIPELINE_UNKNOWN_HANDLER,
                "operation handler removed while flushing",
            ));
            return;
        }
        if let Err(err) = self.drain_out_bridge() {
            promise.fail(err.clone());
            self.notify_failure(err);
            return;
        }
        let Some(op) = self.operation_view() else {
            promise.fail(SluiceError::new(
                codes::PIPELINE_UNKNOWN_HANDLER,
                "context lost its operation capability",
            ));
            return;
        };
        if let Err(err) = op.flush(self, promise.clone()) {
            promise.fail(err.clone());
            self.notify_failure(err);
        }
    }

    /// 写消息：排入前驱的出站缓冲后立即冲刷。
    pub fn write(&self, msg: Message, promise: ChannelPromise) {
        if let Some(executor) = self.executor.get()
            && !executor.in_event_loop()
        {
            let this = self.arc();
            executor.execute(Box::new(move || this.write(msg, promise)));
            return;
        }
        let queued = match msg {
            Message::Buffer(mut buf) => {
                let len = buf.readable_bytes();
                self.with_prev_outbound_byte_buffer(move |out| out.write_from(buf.as_mut(), len))
            }
            user @ Message::User(_) => self.with_prev_outbound_messages(move |queue| {
                queue.push_back(user);
                Ok(())
            }),
        };
        match queued {
            Ok(()) => self.flush(promise),
            Err(err) => {
                promise.fail(err.clone());
                self.fire_exception_caught(err);
            }
        }
    }

    fn relay_operation(
        &self,
        promise: ChannelPromise,
        apply: impl FnOnce(&dyn OperationHandler, &HandlerContext, ChannelPromise) -> Result<()>
        + Send
        + 'static,
    ) {
        let Some(prev) = self
            .pipeline()
            .prev_context(self.id, Capabilities::OPERATION)
        else {
            promise.fail(SluiceError::new(
                codes::PIPELINE_UNKNOWN_HANDLER,
                "no operation handler towards the transport",
            ));
            return;
        };
        run_on(&prev, move |ctx| {
            if ctx.is_removed() {
                promise.fail(SluiceError::new(
                    codes::PIPELINE_UNKNOWN_HANDLER,
                    "operation handler removed",
                ));
                return;
            }
            let Some(op) = ctx.operation_view() else {
                promise.fail(SluiceError::new(
                    codes::PIPELINE_UNKNOWN_HANDLER,
                    "context lost its operation capability",
                ));
                return;
            };
            if let Err(err) = apply(op, ctx, promise.clone()) {
                promise.fail(err.clone());
                ctx.notify_failure(err);
            }
        });
    }

    // ---- 失败与终结 ----

    /// 把回调失败交给流水线统一路由。
    pub(crate) fn notify_failure(&self, error: SluiceError) {
        self.pipeline().notify_handler_exception(self, error);
    }

    /// 摘除后的资源终结：丢弃桥接、恰好一次释放缓冲、回调 Handler。
    pub(crate) fn teardown(&self) {
        *self.in_bridge.lock() = None;
        *self.out_bridge.lock() = None;
        let in_holder = self.in_holder.lock().take();
        let out_holder = self.out_holder.lock().take();
        drop(in_holder);
        drop(out_holder);
        if let Err(err) = self.handler.handler_removed(self) {
            tracing::warn!(ctx = %self.name, error = %err, "handler_removed callback failed");
        }
    }
}
