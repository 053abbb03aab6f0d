use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use crate::buffer::{BufferFactory, ByteBuf, HolderKind, Message, MessageQueue};
use crate::channel::{Channel, ChannelFuture, ChannelPromise};
use crate::error::{Result, SluiceError, codes};
use crate::executor::{EventExecutor, ExecutorGroup};

use super::context::{HandlerContext, run_on};
use super::handler::{Capabilities, Handler, StateHandler, UserEvent};

/// 链表节点的代际句柄：`index` 定位槽位，`generation` 防止摘除后的
/// 陈旧句柄命中复用槽位。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// 链首哨兵（面向传输）。
    pub(crate) const HEAD: NodeId = NodeId {
        index: 0,
        generation: 0,
    };
    /// 链尾哨兵（终结入站事件与出站入口）。
    pub(crate) const TAIL: NodeId = NodeId {
        index: 1,
        generation: 0,
    };
}

struct Node {
    prev: Option<NodeId>,
    next: Option<NodeId>,
    ctx: Arc<HandlerContext>,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// 双向链表的存储：代际竞技场 + 名称索引，整体由流水线互斥锁守护。
struct Chain {
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<String, NodeId>,
}

impl Chain {
    fn new() -> Self {
        // 槽位 0/1 预留给头尾哨兵,永不回收。
        Self {
            slots: vec![
                Slot {
                    generation: 0,
                    node: None,
                },
                Slot {
                    generation: 0,
                    node: None,
                },
            ],
            free: Vec::new(),
            names: HashMap::new(),
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn reserve(&mut self) -> NodeId {
        if let Some(index) = self.free.pop() {
            let generation = self.slots[index as usize].generation;
            NodeId { index, generation }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: None,
            });
            NodeId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    /// 释放一个预订后未接入的槽位。
    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize)
            && slot.generation == id.generation
            && slot.node.is_none()
        {
            slot.generation += 1;
            self.free.push(id.index);
        }
    }

    /// 安放哨兵节点，不触达邻居。
    fn install_sentinel(
        &mut self,
        id: NodeId,
        ctx: Arc<HandlerContext>,
        prev: Option<NodeId>,
        next: Option<NodeId>,
    ) {
        self.slots[id.index as usize].node = Some(Node { prev, next, ctx });
    }

    /// 将节点接入 `prev` 与 `next` 之间。
    fn link(&mut self, id: NodeId, ctx: Arc<HandlerContext>, prev: NodeId, next: NodeId) {
        self.slots[id.index as usize].node = Some(Node {
            prev: Some(prev),
            next: Some(next),
            ctx,
        });
        if let Some(prev_node) = self.node_mut(prev) {
            prev_node.next = Some(id);
        }
        if let Some(next_node) = self.node_mut(next) {
            next_node.prev = Some(id);
        }
    }

    /// 摘除节点并缝合邻居，代际自增使陈旧句柄失效。
    fn unlink(&mut self, id: NodeId) -> Option<Arc<HandlerContext>> {
        let node = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .node
            .take()?;
        if let Some(prev) = node.prev
            && let Some(prev_node) = self.node_mut(prev)
        {
            prev_node.next = node.next;
        }
        if let Some(next) = node.next
            && let Some(next_node) = self.node_mut(next)
        {
            next_node.prev = node.prev;
        }
        let slot = &mut self.slots[id.index as usize];
        slot.generation += 1;
        self.free.push(id.index);
        Some(node.ctx)
    }

    fn all_contexts(&self) -> Vec<Arc<HandlerContext>> {
        let mut out = Vec::new();
        let mut cursor = Some(NodeId::HEAD);
        while let Some(id) = cursor {
            match self.node(id) {
                Some(node) => {
                    out.push(Arc::clone(&node.ctx));
                    cursor = node.next;
                }
                None => break,
            }
        }
        out
    }
}

/// 插入锚点。
enum Anchor<'a> {
    First,
    Last,
    Before(&'a str),
    After(&'a str),
}

/// `LinkedPipeline` 是单连接的 Handler 链路控制面。
///
/// # 设计背景（Why）
/// - 双向链表配合固定头尾哨兵消除了边界判空：链首哨兵承载传输
///   提供的操作 Handler，链尾哨兵终结入站事件并充当出站入口；
/// - 链表存储代际句柄而非拥有型指针（见 [`NodeId`]），上下文以
///   `Arc` 发放给在途任务，摘除仅使句柄失效。
///
/// # 契约说明（What）
/// - 拓扑变更与事件寻径由同一把链锁串行化；锁只覆盖寻径/缝合，
///   Handler 回调一律在锁外进行；
/// - 名称在链路内唯一（`pipeline.duplicate_name`）；
/// - 注册后，未显式指定执行器族的上下文统一钉在通道默认事件循环，
///   指定了族的上下文使用“每族一个”的稳定子执行器。
///
/// # 风险提示（Trade-offs）
/// - 事件投递拿到的上下文可能随后被摘除；投递任务以 `removed`
///   标记兜底，保证摘除完成后不再有回调命中。
pub struct LinkedPipeline {
    channel: Arc<dyn Channel>,
    factory: Arc<dyn BufferFactory>,
    chain: Mutex<Chain>,
    children: Mutex<HashMap<usize, Arc<dyn EventExecutor>>>,
    default_loop: Mutex<Option<Arc<dyn EventExecutor>>>,
    self_ref: OnceLock<Weak<LinkedPipeline>>,
}

impl LinkedPipeline {
    /// 组装流水线：`transport` 是传输提供的链首 Handler，承接全部
    /// 出站操作的终点。
    pub fn new(
        channel: Arc<dyn Channel>,
        factory: Arc<dyn BufferFactory>,
        transport: Arc<dyn Handler>,
    ) -> Result<Arc<Self>> {
        let pipeline = Arc::new(Self {
            channel: Arc::clone(&channel),
            factory,
            chain: Mutex::new(Chain::new()),
            children: Mutex::new(HashMap::new()),
            default_loop: Mutex::new(None),
            self_ref: OnceLock::new(),
        });
        let _ = pipeline.self_ref.set(Arc::downgrade(&pipeline));

        let head = HandlerContext::build(
            NodeId::HEAD,
            "head",
            transport,
            pipeline.weak_ref(),
            Arc::clone(&channel),
            None,
        )?;
        let tail = HandlerContext::build(
            NodeId::TAIL,
            "tail",
            Arc::new(TailHandler),
            pipeline.weak_ref(),
            Arc::clone(&channel),
            None,
        )?;
        {
            let mut chain = pipeline.chain.lock();
            chain.install_sentinel(NodeId::HEAD, head, None, Some(NodeId::TAIL));
            chain.install_sentinel(NodeId::TAIL, tail, Some(NodeId::HEAD), None);
        }
        Ok(pipeline)
    }

    fn weak_ref(&self) -> Weak<LinkedPipeline> {
        self.self_ref
            .get()
            .cloned()
            .expect("pipeline weak self must be initialized")
    }

    /// 所属通道。
    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    /// 缓冲工厂。
    pub fn factory(&self) -> Arc<dyn BufferFactory> {
        Arc::clone(&self.factory)
    }

    // ---- 拓扑操作 ----

    /// 插入为首个用户 Handler。
    pub fn add_first(
        &self,
        group: Option<&Arc<dyn ExecutorGroup>>,
        name: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<()> {
        self.add(Anchor::First, group, name, handler)
    }

    /// 追加为最后一个用户 Handler。
    pub fn add_last(
        &self,
        group: Option<&Arc<dyn ExecutorGroup>>,
        name: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<()> {
        self.add(Anchor::Last, group, name, handler)
    }

    /// 插入到既有 Handler 之前。
    pub fn add_before(
        &self,
        group: Option<&Arc<dyn ExecutorGroup>>,
        existing: &str,
        name: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<()> {
        self.add(Anchor::Before(existing), group, name, handler)
    }

    /// 插入到既有 Handler 之后。
    pub fn add_after(
        &self,
        group: Option<&Arc<dyn ExecutorGroup>>,
        existing: &str,
        name: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<()> {
        self.add(Anchor::After(existing), group, name, handler)
    }

    fn add(
        &self,
        anchor: Anchor<'_>,
        group: Option<&Arc<dyn ExecutorGroup>>,
        name: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<()> {
        // 一段:占住名字与槽位,失败路径负责回滚。
        let id = {
            let mut chain = self.chain.lock();
            if chain.names.contains_key(name) {
                return Err(SluiceError::new(
                    codes::PIPELINE_DUPLICATE_NAME,
                    format!("handler name `{name}` already in use"),
                ));
            }
            let id = chain.reserve();
            chain.names.insert(name.to_string(), id);
            id
        };

        let executor = match group {
            Some(group) => Some(self.child_executor(group)),
            None => self.default_loop.lock().clone(),
        };

        // 二段:构建上下文。Handler 的缓冲分配在链锁之外进行。
        let ctx = match HandlerContext::build(
            id,
            name,
            handler,
            self.weak_ref(),
            Arc::clone(&self.channel),
            executor,
        ) {
            Ok(ctx) => ctx,
            Err(err) => {
                let mut chain = self.chain.lock();
                chain.names.remove(name);
                chain.release(id);
                return Err(err);
            }
        };

        // 三段:解析锚点并缝入链表。
        {
            let mut chain = self.chain.lock();
            let (prev, next) = match anchor {
                Anchor::First => (
                    NodeId::HEAD,
                    chain
                        .node(NodeId::HEAD)
                        .and_then(|n| n.next)
                        .unwrap_or(NodeId::TAIL),
                ),
                Anchor::Last => (
                    chain
                        .node(NodeId::TAIL)
                        .and_then(|n| n.prev)
                        .unwrap_or(NodeId::HEAD),
                    NodeId::TAIL,
                ),
                Anchor::Before(existing) => match chain.names.get(existing).copied() {
                    Some(anchor_id) => (
                        chain
                            .node(anchor_id)
                            .and_then(|n| n.prev)
                            .unwrap_or(NodeId::HEAD),
                        anchor_id,
                    ),
                    None => {
                        chain.names.remove(name);
                        chain.release(id);
                        return Err(unknown_handler(existing));
                    }
                },
                Anchor::After(existing) => match chain.names.get(existing).copied() {
                    Some(anchor_id) => (
                        anchor_id,
                        chain
                            .node(anchor_id)
                            .and_then(|n| n.next)
                            .unwrap_or(NodeId::TAIL),
                    ),
                    None => {
                        chain.names.remove(name);
                        chain.release(id);
                        return Err(unknown_handler(existing));
                    }
                },
            };
            chain.link(id, Arc::clone(&ctx), prev, next);
        }

        tracing::debug!(channel = self.channel.id(), handler = name, "handler added");
        run_on(&ctx, |ctx| {
            if let Err(err) = ctx.handler_arc().handler_added(ctx) {
                ctx.notify_failure(err);
            }
        });
        Ok(())
    }

    /// 按名称摘除 Handler：标记、断链、在其执行器上终结资源。
    ///
    /// 摘除完成后不再有任何事件投递给该上下文；本地缓冲恰好释放
    /// 一次，桥接连同在途数据一并丢弃。
    pub fn remove(&self, name: &str) -> Result<Arc<dyn Handler>> {
        let ctx = {
            let mut chain = self.chain.lock();
            let id = chain
                .names
                .get(name)
                .copied()
                .ok_or_else(|| unknown_handler(name))?;
            let ctx = chain
                .node(id)
                .map(|node| Arc::clone(&node.ctx))
                .ok_or_else(|| unknown_handler(name))?;
            ctx.mark_removed();
            chain.names.remove(name);
            chain.unlink(id);
            ctx
        };
        tracing::debug!(channel = self.channel.id(), handler = name, "handler removed");
        run_on(&ctx, |ctx| ctx.teardown());
        Ok(ctx.handler_arc())
    }

    /// 原位替换 Handler：新节点继承旧节点的位置。
    pub fn replace(&self, old_name: &str, new_name: &str, handler: Arc<dyn Handler>) -> Result<()> {
        let new_id = {
            let mut chain = self.chain.lock();
            if !chain.names.contains_key(old_name) {
                return Err(unknown_handler(old_name));
            }
            if new_name != old_name && chain.names.contains_key(new_name) {
                return Err(SluiceError::new(
                    codes::PIPELINE_DUPLICATE_NAME,
                    format!("handler name `{new_name}` already in use"),
                ));
            }
            chain.reserve()
        };

        let executor = self.default_loop.lock().clone();
        let new_ctx = match HandlerContext::build(
            new_id,
            new_name,
            handler,
            self.weak_ref(),
            Arc::clone(&self.channel),
            executor,
        ) {
            Ok(ctx) => ctx,
            Err(err) => {
                self.chain.lock().release(new_id);
                return Err(err);
            }
        };

        let old_ctx = {
            let mut chain = self.chain.lock();
            let Some(old_id) = chain.names.get(old_name).copied() else {
                chain.release(new_id);
                return Err(unknown_handler(old_name));
            };
            if new_name != old_name && chain.names.contains_key(new_name) {
                chain.release(new_id);
                return Err(SluiceError::new(
                    codes::PIPELINE_DUPLICATE_NAME,
                    format!("handler name `{new_name}` already in use"),
                ));
            }
            let old_node = chain.node(old_id).expect("named node present");
            let prev = old_node.prev.unwrap_or(NodeId::HEAD);
            let next = old_node.next.unwrap_or(NodeId::TAIL);
            let old_ctx = Arc::clone(&old_node.ctx);
            old_ctx.mark_removed();
            chain.names.remove(old_name);
            chain.unlink(old_id);
            chain.names.insert(new_name.to_string(), new_id);
            chain.link(new_id, Arc::clone(&new_ctx), prev, next);
            old_ctx
        };

        tracing::debug!(
            channel = self.channel.id(),
            old = old_name,
            new = new_name,
            "handler replaced"
        );
        run_on(&old_ctx, |ctx| ctx.teardown());
        run_on(&new_ctx, |ctx| {
            if let Err(err) = ctx.handler_arc().handler_added(ctx) {
                ctx.notify_failure(err);
            }
        });
        Ok(())
    }

    /// 按名称检索上下文。
    pub fn get(&self, name: &str) -> Option<Arc<HandlerContext>> {
        let chain = self.chain.lock();
        let id = chain.names.get(name).copied()?;
        chain.node(id).map(|node| Arc::clone(&node.ctx))
    }

    /// 首个用户上下文。
    pub fn first(&self) -> Option<Arc<HandlerContext>> {
        let chain = self.chain.lock();
        let id = chain.node(NodeId::HEAD)?.next?;
        if id == NodeId::TAIL {
            return None;
        }
        chain.node(id).map(|node| Arc::clone(&node.ctx))
    }

    /// 最后一个用户上下文。
    pub fn last(&self) -> Option<Arc<HandlerContext>> {
        let chain = self.chain.lock();
        let id = chain.node(NodeId::TAIL)?.prev?;
        if id == NodeId::HEAD {
            return None;
        }
        chain.node(id).map(|node| Arc::clone(&node.ctx))
    }

    /// 自首至尾的上下文名称快照，顺序即执行序。
    pub fn names(&self) -> Vec<String> {
        let chain = self.chain.lock();
        chain
            .all_contexts()
            .into_iter()
            .map(|ctx| ctx.name().to_string())
            .collect()
    }

    // ---- 执行器装配 ----

    fn child_executor(&self, group: &Arc<dyn ExecutorGroup>) -> Arc<dyn EventExecutor> {
        let key = Arc::as_ptr(group).cast::<()>() as usize;
        let mut children = self.children.lock();
        Arc::clone(children.entry(key).or_insert_with(|| group.next()))
    }

    /// 注册到通道默认事件循环：钉住全部未绑定上下文并广播
    /// `channel_registered`。
    pub fn register(&self, executor: Arc<dyn EventExecutor>) {
        *self.default_loop.lock() = Some(Arc::clone(&executor));
        let contexts = { self.chain.lock().all_contexts() };
        for ctx in contexts {
            ctx.pin_executor(Arc::clone(&executor));
        }
        self.fire_channel_registered();
    }

    // ---- 寻径 ----

    pub(crate) fn next_context(
        &self,
        from: NodeId,
        caps: Capabilities,
    ) -> Option<Arc<HandlerContext>> {
        let chain = self.chain.lock();
        let mut cursor = chain.node(from)?.next;
        while let Some(id) = cursor {
            let node = chain.node(id)?;
            if node.ctx.capabilities().contains(caps) {
                return Some(Arc::clone(&node.ctx));
            }
            cursor = node.next;
        }
        None
    }

    pub(crate) fn prev_context(
        &self,
        from: NodeId,
        caps: Capabilities,
    ) -> Option<Arc<HandlerContext>> {
        let chain = self.chain.lock();
        let mut cursor = chain.node(from)?.prev;
        while let Some(id) = cursor {
            let node = chain.node(id)?;
            if node.ctx.capabilities().contains(caps) {
                return Some(Arc::clone(&node.ctx));
            }
            cursor = node.prev;
        }
        None
    }

    pub(crate) fn next_with_inbound(
        &self,
        from: NodeId,
        kind: HolderKind,
    ) -> Option<Arc<HandlerContext>> {
        let chain = self.chain.lock();
        let mut cursor = chain.node(from)?.next;
        while let Some(id) = cursor {
            let node = chain.node(id)?;
            if node.ctx.capabilities().contains(Capabilities::INBOUND)
                && node.ctx.in_kind() == Some(kind)
            {
                return Some(Arc::clone(&node.ctx));
            }
            cursor = node.next;
        }
        None
    }

    pub(crate) fn prev_with_outbound(
        &self,
        from: NodeId,
        kind: HolderKind,
    ) -> Option<Arc<HandlerContext>> {
        let chain = self.chain.lock();
        let mut cursor = chain.node(from)?.prev;
        while let Some(id) = cursor {
            let node = chain.node(id)?;
            if node.ctx.capabilities().contains(Capabilities::OUTBOUND)
                && node.ctx.out_kind() == Some(kind)
            {
                return Some(Arc::clone(&node.ctx));
            }
            cursor = node.prev;
        }
        None
    }

    pub(crate) fn head_context(&self) -> Arc<HandlerContext> {
        let chain = self.chain.lock();
        Arc::clone(&chain.node(NodeId::HEAD).expect("head sentinel").ctx)
    }

    pub(crate) fn tail_context(&self) -> Arc<HandlerContext> {
        let chain = self.chain.lock();
        Arc::clone(&chain.node(NodeId::TAIL).expect("tail sentinel").ctx)
    }

    // ---- 入站入口（传输侧） ----

    /// 写入首个入站字节缓冲（跨执行器时经桥接）。
    pub fn with_inbound_byte_buffer<R>(
        &self,
        f: impl FnOnce(&mut dyn ByteBuf) -> Result<R>,
    ) -> Result<R> {
        self.head_context().with_next_inbound_byte_buffer(f)
    }

    /// 写入首个入站消息缓冲。
    pub fn with_inbound_messages<R>(
        &self,
        f: impl FnOnce(&mut MessageQueue) -> Result<R>,
    ) -> Result<R> {
        self.head_context().with_next_inbound_messages(f)
    }

    /// 广播通道注册事件。
    pub fn fire_channel_registered(&self) {
        self.head_context().fire_channel_registered();
    }

    /// 广播通道注销事件。
    pub fn fire_channel_unregistered(&self) {
        self.head_context().fire_channel_unregistered();
    }

    /// 广播通道连通事件。
    pub fn fire_channel_active(&self) {
        self.head_context().fire_channel_active();
    }

    /// 广播通道断开事件。
    pub fn fire_channel_inactive(&self) {
        self.head_context().fire_channel_inactive();
    }

    /// 通知首个入站阶段缓冲有新数据。
    pub fn fire_inbound_buffer_updated(&self) {
        self.head_context().fire_inbound_buffer_updated();
    }

    /// 自链首注入异常事件。
    pub fn fire_exception_caught(&self, cause: SluiceError) {
        self.head_context().fire_exception_caught(cause);
    }

    /// 自链首注入用户事件。
    pub fn fire_user_event(&self, event: UserEvent) {
        self.head_context().fire_user_event(event);
    }

    // ---- 出站入口 ----

    /// 写消息并冲刷。通道已关闭时以 `channel.closed` 失败并恰好
    /// 触发一次 `exception_caught`。
    pub fn write(&self, msg: Message) -> ChannelFuture {
        let (promise, future) = ChannelPromise::new();
        if !self.channel.is_open() {
            let error = SluiceError::closed_channel();
            promise.fail(error.clone());
            self.head_context().fire_exception_caught(error);
            return future;
        }
        self.tail_context().write(msg, promise);
        future
    }

    /// 冲刷出站链路；已关闭通道同样归一化为 `channel.closed`。
    pub fn flush(&self) -> ChannelFuture {
        let (promise, future) = ChannelPromise::new();
        if !self.channel.is_open() {
            let error = SluiceError::closed_channel();
            promise.fail(error.clone());
            self.head_context().fire_exception_caught(error);
            return future;
        }
        self.tail_context().flush(promise);
        future
    }

    /// 绑定本地地址。
    pub fn bind(&self, addr: SocketAddr) -> ChannelFuture {
        let (promise, future) = ChannelPromise::new();
        self.tail_context().bind(addr, promise);
        future
    }

    /// 连接远端。
    pub fn connect(&self, remote: SocketAddr) -> ChannelFuture {
        let (promise, future) = ChannelPromise::new();
        self.tail_context().connect(remote, promise);
        future
    }

    /// 断开连接。
    pub fn disconnect(&self) -> ChannelFuture {
        let (promise, future) = ChannelPromise::new();
        self.tail_context().disconnect(promise);
        future
    }

    /// 关闭通道。
    pub fn close(&self) -> ChannelFuture {
        let (promise, future) = ChannelPromise::new();
        self.tail_context().close(promise);
        future
    }

    /// 从执行器注销。
    pub fn deregister(&self) -> ChannelFuture {
        let (promise, future) = ChannelPromise::new();
        self.tail_context().deregister(promise);
        future
    }

    /// Handler 回调失败的统一入口：记录后经 `exception_caught` 沿
    /// 链路投递。
    pub(crate) fn notify_handler_exception(&self, ctx: &HandlerContext, error: SluiceError) {
        tracing::debug!(
            channel = self.channel.id(),
            ctx = %ctx.name(),
            error = %error,
            "handler failure routed to exception_caught"
        );
        ctx.fire_exception_caught(error);
    }
}

fn unknown_handler(name: &str) -> SluiceError {
    SluiceError::new(
        codes::PIPELINE_UNKNOWN_HANDLER,
        format!("no handler named `{name}`"),
    )
}

/// 链尾哨兵 Handler：终结入站事件流。
///
/// 抵达链尾仍未被处理的异常记入错误日志后丢弃；用户事件与入站
/// 通知降级为调试日志。
pub(crate) struct TailHandler;

impl Handler for TailHandler {
    fn exception_caught(&self, ctx: &HandlerContext, cause: SluiceError) -> Result<()> {
        tracing::error!(
            channel = ctx.channel().id(),
            error = %cause,
            "exception reached pipeline tail, dropping"
        );
        Ok(())
    }

    fn user_event(&self, ctx: &HandlerContext, _event: UserEvent) -> Result<()> {
        tracing::debug!(
            channel = ctx.channel().id(),
            "user event reached pipeline tail, dropping"
        );
        Ok(())
    }

    fn as_state(&self) -> Option<&dyn StateHandler> {
        Some(self)
    }
}

impl StateHandler for TailHandler {
    fn inbound_buffer_updated(&self, ctx: &HandlerContext) -> Result<()> {
        tracing::debug!(
            channel = ctx.channel().id(),
            "inbound notification reached pipeline tail"
        );
        Ok(())
    }
}
