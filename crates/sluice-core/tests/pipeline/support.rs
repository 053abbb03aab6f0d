//! 测试共用夹具：最小流水线装配与记录型 Handler。

use std::sync::{Arc, Mutex};

use sluice_core::prelude::*;
use sluice_core::test_stubs::{ImmediateExecutor, MemoryTransportHandler, TestChannel};

/// 组装一条注册在内联执行器上的流水线。
pub fn fixture() -> (
    Arc<TestChannel>,
    Arc<MemoryTransportHandler>,
    Arc<LinkedPipeline>,
) {
    let channel = TestChannel::new(7);
    let transport = MemoryTransportHandler::new(Arc::clone(&channel));
    let pipeline = LinkedPipeline::new(
        Arc::clone(&channel) as Arc<dyn Channel>,
        Arc::new(HeapBufferFactory::default()),
        Arc::clone(&transport) as Arc<dyn Handler>,
    )
    .expect("pipeline assembles");
    pipeline.register(Arc::new(ImmediateExecutor));
    (channel, transport, pipeline)
}

/// 共享事件日志。
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(log: &EventLog) -> Vec<String> {
    log.lock().expect("log lock").clone()
}

/// 记录生命周期与用户事件后继续转发的 STATE Handler。
pub struct RecordingState {
    tag: &'static str,
    log: EventLog,
}

impl RecordingState {
    pub fn new(tag: &'static str, log: EventLog) -> Arc<Self> {
        Arc::new(Self { tag, log })
    }

    fn record(&self, event: &str) {
        self.log
            .lock()
            .expect("log lock")
            .push(format!("{}:{event}", self.tag));
    }
}

impl Handler for RecordingState {
    fn user_event(&self, ctx: &HandlerContext, event: UserEvent) -> Result<()> {
        self.record("user");
        ctx.fire_user_event(event);
        Ok(())
    }

    fn as_state(&self) -> Option<&dyn StateHandler> {
        Some(self)
    }
}

impl StateHandler for RecordingState {
    fn channel_registered(&self, ctx: &HandlerContext) -> Result<()> {
        self.record("registered");
        ctx.fire_channel_registered();
        Ok(())
    }

    fn channel_unregistered(&self, ctx: &HandlerContext) -> Result<()> {
        self.record("unregistered");
        ctx.fire_channel_unregistered();
        Ok(())
    }

    fn channel_active(&self, ctx: &HandlerContext) -> Result<()> {
        self.record("active");
        ctx.fire_channel_active();
        Ok(())
    }

    fn channel_inactive(&self, ctx: &HandlerContext) -> Result<()> {
        self.record("inactive");
        ctx.fire_channel_inactive();
        Ok(())
    }
}

/// 记录异常后截断传播的 Handler。
pub struct ExceptionRecorder {
    log: EventLog,
}

impl ExceptionRecorder {
    pub fn new(log: EventLog) -> Arc<Self> {
        Arc::new(Self { log })
    }
}

impl Handler for ExceptionRecorder {
    fn exception_caught(&self, _ctx: &HandlerContext, cause: SluiceError) -> Result<()> {
        self.log
            .lock()
            .expect("log lock")
            .push(format!("exception:{}", cause.code()));
        Ok(())
    }
}

/// 把自己的入站字节透传给下一个入站缓冲的身份阶段。
pub struct ForwardInbound;

impl ForwardInbound {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Handler for ForwardInbound {
    fn as_inbound(&self) -> Option<&dyn InboundHandler> {
        Some(self)
    }
}

impl StateHandler for ForwardInbound {
    fn inbound_buffer_updated(&self, ctx: &HandlerContext) -> Result<()> {
        let mut pending = ctx.with_inbound_byte_buffer(|buf| {
            let readable = buf.readable_bytes();
            buf.read_buf(readable)
        })?;
        let len = pending.readable_bytes();
        if len > 0 {
            ctx.with_next_inbound_byte_buffer(move |next| next.write_from(pending.as_mut(), len))?;
            ctx.fire_inbound_buffer_updated();
        }
        Ok(())
    }
}

impl InboundHandler for ForwardInbound {
    fn new_inbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}

/// 终端收集阶段：把抵达的入站字节累计到共享缓冲。
pub struct CollectorInbound {
    seen: Arc<Mutex<Vec<u8>>>,
}

impl CollectorInbound {
    pub fn new(seen: Arc<Mutex<Vec<u8>>>) -> Arc<Self> {
        Arc::new(Self { seen })
    }
}

impl Handler for CollectorInbound {
    fn as_inbound(&self) -> Option<&dyn InboundHandler> {
        Some(self)
    }
}

impl StateHandler for CollectorInbound {
    fn inbound_buffer_updated(&self, ctx: &HandlerContext) -> Result<()> {
        let bytes = ctx.with_inbound_byte_buffer(|buf| {
            let readable = buf.readable_bytes();
            let mut scratch = vec![0u8; readable];
            buf.read_bytes(&mut scratch)?;
            Ok(scratch)
        })?;
        self.seen.lock().expect("seen lock").extend_from_slice(&bytes);
        Ok(())
    }
}

impl InboundHandler for CollectorInbound {
    fn new_inbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}
