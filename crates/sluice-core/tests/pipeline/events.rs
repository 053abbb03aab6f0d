//! 事件传播：生命周期顺序、用户事件透传与异常路由（场景 S5）。

use std::sync::Arc;

use sluice_core::prelude::*;
use sluice_core::test_stubs::{ImmediateExecutor, MemoryTransportHandler, TestChannel};

use super::support::{ExceptionRecorder, RecordingState, fixture, new_log, snapshot};

#[test]
fn lifecycle_events_visit_state_contexts_in_order_once() {
    let channel = TestChannel::new(11);
    let transport = MemoryTransportHandler::new(Arc::clone(&channel));
    let pipeline = LinkedPipeline::new(
        Arc::clone(&channel) as Arc<dyn Channel>,
        Arc::new(HeapBufferFactory::default()),
        transport as Arc<dyn Handler>,
    )
    .expect("pipeline");

    let log = new_log();
    pipeline
        .add_last(None, "a", RecordingState::new("a", Arc::clone(&log)))
        .expect("a");
    pipeline
        .add_last(None, "b", RecordingState::new("b", Arc::clone(&log)))
        .expect("b");

    pipeline.register(Arc::new(ImmediateExecutor));
    pipeline.fire_channel_active();
    pipeline.fire_channel_inactive();
    pipeline.fire_channel_unregistered();

    assert_eq!(
        snapshot(&log),
        vec![
            "a:registered",
            "b:registered",
            "a:active",
            "b:active",
            "a:inactive",
            "b:inactive",
            "a:unregistered",
            "b:unregistered",
        ]
    );
}

#[test]
fn user_events_traverse_every_context_unmodified() {
    let (_channel, _transport, pipeline) = fixture();
    let log = new_log();
    pipeline
        .add_last(None, "a", RecordingState::new("a", Arc::clone(&log)))
        .expect("a");
    pipeline
        .add_last(None, "b", RecordingState::new("b", Arc::clone(&log)))
        .expect("b");

    pipeline.fire_user_event(Box::new("ping".to_string()));
    assert_eq!(snapshot(&log), vec!["a:user", "b:user"]);
}

/// 消费入站数据后上报解码失败的阶段。
struct BoomInbound;

impl Handler for BoomInbound {
    fn as_inbound(&self) -> Option<&dyn InboundHandler> {
        Some(self)
    }
}

impl StateHandler for BoomInbound {
    fn inbound_buffer_updated(&self, ctx: &HandlerContext) -> Result<()> {
        ctx.with_inbound_byte_buffer(|buf| {
            let readable = buf.readable_bytes();
            let mut scratch = vec![0u8; readable];
            buf.read_bytes(&mut scratch)
        })?;
        Err(SluiceError::new(codes::CODEC_DECODE, "malformed frame"))
    }
}

impl InboundHandler for BoomInbound {
    fn new_inbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}

#[test]
fn handler_failure_reaches_next_context_exactly_once() {
    let (channel, _transport, pipeline) = fixture();
    let state_log = new_log();
    let exception_log = new_log();
    pipeline
        .add_last(None, "before", RecordingState::new("before", state_log))
        .expect("before");
    pipeline
        .add_last(None, "boom", Arc::new(BoomInbound))
        .expect("boom");
    pipeline
        .add_last(None, "catcher", ExceptionRecorder::new(Arc::clone(&exception_log)))
        .expect("catcher");

    pipeline
        .with_inbound_byte_buffer(|buf| buf.write_bytes(&[0xFF]))
        .expect("push");
    pipeline.fire_inbound_buffer_updated();

    assert_eq!(snapshot(&exception_log), vec!["exception:codec.decode"]);
    // 通道状态不受 Handler 失败影响。
    assert!(channel.is_open());
    assert!(!channel.is_active());
}

#[test]
fn unhandled_exception_is_dropped_at_tail() {
    let (_channel, _transport, pipeline) = fixture();
    // 没有任何用户 Handler:异常应在链尾被记录并吞掉,不得 panic。
    pipeline.fire_exception_caught(SluiceError::new(codes::CODEC_DECODE, "orphan"));
}

#[test]
fn missing_inbound_buffer_is_reported() {
    let (_channel, _transport, pipeline) = fixture();
    let err = pipeline
        .with_inbound_byte_buffer(|buf| buf.write_bytes(&[1]))
        .expect_err("no inbound stage");
    assert!(err.is(codes::PIPELINE_NO_SUCH_BUFFER));
}
