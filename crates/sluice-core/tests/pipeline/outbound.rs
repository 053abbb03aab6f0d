//! 出站链路：写/冲刷变换、操作透传与关闭后写入（场景 S6）。

use std::sync::Arc;

use sluice_core::prelude::*;
use sluice_core::test_stubs::TransportOp;

use super::support::{ExceptionRecorder, fixture, new_log, snapshot};

/// 冲刷时把出站字节逐个加一后传往传输方向的阶段。
struct PlusOneOutbound;

impl Handler for PlusOneOutbound {
    fn as_outbound(&self) -> Option<&dyn OutboundHandler> {
        Some(self)
    }
}

impl OperationHandler for PlusOneOutbound {
    fn flush(&self, ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        let transformed: Vec<u8> = ctx
            .with_outbound_byte_buffer(|buf| {
                let bytes = buf.to_vec();
                buf.clear();
                Ok(bytes)
            })?
            .into_iter()
            .map(|b| b.wrapping_add(1))
            .collect();
        ctx.with_prev_outbound_byte_buffer(|out| out.write_bytes(&transformed))?;
        ctx.flush(promise);
        Ok(())
    }
}

impl OutboundHandler for PlusOneOutbound {
    fn new_outbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}

#[test]
fn write_traverses_outbound_stage_and_completes_future() {
    let (_channel, transport, pipeline) = fixture();
    pipeline
        .add_last(None, "plus-one", Arc::new(PlusOneOutbound))
        .expect("stage");

    let payload = HeapByteBuf::wrapped(vec![1, 2, 3]);
    let future = pipeline.write(Message::Buffer(Box::new(payload)));

    assert!(future.result().expect("completed").is_ok());
    assert_eq!(transport.flushed(), vec![2, 3, 4]);
}

#[test]
fn operations_reach_transport_handler() {
    let (channel, transport, pipeline) = fixture();
    let addr = "127.0.0.1:4000".parse().expect("addr");

    assert!(pipeline.bind(addr).result().expect("bind done").is_ok());
    assert!(pipeline.connect(addr).result().expect("connect done").is_ok());
    assert!(channel.is_active());
    assert!(pipeline.disconnect().result().expect("disconnect done").is_ok());
    assert!(!channel.is_active());

    assert_eq!(
        transport.operations(),
        vec![
            TransportOp::Bind(addr),
            TransportOp::Connect(addr),
            TransportOp::Disconnect,
        ]
    );
}

#[test]
fn write_after_close_fails_future_and_fires_exception_once() {
    let (channel, transport, pipeline) = fixture();
    let exceptions = new_log();
    pipeline
        .add_last(None, "catcher", ExceptionRecorder::new(Arc::clone(&exceptions)))
        .expect("catcher");

    assert!(pipeline.close().result().expect("close done").is_ok());
    assert!(!channel.is_open());
    assert_eq!(transport.operations(), vec![TransportOp::Close]);

    let future = pipeline.write(Message::Buffer(Box::new(HeapByteBuf::wrapped(vec![9]))));
    let result = future.result().expect("failed immediately");
    assert!(result.expect_err("must fail").is(codes::CHANNEL_CLOSED));
    assert_eq!(snapshot(&exceptions), vec!["exception:channel.closed"]);

    // 通道保持关闭,且没有字节到达传输。
    assert!(transport.flushed().is_empty());
}

#[test]
fn flush_after_close_is_normalized_too() {
    let (_channel, _transport, pipeline) = fixture();
    pipeline.close().result().expect("close done").expect("ok");
    let result = pipeline.flush().result().expect("failed immediately");
    assert!(result.expect_err("must fail").is(codes::CHANNEL_CLOSED));
}
