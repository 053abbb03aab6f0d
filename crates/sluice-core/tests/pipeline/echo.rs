//! 回声链路：入站字节原样折返出站（场景 S1 与恒等链路属性）。

use std::sync::{Arc, Mutex};

use sluice_core::prelude::*;

use super::support::{CollectorInbound, ForwardInbound, fixture};

/// 把入站字节复制进出站链路并立即冲刷的阶段。
struct EchoInbound;

impl Handler for EchoInbound {
    fn as_inbound(&self) -> Option<&dyn InboundHandler> {
        Some(self)
    }
}

impl StateHandler for EchoInbound {
    fn inbound_buffer_updated(&self, ctx: &HandlerContext) -> Result<()> {
        let mut pending = ctx.with_inbound_byte_buffer(|buf| {
            let readable = buf.readable_bytes();
            buf.read_buf(readable)
        })?;
        let len = pending.readable_bytes();
        ctx.with_prev_outbound_byte_buffer(move |out| out.write_from(pending.as_mut(), len))?;
        let (promise, _future) = ctx.new_promise();
        ctx.flush(promise);
        Ok(())
    }
}

impl InboundHandler for EchoInbound {
    fn new_inbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}

#[test]
fn echo_pipeline_reflects_input_bytes() {
    let (_channel, transport, pipeline) = fixture();
    pipeline
        .add_last(None, "echo", Arc::new(EchoInbound))
        .expect("add echo");

    pipeline
        .with_inbound_byte_buffer(|buf| buf.write_bytes(&[0x01, 0x02, 0x03]))
        .expect("push");
    pipeline.fire_inbound_buffer_updated();

    assert_eq!(transport.flushed(), vec![0x01, 0x02, 0x03]);
}

#[test]
fn echo_twice_appends_in_order() {
    let (_channel, transport, pipeline) = fixture();
    pipeline
        .add_last(None, "echo", Arc::new(EchoInbound))
        .expect("add echo");

    for chunk in [&b"ab"[..], &b"cd"[..]] {
        pipeline
            .with_inbound_byte_buffer(|buf| buf.write_bytes(chunk))
            .expect("push");
        pipeline.fire_inbound_buffer_updated();
    }
    assert_eq!(transport.flushed(), b"abcd".to_vec());
}

#[test]
fn identity_chain_preserves_readable_byte_count() {
    let (_channel, _transport, pipeline) = fixture();
    let seen = Arc::new(Mutex::new(Vec::new()));
    pipeline
        .add_last(None, "id-1", ForwardInbound::new())
        .expect("id-1");
    pipeline
        .add_last(None, "id-2", ForwardInbound::new())
        .expect("id-2");
    pipeline
        .add_last(None, "id-3", ForwardInbound::new())
        .expect("id-3");
    pipeline
        .add_last(None, "collect", CollectorInbound::new(Arc::clone(&seen)))
        .expect("collect");

    let payload: Vec<u8> = (0..=255u8).collect();
    pipeline
        .with_inbound_byte_buffer(|buf| buf.write_bytes(&payload))
        .expect("push");
    pipeline.fire_inbound_buffer_updated();

    let seen = seen.lock().expect("seen lock");
    assert_eq!(seen.len(), payload.len());
    assert_eq!(*seen, payload);
}
