//! 跨执行器接力：相邻阶段分属不同事件循环时的顺序与完整性
//! （场景 S4 与不变量 4）。

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use sluice_core::prelude::*;
use sluice_core::test_stubs::{MemoryTransportHandler, TestChannel};

use super::support::{CollectorInbound, ForwardInbound};

const TOTAL: usize = 1024 * 1024;
const CHUNKS: usize = 37;

fn wait_until(deadline: Duration, mut probe: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if probe() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    probe()
}

#[test]
fn one_mebibyte_in_37_chunks_survives_executor_hop() {
    let channel = TestChannel::new(42);
    let transport = MemoryTransportHandler::new(Arc::clone(&channel));
    let pipeline = LinkedPipeline::new(
        Arc::clone(&channel) as Arc<dyn Channel>,
        Arc::new(HeapBufferFactory::new(4096, 64 * 1024 * 1024)),
        transport as Arc<dyn Handler>,
    )
    .expect("pipeline");

    let loop_main = SingleThreadExecutor::new("loop-main");
    let loop_relay = SingleThreadExecutor::new("loop-relay");
    let loop_sink = SingleThreadExecutor::new("loop-sink");

    let seen = Arc::new(Mutex::new(Vec::with_capacity(TOTAL)));
    let relay_group: Arc<dyn ExecutorGroup> = Arc::clone(&loop_relay) as Arc<dyn ExecutorGroup>;
    let sink_group: Arc<dyn ExecutorGroup> = Arc::clone(&loop_sink) as Arc<dyn ExecutorGroup>;
    pipeline
        .add_last(Some(&relay_group), "relay", ForwardInbound::new())
        .expect("relay");
    pipeline
        .add_last(
            Some(&sink_group),
            "sink",
            CollectorInbound::new(Arc::clone(&seen)),
        )
        .expect("sink");
    pipeline.register(Arc::clone(&loop_main) as Arc<dyn EventExecutor>);

    let payload: Vec<u8> = (0..TOTAL).map(|i| (i % 251) as u8).collect();
    let base = TOTAL / CHUNKS;
    let mut offset = 0;
    for chunk_index in 0..CHUNKS {
        let len = if chunk_index == CHUNKS - 1 {
            TOTAL - offset
        } else {
            base
        };
        let chunk = &payload[offset..offset + len];
        offset += len;
        pipeline
            .with_inbound_byte_buffer(|buf| buf.write_bytes(chunk))
            .expect("push chunk");
        pipeline.fire_inbound_buffer_updated();
    }
    assert_eq!(offset, TOTAL);

    let complete = wait_until(Duration::from_secs(20), || {
        seen.lock().expect("seen lock").len() == TOTAL
    });
    assert!(complete, "consumer did not observe all bytes in time");
    assert_eq!(*seen.lock().expect("seen lock"), payload, "byte order must survive the hop");

    loop_main.shutdown_graceful();
    loop_relay.shutdown_graceful();
    loop_sink.shutdown_graceful();
}

#[test]
fn interleaved_small_writes_keep_fifo_across_bridge() {
    let channel = TestChannel::new(43);
    let transport = MemoryTransportHandler::new(Arc::clone(&channel));
    let pipeline = LinkedPipeline::new(
        Arc::clone(&channel) as Arc<dyn Channel>,
        Arc::new(HeapBufferFactory::default()),
        transport as Arc<dyn Handler>,
    )
    .expect("pipeline");

    let loop_main = SingleThreadExecutor::new("fifo-main");
    let loop_sink = SingleThreadExecutor::new("fifo-sink");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_group: Arc<dyn ExecutorGroup> = Arc::clone(&loop_sink) as Arc<dyn ExecutorGroup>;
    pipeline
        .add_last(
            Some(&sink_group),
            "sink",
            CollectorInbound::new(Arc::clone(&seen)),
        )
        .expect("sink");
    pipeline.register(Arc::clone(&loop_main) as Arc<dyn EventExecutor>);

    let mut expected = Vec::new();
    for round in 0..100u8 {
        let piece = [round, round.wrapping_mul(3)];
        expected.extend_from_slice(&piece);
        pipeline
            .with_inbound_byte_buffer(|buf| buf.write_bytes(&piece))
            .expect("push");
        pipeline.fire_inbound_buffer_updated();
    }

    let complete = wait_until(Duration::from_secs(10), || {
        seen.lock().expect("seen lock").len() == expected.len()
    });
    assert!(complete, "sink did not observe all pieces");
    assert_eq!(*seen.lock().expect("seen lock"), expected);

    loop_main.shutdown_graceful();
    loop_sink.shutdown_graceful();
}
