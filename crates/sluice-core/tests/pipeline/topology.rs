//! 拓扑编辑：命名唯一性、插入锚点、摘除语义与原位替换。

use std::sync::Arc;

use sluice_core::prelude::*;

use super::support::{RecordingState, fixture, new_log, snapshot};

/// 记录装配与终结回调的探针 Handler。
struct LifetimeProbe {
    log: super::support::EventLog,
}

impl LifetimeProbe {
    fn new(log: super::support::EventLog) -> Arc<Self> {
        Arc::new(Self { log })
    }

    fn record(&self, event: &str) {
        self.log.lock().expect("log lock").push(event.to_string());
    }
}

impl Handler for LifetimeProbe {
    fn handler_added(&self, _ctx: &HandlerContext) -> Result<()> {
        self.record("added");
        Ok(())
    }

    fn handler_removed(&self, _ctx: &HandlerContext) -> Result<()> {
        self.record("removed");
        Ok(())
    }

    fn user_event(&self, ctx: &HandlerContext, event: UserEvent) -> Result<()> {
        self.record("user");
        ctx.fire_user_event(event);
        Ok(())
    }
}

#[test]
fn names_are_unique_and_order_follows_anchors() {
    let (_channel, _transport, pipeline) = fixture();
    let log = new_log();
    pipeline
        .add_last(None, "b", RecordingState::new("b", Arc::clone(&log)))
        .expect("b");
    pipeline
        .add_first(None, "a", RecordingState::new("a", Arc::clone(&log)))
        .expect("a");
    pipeline
        .add_after(None, "a", "a2", RecordingState::new("a2", Arc::clone(&log)))
        .expect("a2");
    pipeline
        .add_before(None, "b", "b0", RecordingState::new("b0", Arc::clone(&log)))
        .expect("b0");

    assert_eq!(pipeline.names(), vec!["head", "a", "a2", "b0", "b", "tail"]);

    let err = pipeline
        .add_last(None, "a", RecordingState::new("dup", log))
        .expect_err("duplicate");
    assert!(err.is(codes::PIPELINE_DUPLICATE_NAME));

    let missing = pipeline
        .add_before(None, "ghost", "x", RecordingState::new("x", new_log()))
        .expect_err("unknown anchor");
    assert!(missing.is(codes::PIPELINE_UNKNOWN_HANDLER));
}

#[test]
fn removed_context_receives_no_further_events() {
    let (_channel, _transport, pipeline) = fixture();
    let probe_log = new_log();
    let state_log = new_log();
    pipeline
        .add_last(None, "probe", LifetimeProbe::new(Arc::clone(&probe_log)))
        .expect("probe");
    pipeline
        .add_last(None, "keeper", RecordingState::new("keeper", Arc::clone(&state_log)))
        .expect("keeper");

    pipeline.fire_user_event(Box::new(1u32));
    assert_eq!(snapshot(&probe_log), vec!["added", "user"]);

    let removed = pipeline.remove("probe").expect("remove");
    assert!(Arc::strong_count(&removed) >= 1);
    assert!(pipeline.get("probe").is_none());

    pipeline.fire_user_event(Box::new(2u32));
    // 终结回调恰好一次,摘除后不再有事件命中。
    assert_eq!(snapshot(&probe_log), vec!["added", "user", "removed"]);
    assert_eq!(snapshot(&state_log), vec!["keeper:user", "keeper:user"]);

    let err = match pipeline.remove("probe") {
        Err(err) => err,
        Ok(_) => panic!("already gone"),
    };
    assert!(err.is(codes::PIPELINE_UNKNOWN_HANDLER));
}

#[test]
fn replace_keeps_position_and_swaps_handler() {
    let (_channel, _transport, pipeline) = fixture();
    let log = new_log();
    pipeline
        .add_last(None, "left", RecordingState::new("left", Arc::clone(&log)))
        .expect("left");
    pipeline
        .add_last(None, "mid", RecordingState::new("mid", Arc::clone(&log)))
        .expect("mid");
    pipeline
        .add_last(None, "right", RecordingState::new("right", Arc::clone(&log)))
        .expect("right");

    pipeline
        .replace("mid", "mid2", RecordingState::new("mid2", Arc::clone(&log)))
        .expect("replace");
    assert_eq!(
        pipeline.names(),
        vec!["head", "left", "mid2", "right", "tail"]
    );
    assert!(pipeline.get("mid").is_none());
    assert!(pipeline.get("mid2").is_some());

    log.lock().expect("log lock").clear();
    pipeline.fire_user_event(Box::new(0u8));
    assert_eq!(snapshot(&log), vec!["left:user", "mid2:user", "right:user"]);
}

#[test]
fn contexts_expose_identity_and_capabilities() {
    let (channel, _transport, pipeline) = fixture();
    let log = new_log();
    pipeline
        .add_last(None, "probe", RecordingState::new("probe", log))
        .expect("probe");

    let ctx = pipeline.get("probe").expect("ctx");
    assert_eq!(ctx.name(), "probe");
    assert!(ctx.capabilities().contains(Capabilities::STATE));
    assert!(!ctx.capabilities().contains(Capabilities::INBOUND));
    assert_eq!(ctx.channel().id(), channel.id());
    assert!(!ctx.is_removed());
    assert!(ctx.executor().is_ok());

    // 属性表跨回调共享。
    ctx.attributes().insert(42u64);
    assert_eq!(*ctx.attributes().get::<u64>().expect("attr"), 42);
}
