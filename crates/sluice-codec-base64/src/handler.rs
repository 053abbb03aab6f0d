use parking_lot::Mutex;

use sluice_core::buffer::BufferHolder;
use sluice_core::channel::ChannelPromise;
use sluice_core::error::Result;
use sluice_core::pipeline::{
    Handler, HandlerContext, InboundHandler, OperationHandler, OutboundHandler, StateHandler,
};

use crate::engine;

/// 出站 Base64 编码阶段：冲刷时把本地出站字节编码后传往传输方向。
///
/// 编码发生在冲刷点而非写入点，上游的多次小块写入会被合并为一次
/// 编码输出，尾组填充因此只出现在每次冲刷的末尾。
pub struct Base64Encoder {
    break_lines: bool,
}

impl Base64Encoder {
    /// 构造编码阶段；`break_lines` 控制是否每 76 字符折行。
    pub fn new(break_lines: bool) -> Self {
        Self { break_lines }
    }
}

impl Handler for Base64Encoder {
    fn as_outbound(&self) -> Option<&dyn OutboundHandler> {
        Some(self)
    }
}

impl OperationHandler for Base64Encoder {
    fn flush(&self, ctx: &HandlerContext, promise: ChannelPromise) -> Result<()> {
        let pending = ctx.with_outbound_byte_buffer(|buf| {
            let bytes = buf.to_vec();
            buf.clear();
            Ok(bytes)
        })?;
        if !pending.is_empty() {
            let encoded = engine::encode(&pending, self.break_lines);
            ctx.with_prev_outbound_byte_buffer(|out| out.write_bytes(&encoded))?;
        }
        ctx.flush(promise);
        Ok(())
    }
}

impl OutboundHandler for Base64Encoder {
    fn new_outbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}

/// 入站 Base64 解码阶段：按完整四元组增量解码，残余字节留待后续
/// 输入补齐。
///
/// 分块到达的编码流（包括四元组被任意切开）都能无损解码，空白
/// 字符按引擎约定忽略。
pub struct Base64Decoder {
    pending: Mutex<Vec<u8>>,
}

impl Base64Decoder {
    /// 构造解码阶段。
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }
}

impl Default for Base64Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Base64Decoder {
    fn as_inbound(&self) -> Option<&dyn InboundHandler> {
        Some(self)
    }
}

impl StateHandler for Base64Decoder {
    fn inbound_buffer_updated(&self, ctx: &HandlerContext) -> Result<()> {
        let fresh = ctx.with_inbound_byte_buffer(|buf| {
            let readable = buf.readable_bytes();
            let mut scratch = vec![0u8; readable];
            buf.read_bytes(&mut scratch)?;
            Ok(scratch)
        })?;

        let ready = {
            let mut pending = self.pending.lock();
            pending.extend_from_slice(&fresh);
            // 找到最后一个完整四元组的边界,只解码其前缀。
            let mut significant = 0usize;
            let mut boundary = 0usize;
            for (index, byte) in pending.iter().enumerate() {
                if matches!(byte, b' ' | b'\t' | b'\r' | b'\n') {
                    continue;
                }
                significant += 1;
                if significant % 4 == 0 {
                    boundary = index + 1;
                }
            }
            if boundary == 0 {
                return Ok(());
            }
            let rest = pending.split_off(boundary);
            let ready = std::mem::replace(&mut *pending, rest);
            ready
        };

        let decoded = engine::decode(&ready)?;
        if !decoded.is_empty() {
            ctx.with_next_inbound_byte_buffer(|out| out.write_bytes(&decoded))?;
            ctx.fire_inbound_buffer_updated();
        }
        Ok(())
    }
}

impl InboundHandler for Base64Decoder {
    fn new_inbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}
