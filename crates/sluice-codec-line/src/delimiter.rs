use parking_lot::Mutex;

use sluice_core::buffer::{BufferHolder, ByteBuf, Message};
use sluice_core::error::{Result, SluiceError};
use sluice_core::pipeline::{Handler, HandlerContext, InboundHandler, StateHandler};

/// 基于单字节分隔符的分帧解码器。
///
/// # 设计动机（Why）
/// - 分隔符协议（行文本、NUL 结尾帧）是字节流到消息流的最小分帧
///   形态，适合作为入站消息缓冲路径的参考实现；
/// - 超长帧必须既上报又自恢复：坏帧连同分隔符被整体丢弃，后续
///   帧不受影响，重复注入坏帧得到相同结果。
///
/// # 行为概览（How）
/// - 每次入站通知循环扫描本地字节缓冲：找到分隔符即切出一帧
///   （不含分隔符），以独立缓冲包装成消息推入下一入站消息缓冲；
/// - 无分隔符且累积超过 `max_frame_len` 时进入丢弃模式，静默吞掉
///   后续字节，直到分隔符出现才以 `codec.frame_too_long` 上报并
///   复位；
/// - 产出过帧才向后继广播 `inbound_buffer_updated`。
///
/// # 契约说明（What）
/// - **前置**：上游必须把本阶段声明为字节形态（由
///   [`InboundHandler::new_inbound_holder`] 保证）；
/// - **后置**：缓冲中未凑满一帧的字节原地保留，等待下一次通知。
///
/// # 权衡与风险（Trade-offs）
/// - 帧以拷贝切出（`read_buf`），牺牲零拷贝换取帧与解码缓冲生命
///   周期解耦；超长行为以分隔符为界上报一次，与逐字节上报相比
///   显著降低坏流量下的事件压力。
pub struct DelimiterFrameDecoder {
    delimiter: u8,
    max_frame_len: usize,
    state: Mutex<DecodeState>,
}

#[derive(Default)]
struct DecodeState {
    discarding: bool,
    discarded: usize,
}

impl DelimiterFrameDecoder {
    /// 以显式分隔符与最大帧长构造解码器。
    pub fn new(delimiter: u8, max_frame_len: usize) -> Self {
        Self {
            delimiter,
            max_frame_len,
            state: Mutex::new(DecodeState::default()),
        }
    }

    /// 换行分帧的便捷构造。
    pub fn line_based(max_frame_len: usize) -> Self {
        Self::new(b'\n', max_frame_len)
    }

    /// 配置的分隔符。
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// 配置的最大帧长。
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Handler for DelimiterFrameDecoder {
    fn as_inbound(&self) -> Option<&dyn InboundHandler> {
        Some(self)
    }
}

impl StateHandler for DelimiterFrameDecoder {
    fn inbound_buffer_updated(&self, ctx: &HandlerContext) -> Result<()> {
        let mut frames: Vec<Box<dyn ByteBuf>> = Vec::new();
        let mut oversize: Option<SluiceError> = None;

        ctx.with_inbound_byte_buffer(|buf| {
            let mut state = self.state.lock();
            loop {
                let readable = buf.readable_bytes();
                if readable == 0 {
                    break;
                }
                let mut position = None;
                buf.with_slice(buf.reader_index(), readable, &mut |bytes| {
                    position = bytes.iter().position(|b| *b == self.delimiter);
                })?;
                match position {
                    Some(index) => {
                        if state.discarding {
                            let bad_frame_len = state.discarded + index;
                            buf.set_reader_index(buf.reader_index() + index + 1)?;
                            state.discarding = false;
                            state.discarded = 0;
                            oversize = Some(SluiceError::frame_too_long(
                                bad_frame_len,
                                self.max_frame_len,
                            ));
                            break;
                        }
                        if index > self.max_frame_len {
                            buf.set_reader_index(buf.reader_index() + index + 1)?;
                            oversize =
                                Some(SluiceError::frame_too_long(index, self.max_frame_len));
                            break;
                        }
                        let frame = buf.read_buf(index)?;
                        buf.read_u8()?;
                        frames.push(frame);
                    }
                    None => {
                        if state.discarding {
                            state.discarded += readable;
                            buf.set_reader_index(buf.reader_index() + readable)?;
                        } else if readable > self.max_frame_len {
                            tracing::warn!(
                                readable,
                                max = self.max_frame_len,
                                "frame exceeds limit, discarding until delimiter"
                            );
                            state.discarding = true;
                            state.discarded = readable;
                            buf.set_reader_index(buf.reader_index() + readable)?;
                        }
                        break;
                    }
                }
            }
            Ok(())
        })?;

        let emitted = !frames.is_empty();
        for frame in frames {
            ctx.with_next_inbound_messages(move |queue| {
                queue.push_back(Message::Buffer(frame));
                Ok(())
            })?;
        }
        if emitted {
            ctx.fire_inbound_buffer_updated();
        }
        match oversize {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl InboundHandler for DelimiterFrameDecoder {
    fn new_inbound_holder(&self, ctx: &HandlerContext) -> Result<BufferHolder> {
        Ok(BufferHolder::Bytes(ctx.alloc().new_byte_buffer()))
    }
}
