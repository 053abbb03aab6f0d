use std::collections::VecDeque;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::buffer::{ByteBuf, Message, MessageQueue};
use crate::error::Result;

/// 相邻上下文分属不同执行器时的字节流接力结构。
///
/// # 设计背景（Why）
/// - 跨执行器的两个阶段不得互相触碰对方的私有缓冲；生产方写入
///   自己可见的中转缓冲，经交换队列把已冻结的块移交消费方。
/// - 交换队列是唯一跨线程结构：`fill` 固定在生产方执行器执行，
///   `flush_into` 固定在消费方执行器执行。
///
/// # 契约说明（What）
/// - `fill`：把中转缓冲的全部可读字节冻结为一个块入队并压缩中转
///   缓冲；空缓冲为无操作。
/// - `flush_into`：按 FIFO 把全部块写入消费方缓冲。
/// - 两端配合保证无乱序、无丢失、无重复。
pub struct StreamBridge {
    intake: Mutex<Box<dyn ByteBuf>>,
    exchange: Mutex<VecDeque<Bytes>>,
}

impl StreamBridge {
    /// 以工厂租借的中转缓冲构造桥接。
    pub fn new(intake: Box<dyn ByteBuf>) -> Self {
        Self {
            intake: Mutex::new(intake),
            exchange: Mutex::new(VecDeque::new()),
        }
    }

    /// 在生产方执行器上访问中转缓冲。
    pub fn with_intake<R>(&self, f: impl FnOnce(&mut dyn ByteBuf) -> Result<R>) -> Result<R> {
        let mut intake = self.intake.lock();
        f(intake.as_mut())
    }

    /// 快照生产数据入队；生产方执行器专用。
    pub fn fill(&self) {
        let chunk = {
            let mut intake = self.intake.lock();
            if intake.readable_bytes() == 0 {
                return;
            }
            let snapshot = intake.to_vec();
            intake.clear();
            Bytes::from(snapshot)
        };
        self.exchange.lock().push_back(chunk);
    }

    /// 将全部在途块按序排入消费方缓冲；消费方执行器专用。
    pub fn flush_into(&self, out: &mut dyn ByteBuf) -> Result<()> {
        loop {
            let chunk = self.exchange.lock().pop_front();
            match chunk {
                Some(chunk) => out.write_bytes(&chunk)?,
                None => return Ok(()),
            }
        }
    }

    /// 交换队列中的在途块数，供观测与测试。
    pub fn pending_chunks(&self) -> usize {
        self.exchange.lock().len()
    }
}

/// 消息形态的接力结构，语义与 [`StreamBridge`] 一致，批次为单位。
pub struct MessageBridge {
    intake: Mutex<MessageQueue>,
    exchange: Mutex<VecDeque<Vec<Message>>>,
}

impl MessageBridge {
    /// 构造空桥接。
    pub fn new() -> Self {
        Self {
            intake: Mutex::new(MessageQueue::new()),
            exchange: Mutex::new(VecDeque::new()),
        }
    }

    /// 在生产方执行器上访问中转队列。
    pub fn with_intake<R>(&self, f: impl FnOnce(&mut MessageQueue) -> Result<R>) -> Result<R> {
        let mut intake = self.intake.lock();
        f(&mut intake)
    }

    /// 原子快照中转队列为一个批次入队；空队列为无操作。
    pub fn fill(&self) {
        let batch: Vec<Message> = {
            let mut intake = self.intake.lock();
            if intake.is_empty() {
                return;
            }
            intake.drain(..).collect()
        };
        self.exchange.lock().push_back(batch);
    }

    /// 按 FIFO 将全部批次排入消费方消息缓冲。
    pub fn flush_into(&self, out: &mut MessageQueue) {
        loop {
            let batch = self.exchange.lock().pop_front();
            match batch {
                Some(batch) => out.extend(batch),
                None => return,
            }
        }
    }

    /// 在途批次数。
    pub fn pending_batches(&self) -> usize {
        self.exchange.lock().len()
    }
}

impl Default for MessageBridge {
    fn default() -> Self {
        Self::new()
    }
}
