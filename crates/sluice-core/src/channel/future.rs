use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::SluiceError;

/// 出站操作的完成结果。
pub type OpResult = Result<(), SluiceError>;

type Listener = Box<dyn FnOnce(&OpResult) + Send + 'static>;

struct Shared {
    state: Mutex<State>,
    done: Condvar,
}

struct State {
    result: Option<OpResult>,
    listeners: Vec<Listener>,
    wakers: Vec<Waker>,
}

/// `ChannelPromise` 是出站操作的写端：由最终执行操作的一方完成。
///
/// # 契约说明（What）
/// - 首次完成生效，后续完成尝试返回 `false` 并被忽略；
/// - 完成时回调全部监听器（在完成者线程上）、唤醒全部等待者。
///
/// # 风险提示（Trade-offs）
/// - 监听器在完成者线程内联执行，必须保持轻量；重逻辑应转投
///   执行器。
#[derive(Clone)]
pub struct ChannelPromise {
    shared: Arc<Shared>,
}

/// `ChannelFuture` 是出站操作的读端。
///
/// 同时提供三种消费方式：注册监听器、阻塞等待（测试与同步场景）、
/// 以及作为 `std::future::Future` 被异步运行时轮询。
#[derive(Clone)]
pub struct ChannelFuture {
    shared: Arc<Shared>,
}

impl ChannelPromise {
    /// 创建一对尚未完成的写端与读端。
    pub fn new() -> (ChannelPromise, ChannelFuture) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                result: None,
                listeners: Vec::new(),
                wakers: Vec::new(),
            }),
            done: Condvar::new(),
        });
        (
            ChannelPromise {
                shared: Arc::clone(&shared),
            },
            ChannelFuture { shared },
        )
    }

    /// 标记操作成功；若已完成则返回 `false`。
    pub fn succeed(&self) -> bool {
        self.complete(Ok(()))
    }

    /// 标记操作失败；若已完成则返回 `false`。
    pub fn fail(&self, error: SluiceError) -> bool {
        self.complete(Err(error))
    }

    /// 对应的读端。
    pub fn future(&self) -> ChannelFuture {
        ChannelFuture {
            shared: Arc::clone(&self.shared),
        }
    }

    fn complete(&self, result: OpResult) -> bool {
        let (listeners, wakers) = {
            let mut state = self.shared.state.lock();
            if state.result.is_some() {
                return false;
            }
            state.result = Some(result.clone());
            (
                std::mem::take(&mut state.listeners),
                std::mem::take(&mut state.wakers),
            )
        };
        self.shared.done.notify_all();
        // 锁外回调,避免监听器再次触碰本 future 时自锁。
        for listener in listeners {
            listener(&result);
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }
}

impl ChannelFuture {
    /// 是否已完成。
    pub fn is_done(&self) -> bool {
        self.shared.state.lock().result.is_some()
    }

    /// 取完成结果快照；未完成时为 `None`。
    pub fn result(&self) -> Option<OpResult> {
        self.shared.state.lock().result.clone()
    }

    /// 注册完成监听器；已完成时立即内联回调。
    pub fn on_complete(&self, listener: impl FnOnce(&OpResult) + Send + 'static) {
        let mut state = self.shared.state.lock();
        if let Some(result) = state.result.clone() {
            drop(state);
            listener(&result);
        } else {
            state.listeners.push(Box::new(listener));
        }
    }

    /// 阻塞等待完成并返回结果。
    pub fn wait(&self) -> OpResult {
        let mut state = self.shared.state.lock();
        while state.result.is_none() {
            self.shared.done.wait(&mut state);
        }
        state.result.clone().expect("result present")
    }

    /// 限时阻塞等待；超时返回 `None`。
    pub fn wait_timeout(&self, timeout: Duration) -> Option<OpResult> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.result.is_none() {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            if self
                .shared
                .done
                .wait_for(&mut state, deadline - now)
                .timed_out()
                && state.result.is_none()
            {
                return None;
            }
        }
        state.result.clone()
    }
}

impl Future for ChannelFuture {
    type Output = OpResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.state.lock();
        match &state.result {
            Some(result) => Poll::Ready(result.clone()),
            None => {
                state.wakers.push(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
