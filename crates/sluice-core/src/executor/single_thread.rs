use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::{Condvar, Mutex};

use super::{EventExecutor, ExecutorGroup, Task};

/// 独立工作线程上的单事件循环执行器。
///
/// # 逻辑解析（How）
/// - 构造时启动一条命名工作线程，循环从互斥队列取任务执行，
///   队列为空时在条件变量上休眠；
/// - `in_event_loop` 通过比较线程 ID 判定，无须线程本地状态；
/// - `shutdown_graceful` 置停机位并唤醒线程，已入队任务执行完毕后
///   线程退出；停机后提交的任务被拒绝并告警。
///
/// # 契约说明（What）
/// - 同一实例上的任务严格按提交顺序执行；
/// - `new` 返回 `Arc`，实例同时充当单成员执行器族
///   （[`ExecutorGroup::next`] 恒返回自身）。
pub struct SingleThreadExecutor {
    inner: Arc<Inner>,
    self_ref: OnceLock<Weak<SingleThreadExecutor>>,
}

struct Inner {
    name: String,
    queue: Mutex<VecDeque<Task>>,
    available: Condvar,
    running: AtomicBool,
    thread_id: OnceLock<ThreadId>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SingleThreadExecutor {
    /// 启动命名工作线程并返回执行器句柄。
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        let inner = Arc::new(Inner {
            name: name.clone(),
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            running: AtomicBool::new(true),
            thread_id: OnceLock::new(),
            worker: Mutex::new(None),
        });

        let worker_inner = Arc::clone(&inner);
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || worker_loop(worker_inner))
            .expect("spawn executor thread");
        *inner.worker.lock() = Some(handle);

        let executor = Arc::new(Self {
            inner,
            self_ref: OnceLock::new(),
        });
        // 弱自引用仅写入一次,供 ExecutorGroup::next 升级为拥有型句柄。
        let _ = executor.self_ref.set(Arc::downgrade(&executor));
        executor
    }

    /// 执行器名称，亦即工作线程名。
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// 优雅停机：排空既有任务后退出工作线程并汇合。
    pub fn shutdown_graceful(&self) {
        self.inner.running.store(false, Ordering::Release);
        self.inner.available.notify_all();
        let handle = self.inner.worker.lock().take();
        if let Some(handle) = handle
            && handle.thread().id() != thread::current().id()
        {
            let _ = handle.join();
        }
    }
}

fn worker_loop(inner: Arc<Inner>) {
    let _ = inner.thread_id.set(thread::current().id());
    loop {
        let task = {
            let mut queue = inner.queue.lock();
            loop {
                if let Some(task) = queue.pop_front() {
                    break Some(task);
                }
                if !inner.running.load(Ordering::Acquire) {
                    break None;
                }
                inner.available.wait(&mut queue);
            }
        };
        match task {
            Some(task) => task(),
            None => return,
        }
    }
}

impl EventExecutor for SingleThreadExecutor {
    fn in_event_loop(&self) -> bool {
        self.inner
            .thread_id
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }

    fn execute(&self, task: Task) {
        if !self.inner.running.load(Ordering::Acquire) {
            tracing::warn!(executor = %self.inner.name, "executor.shutdown 任务被拒绝");
            return;
        }
        self.inner.queue.lock().push_back(task);
        self.inner.available.notify_one();
    }

    fn is_shutdown(&self) -> bool {
        !self.inner.running.load(Ordering::Acquire)
    }
}

impl ExecutorGroup for SingleThreadExecutor {
    fn next(&self) -> Arc<dyn EventExecutor> {
        self.self_ref
            .get()
            .and_then(Weak::upgrade)
            .expect("executor weak self must be initialized")
    }
}
