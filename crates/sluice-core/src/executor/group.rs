use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{EventExecutor, ExecutorGroup, SingleThreadExecutor};

/// 轮询分配子执行器的多线程执行器族。
///
/// 同一通道的多个上下文可分摊到不同子循环；流水线对每个族只取一次
/// 子执行器，因此轮询只影响上下文间的分布，不影响单上下文的串行性。
pub struct MultiThreadGroup {
    children: Vec<Arc<SingleThreadExecutor>>,
    cursor: AtomicUsize,
}

impl MultiThreadGroup {
    /// 启动 `threads` 条工作线程，线程名为 `{prefix}-{序号}`。
    pub fn new(prefix: &str, threads: usize) -> Arc<Self> {
        let threads = threads.max(1);
        let children = (0..threads)
            .map(|idx| SingleThreadExecutor::new(format!("{prefix}-{idx}")))
            .collect();
        Arc::new(Self {
            children,
            cursor: AtomicUsize::new(0),
        })
    }

    /// 子执行器数量。
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// 族是否为空；构造保证至少一个子执行器，恒为 `false`。
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// 停机全部子执行器。
    pub fn shutdown_graceful(&self) {
        for child in &self.children {
            child.shutdown_graceful();
        }
    }
}

impl ExecutorGroup for MultiThreadGroup {
    fn next(&self) -> Arc<dyn EventExecutor> {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.children.len();
        let child = Arc::clone(&self.children[idx]);
        child as Arc<dyn EventExecutor>
    }
}
