//! 事件执行器契约：流水线按上下文固定执行器，串行化回调投递。
//!
//! ## 设计溯源（Why）
//! - 对齐事件循环模型：每个上下文固定绑定一个执行器，该执行器对
//!   Handler 回调而言是单线程的，单上下文事件天然串行。
//! - 契约保持对象安全（装箱任务提交），调度策略与线程模型由实现
//!   决定，核心不感知。
//!
//! ## 模块说明（What）
//! - [`EventExecutor`]：单事件循环契约，核心只依赖“是否身处本循环”
//!   与“提交任务”两个能力。
//! - [`ExecutorGroup`]：执行器族，流水线注册 Handler 时从中为上下文
//!   挑选子执行器并保持父→子映射稳定。
//! - [`single_thread`]：独立工作线程实现。
//! - [`group`]：轮询分配的多线程执行器族。

pub mod group;
pub mod single_thread;

pub use group::MultiThreadGroup;
pub use single_thread::SingleThreadExecutor;

/// 提交给执行器的装箱任务。
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// `EventExecutor` 是上下文绑定的单事件循环契约。
///
/// # 契约说明（What）
/// - `in_event_loop`：调用线程是否就是本执行器的事件线程；调度助手
///   据此决定内联执行还是提交任务，绝不从其他线程同步重入。
/// - `execute`：将任务入队；实现必须保证同一执行器内任务按提交顺序
///   串行执行。
///
/// # 前置/后置条件（Contract）
/// - **前置**：任务必须 `Send`，且不得阻塞事件线程执行长耗时操作；
/// - **后置**：除非执行器已停机，提交的任务最终必然执行一次。
pub trait EventExecutor: Send + Sync + 'static {
    /// 调用线程是否身处本执行器的事件循环。
    fn in_event_loop(&self) -> bool;

    /// 提交任务，按提交顺序串行执行。
    fn execute(&self, task: Task);

    /// 执行器是否已停机。
    fn is_shutdown(&self) -> bool {
        false
    }
}

/// 执行器族：为新注册的上下文提供子执行器。
///
/// 流水线对同一族只取一次子执行器并缓存，保证“父 → 子”的映射在
/// 通道生命周期内稳定（上下文的执行器一经处理事件不得更换）。
pub trait ExecutorGroup: Send + Sync + 'static {
    /// 取下一个子执行器。
    fn next(&self) -> std::sync::Arc<dyn EventExecutor>;
}
