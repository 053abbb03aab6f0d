use std::{error::Error as StdError, fmt, sync::Arc};

/// 框架统一的 `Result` 别名，错误位默认为 [`SluiceError`]。
pub type Result<T, E = SluiceError> = core::result::Result<T, E>;

/// `ErrorCause` 封装底层原因，保持 `Send + Sync` 以方便跨线程传递。
///
/// 采用 `Arc` 而非 `Box`：同一失败往往需要同时完成出站操作的
/// [`ChannelFuture`](crate::channel::ChannelFuture) 并沿链路触发
/// `exception_caught`，错误必须可克隆。
pub type ErrorCause = Arc<dyn StdError + Send + Sync + 'static>;

/// `SluiceError` 表示 `sluice-core` 统一的错误域。
///
/// # 设计背景（Why）
/// - 流水线在调度点捕获 Handler 失败并沿链路转发，日志与测试断言都需要
///   稳定、机器可读的错误码，而非脆弱的消息字符串匹配。
/// - 缓冲越界、缺失缓冲、编解码失败、通道已关闭等错误族在语义上互斥，
///   通过 `codes` 模块的常量集中声明，避免散落的裸字符串漂移。
///
/// # 逻辑解析（How）
/// - 结构体以 Builder 风格的方法累积上下文（`with_cause`）；
/// - `code` 字段承载稳定错误码，`message` 面向人类调试；
/// - 错误整体实现 `Clone`，使得一次失败可以同时走完 future 完成与
///   事件广播两条路径。
///
/// # 契约说明（What）
/// - **前置条件**：调用方应保证错误码在 [`codes`] 模块中声明，或遵守
///   约定的 `namespace.action` 形式。
/// - **后置条件**：所有构造方法都产生拥有所有权的 `SluiceError`，
///   可跨线程移动与克隆。
#[derive(Debug, Clone)]
pub struct SluiceError {
    code: &'static str,
    message: String,
    cause: Option<ErrorCause>,
}

impl SluiceError {
    /// 使用稳定错误码与消息创建 `SluiceError`。
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 获取人类可读的错误描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 附带一个底层原因，形成错误链。
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// 获取可选的底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// 判定错误是否属于给定错误码。
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// 缓冲区索引或长度越界。
    pub fn out_of_bounds(op: &'static str, detail: impl Into<String>) -> Self {
        Self::new(codes::BUFFER_OUT_OF_BOUNDS, format!("{op}: {}", detail.into()))
    }

    /// 阶段查询了自己未声明的缓冲形态。
    pub fn no_such_buffer(ctx_name: &str, wanted: &str) -> Self {
        Self::new(
            codes::PIPELINE_NO_SUCH_BUFFER,
            format!("context `{ctx_name}` does not expose a {wanted} buffer"),
        )
    }

    /// 向已关闭的传输写入。
    pub fn closed_channel() -> Self {
        Self::new(codes::CHANNEL_CLOSED, "channel is already closed")
    }

    /// 帧超出编解码器允许的最大长度。
    pub fn frame_too_long(actual: usize, max: usize) -> Self {
        Self::new(
            codes::CODEC_FRAME_TOO_LONG,
            format!("frame length {actual} exceeds {max}"),
        )
    }
}

impl fmt::Display for SluiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl StdError for SluiceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_ref()
            .map(|arc| arc.as_ref() as &(dyn StdError + 'static))
    }
}

/// 框架内置的错误码常量集合，确保日志与断言具有稳定识别符。
pub mod codes {
    /// 缓冲区索引或长度越界。
    pub const BUFFER_OUT_OF_BOUNDS: &str = "buffer.out_of_bounds";
    /// 输入流在写入任何字节前即到达结尾。
    pub const BUFFER_END_OF_INPUT: &str = "buffer.end_of_input";
    /// 与外部读写端交互失败。
    pub const BUFFER_IO_FAILED: &str = "buffer.io_failed";
    /// 阶段查询了未声明的缓冲形态。
    pub const PIPELINE_NO_SUCH_BUFFER: &str = "pipeline.no_such_buffer";
    /// Handler 在注册阶段创建缓冲失败，注册终止。
    pub const PIPELINE_INIT_FAILED: &str = "pipeline.init_failed";
    /// 链路中已存在同名 Handler。
    pub const PIPELINE_DUPLICATE_NAME: &str = "pipeline.duplicate_name";
    /// 按名称检索不到 Handler。
    pub const PIPELINE_UNKNOWN_HANDLER: &str = "pipeline.unknown_handler";
    /// 通道尚未注册到事件执行器。
    pub const PIPELINE_NOT_REGISTERED: &str = "pipeline.not_registered";
    /// 用户 Handler 回调返回的任意失败。
    pub const HANDLER_FAILURE: &str = "handler.failure";
    /// 编解码器自身的解码失败。
    pub const CODEC_DECODE: &str = "codec.decode";
    /// 编码路径包装的失败。
    pub const CODEC_ENCODE: &str = "codec.encode";
    /// 帧超长，由分帧编解码器产生并原样透传。
    pub const CODEC_FRAME_TOO_LONG: &str = "codec.frame_too_long";
    /// 通道已关闭，亦用于归一化传输层各自的“连接已断开”。
    pub const CHANNEL_CLOSED: &str = "channel.closed";
    /// 执行器已停机，任务被拒绝。
    pub const EXECUTOR_SHUTDOWN: &str = "executor.shutdown";
}
