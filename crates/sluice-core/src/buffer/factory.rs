use super::{ByteBuf, HeapByteBuf};

/// 可插拔缓冲工厂：流水线、上下文与桥接统一经此租借字节缓冲。
///
/// # 设计背景（Why）
/// - Handler 在注册阶段声明缓冲形态时不应关心分配策略；集中到工厂
///   之后，初始容量、扩容上限等策略可以按通道整体调整。
/// - 桥接的生产侧中转缓冲同样由工厂分配，保证跨执行器路径与本地
///   路径的内存策略一致。
///
/// # 契约说明（What）
/// - `new_byte_buffer` 返回的缓冲必须立即可写且游标为 `(0, 0)`；
/// - 实现必须线程安全，同一工厂会被多个执行器并发调用。
pub trait BufferFactory: Send + Sync + 'static {
    /// 租借一个新的字节缓冲。
    fn new_byte_buffer(&self) -> Box<dyn ByteBuf>;
}

/// 缺省工厂：按配置产出动态堆缓冲。
#[derive(Debug, Clone)]
pub struct HeapBufferFactory {
    initial_capacity: usize,
    max_capacity: usize,
}

impl HeapBufferFactory {
    /// 以显式容量策略构造工厂。
    pub fn new(initial_capacity: usize, max_capacity: usize) -> Self {
        Self {
            initial_capacity: initial_capacity.min(max_capacity),
            max_capacity,
        }
    }

    /// 初始容量。
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// 扩容上限。
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }
}

impl Default for HeapBufferFactory {
    fn default() -> Self {
        // 初始 256 字节、上限 16 MiB:覆盖常见帧大小,超长帧应由分帧
        // 编解码器先行拦截。
        Self::new(256, 16 * 1024 * 1024)
    }
}

impl BufferFactory for HeapBufferFactory {
    fn new_byte_buffer(&self) -> Box<dyn ByteBuf> {
        Box::new(HeapByteBuf::dynamic(self.initial_capacity, self.max_capacity))
    }
}
