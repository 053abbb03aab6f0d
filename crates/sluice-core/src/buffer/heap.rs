use std::any::Any;
use std::io::{Read, Write};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::{Result, SluiceError, codes};

use super::{ByteBuf, ByteOrder};

/// 动态缓冲扩容的起步容量；此后按倍增逼近所需大小。
const GROWTH_FLOOR: usize = 64;

/// 视图间共享的堆存储。
///
/// 读写均经由 `RwLock`：切片与副本对同一存储的别名可变访问由锁
/// 保证安全，无须任何 `unsafe`。动态扩容只会追加，已发放窗口的
/// 区间始终有效。
#[derive(Debug)]
struct Storage {
    bytes: RwLock<Vec<u8>>,
}

impl Storage {
    fn with_vec(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            bytes: RwLock::new(bytes),
        })
    }
}

/// 全局规范空缓冲的共享存储，进程内唯一。
fn empty_storage() -> Arc<Storage> {
    static EMPTY: OnceLock<Arc<Storage>> = OnceLock::new();
    Arc::clone(EMPTY.get_or_init(|| Storage::with_vec(Vec::new())))
}

/// `HeapByteBuf` 以单一结构统一表达缓冲的全部形态。
///
/// # 逻辑解析（How）
/// - `storage` 为 `Arc` 共享的堆存储，`origin + window` 圈定本视图的
///   可寻址窗口：根缓冲与副本的 `window` 为 `None`（跟随存储增长），
///   切片固定为 `Some(len)`；
/// - 游标、标记、字节序均为视图私有，互不影响（副本读数据不会移动
///   父缓冲的游标）；
/// - 仅根缓冲可声明 `growable`，切片与拷贝一律固定容量。
///
/// # 契约说明（What）
/// - 所有入口先校验 `0 ≤ reader ≤ writer ≤ capacity` 不变量，违例以
///   `buffer.out_of_bounds` 失败且不产生副作用；
/// - 同族缓冲间的批量搬运（[`ByteBuf::get_into`] / [`ByteBuf::set_from`]）
///   执行单次连续拷贝，同一存储内的重叠区间走 `copy_within`。
#[derive(Debug)]
pub struct HeapByteBuf {
    storage: Arc<Storage>,
    origin: usize,
    window: Option<usize>,
    reader: usize,
    writer: usize,
    reader_mark: usize,
    writer_mark: usize,
    order: ByteOrder,
    growable: bool,
    max_capacity: usize,
}

impl HeapByteBuf {
    /// 创建固定容量的堆缓冲，游标为 `(0, 0)`。
    pub fn fixed(capacity: usize) -> Self {
        Self {
            storage: Storage::with_vec(vec![0u8; capacity]),
            origin: 0,
            window: None,
            reader: 0,
            writer: 0,
            reader_mark: 0,
            writer_mark: 0,
            order: ByteOrder::default(),
            growable: false,
            max_capacity: capacity,
        }
    }

    /// 创建可增长的动态缓冲，容量不足时倍增扩容至 `max_capacity`。
    pub fn dynamic(initial_capacity: usize, max_capacity: usize) -> Self {
        let initial = initial_capacity.min(max_capacity);
        Self {
            storage: Storage::with_vec(vec![0u8; initial]),
            origin: 0,
            window: None,
            reader: 0,
            writer: 0,
            reader_mark: 0,
            writer_mark: 0,
            order: ByteOrder::default(),
            growable: true,
            max_capacity,
        }
    }

    /// 包装外部提供的字节：整段立即可读，容量固定不可增长。
    pub fn wrapped(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self {
            storage: Storage::with_vec(bytes),
            origin: 0,
            window: None,
            reader: 0,
            writer: len,
            reader_mark: 0,
            writer_mark: 0,
            order: ByteOrder::default(),
            growable: false,
            max_capacity: len,
        }
    }

    /// 返回规范空缓冲：容量为零的只读视图，底层存储进程内唯一。
    pub fn empty() -> Self {
        Self {
            storage: empty_storage(),
            origin: 0,
            window: Some(0),
            reader: 0,
            writer: 0,
            reader_mark: 0,
            writer_mark: 0,
            order: ByteOrder::default(),
            growable: false,
            max_capacity: 0,
        }
    }

    /// 以指定字节序返回自身，Builder 风格。
    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    fn cap_of(&self, storage_len: usize) -> usize {
        match self.window {
            Some(len) => len,
            None => storage_len - self.origin,
        }
    }

    fn check_range(&self, op: &'static str, index: usize, len: usize) -> Result<()> {
        let cap = self.capacity();
        let end = index
            .checked_add(len)
            .ok_or_else(|| SluiceError::out_of_bounds(op, "index + len overflows"))?;
        if end > cap {
            return Err(SluiceError::out_of_bounds(
                op,
                format!("range [{index}, {end}) exceeds capacity {cap}"),
            ));
        }
        Ok(())
    }

    fn duplicate_view(&self) -> HeapByteBuf {
        HeapByteBuf {
            storage: Arc::clone(&self.storage),
            origin: self.origin,
            window: self.window,
            reader: self.reader,
            writer: self.writer,
            reader_mark: self.reader_mark,
            writer_mark: self.writer_mark,
            order: self.order,
            growable: self.growable,
            max_capacity: self.max_capacity,
        }
    }
}

impl ByteBuf for HeapByteBuf {
    fn capacity(&self) -> usize {
        match self.window {
            Some(len) => len,
            None => {
                let guard = self.storage.bytes.read();
                guard.len() - self.origin
            }
        }
    }

    fn is_growable(&self) -> bool {
        self.growable
    }

    fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    fn order(&self) -> ByteOrder {
        self.order
    }

    fn reader_index(&self) -> usize {
        self.reader
    }

    fn writer_index(&self) -> usize {
        self.writer
    }

    fn set_reader_index(&mut self, reader: usize) -> Result<()> {
        if reader > self.writer {
            return Err(SluiceError::out_of_bounds(
                "set_reader_index",
                format!("reader {reader} > writer {}", self.writer),
            ));
        }
        self.reader = reader;
        Ok(())
    }

    fn set_writer_index(&mut self, writer: usize) -> Result<()> {
        let cap = self.capacity();
        if writer < self.reader || writer > cap {
            return Err(SluiceError::out_of_bounds(
                "set_writer_index",
                format!("writer {writer} outside [{}, {cap}]", self.reader),
            ));
        }
        self.writer = writer;
        Ok(())
    }

    fn set_index(&mut self, reader: usize, writer: usize) -> Result<()> {
        let cap = self.capacity();
        if reader > writer || writer > cap {
            return Err(SluiceError::out_of_bounds(
                "set_index",
                format!("indices ({reader}, {writer}) violate 0 <= r <= w <= {cap}"),
            ));
        }
        self.reader = reader;
        self.writer = writer;
        Ok(())
    }

    fn mark_reader_index(&mut self) {
        self.reader_mark = self.reader;
    }

    fn reset_reader_index(&mut self) -> Result<()> {
        let mark = self.reader_mark;
        self.set_reader_index(mark)
    }

    fn mark_writer_index(&mut self) {
        self.writer_mark = self.writer;
    }

    fn reset_writer_index(&mut self) -> Result<()> {
        let mark = self.writer_mark;
        self.set_writer_index(mark)
    }

    fn discard_read_bytes(&mut self) {
        if self.reader == 0 {
            return;
        }
        let discarded = self.reader;
        {
            let mut guard = self.storage.bytes.write();
            let start = self.origin + self.reader;
            let end = self.origin + self.writer;
            guard.copy_within(start..end, self.origin);
        }
        self.writer -= discarded;
        self.reader = 0;
        self.reader_mark = self.reader_mark.saturating_sub(discarded);
        self.writer_mark = self.writer_mark.saturating_sub(discarded);
    }

    fn ensure_writable(&mut self, needed: usize) -> Result<()> {
        if needed <= self.writable_bytes() {
            return Ok(());
        }
        if !self.growable {
            return Err(SluiceError::out_of_bounds(
                "ensure_writable",
                format!(
                    "need {needed} writable bytes, only {} in fixed buffer",
                    self.writable_bytes()
                ),
            ));
        }
        let required = self
            .writer
            .checked_add(needed)
            .ok_or_else(|| SluiceError::out_of_bounds("ensure_writable", "capacity overflows"))?;
        if required > self.max_capacity {
            return Err(SluiceError::out_of_bounds(
                "ensure_writable",
                format!("required {required} exceeds max capacity {}", self.max_capacity),
            ));
        }
        let mut next = GROWTH_FLOOR.max(self.capacity());
        while next < required {
            next <<= 1;
        }
        let next = next.min(self.max_capacity);
        let mut guard = self.storage.bytes.write();
        let target = self.origin + next;
        if guard.len() < target {
            guard.resize(target, 0);
        }
        Ok(())
    }

    fn get_u8(&self, index: usize) -> Result<u8> {
        let guard = self.storage.bytes.read();
        let cap = self.cap_of(guard.len());
        if index >= cap {
            return Err(SluiceError::out_of_bounds(
                "get_u8",
                format!("index {index} >= capacity {cap}"),
            ));
        }
        Ok(guard[self.origin + index])
    }

    fn set_u8(&mut self, index: usize, value: u8) -> Result<()> {
        let mut guard = self.storage.bytes.write();
        let cap = self.cap_of(guard.len());
        if index >= cap {
            return Err(SluiceError::out_of_bounds(
                "set_u8",
                format!("index {index} >= capacity {cap}"),
            ));
        }
        guard[self.origin + index] = value;
        Ok(())
    }

    fn get_bytes(&self, index: usize, dst: &mut [u8]) -> Result<()> {
        self.check_range("get_bytes", index, dst.len())?;
        let guard = self.storage.bytes.read();
        let start = self.origin + index;
        dst.copy_from_slice(&guard[start..start + dst.len()]);
        Ok(())
    }

    fn set_bytes(&mut self, index: usize, src: &[u8]) -> Result<()> {
        self.check_range("set_bytes", index, src.len())?;
        let mut guard = self.storage.bytes.write();
        let start = self.origin + index;
        guard[start..start + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn get_into(&self, index: usize, dst: &mut dyn ByteBuf, len: usize) -> Result<()> {
        self.check_range("get_into", index, len)?;
        let Some(other) = dst.as_any_mut().downcast_mut::<HeapByteBuf>() else {
            let mut tmp = vec![0u8; len];
            self.get_bytes(index, &mut tmp)?;
            return dst.write_bytes(&tmp);
        };
        other.ensure_writable(len)?;
        let src_start = self.origin + index;
        let dst_start = other.origin + other.writer;
        if Arc::ptr_eq(&self.storage, &other.storage) {
            let mut guard = self.storage.bytes.write();
            guard.copy_within(src_start..src_start + len, dst_start);
        } else {
            let src_guard = self.storage.bytes.read();
            let mut dst_guard = other.storage.bytes.write();
            dst_guard[dst_start..dst_start + len]
                .copy_from_slice(&src_guard[src_start..src_start + len]);
        }
        other.writer += len;
        Ok(())
    }

    fn set_from(&mut self, index: usize, src: &mut dyn ByteBuf, len: usize) -> Result<()> {
        self.check_range("set_from", index, len)?;
        let Some(other) = src.as_any_mut().downcast_mut::<HeapByteBuf>() else {
            let mut tmp = vec![0u8; len];
            src.read_bytes(&mut tmp)?;
            return self.set_bytes(index, &tmp);
        };
        if len > other.readable_bytes() {
            return Err(SluiceError::out_of_bounds(
                "set_from",
                format!("len {len} > source readable {}", other.readable_bytes()),
            ));
        }
        let src_start = other.origin + other.reader;
        let dst_start = self.origin + index;
        if Arc::ptr_eq(&self.storage, &other.storage) {
            let mut guard = self.storage.bytes.write();
            guard.copy_within(src_start..src_start + len, dst_start);
        } else {
            let src_guard = other.storage.bytes.read();
            let mut dst_guard = self.storage.bytes.write();
            dst_guard[dst_start..dst_start + len]
                .copy_from_slice(&src_guard[src_start..src_start + len]);
        }
        other.reader += len;
        Ok(())
    }

    fn get_to_writer(&self, index: usize, dst: &mut dyn Write, len: usize) -> Result<usize> {
        self.check_range("get_to_writer", index, len)?;
        let guard = self.storage.bytes.read();
        let start = self.origin + index;
        dst.write(&guard[start..start + len]).map_err(|err| {
            SluiceError::new(codes::BUFFER_IO_FAILED, "sink rejected bytes").with_cause(err)
        })
    }

    fn set_from_reader(&mut self, index: usize, src: &mut dyn Read, len: usize) -> Result<usize> {
        self.check_range("set_from_reader", index, len)?;
        let mut tmp = vec![0u8; len];
        let filled = src.read(&mut tmp).map_err(|err| {
            SluiceError::new(codes::BUFFER_IO_FAILED, "source read failed").with_cause(err)
        })?;
        if filled == 0 && len > 0 {
            return Err(SluiceError::new(
                codes::BUFFER_END_OF_INPUT,
                "source reached end of input",
            ));
        }
        let mut guard = self.storage.bytes.write();
        let start = self.origin + index;
        guard[start..start + filled].copy_from_slice(&tmp[..filled]);
        Ok(filled)
    }

    fn with_slice(&self, index: usize, len: usize, f: &mut dyn FnMut(&[u8])) -> Result<()> {
        self.check_range("with_slice", index, len)?;
        let guard = self.storage.bytes.read();
        let start = self.origin + index;
        f(&guard[start..start + len]);
        Ok(())
    }

    fn slice(&self, index: usize, len: usize) -> Result<Box<dyn ByteBuf>> {
        let cap = self.capacity();
        self.check_range("slice", index, len)?;
        if len == 0 {
            return Ok(Box::new(HeapByteBuf::empty()));
        }
        if index == 0 && len == cap {
            let mut full = self.duplicate_view();
            full.reader = 0;
            full.writer = cap;
            full.reader_mark = 0;
            full.writer_mark = 0;
            return Ok(Box::new(full));
        }
        Ok(Box::new(HeapByteBuf {
            storage: Arc::clone(&self.storage),
            origin: self.origin + index,
            window: Some(len),
            reader: 0,
            writer: len,
            reader_mark: 0,
            writer_mark: 0,
            order: self.order,
            growable: false,
            max_capacity: len,
        }))
    }

    fn duplicate(&self) -> Box<dyn ByteBuf> {
        Box::new(self.duplicate_view())
    }

    fn copy(&self, index: usize, len: usize) -> Result<Box<dyn ByteBuf>> {
        self.check_range("copy", index, len)?;
        let segment = {
            let guard = self.storage.bytes.read();
            let start = self.origin + index;
            guard[start..start + len].to_vec()
        };
        let mut owned = HeapByteBuf::wrapped(segment);
        owned.order = self.order;
        Ok(Box::new(owned))
    }

    fn to_vec(&self) -> Vec<u8> {
        let guard = self.storage.bytes.read();
        let start = self.origin + self.reader;
        let end = self.origin + self.writer;
        guard[start..end].to_vec()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
