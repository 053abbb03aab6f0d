use std::any::Any;
use std::io::{Read, Write};

use crate::error::{Result, SluiceError};

use super::ByteOrder;

/// `ByteBuf` 是流水线各阶段共享的索引式字节缓冲契约。
///
/// # 设计背景（Why）
/// - 阶段之间以“读游标/写游标”划分已消费、可读与可写三段区域，
///   消费与生产互不干扰，压缩（[`Self::discard_read_bytes`]）可随时回收
///   已读空间以约束内存。
/// - 契约保持对象安全，`Box<dyn ByteBuf>` 可在上下文、桥接与消息载体
///   之间自由流转。
///
/// # 契约说明（What）
/// - 核心不变量：`0 ≤ reader_index ≤ writer_index ≤ capacity` 在每一次
///   操作之后都必须成立；任何会破坏不变量的调用以
///   `buffer.out_of_bounds` 失败且不产生副作用。
/// - 绝对存取（`get_*`/`set_*`）不移动游标；相对存取（`read_*`/`write_*`）
///   前移对应游标。多字节原语一律遵循 [`Self::order`] 声明的字节序。
/// - 缓冲间搬运的游标约定：`get_into` 前移**目标**写游标，`set_from`
///   前移**来源**读游标，自身游标均不动。
/// - 动态缓冲在相对写越界时自动扩容到满足写入的下一档容量；
///   固定/包装缓冲则直接失败。
///
/// # 风险提示（Trade-offs）
/// - 视图（切片/副本）与父缓冲共享底层存储，跨视图写入彼此可见；
///   需要隔离时应使用 [`Self::copy`]。
pub trait ByteBuf: Send + Sync + 'static {
    /// 当前可寻址容量。
    fn capacity(&self) -> usize;

    /// 是否允许按需扩容。
    fn is_growable(&self) -> bool;

    /// 扩容上限；固定缓冲等于 `capacity`。
    fn max_capacity(&self) -> usize;

    /// 多字节存取遵循的字节序。
    fn order(&self) -> ByteOrder;

    /// 读游标。
    fn reader_index(&self) -> usize;

    /// 写游标。
    fn writer_index(&self) -> usize;

    /// 设置读游标，要求 `reader ≤ writer_index`。
    fn set_reader_index(&mut self, reader: usize) -> Result<()>;

    /// 设置写游标，要求 `reader_index ≤ writer ≤ capacity`。
    fn set_writer_index(&mut self, writer: usize) -> Result<()>;

    /// 同时设置两个游标，要求 `reader ≤ writer ≤ capacity`。
    fn set_index(&mut self, reader: usize, writer: usize) -> Result<()>;

    /// 可读字节数。
    fn readable_bytes(&self) -> usize {
        self.writer_index() - self.reader_index()
    }

    /// 可写字节数。
    fn writable_bytes(&self) -> usize {
        self.capacity() - self.writer_index()
    }

    /// 是否仍有可读字节。
    fn is_readable(&self) -> bool {
        self.readable_bytes() > 0
    }

    /// 是否仍有可写空间。
    fn is_writable(&self) -> bool {
        self.writable_bytes() > 0
    }

    /// 游标归零；内容不清除。
    fn clear(&mut self) {
        let _ = self.set_index(0, 0);
    }

    /// 记录当前读游标，供 [`Self::reset_reader_index`] 回退。
    fn mark_reader_index(&mut self);

    /// 回退读游标到上次标记处。
    fn reset_reader_index(&mut self) -> Result<()>;

    /// 记录当前写游标。
    fn mark_writer_index(&mut self);

    /// 回退写游标到上次标记处。
    fn reset_writer_index(&mut self) -> Result<()>;

    /// 将可读区间搬移到偏移 0，两个游标同减已丢弃的字节数。
    ///
    /// 对可读内容是无损操作：`readable_bytes` 与后续 `read_*` 的结果
    /// 不受影响。标记随游标同步回退。
    fn discard_read_bytes(&mut self);

    /// 确保至少 `needed` 字节可写空间；动态缓冲按需扩容，
    /// 固定缓冲返回 `buffer.out_of_bounds`。
    fn ensure_writable(&mut self, needed: usize) -> Result<()>;

    // ---- 绝对原语存取 ----

    /// 读取 `index` 处的单字节。
    fn get_u8(&self, index: usize) -> Result<u8>;

    /// 写入 `index` 处的单字节。
    fn set_u8(&mut self, index: usize, value: u8) -> Result<()>;

    /// 读取有符号单字节。
    fn get_i8(&self, index: usize) -> Result<i8> {
        Ok(self.get_u8(index)? as i8)
    }

    /// 写入有符号单字节。
    fn set_i8(&mut self, index: usize, value: i8) -> Result<()> {
        self.set_u8(index, value as u8)
    }

    /// 按声明字节序读取 16 位无符号整数。
    fn get_u16(&self, index: usize) -> Result<u16> {
        let mut raw = [0u8; 2];
        self.get_bytes(index, &mut raw)?;
        Ok(match self.order() {
            ByteOrder::Big => u16::from_be_bytes(raw),
            ByteOrder::Little => u16::from_le_bytes(raw),
        })
    }

    /// 按声明字节序写入 16 位无符号整数。
    fn set_u16(&mut self, index: usize, value: u16) -> Result<()> {
        let raw = match self.order() {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.set_bytes(index, &raw)
    }

    /// 读取 16 位有符号整数。
    fn get_i16(&self, index: usize) -> Result<i16> {
        Ok(self.get_u16(index)? as i16)
    }

    /// 写入 16 位有符号整数。
    fn set_i16(&mut self, index: usize, value: i16) -> Result<()> {
        self.set_u16(index, value as u16)
    }

    /// 读取 32 位无符号整数。
    fn get_u32(&self, index: usize) -> Result<u32> {
        let mut raw = [0u8; 4];
        self.get_bytes(index, &mut raw)?;
        Ok(match self.order() {
            ByteOrder::Big => u32::from_be_bytes(raw),
            ByteOrder::Little => u32::from_le_bytes(raw),
        })
    }

    /// 写入 32 位无符号整数。
    fn set_u32(&mut self, index: usize, value: u32) -> Result<()> {
        let raw = match self.order() {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.set_bytes(index, &raw)
    }

    /// 读取 32 位有符号整数。
    fn get_i32(&self, index: usize) -> Result<i32> {
        Ok(self.get_u32(index)? as i32)
    }

    /// 写入 32 位有符号整数。
    fn set_i32(&mut self, index: usize, value: i32) -> Result<()> {
        self.set_u32(index, value as u32)
    }

    /// 读取 64 位无符号整数。
    fn get_u64(&self, index: usize) -> Result<u64> {
        let mut raw = [0u8; 8];
        self.get_bytes(index, &mut raw)?;
        Ok(match self.order() {
            ByteOrder::Big => u64::from_be_bytes(raw),
            ByteOrder::Little => u64::from_le_bytes(raw),
        })
    }

    /// 写入 64 位无符号整数。
    fn set_u64(&mut self, index: usize, value: u64) -> Result<()> {
        let raw = match self.order() {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.set_bytes(index, &raw)
    }

    /// 读取 64 位有符号整数。
    fn get_i64(&self, index: usize) -> Result<i64> {
        Ok(self.get_u64(index)? as i64)
    }

    /// 写入 64 位有符号整数。
    fn set_i64(&mut self, index: usize, value: i64) -> Result<()> {
        self.set_u64(index, value as u64)
    }

    // ---- 相对原语存取 ----

    /// 读取并消费单字节。
    fn read_u8(&mut self) -> Result<u8> {
        let value = self.get_u8(self.reader_index())?;
        self.set_reader_index(self.reader_index() + 1)?;
        Ok(value)
    }

    /// 追加单字节。
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.ensure_writable(1)?;
        let writer = self.writer_index();
        self.set_u8(writer, value)?;
        self.set_writer_index(writer + 1)
    }

    /// 读取并消费 16 位无符号整数。
    fn read_u16(&mut self) -> Result<u16> {
        let value = self.get_u16(self.reader_index())?;
        self.set_reader_index(self.reader_index() + 2)?;
        Ok(value)
    }

    /// 追加 16 位无符号整数。
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.ensure_writable(2)?;
        let writer = self.writer_index();
        self.set_u16(writer, value)?;
        self.set_writer_index(writer + 2)
    }

    /// 读取并消费 32 位无符号整数。
    fn read_u32(&mut self) -> Result<u32> {
        let value = self.get_u32(self.reader_index())?;
        self.set_reader_index(self.reader_index() + 4)?;
        Ok(value)
    }

    /// 追加 32 位无符号整数。
    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.ensure_writable(4)?;
        let writer = self.writer_index();
        self.set_u32(writer, value)?;
        self.set_writer_index(writer + 4)
    }

    /// 读取并消费 64 位无符号整数。
    fn read_u64(&mut self) -> Result<u64> {
        let value = self.get_u64(self.reader_index())?;
        self.set_reader_index(self.reader_index() + 8)?;
        Ok(value)
    }

    /// 追加 64 位无符号整数。
    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.ensure_writable(8)?;
        let writer = self.writer_index();
        self.set_u64(writer, value)?;
        self.set_writer_index(writer + 8)
    }

    // ---- 批量搬运 ----

    /// 从 `index` 起读取 `dst.len()` 字节到切片；不移动游标。
    fn get_bytes(&self, index: usize, dst: &mut [u8]) -> Result<()>;

    /// 从 `index` 起写入整个切片；不移动游标。
    fn set_bytes(&mut self, index: usize, src: &[u8]) -> Result<()>;

    /// 从 `index` 起搬运 `len` 字节到另一缓冲，前移目标写游标。
    fn get_into(&self, index: usize, dst: &mut dyn ByteBuf, len: usize) -> Result<()> {
        let mut tmp = vec![0u8; len];
        self.get_bytes(index, &mut tmp)?;
        dst.write_bytes(&tmp)
    }

    /// 在 `index` 处写入另一缓冲的前 `len` 个可读字节，前移来源读游标。
    fn set_from(&mut self, index: usize, src: &mut dyn ByteBuf, len: usize) -> Result<()> {
        let mut tmp = vec![0u8; len];
        src.read_bytes(&mut tmp)?;
        self.set_bytes(index, &tmp)
    }

    /// 读取并消费 `dst.len()` 字节。
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        if dst.len() > self.readable_bytes() {
            return Err(SluiceError::out_of_bounds(
                "read_bytes",
                format!("len {} > readable {}", dst.len(), self.readable_bytes()),
            ));
        }
        self.get_bytes(self.reader_index(), dst)?;
        self.set_reader_index(self.reader_index() + dst.len())
    }

    /// 追加整个切片，必要时扩容。
    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.ensure_writable(src.len())?;
        let writer = self.writer_index();
        self.set_bytes(writer, src)?;
        self.set_writer_index(writer + src.len())
    }

    /// 读取并消费前 `len` 个可读字节，返回独立的新缓冲。
    fn read_buf(&mut self, len: usize) -> Result<Box<dyn ByteBuf>> {
        if len > self.readable_bytes() {
            return Err(SluiceError::out_of_bounds(
                "read_buf",
                format!("len {len} > readable {}", self.readable_bytes()),
            ));
        }
        let out = self.copy(self.reader_index(), len)?;
        self.set_reader_index(self.reader_index() + len)?;
        Ok(out)
    }

    /// 追加另一缓冲的前 `len` 个可读字节，前移来源读游标。
    fn write_from(&mut self, src: &mut dyn ByteBuf, len: usize) -> Result<()> {
        self.ensure_writable(len)?;
        let writer = self.writer_index();
        self.set_from(writer, src, len)?;
        self.set_writer_index(writer + len)
    }

    // ---- std::io 互操作 ----

    /// 从 `index` 起向写出端输出最多 `len` 字节，返回实际写出量；
    /// 不移动游标。
    fn get_to_writer(&self, index: usize, dst: &mut dyn Write, len: usize) -> Result<usize>;

    /// 在 `index` 处写入读入端的一次 `read` 结果，返回实际写入量；
    /// 读入端未产出任何字节即结束时返回 `buffer.end_of_input`。
    fn set_from_reader(&mut self, index: usize, src: &mut dyn Read, len: usize) -> Result<usize>;

    /// 相对变体：输出并消费最多 `len` 个可读字节。
    fn read_to_writer(&mut self, dst: &mut dyn Write, len: usize) -> Result<usize> {
        if len > self.readable_bytes() {
            return Err(SluiceError::out_of_bounds(
                "read_to_writer",
                format!("len {len} > readable {}", self.readable_bytes()),
            ));
        }
        let written = self.get_to_writer(self.reader_index(), dst, len)?;
        self.set_reader_index(self.reader_index() + written)?;
        Ok(written)
    }

    /// 相对变体：追加读入端的一次 `read` 结果。
    fn write_from_reader(&mut self, src: &mut dyn Read, len: usize) -> Result<usize> {
        self.ensure_writable(len)?;
        let writer = self.writer_index();
        let filled = self.set_from_reader(writer, src, len)?;
        self.set_writer_index(writer + filled)?;
        Ok(filled)
    }

    /// 以借用窗口形式暴露 `[index, index + len)` 的字节，供调用方
    /// 原地扫描而无须复制。
    fn with_slice(&self, index: usize, len: usize, f: &mut dyn FnMut(&[u8])) -> Result<()>;

    // ---- 派生视图 ----

    /// 返回共享存储、拥有独立游标的窗口视图。
    ///
    /// 特例：零长切片返回全局规范空缓冲；`slice(0, capacity)` 等价于
    /// 游标为 `(0, capacity)` 的副本。
    fn slice(&self, index: usize, len: usize) -> Result<Box<dyn ByteBuf>>;

    /// 返回共享存储、游标独立的全范围视图。
    fn duplicate(&self) -> Box<dyn ByteBuf>;

    /// 返回全新存储的独立拷贝，游标为 `(0, len)`。
    fn copy(&self, index: usize, len: usize) -> Result<Box<dyn ByteBuf>>;

    /// 当前可读区间的切片视图。
    fn readable_slice(&self) -> Result<Box<dyn ByteBuf>> {
        self.slice(self.reader_index(), self.readable_bytes())
    }

    /// 当前可读区间的 `Vec` 快照，不移动游标。
    fn to_vec(&self) -> Vec<u8>;

    // ---- dyn 特化入口 ----

    /// 向下转型入口，供同族实现走单次连续拷贝。
    fn as_any(&self) -> &dyn Any;

    /// 可变向下转型入口。
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
