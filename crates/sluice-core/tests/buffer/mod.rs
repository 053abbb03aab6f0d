//! 缓冲基座的契约测试：游标不变量、视图派生、扩容与 IO 互操作。

mod properties;

use std::io::Cursor;

use sluice_core::buffer::{ByteBuf, ByteOrder, HeapByteBuf};
use sluice_core::error::codes;

#[test]
fn index_invariant_holds_after_every_mutation() {
    let mut buf = HeapByteBuf::fixed(16);
    buf.write_bytes(&[1, 2, 3, 4, 5]).expect("write");
    assert_eq!(buf.read_u8().expect("read"), 1);
    buf.discard_read_bytes();
    buf.set_index(2, 4).expect("set");
    assert!(buf.reader_index() <= buf.writer_index());
    assert!(buf.writer_index() <= buf.capacity());

    let err = buf.set_index(5, 4).expect_err("invalid");
    assert!(err.is(codes::BUFFER_OUT_OF_BOUNDS));
}

#[test]
fn absolute_accessors_do_not_move_cursors() {
    let mut buf = HeapByteBuf::fixed(16);
    buf.write_bytes(&[0; 8]).expect("seed");
    buf.set_u32(0, 0xDEAD_BEEF).expect("set");
    assert_eq!(buf.get_u32(0).expect("get"), 0xDEAD_BEEF);
    assert_eq!(buf.reader_index(), 0);
    assert_eq!(buf.writer_index(), 8);
}

#[test]
fn relative_reads_stop_at_writer_index() {
    let mut buf = HeapByteBuf::fixed(8);
    buf.write_bytes(&[9, 9]).expect("write");
    buf.read_u8().expect("first");
    buf.read_u8().expect("second");
    let err = buf.read_u8().expect_err("exhausted");
    assert!(err.is(codes::BUFFER_OUT_OF_BOUNDS));
}

#[test]
fn multi_byte_orders_round_trip() {
    for (order, expected) in [
        (ByteOrder::Big, vec![0x12, 0x34, 0x56, 0x78]),
        (ByteOrder::Little, vec![0x78, 0x56, 0x34, 0x12]),
    ] {
        let mut buf = HeapByteBuf::fixed(8).with_order(order);
        buf.write_u32(0x1234_5678).expect("write");
        assert_eq!(buf.to_vec(), expected);
        assert_eq!(buf.read_u32().expect("read"), 0x1234_5678);
    }
}

#[test]
fn marks_follow_discard() {
    let mut buf = HeapByteBuf::fixed(16);
    buf.write_bytes(b"abcdef").expect("write");
    buf.read_u8().expect("a");
    buf.read_u8().expect("b");
    buf.mark_reader_index();
    buf.read_u8().expect("c");
    buf.reset_reader_index().expect("reset");
    assert_eq!(buf.read_u8().expect("c again"), b'c');

    buf.discard_read_bytes();
    // 丢弃三字节后标记同步回退,重置不会越过写游标。
    buf.reset_reader_index().expect("reset after discard");
    assert_eq!(buf.read_u8().expect("d"), b'd');
}

#[test]
fn duplicate_reads_do_not_disturb_parent() {
    let mut parent = HeapByteBuf::fixed(8);
    parent.write_bytes(&[1, 2, 3]).expect("write");
    let mut twin = parent.duplicate();
    assert_eq!(twin.read_u8().expect("dup read"), 1);
    assert_eq!(twin.reader_index(), 1);
    assert_eq!(parent.reader_index(), 0);
    assert_eq!(parent.readable_bytes(), 3);
}

#[test]
fn slice_bounds_reads_to_window() {
    let mut parent = HeapByteBuf::fixed(8);
    parent.write_bytes(&[10, 11, 12, 13]).expect("write");
    let mut view = parent.slice(1, 2).expect("slice");
    assert_eq!(view.capacity(), 2);
    assert_eq!(view.to_vec(), vec![11, 12]);
    assert!(view.get_u8(2).is_err());
    assert!(view.slice(1, 2).is_err());
    view.clear();
    assert!(view.write_bytes(&[0, 0, 0]).is_err());
}

#[test]
fn copy_is_isolated_from_parent() {
    let mut parent = HeapByteBuf::fixed(8);
    parent.write_bytes(&[5, 6, 7]).expect("write");
    let mut owned = parent.copy(0, 3).expect("copy");
    owned.set_u8(0, 99).expect("mutate copy");
    assert_eq!(parent.get_u8(0).expect("parent intact"), 5);
    assert_eq!(owned.reader_index(), 0);
    assert_eq!(owned.writer_index(), 3);
}

#[test]
fn buffer_to_buffer_transfer_moves_peer_cursors_only() {
    let mut src = HeapByteBuf::fixed(8);
    src.write_bytes(&[1, 2, 3, 4]).expect("seed");
    let mut dst = HeapByteBuf::fixed(8);

    // get_into 只前移目标写游标。
    src.get_into(1, &mut dst, 2).expect("get_into");
    assert_eq!(dst.to_vec(), vec![2, 3]);
    assert_eq!(src.reader_index(), 0);

    // set_from 只前移来源读游标。
    let mut sink = HeapByteBuf::fixed(8);
    sink.ensure_writable(4).expect("room");
    sink.set_writer_index(4).expect("window");
    sink.set_from(0, &mut src, 2).expect("set_from");
    assert_eq!(src.reader_index(), 2);
    assert_eq!(sink.get_u8(0).expect("first"), 1);
    assert_eq!(sink.writer_index(), 4);
}

#[test]
fn io_interop_reports_counts_and_end_of_input() {
    let mut buf = HeapByteBuf::dynamic(8, 1024);
    let mut reader = Cursor::new(vec![7u8, 8, 9]);
    let filled = buf.write_from_reader(&mut reader, 8).expect("fill");
    assert_eq!(filled, 3);
    assert_eq!(buf.to_vec(), vec![7, 8, 9]);

    let err = buf.write_from_reader(&mut reader, 4).expect_err("eof");
    assert!(err.is(codes::BUFFER_END_OF_INPUT));

    let mut out = Vec::new();
    let written = buf.read_to_writer(&mut out, 2).expect("drain");
    assert_eq!(written, 2);
    assert_eq!(out, vec![7, 8]);
    assert_eq!(buf.readable_bytes(), 1);
}

#[test]
fn growth_steps_double_and_respect_max() {
    let mut buf = HeapByteBuf::dynamic(4, 96);
    buf.write_bytes(&[0u8; 65]).expect("grow");
    // 64 仍不足 65,倍增后夹到上限 96。
    assert_eq!(buf.capacity(), 96);
    let err = buf.write_bytes(&[0u8; 40]).expect_err("over max");
    assert!(err.is(codes::BUFFER_OUT_OF_BOUNDS));
}

#[test]
fn wrapped_buffer_is_readable_and_non_growable() {
    let mut buf = HeapByteBuf::wrapped(vec![1, 2, 3]);
    assert_eq!(buf.readable_bytes(), 3);
    assert!(!buf.is_growable());
    assert_eq!(buf.read_u8().expect("read"), 1);
    assert!(buf.write_u8(4).is_err());
}

#[test]
fn with_slice_exposes_window_without_copy() {
    let mut buf = HeapByteBuf::fixed(8);
    buf.write_bytes(b"scan-me").expect("write");
    let mut seen = None;
    buf.with_slice(0, buf.readable_bytes(), &mut |bytes| {
        seen = bytes.iter().position(|b| *b == b'-');
    })
    .expect("window");
    assert_eq!(seen, Some(4));
}
