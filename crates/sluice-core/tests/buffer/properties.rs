//! 随机操作序列下的缓冲不变量验证。

use proptest::prelude::*;

use sluice_core::buffer::{ByteBuf, HeapByteBuf};

/// 缓冲上的一步随机操作。
#[derive(Clone, Debug)]
enum Op {
    Write(Vec<u8>),
    Read(usize),
    Discard,
    SetIndex(usize, usize),
    Slice(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(Op::Write),
        (0usize..64).prop_map(Op::Read),
        Just(Op::Discard),
        (0usize..128, 0usize..128).prop_map(|(r, w)| Op::SetIndex(r, w)),
        (0usize..128, 0usize..64).prop_map(|(i, l)| Op::Slice(i, l)),
    ]
}

proptest! {
    /// 不变量 `0 ≤ reader ≤ writer ≤ capacity` 在任意操作序列后成立,
    /// 失败的操作不得产生副作用。
    #[test]
    fn cursor_invariant_survives_random_ops(ops in proptest::collection::vec(op_strategy(), 1..48)) {
        let mut buf = HeapByteBuf::dynamic(8, 4096);
        for op in ops {
            match op {
                Op::Write(bytes) => { let _ = buf.write_bytes(&bytes); }
                Op::Read(n) => {
                    let mut scratch = vec![0u8; n];
                    let _ = buf.read_bytes(&mut scratch);
                }
                Op::Discard => buf.discard_read_bytes(),
                Op::SetIndex(r, w) => { let _ = buf.set_index(r, w); }
                Op::Slice(i, l) => {
                    if let Ok(view) = buf.slice(i, l) {
                        prop_assert!(view.reader_index() <= view.writer_index());
                        prop_assert!(view.writer_index() <= view.capacity());
                    }
                }
            }
            prop_assert!(buf.reader_index() <= buf.writer_index());
            prop_assert!(buf.writer_index() <= buf.capacity());
        }
    }

    /// `discard_read_bytes` 对可读内容透明:前后读取结果一致。
    #[test]
    fn discard_is_transparent_to_readable_content(
        payload in proptest::collection::vec(any::<u8>(), 1..256),
        consumed in 0usize..128,
    ) {
        let mut buf = HeapByteBuf::dynamic(16, 8192);
        buf.write_bytes(&payload).unwrap();
        let consumed = consumed.min(payload.len());
        let mut scratch = vec![0u8; consumed];
        buf.read_bytes(&mut scratch).unwrap();

        let before = buf.to_vec();
        let readable_before = buf.readable_bytes();
        buf.discard_read_bytes();
        prop_assert_eq!(buf.readable_bytes(), readable_before);
        prop_assert_eq!(buf.to_vec(), before);
        prop_assert_eq!(buf.reader_index(), 0);
    }

    /// 副本游标独立;切片读写被窗口约束。
    #[test]
    fn views_have_independent_cursors(
        payload in proptest::collection::vec(any::<u8>(), 4..128),
        start in 0usize..64,
        len in 1usize..64,
    ) {
        let mut parent = HeapByteBuf::dynamic(16, 8192);
        parent.write_bytes(&payload).unwrap();
        let reader_before = parent.reader_index();

        let mut twin = parent.duplicate();
        let n = twin.readable_bytes();
        let mut scratch = vec![0u8; n];
        twin.read_bytes(&mut scratch).unwrap();
        prop_assert_eq!(parent.reader_index(), reader_before);
        prop_assert_eq!(&scratch, &payload);

        let start = start.min(payload.len().saturating_sub(1));
        let len = len.min(parent.capacity() - start);
        if len > 0 {
            let view = parent.slice(start, len).unwrap();
            prop_assert_eq!(view.capacity(), len);
            prop_assert!(view.get_u8(len).is_err());
        }
    }
}
