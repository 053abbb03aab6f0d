#![doc = "sluice-codec-line: 基于分隔符的分帧解码扩展。"]
#![doc = ""]
#![doc = "在不改动核心 crate 的前提下,验证外部扩展如何以 INBOUND Handler"]
#![doc = "的身份消费字节流、向后继消息缓冲产出帧,并在超长帧场景下通过"]
#![doc = "`codec.frame_too_long` 完成报告与自恢复。"]

pub mod delimiter;

pub use delimiter::DelimiterFrameDecoder;
