#![doc = "sluice-codec-base64: 标准字母表的 Base64 编解码扩展。"]
#![doc = ""]
#![doc = "引擎层提供纯函数的编解码实现;Handler 层把编码挂在出站冲刷"]
#![doc = "路径、把解码挂在入站通知路径,验证字节到字节的双向变换阶段"]
#![doc = "如何以扩展 crate 的形式接入流水线。"]

pub mod engine;
pub mod handler;

pub use engine::{decode, encode};
pub use handler::{Base64Decoder, Base64Encoder};
