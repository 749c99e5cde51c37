//! 行情领域核心：实体、端口与共享的解析工具。
//!
//! 本 crate 不做任何 I/O，所有网络访问都通过 [`market::port`] 中的端口注入。

pub mod common;
pub mod config;
pub mod market;
