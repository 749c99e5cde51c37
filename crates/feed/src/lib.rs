//! 上游行情适配层：HTTP 传输、各数据源的线格式解析与字段布局表。

pub mod http;
pub mod ifzq;
pub mod layout;
pub mod sina;
pub mod tencent;
