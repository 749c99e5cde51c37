//! 行情领域服务：分时重采样、K 线透传、数据源路由与多粒度汇总。

pub mod aggregator;
pub mod catalog;
pub mod passthrough;
pub mod router;
pub mod service;
