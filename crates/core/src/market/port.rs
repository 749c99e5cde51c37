use crate::common::{Granularity, Provider};
use crate::market::entity::{MinuteSeries, Quote, RawBar, SearchHit};
use crate::market::error::MarketError;
use async_trait::async_trait;
use std::collections::HashMap;

/// # Summary
/// 一次上游 GET 请求的描述。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    // 额外请求头，如 Referer / Host
    pub headers: Vec<(&'static str, String)>,
    // 响应体字符集，None 表示按响应头或 UTF-8 解码
    pub charset: Option<&'static str>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            charset: None,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn charset(mut self, charset: &'static str) -> Self {
        self.charset = Some(charset);
        self
    }
}

/// # Summary
/// HTTP 传输层端口，交付给定 URL 的原始响应文本。
///
/// # Invariants
/// - 超时与取消由实现者负责，并统一映射为 `MarketError::Network`。
/// - 非 2xx 响应映射为 `MarketError::Http`。
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Summary
    /// 执行请求并以文本形式返回响应体。
    ///
    /// # Arguments
    /// * `request`: 请求描述。
    ///
    /// # Returns
    /// 成功返回解码后的响应文本。
    async fn fetch_text(&self, request: &FetchRequest) -> Result<String, MarketError>;
}

/// # Summary
/// 实时报价提供者接口。
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// 该实现对应的数据源标签。
    fn provider(&self) -> Provider;

    /// # Summary
    /// 批量获取实时报价。
    ///
    /// # Logic
    /// 1. 将规范代码转换为上游请求格式并发起一次批量请求。
    /// 2. 逐行解析，单行失败只丢弃该行。
    /// 3. 仅保留请求中包含的代码。
    ///
    /// # Arguments
    /// * `codes`: 小写规范代码列表。
    ///
    /// # Returns
    /// 以规范代码为键的报价映射；结构性失败返回空映射。
    async fn fetch_quotes(&self, codes: &[String]) -> Result<HashMap<String, Quote>, MarketError>;
}

/// # Summary
/// 分时与 K 线数据提供者接口。
#[async_trait]
pub trait KlineProvider: Send + Sync {
    /// # Summary
    /// 获取当日完整分时序列。
    ///
    /// # Returns
    /// 按上游顺序排列的分时序列；截取尾部由调用方完成。
    async fn fetch_minute(&self, code: &str) -> Result<MinuteSeries, MarketError>;

    /// # Summary
    /// 获取上游已聚合的日/周/月原始 K 线数组。
    ///
    /// # Arguments
    /// * `code`: 规范代码。
    /// * `granularity`: 仅接受日/周/月。
    /// * `count`: 请求条数。
    ///
    /// # Returns
    /// 未排序的原始 K 线；上游以空集合表示不支持时返回 `MarketError::Unsupported`。
    async fn fetch_bars(
        &self,
        code: &str,
        granularity: Granularity,
        count: usize,
    ) -> Result<Vec<RawBar>, MarketError>;
}

/// # Summary
/// 证券代码搜索接口。
#[async_trait]
pub trait SymbolSearch: Send + Sync {
    /// 按名称或代码关键字搜索。
    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, MarketError>;
}
