use async_trait::async_trait;
use hq_core::config::FeedConfig;
use hq_core::market::error::MarketError;
use hq_core::market::port::{FetchRequest, Transport};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// # Summary
/// 基于 `reqwest` 的 HTTP 传输实现。
///
/// # Invariants
/// - 超时由客户端统一配置，超时与连接错误都映射为 `MarketError::Network`。
#[derive(Clone)]
pub struct HttpTransport {
    /// 内部使用的 HTTP 客户端
    client: Client,
}

impl HttpTransport {
    /// # Summary
    /// 创建一个新的 HttpTransport 实例。
    ///
    /// # Logic
    /// 1. 安装 rustls 的 ring 加密后端（已安装时忽略）。
    /// 2. 按配置设置超时与浏览器 User-Agent，减少被上游拦截的风险。
    /// 3. 初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `config`: 数据源配置。
    ///
    /// # Returns
    /// 成功返回传输实例，客户端构建失败返回 `MarketError::Network`。
    pub fn new(config: &FeedConfig) -> Result<Self, MarketError> {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| MarketError::Network(format!("invalid user agent: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| MarketError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// # Summary
    /// 发起 GET 请求并返回文本响应体。
    ///
    /// # Logic
    /// 1. 附加请求级 Header。
    /// 2. 非 2xx 状态直接返回 `MarketError::Http`。
    /// 3. 按请求指定的字符集解码（新浪与腾讯报价为 GB18030）。
    async fn fetch_text(&self, request: &FetchRequest) -> Result<String, MarketError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketError::Http(resp.status().as_u16()));
        }

        let text = match request.charset {
            Some(charset) => resp.text_with_charset(charset).await,
            None => resp.text().await,
        };
        text.map_err(|e| MarketError::Network(e.to_string()))
    }
}
