use crate::layout::{TENCENT_V1, normalize};
use async_trait::async_trait;
use hq_core::common::time::{RealTimeProvider, TimeProvider};
use hq_core::common::{MarketClass, Provider};
use hq_core::config::FeedConfig;
use hq_core::market::entity::Quote;
use hq_core::market::error::MarketError;
use hq_core::market::port::{FetchRequest, QuoteProvider, Transport};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

const REFERER: &str = "https://gu.qq.com/";

/// # Summary
/// 腾讯行情提供者 (Provider B)：波浪号分隔的定位格式报价，覆盖港股与沪深 A 股。
pub struct TencentProvider {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn TimeProvider>,
    quote_url: String,
}

impl TencentProvider {
    pub fn new(transport: Arc<dyn Transport>, config: &FeedConfig) -> Self {
        Self {
            transport,
            clock: Arc::new(RealTimeProvider),
            quote_url: config.tencent_quote_url.trim_end_matches('/').to_string(),
        }
    }

    /// 替换时钟实现（测试中用于固定请求 URL）。
    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }
}

/// # Summary
/// 将规范代码转换为腾讯请求代码：港股加 `r_` 前缀 (`hk00700` → `r_hk00700`)。
pub fn tencent_symbol(code: &str) -> String {
    let lower = code.trim().to_lowercase();
    if lower.starts_with("hk") {
        format!("r_{}", lower)
    } else {
        lower
    }
}

/// # Summary
/// 解析腾讯批量报价响应。
///
/// # Logic
/// 1. 只处理同时包含 `=` 与 `~` 的行。
/// 2. 变量名去掉 `v_` 与 `r_` 前缀即为代码。
/// 3. 字段数少于 35 的记录丢弃。
///
/// # Returns
/// 以小写代码为键的报价映射。
pub fn parse_quotes(body: &str) -> HashMap<String, Quote> {
    body.lines()
        .filter(|line| line.contains('=') && line.contains('~'))
        .filter_map(parse_line)
        .map(|quote| (quote.code.clone(), quote))
        .collect()
}

fn parse_line(line: &str) -> Option<Quote> {
    let (var, payload) = line.split_once('=')?;
    let var = var.trim();
    let var = var.strip_prefix("v_").unwrap_or(var);
    let code = var.strip_prefix("r_").unwrap_or(var).to_lowercase();
    if code.is_empty() {
        return None;
    }

    let payload = payload.trim().trim_end_matches(';').trim_matches('"');
    let fields: Vec<&str> = payload.split('~').collect();
    if fields.len() < TENCENT_V1.min_fields {
        debug!(
            "Tencent record for {} discarded: only {} fields",
            code,
            fields.len()
        );
        return None;
    }

    Some(normalize(
        Provider::Tencent,
        MarketClass::from_code(&code),
        &code,
        &fields,
    ))
}

#[async_trait]
impl QuoteProvider for TencentProvider {
    fn provider(&self) -> Provider {
        Provider::Tencent
    }

    /// # Summary
    /// 批量获取腾讯实时报价。
    ///
    /// # Logic
    /// 1. 港股代码补 `r_` 前缀后以逗号拼接。
    /// 2. 附带 Referer 与时间戳参数发起请求，按 GB18030 解码。
    /// 3. 解析后只保留请求过的代码。
    async fn fetch_quotes(&self, codes: &[String]) -> Result<HashMap<String, Quote>, MarketError> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let symbols: Vec<String> = codes.iter().map(|c| tencent_symbol(c)).collect();
        let url = format!(
            "{}/?_={}&q={}",
            self.quote_url,
            self.clock.now().timestamp(),
            symbols.join(",")
        );
        let request = FetchRequest::new(url)
            .header("Referer", REFERER)
            .charset("gb18030");

        let body = self.transport.fetch_text(&request).await?;
        let wanted: HashSet<String> = codes.iter().map(|c| c.trim().to_lowercase()).collect();

        Ok(parse_quotes(&body)
            .into_iter()
            .filter(|(code, _)| wanted.contains(code))
            .collect())
    }
}
