use async_trait::async_trait;
use hq_core::common::decimal::parse_optional_decimal;
use hq_core::common::{Granularity, MarketClass};
use hq_core::config::FeedConfig;
use hq_core::market::entity::{MinuteSeries, RawBar, Tick};
use hq_core::market::error::MarketError;
use hq_core::market::port::{FetchRequest, KlineProvider, Transport};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 信封中表示成功的状态码。
const SUCCESS_CODE: i64 = 0;

/// # Summary
/// 腾讯 appstock 接口的 JSON 信封。
///
/// # Invariants
/// - 仅当 `code == 0` 时 `data` 才有意义。
#[derive(Deserialize, Debug)]
struct Envelope {
    code: Option<Value>,
    #[serde(default)]
    msg: Option<String>,
    data: Option<Value>,
}

/// # Summary
/// 腾讯分时与前复权 K 线接口提供者。
pub struct IfzqProvider {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl IfzqProvider {
    pub fn new(transport: Arc<dyn Transport>, config: &FeedConfig) -> Self {
        Self {
            transport,
            base_url: config.ifzq_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// # Summary
    /// 生成分时请求 URL 与上游查询代码。
    ///
    /// # Logic
    /// 美股走 `UsMinute` 接口，代码改写为 `us<TICKER>.OQ`；其余市场原样使用规范代码。
    ///
    /// # Returns
    /// `(url, 查询代码)`。
    pub fn minute_request(&self, code: &str) -> (String, String) {
        let query = query_code(code);
        let url = if MarketClass::from_code(code) == MarketClass::Us {
            format!("{}/UsMinute/query?code={}", self.base_url, query)
        } else {
            format!("{}/minute/query?code={}", self.base_url, query)
        };
        (url, query)
    }

    /// 前复权 K 线请求 URL，`query` 为上游查询代码。
    pub fn kline_url(&self, query: &str, param: &str, count: usize) -> String {
        format!(
            "{}/fqkline/get?param={},{},,,{},qfq",
            self.base_url, query, param, count
        )
    }
}

/// 上游查询代码：美股改写为 `us<TICKER>.OQ`，其余市场沿用规范代码。
fn query_code(code: &str) -> String {
    if MarketClass::from_code(code) == MarketClass::Us {
        us_minute_code(code)
    } else {
        code.to_string()
    }
}

fn us_minute_code(code: &str) -> String {
    let lower = code.trim().to_lowercase();
    let ticker = lower
        .strip_prefix("gb_")
        .or_else(|| lower.strip_prefix("us"))
        .unwrap_or(&lower);
    format!("us{}.OQ", ticker.to_uppercase())
}

/// # Summary
/// 打开信封并取出 `data`。
///
/// # Logic
/// 1. 响应不是 JSON 对象时视为信封错误。
/// 2. 状态码缺失或不等于成功哨兵值时视为信封错误。
fn open_envelope(body: &str) -> Result<Value, MarketError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| MarketError::Envelope(format!("body is not a JSON envelope: {}", e)))?;

    let status = envelope.code.as_ref().and_then(Value::as_i64);
    if status != Some(SUCCESS_CODE) {
        return Err(MarketError::Envelope(format!(
            "status {:?} ({})",
            envelope.code,
            envelope.msg.unwrap_or_default()
        )));
    }

    envelope
        .data
        .ok_or_else(|| MarketError::Envelope("missing data".to_string()))
}

/// # Summary
/// 解码分时接口响应。
///
/// # Logic
/// 1. 打开信封，按请求代码查找条目，找不到时回退到上游查询代码。
/// 2. 交给 `decode_payload` 处理内层结构。
///
/// # Arguments
/// * `body`: 原始响应文本。
/// * `code`: 规范代码。
/// * `query_code`: 实际提交给上游的代码。
pub fn decode_minute(body: &str, code: &str, query_code: &str) -> Result<MinuteSeries, MarketError> {
    let data = open_envelope(body)?;
    let entry = data
        .get(code)
        .or_else(|| data.get(query_code))
        .ok_or(MarketError::NotFound)?;
    let inner = entry.get("data").ok_or(MarketError::NotFound)?;
    Ok(decode_payload(code, inner))
}

/// # Summary
/// 将分时内层结构归一为 `(date, ticks)`。
///
/// # Logic
/// 内层既可能是 `{"date": ..., "data": [...]}`，也可能是 `[date, data]`，
/// 后者的 `data` 还可能再包一层 `{"data": [...]}`。
pub fn decode_payload(code: &str, inner: &Value) -> MinuteSeries {
    let (date, lines) = match inner {
        Value::Object(map) => (
            map.get("date").and_then(Value::as_str).unwrap_or(""),
            map.get("data"),
        ),
        Value::Array(items) => (
            items.first().and_then(Value::as_str).unwrap_or(""),
            items.get(1).map(|d| d.get("data").unwrap_or(d)),
        ),
        _ => ("", None),
    };

    let data = lines
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(decode_tick_line)
                .collect()
        })
        .unwrap_or_default();

    MinuteSeries {
        code: code.to_string(),
        date: date.to_string(),
        data,
    }
}

/// # Summary
/// 解码单行分时记录：`HHMM price volume [amount]`。
///
/// # Logic
/// 1. 按空白切分（兼容内嵌的 `\r\n`），不足 3 段丢弃。
/// 2. 时间归一为 `HH:MM`，无法识别的时间丢弃整行。
/// 3. 价格无法解析时缺失；成交量与成交额缺失时记为 0。
pub fn decode_tick_line(line: &str) -> Option<Tick> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }
    let Some(time) = normalize_hhmm(tokens[0]) else {
        debug!("Dropping tick with unrecognised time {:?}", tokens[0]);
        return None;
    };

    Some(Tick {
        time,
        price: parse_optional_decimal(tokens[1]),
        volume: parse_optional_decimal(tokens[2]).unwrap_or(Decimal::ZERO),
        amount: tokens
            .get(3)
            .and_then(|t| parse_optional_decimal(t))
            .unwrap_or(Decimal::ZERO),
    })
}

/// 将 `HHMM`、`HH:MM` 或 `HHMMSS` 归一为 `HH:MM`。
pub fn normalize_hhmm(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| *c != ':').collect();
    if !(digits.len() == 4 || digits.len() == 6) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}:{}", &digits[0..2], &digits[2..4]))
}

/// # Summary
/// 从 K 线接口响应中取出指定粒度的原始 K 线。
///
/// # Logic
/// 1. 打开信封。
/// 2. `data` 为空数组：上游明确表示该市场不支持 → `Unsupported`。
/// 3. `data` 不是对象：结构异常 → `Envelope`。
/// 4. 按规范代码查找条目，找不到时回退到上游查询代码。
/// 5. 读取 `qfqday`/`qfqweek`/`qfqmonth`，缺失时回退到不复权字段；
///    字段存在但不是数组 → `Parse`，缺失或为空视为不支持。
///
/// # Arguments
/// * `code`: 规范代码。
/// * `query_code`: 实际提交给上游的代码。
pub fn extract_bars(
    body: &str,
    code: &str,
    query_code: &str,
    granularity: Granularity,
) -> Result<Vec<RawBar>, MarketError> {
    let unsupported = || MarketError::Unsupported {
        code: code.to_string(),
        granularity: granularity.to_string(),
    };

    let data = open_envelope(body)?;
    let map = match data {
        Value::Object(map) => map,
        Value::Array(items) if items.is_empty() => return Err(unsupported()),
        _ => {
            return Err(MarketError::Envelope(
                "unexpected kline data shape".to_string(),
            ));
        }
    };

    let entry = map
        .get(code)
        .or_else(|| map.get(query_code))
        .ok_or(MarketError::NotFound)?;
    let (primary, fallback) = granularity.bar_fields().ok_or_else(unsupported)?;
    let bars: Vec<RawBar> = match entry.get(primary).or_else(|| entry.get(fallback)) {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_array)
            .cloned()
            .collect(),
        Some(other) => {
            return Err(MarketError::Parse(format!(
                "{} bars for {} are not an array: {}",
                granularity, code, other
            )));
        }
    };

    if bars.is_empty() {
        return Err(unsupported());
    }
    Ok(bars)
}

#[async_trait]
impl KlineProvider for IfzqProvider {
    async fn fetch_minute(&self, code: &str) -> Result<MinuteSeries, MarketError> {
        let (url, query_code) = self.minute_request(code);
        let body = self.transport.fetch_text(&FetchRequest::new(url)).await?;
        decode_minute(&body, code, &query_code)
    }

    async fn fetch_bars(
        &self,
        code: &str,
        granularity: Granularity,
        count: usize,
    ) -> Result<Vec<RawBar>, MarketError> {
        let param = granularity
            .kline_param()
            .ok_or_else(|| MarketError::Unsupported {
                code: code.to_string(),
                granularity: granularity.to_string(),
            })?;
        let query = query_code(code);
        let url = self.kline_url(&query, param, count);
        let body = self.transport.fetch_text(&FetchRequest::new(url)).await?;
        extract_bars(&body, code, &query, granularity)
    }
}
