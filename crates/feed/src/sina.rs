use crate::layout::{SINA_CN_V1, SINA_US_V1, normalize};
use async_trait::async_trait;
use hq_core::common::time::{RealTimeProvider, TimeProvider};
use hq_core::common::{MarketClass, Provider};
use hq_core::config::FeedConfig;
use hq_core::market::entity::{Quote, SearchHit};
use hq_core::market::error::MarketError;
use hq_core::market::port::{FetchRequest, QuoteProvider, SymbolSearch, Transport};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

const REFERER: &str = "https://finance.sina.com.cn/";
const VAR_PREFIX: &str = "hq_str_";
const SUGGEST_MARKER: &str = "suggestdata=\"";

/// # Summary
/// 新浪行情提供者 (Provider A)：逗号分隔的定位格式报价与代码联想。
///
/// # Invariants
/// - 只负责请求组装与解析，网络访问完全委托给注入的 `Transport`。
pub struct SinaProvider {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn TimeProvider>,
    quote_url: String,
    suggest_url: String,
}

impl SinaProvider {
    /// # Summary
    /// 创建新浪提供者，使用真实时钟生成防缓存参数。
    pub fn new(transport: Arc<dyn Transport>, config: &FeedConfig) -> Self {
        Self {
            transport,
            clock: Arc::new(RealTimeProvider),
            quote_url: config.sina_quote_url.trim_end_matches('/').to_string(),
            suggest_url: config.sina_suggest_url.trim_end_matches('/').to_string(),
        }
    }

    /// 替换时钟实现（测试中用于固定请求 URL）。
    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }
}

/// # Summary
/// 将规范代码转换为新浪请求代码。
///
/// # Logic
/// 统一小写；`us` 前缀的美股代码改写为 `gb_` 前缀 (`usAAPL` → `gb_aapl`)。
pub fn sina_symbol(code: &str) -> String {
    let lower = code.trim().to_lowercase();
    match lower.strip_prefix("us") {
        Some(ticker) => format!("gb_{}", ticker),
        None => lower,
    }
}

/// # Summary
/// 解析新浪批量报价响应。
///
/// # Logic
/// 1. 逐行查找 `var hq_str_<code>="...";` 形式的赋值语句。
/// 2. 单行解析失败只跳过该行，不影响整个批次。
///
/// # Returns
/// 以小写代码为键的报价映射；无任何有效行时为空。
pub fn parse_quotes(body: &str) -> HashMap<String, Quote> {
    body.lines()
        .filter_map(parse_line)
        .map(|quote| (quote.code.clone(), quote))
        .collect()
}

fn parse_line(line: &str) -> Option<Quote> {
    let (var, payload) = line.split_once('=')?;
    let var = var.trim();
    let var = var.strip_prefix("var ").unwrap_or(var).trim();
    let code = var.strip_prefix(VAR_PREFIX)?.to_lowercase();

    let payload = payload.trim().trim_end_matches(';').trim_matches('"');
    if payload.trim().is_empty() {
        debug!("Sina returned empty payload for {}", code);
        return None;
    }

    let fields: Vec<&str> = payload.split(',').collect();
    let market = if code.starts_with("gb_") && fields.len() >= SINA_US_V1.min_fields {
        MarketClass::Us
    } else if fields.len() >= SINA_CN_V1.min_fields {
        MarketClass::CnA
    } else {
        debug!(
            "Sina record for {} discarded: only {} fields",
            code,
            fields.len()
        );
        return None;
    };

    Some(normalize(Provider::Sina, market, &code, &fields))
}

/// # Summary
/// 解析新浪代码联想响应。
///
/// # Logic
/// 1. 截取 `suggestdata="...";` 之间的内容，按 `;` 切分记录。
/// 2. 每条记录按 `,` 切分：`[名称, 类型, 代码, 完整代码, 名称2, ...]`，不足 5 段丢弃。
/// 3. 类型 11/12/13 分别映射为 A 股/港股/美股。
/// 4. 优先使用完整代码，缺失时按 6 位代码首位推断交易所。
pub fn parse_suggest(body: &str) -> Vec<SearchHit> {
    let Some(start) = body.find(SUGGEST_MARKER) else {
        return Vec::new();
    };
    let rest = &body[start + SUGGEST_MARKER.len()..];
    let data = rest.split('"').next().unwrap_or("");

    data.split(';')
        .filter(|item| !item.is_empty())
        .filter_map(|item| {
            let parts: Vec<&str> = item.split(',').collect();
            if parts.len() < 5 {
                return None;
            }
            let market = match parts[1] {
                "11" => MarketClass::CnA,
                "12" => MarketClass::Hk,
                "13" => MarketClass::Us,
                _ => MarketClass::Other,
            };
            let code = parts[2].trim();
            let full_code = parts[3].trim();
            Some(SearchHit {
                name: parts[0].to_string(),
                code: derive_code(code, full_code),
                original_code: (!code.is_empty()).then(|| code.to_string()),
                full_code: (!full_code.is_empty()).then(|| full_code.to_string()),
                market,
                source: Provider::Sina.to_string(),
            })
        })
        .collect()
}

fn derive_code(code: &str, full_code: &str) -> String {
    if !full_code.is_empty() {
        return full_code.to_lowercase();
    }
    if code.len() == 6 {
        let exchange = match code.as_bytes().first() {
            Some(b'6') => Some("sh"),
            Some(b'0') | Some(b'3') => Some("sz"),
            Some(b'8') => Some("bj"),
            _ => None,
        };
        if let Some(exchange) = exchange {
            return format!("{}{}", exchange, code);
        }
    }
    code.to_string()
}

#[async_trait]
impl QuoteProvider for SinaProvider {
    fn provider(&self) -> Provider {
        Provider::Sina
    }

    /// # Summary
    /// 批量获取新浪实时报价。
    ///
    /// # Logic
    /// 1. 将代码转换为新浪格式并以逗号拼接。
    /// 2. 附带 Referer 与时间戳参数发起请求，按 GB18030 解码。
    /// 3. 解析后只保留请求过的代码。
    async fn fetch_quotes(&self, codes: &[String]) -> Result<HashMap<String, Quote>, MarketError> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let symbols: Vec<String> = codes.iter().map(|c| sina_symbol(c)).collect();
        let url = format!(
            "{}/rn={}&list={}",
            self.quote_url,
            self.clock.now().timestamp(),
            symbols.join(",")
        );
        let request = FetchRequest::new(url)
            .header("Referer", REFERER)
            .charset("gb18030");

        let body = self.transport.fetch_text(&request).await?;
        let wanted: HashSet<&str> = symbols.iter().map(String::as_str).collect();

        Ok(parse_quotes(&body)
            .into_iter()
            .filter(|(code, _)| wanted.contains(code.as_str()))
            .collect())
    }
}

#[async_trait]
impl SymbolSearch for SinaProvider {
    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, MarketError> {
        let url = format!(
            "{}/type=11,12,13&key={}&name=suggestdata",
            self.suggest_url,
            urlencoding::encode(keyword.trim())
        );
        let request = FetchRequest::new(url)
            .header("Referer", REFERER)
            .charset("gb18030");
        let body = self.transport.fetch_text(&request).await?;
        Ok(parse_suggest(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn us_line(code: &str, price: &str) -> String {
        let mut fields = vec![""; 30];
        fields[0] = "苹果";
        fields[1] = price;
        fields[3] = "2024-01-05 16:00:00";
        format!("var hq_str_{}=\"{}\";", code, fields.join(","))
    }

    fn cn_line(code: &str, name: &str, price: &str) -> String {
        let mut fields = vec!["0"; 33];
        fields[0] = name;
        fields[3] = price;
        fields[30] = "2024-01-05";
        fields[31] = "15:00:00";
        format!("var hq_str_{}=\"{}\";", code, fields.join(","))
    }

    #[test]
    fn test_symbol_rewrites_us_prefix() {
        assert_eq!(sina_symbol("usAAPL"), "gb_aapl");
        assert_eq!(sina_symbol("GB_AAPL"), "gb_aapl");
        assert_eq!(sina_symbol("SH600000"), "sh600000");
    }

    #[test]
    fn test_parse_batch_with_mixed_markets() {
        let body = format!(
            "{}\n{}\nvar hq_str_sz000002=\"\";\n",
            cn_line("sh600000", "浦发银行", "7.120"),
            us_line("gb_aapl", "185.92")
        );
        let quotes = parse_quotes(&body);

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["sh600000"].price, Some(dec!(7.120)));
        assert_eq!(quotes["sh600000"].date.as_deref(), Some("2024-01-05"));
        assert_eq!(quotes["gb_aapl"].price, Some(dec!(185.92)));
        assert_eq!(quotes["gb_aapl"].time.as_deref(), Some("16:00:00"));
    }

    #[test]
    fn test_non_numeric_price_keeps_identity() {
        let body = cn_line("SH600000", "浦发银行", "--");
        let quotes = parse_quotes(&body);
        let quote = &quotes["sh600000"];
        assert_eq!(quote.price, None);
        assert_eq!(quote.name, "浦发银行");
        assert_eq!(quote.code, "sh600000");
    }

    #[test]
    fn test_short_records_are_discarded_not_fatal() {
        let short_cn = "var hq_str_sh600001=\"a,b,c\";";
        let short_us = {
            let mut fields = vec!["1"; 29];
            fields[0] = "Short";
            format!("var hq_str_gb_xyz=\"{}\";", fields.join(","))
        };
        let body = format!(
            "{}\n{}\ngarbage line\n{}",
            short_cn,
            short_us,
            cn_line("sz000001", "平安银行", "9.41")
        );
        let quotes = parse_quotes(&body);
        assert_eq!(quotes.len(), 1);
        assert!(quotes.contains_key("sz000001"));
    }

    #[test]
    fn test_parse_suggest_records() {
        let body = "var suggestdata=\"平安银行,11,000001,sz000001,平安银行,,平安银行,99,1,ESG,,;\
                    腾讯控股,12,00700,,腾讯控股,,腾讯控股,99,1,,,;\
                    贵州茅台,11,600519,,贵州茅台;\
                    bad,11;\";";
        let hits = parse_suggest(body);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].code, "sz000001");
        assert_eq!(hits[0].market, MarketClass::CnA);
        assert_eq!(hits[0].full_code.as_deref(), Some("sz000001"));
        assert_eq!(hits[1].market, MarketClass::Hk);
        assert_eq!(hits[1].code, "00700");
        assert_eq!(hits[2].code, "sh600519");
        assert_eq!(hits[2].original_code.as_deref(), Some("600519"));
    }

    #[test]
    fn test_parse_suggest_without_marker() {
        assert!(parse_suggest("<html>blocked</html>").is_empty());
    }
}
