use crate::common::{MarketClass, Provider};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// # Summary
/// 单笔分时成交记录。
///
/// # Invariants
/// - `time` 恒为 `HH:MM` 形式的交易日本地时间，不含日期。
/// - `price` 无法解析时为 None；`volume`/`amount` 缺失时记为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    // 成交时间 (HH:MM)
    pub time: String,
    // 成交价
    pub price: Option<Decimal>,
    // 成交量
    pub volume: Decimal,
    // 成交额
    pub amount: Decimal,
}

/// # Summary
/// K 线的排序键：分钟级 K 线使用桶内首笔成交时间，日/周/月使用上游日期。
///
/// 序列化时展开为 `"time"` 或 `"date"` 字段。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleKey {
    Time(String),
    Date(String),
}

impl CandleKey {
    /// 返回键的原始文本。
    pub fn as_str(&self) -> &str {
        match self {
            CandleKey::Time(s) | CandleKey::Date(s) => s,
        }
    }
}

/// # Summary
/// 单根 OHLCV K 线。
///
/// # Invariants
/// - 四价齐全时满足 `low <= open, close <= high`。
/// - `volume`/`amount` 为非负累加值。
/// - 任何 K 线序列都按 `key` 严格升序排列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(flatten)]
    pub key: CandleKey,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Decimal,
    pub amount: Decimal,
}

impl Candle {
    /// K 线的时间或日期标签。
    pub fn label(&self) -> &str {
        self.key.as_str()
    }
}

/// # Summary
/// 单只证券的实时报价快照。
///
/// # Invariants
/// - `code` 恒为小写规范代码 (如 `sh600000`、`hk00700`、`gb_aapl`)。
/// - 无法解码的字段为 None，绝不以 0 代替。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub name: String,
    pub price: Option<Decimal>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub pre_close: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub time: Option<String>,
    // 涨跌额，仅部分布局提供
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,
    // 涨跌幅 (%)，仅部分布局提供
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,
    // 买一价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<Decimal>,
    // 卖一价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<Decimal>,
    pub source: Provider,
}

impl Quote {
    /// # Summary
    /// 创建一条仅含身份信息的空报价。
    ///
    /// # Logic
    /// 代码统一转为小写，其余数值字段全部置为 None，由布局表逐项填充。
    pub fn new(code: &str, name: &str, source: Provider) -> Self {
        Self {
            code: code.to_lowercase(),
            name: name.to_string(),
            price: None,
            open: None,
            high: None,
            low: None,
            pre_close: None,
            volume: None,
            amount: None,
            date: None,
            time: None,
            change: None,
            change_percent: None,
            bid: None,
            ask: None,
            source,
        }
    }
}

/// # Summary
/// 单个交易日的分时序列。
///
/// # Invariants
/// - `data` 保持上游交付顺序，即时间升序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteSeries {
    pub code: String,
    // 交易日期，上游原样返回 (如 `20240105`)
    pub date: String,
    pub data: Vec<Tick>,
}

impl MinuteSeries {
    /// 无数据时的空序列。
    pub fn empty(code: &str) -> Self {
        Self {
            code: code.to_string(),
            date: String::new(),
            data: Vec::new(),
        }
    }

    /// # Summary
    /// 仅保留最近 `recent` 笔成交。
    ///
    /// # Logic
    /// 解码完成后截取尾部切片；序列更短时原样返回。
    pub fn tail(mut self, recent: usize) -> Self {
        let skip = self.data.len().saturating_sub(recent);
        self.data.drain(..skip);
        self
    }
}

/// # Summary
/// 多粒度汇总，任意子项失败时该键为空集合。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    pub code: String,
    pub day: Vec<Candle>,
    pub week: Vec<Candle>,
    pub minute5: Vec<Candle>,
    pub tick: MinuteSeries,
}

/// # Summary
/// 代码搜索结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    // 规范代码
    pub code: String,
    // 上游返回的裸代码 (如 `000001`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_code: Option<String>,
    pub market: MarketClass,
    pub source: String,
}

/// 上游日/周/月 K 线的原始定位数组：`[date, open, close, high, low, volume, amount?]`。
pub type RawBar = Vec<serde_json::Value>;
