use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod decimal;
pub mod time;

/// # Summary
/// 行情粒度枚举，对应 CLI 可接受的 `minute`、`5min`…`60min`、`day`、`week`、`month`。
///
/// # Invariants
/// - 分钟级粒度由逐笔分时数据重采样得到，日/周/月由上游直接返回。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Granularity {
    // 分时（逐笔）
    Minute,
    // 5分钟
    Min5,
    // 10分钟
    Min10,
    // 15分钟
    Min15,
    // 30分钟
    Min30,
    // 60分钟
    Min60,
    // 日线
    Day,
    // 周线
    Week,
    // 月线
    Month,
}

impl Granularity {
    /// 全部可用粒度，按由细到粗排列。
    pub const ALL: [Granularity; 9] = [
        Granularity::Minute,
        Granularity::Min5,
        Granularity::Min10,
        Granularity::Min15,
        Granularity::Min30,
        Granularity::Min60,
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
    ];

    /// # Summary
    /// 重采样时每根 K 线覆盖的分钟数。
    ///
    /// # Returns
    /// 分钟级粒度返回桶宽，日/周/月返回 None。
    pub fn bucket_minutes(self) -> Option<u32> {
        match self {
            Granularity::Minute => Some(1),
            Granularity::Min5 => Some(5),
            Granularity::Min10 => Some(10),
            Granularity::Min15 => Some(15),
            Granularity::Min30 => Some(30),
            Granularity::Min60 => Some(60),
            Granularity::Day | Granularity::Week | Granularity::Month => None,
        }
    }

    /// # Summary
    /// 上游 K 线接口使用的周期参数。
    ///
    /// # Returns
    /// 仅日/周/月返回 `day`/`week`/`month`。
    pub fn kline_param(self) -> Option<&'static str> {
        match self {
            Granularity::Day => Some("day"),
            Granularity::Week => Some("week"),
            Granularity::Month => Some("month"),
            _ => None,
        }
    }

    /// # Summary
    /// 上游响应中承载该粒度 K 线的子集合名称。
    ///
    /// # Logic
    /// 优先读取前复权集合 (`qfqday` 等)，缺失时回退到同名的不复权集合。
    ///
    /// # Returns
    /// `(首选字段, 回退字段)`，分钟级粒度返回 None。
    pub fn bar_fields(self) -> Option<(&'static str, &'static str)> {
        match self {
            Granularity::Day => Some(("qfqday", "day")),
            Granularity::Week => Some(("qfqweek", "week")),
            Granularity::Month => Some(("qfqmonth", "month")),
            _ => None,
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" | "1min" => Ok(Granularity::Minute),
            "5min" => Ok(Granularity::Min5),
            "10min" => Ok(Granularity::Min10),
            "15min" => Ok(Granularity::Min15),
            "30min" => Ok(Granularity::Min30),
            "60min" => Ok(Granularity::Min60),
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            _ => Err(format!("Unknown Granularity: {}", s)),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            Granularity::Minute => "minute",
            Granularity::Min5 => "5min",
            Granularity::Min10 => "10min",
            Granularity::Min15 => "15min",
            Granularity::Min30 => "30min",
            Granularity::Min60 => "60min",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        };
        write!(f, "{}", token)
    }
}

/// # Summary
/// 市场分类，决定报价字段布局的选择。
///
/// # Invariants
/// - 仅由代码前缀推导，不依赖任何网络结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MarketClass {
    // 沪深北 A 股 (sh/sz/bj)
    CnA,
    // 港股 (hk)
    Hk,
    // 美股 (gb_/us)
    Us,
    // 无法识别的前缀
    Other,
}

impl MarketClass {
    /// # Summary
    /// 根据代码前缀判断市场分类。
    ///
    /// # Arguments
    /// * `code`: 任意大小写的证券代码。
    ///
    /// # Returns
    /// 对应的市场分类，未知前缀返回 `Other`。
    pub fn from_code(code: &str) -> Self {
        let lower = code.trim().to_lowercase();
        if lower.starts_with("sh") || lower.starts_with("sz") || lower.starts_with("bj") {
            MarketClass::CnA
        } else if lower.starts_with("hk") {
            MarketClass::Hk
        } else if lower.starts_with("gb_") || lower.starts_with("us") {
            MarketClass::Us
        } else {
            MarketClass::Other
        }
    }
}

/// # Summary
/// 实时报价数据源标签。
///
/// - `Sina`：逗号分隔的定位格式 (Provider A)。
/// - `Tencent`：波浪号分隔的定位格式 (Provider B)。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Sina,
    Tencent,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Sina => write!(f, "sina"),
            Provider::Tencent => write!(f, "tencent"),
        }
    }
}
