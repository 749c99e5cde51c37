use crate::aggregator::tail;
use hq_core::common::decimal::decimal_from_json;
use hq_core::market::entity::{Candle, CandleKey, RawBar};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

// [date, open, close, high, low, volume, amount?]
const MIN_BAR_FIELDS: usize = 6;

/// # Summary
/// 将上游已聚合的日/周/月 K 线整理为规范序列。
///
/// # Logic
/// 1. 逐条解析定位数组，字段数不足 6 的丢弃。
/// 2. 按日期升序稳定排序，上游顺序不可信。
/// 3. 同一日期只保留第一条，保证序列严格升序。
/// 4. 取尾部 `count` 条。
///
/// # Arguments
/// * `raw_bars`: 未排序的原始 K 线数组。
/// * `count`: 最多返回的条数。
///
/// # Returns
/// 按日期升序的 K 线序列。
pub fn passthrough(raw_bars: &[RawBar], count: usize) -> Vec<Candle> {
    let mut candles: Vec<Candle> = raw_bars.iter().filter_map(|bar| parse_bar(bar)).collect();
    candles.sort_by(|a, b| a.key.cmp(&b.key));
    candles.dedup_by(|later, earlier| later.key == earlier.key);
    tail(candles, count)
}

fn parse_bar(bar: &[Value]) -> Option<Candle> {
    if bar.len() < MIN_BAR_FIELDS {
        debug!("Dropping bar with {} fields", bar.len());
        return None;
    }
    let date = match &bar[0] {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        other => {
            debug!("Dropping bar with unusable date {}", other);
            return None;
        }
    };

    Some(Candle {
        key: CandleKey::Date(date),
        open: decimal_from_json(&bar[1]),
        close: decimal_from_json(&bar[2]),
        high: decimal_from_json(&bar[3]),
        low: decimal_from_json(&bar[4]),
        volume: decimal_from_json(&bar[5]).unwrap_or(Decimal::ZERO),
        amount: bar
            .get(6)
            .and_then(decimal_from_json)
            .unwrap_or(Decimal::ZERO),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn bars(value: Value) -> Vec<RawBar> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_unsorted_bars_come_back_ascending() {
        let raw = bars(json!([
            ["2024-01-03", 10, 11, 11.5, 9.5, 1000],
            ["2024-01-02", 9, 10, 10.2, 8.8, 900]
        ]));
        let candles = passthrough(&raw, 2);

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].label(), "2024-01-02");
        assert_eq!(candles[0].open, Some(dec!(9)));
        assert_eq!(candles[0].close, Some(dec!(10)));
        assert_eq!(candles[0].high, Some(dec!(10.2)));
        assert_eq!(candles[0].low, Some(dec!(8.8)));
        assert_eq!(candles[0].volume, dec!(900));
        assert_eq!(candles[0].amount, Decimal::ZERO);
        assert_eq!(candles[1].label(), "2024-01-03");
    }

    #[test]
    fn test_string_values_and_amount() {
        let raw = bars(json!([
            ["2024-01-05", "7.090", "7.120", "7.150", "7.050", "315434.000", "224618927.000"]
        ]));
        let candles = passthrough(&raw, 10);
        assert_eq!(candles[0].open, Some(dec!(7.090)));
        assert_eq!(candles[0].volume, dec!(315434.000));
        assert_eq!(candles[0].amount, dec!(224618927.000));
    }

    #[test]
    fn test_short_and_dateless_bars_are_dropped() {
        let raw = bars(json!([
            ["2024-01-02", 9, 10, 10.2, 8.8],
            [null, 9, 10, 10.2, 8.8, 900],
            ["2024-01-04", "-", 10, 10.2, 8.8, "x"]
        ]));
        let candles = passthrough(&raw, 10);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].label(), "2024-01-04");
        assert_eq!(candles[0].open, None);
        assert_eq!(candles[0].volume, Decimal::ZERO);
    }

    #[test]
    fn test_keeps_last_count_and_strict_order() {
        let raw = bars(json!([
            ["2024-01-05", 1, 1, 1, 1, 1],
            ["2024-01-02", 1, 1, 1, 1, 1],
            ["2024-01-04", 1, 1, 1, 1, 1],
            ["2024-01-03", 2, 2, 2, 2, 2],
            ["2024-01-03", 3, 3, 3, 3, 3]
        ]));
        let candles = passthrough(&raw, 3);
        let labels: Vec<&str> = candles.iter().map(Candle::label).collect();
        assert_eq!(labels, vec!["2024-01-03", "2024-01-04", "2024-01-05"]);
        assert_eq!(candles[0].open, Some(dec!(2)));
        assert!(passthrough(&raw, 0).is_empty());
        assert!(passthrough(&[], 5).is_empty());
    }
}
