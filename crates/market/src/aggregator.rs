use hq_core::market::entity::{Candle, CandleKey, Tick};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::debug;

/// 交易时段起点 09:30，分桶的零点。
const SESSION_OPEN_HOUR: i64 = 9;
const SESSION_OPEN_MINUTE: i64 = 30;

/// # Summary
/// 单个时间桶的累加器。
///
/// # Invariants
/// - `label` 取自桶内第一笔成交，之后不再修改。
/// - `open` 在创建时取自桶内第一笔成交，该笔无价格时保持缺失。
/// - `close` 随每笔有价成交覆盖；无价格的成交不影响高低收，只累加成交量与成交额。
#[derive(Debug, Clone)]
struct BucketAccumulator {
    label: String,
    open: Option<Decimal>,
    high: Option<Decimal>,
    low: Option<Decimal>,
    close: Option<Decimal>,
    volume: Decimal,
    amount: Decimal,
}

impl BucketAccumulator {
    fn start(tick: &Tick) -> Self {
        let mut bucket = Self {
            label: tick.time.clone(),
            open: tick.price,
            high: None,
            low: None,
            close: None,
            volume: Decimal::ZERO,
            amount: Decimal::ZERO,
        };
        bucket.push(tick);
        bucket
    }

    fn push(&mut self, tick: &Tick) {
        if let Some(price) = tick.price {
            self.high = Some(self.high.map_or(price, |h| h.max(price)));
            self.low = Some(self.low.map_or(price, |l| l.min(price)));
            self.close = Some(price);
        }
        self.volume += tick.volume;
        self.amount += tick.amount;
    }

    fn finish(self) -> Candle {
        Candle {
            key: CandleKey::Time(self.label),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            amount: self.amount,
        }
    }
}

/// # Summary
/// 将分时成交序列重采样为固定宽度的分钟 K 线。
///
/// # Invariants
/// - 桶宽恒大于 0。
/// - 输入必须按时间升序，因为开盘价与收盘价取决于桶内成交的先后。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleAggregator {
    bucket_minutes: u32,
}

impl CandleAggregator {
    /// # Summary
    /// 创建聚合器。
    ///
    /// # Returns
    /// 桶宽为 0 时返回 None。
    pub fn new(bucket_minutes: u32) -> Option<Self> {
        (bucket_minutes > 0).then_some(Self { bucket_minutes })
    }

    pub fn bucket_minutes(&self) -> u32 {
        self.bucket_minutes
    }

    /// # Summary
    /// 产出最近 `count` 根完整 K 线所需抓取的分时条数。
    ///
    /// # Logic
    /// `count × 桶宽` 之外再多取一个桶宽，保证最早那根 K 线的桶是完整的。
    pub fn ticks_needed(&self, count: usize) -> usize {
        let width = usize::try_from(self.bucket_minutes).unwrap_or(usize::MAX);
        count.saturating_mul(width).saturating_add(width)
    }

    /// # Summary
    /// 单次线性扫描完成重采样。
    ///
    /// # Logic
    /// 1. 以 09:30 为零点计算每笔成交的分钟偏移，偏移为负（盘前）的成交丢弃。
    /// 2. 桶序号 = 偏移 / 桶宽（向下取整）。
    /// 3. 首次遇到的桶惰性创建累加器，后续成交依次累加。
    /// 4. 按桶序号升序输出。
    ///
    /// # Arguments
    /// * `ticks`: 按时间升序的分时成交。
    ///
    /// # Returns
    /// 按时间升序的 K 线序列；空输入返回空序列。
    pub fn aggregate(&self, ticks: &[Tick]) -> Vec<Candle> {
        let width = i64::from(self.bucket_minutes);
        let mut buckets: BTreeMap<i64, BucketAccumulator> = BTreeMap::new();

        for tick in ticks {
            let Some(offset) = session_offset(&tick.time) else {
                debug!("Skipping tick with malformed time {:?}", tick.time);
                continue;
            };
            if offset < 0 {
                continue;
            }

            match buckets.entry(offset / width) {
                Entry::Vacant(slot) => {
                    slot.insert(BucketAccumulator::start(tick));
                }
                Entry::Occupied(mut slot) => slot.get_mut().push(tick),
            }
        }

        buckets.into_values().map(BucketAccumulator::finish).collect()
    }

    /// # Summary
    /// 完整重采样后再截取最近 `count` 根。
    ///
    /// # Logic
    /// 截取必须在全部成交扫描完之后进行，桶只有在看完所有成交后才算完整。
    pub fn last(&self, ticks: &[Tick], count: usize) -> Vec<Candle> {
        tail(self.aggregate(ticks), count)
    }
}

/// 保留序列尾部的 `count` 个元素。
pub(crate) fn tail<T>(mut items: Vec<T>, count: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(count);
    items.drain(..skip);
    items
}

/// `HH:MM` 距 09:30 的分钟偏移；格式不合法时返回 None。
fn session_offset(time: &str) -> Option<i64> {
    let (hour, minute) = time.split_once(':')?;
    let hour: i64 = hour.trim().parse().ok()?;
    let minute: i64 = minute.trim().parse().ok()?;
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return None;
    }
    Some((hour - SESSION_OPEN_HOUR) * 60 + (minute - SESSION_OPEN_MINUTE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tick(time: &str, price: Option<Decimal>, volume: Decimal, amount: Decimal) -> Tick {
        Tick {
            time: time.to_string(),
            price,
            volume,
            amount,
        }
    }

    fn five() -> CandleAggregator {
        CandleAggregator::new(5).unwrap()
    }

    #[test]
    fn test_two_bucket_example() {
        let ticks = vec![
            tick("09:30", Some(dec!(10.0)), dec!(100), Decimal::ZERO),
            tick("09:32", Some(dec!(10.5)), dec!(50), Decimal::ZERO),
            tick("09:36", Some(dec!(10.2)), dec!(80), Decimal::ZERO),
        ];
        let candles = five().aggregate(&ticks);

        assert_eq!(candles.len(), 2);
        assert_eq!(
            candles[0],
            Candle {
                key: CandleKey::Time("09:30".into()),
                open: Some(dec!(10.0)),
                high: Some(dec!(10.5)),
                low: Some(dec!(10.0)),
                close: Some(dec!(10.5)),
                volume: dec!(150),
                amount: Decimal::ZERO,
            }
        );
        assert_eq!(
            candles[1],
            Candle {
                key: CandleKey::Time("09:36".into()),
                open: Some(dec!(10.2)),
                high: Some(dec!(10.2)),
                low: Some(dec!(10.2)),
                close: Some(dec!(10.2)),
                volume: dec!(80),
                amount: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(five().aggregate(&[]).is_empty());
        assert!(CandleAggregator::new(0).is_none());
    }

    #[test]
    fn test_pre_open_ticks_are_dropped() {
        let ticks = vec![
            tick("09:25", Some(dec!(9.9)), dec!(500), dec!(4950)),
            tick("09:30", Some(dec!(10.0)), dec!(100), dec!(1000)),
        ];
        let candles = five().aggregate(&ticks);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, Some(dec!(10.0)));
        assert_eq!(candles[0].volume, dec!(100));
        assert_eq!(candles[0].amount, dec!(1000));
    }

    #[test]
    fn test_conservation_open_close_and_bounds() {
        let prices = [
            dec!(10.00),
            dec!(10.20),
            dec!(9.80),
            dec!(10.05),
            dec!(10.40),
            dec!(10.10),
            dec!(9.95),
        ];
        let times = ["09:30", "09:31", "09:33", "09:34", "09:41", "09:44", "10:02"];
        let ticks: Vec<Tick> = times
            .iter()
            .zip(prices.iter())
            .enumerate()
            .map(|(i, (t, p))| {
                let volume = Decimal::from(i + 1) * dec!(10);
                tick(t, Some(*p), volume, volume * *p)
            })
            .collect();

        let aggregator = CandleAggregator::new(10).unwrap();
        let candles = aggregator.aggregate(&ticks);

        let vol_in: Decimal = ticks.iter().map(|t| t.volume).sum();
        let vol_out: Decimal = candles.iter().map(|c| c.volume).sum();
        let amt_in: Decimal = ticks.iter().map(|t| t.amount).sum();
        let amt_out: Decimal = candles.iter().map(|c| c.amount).sum();
        assert_eq!(vol_in, vol_out);
        assert_eq!(amt_in, amt_out);

        // 09:30-09:39 / 09:40-09:49 / 10:00-10:09
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].open, Some(dec!(10.00)));
        assert_eq!(candles[0].close, Some(dec!(10.05)));
        assert_eq!(candles[0].high, Some(dec!(10.20)));
        assert_eq!(candles[0].low, Some(dec!(9.80)));
        assert_eq!(candles[1].label(), "09:41");
        assert_eq!(candles[1].close, Some(dec!(10.10)));
        assert_eq!(candles[2].label(), "10:02");

        for candle in &candles {
            let o = candle.open.unwrap();
            let h = candle.high.unwrap();
            let l = candle.low.unwrap();
            let c = candle.close.unwrap();
            assert!(l <= o && o <= h);
            assert!(l <= c && c <= h);
        }
    }

    #[test]
    fn test_missing_prices_only_contribute_volume() {
        let ticks = vec![
            tick("09:30", Some(dec!(9.8)), dec!(5), dec!(1)),
            tick("09:31", None, dec!(10), Decimal::ZERO),
            tick("09:32", Some(dec!(10.0)), dec!(7), Decimal::ZERO),
            tick("09:33", None, dec!(0), Decimal::ZERO),
        ];
        let candles = five().aggregate(&ticks);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, Some(dec!(9.8)));
        assert_eq!(candles[0].high, Some(dec!(10.0)));
        assert_eq!(candles[0].low, Some(dec!(9.8)));
        assert_eq!(candles[0].close, Some(dec!(10.0)));
        assert_eq!(candles[0].volume, dec!(22));
        assert_eq!(candles[0].amount, dec!(1));
    }

    #[test]
    fn test_unpriced_first_tick_leaves_open_absent() {
        let ticks = vec![
            tick("09:30", None, dec!(5), dec!(1)),
            tick("09:31", Some(dec!(10.0)), dec!(10), Decimal::ZERO),
            tick("09:32", None, dec!(7), Decimal::ZERO),
        ];
        let candles = five().aggregate(&ticks);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].label(), "09:30");
        assert_eq!(candles[0].open, None);
        assert_eq!(candles[0].high, Some(dec!(10.0)));
        assert_eq!(candles[0].low, Some(dec!(10.0)));
        assert_eq!(candles[0].close, Some(dec!(10.0)));
        assert_eq!(candles[0].volume, dec!(22));
        assert_eq!(candles[0].amount, dec!(1));
    }

    #[test]
    fn test_zero_price_is_a_real_price() {
        let ticks = vec![
            tick("09:30", Some(dec!(1.0)), Decimal::ZERO, Decimal::ZERO),
            tick("09:31", Some(Decimal::ZERO), Decimal::ZERO, Decimal::ZERO),
        ];
        let candles = five().aggregate(&ticks);
        assert_eq!(candles[0].low, Some(Decimal::ZERO));
        assert_eq!(candles[0].close, Some(Decimal::ZERO));
    }

    #[test]
    fn test_reaggregating_flattened_candles_is_idempotent() {
        let ticks = vec![
            tick("09:30", Some(dec!(10.0)), dec!(100), dec!(1000)),
            tick("09:31", Some(dec!(10.6)), dec!(40), dec!(424)),
            tick("09:33", Some(dec!(9.7)), dec!(60), dec!(582)),
            tick("09:34", Some(dec!(10.1)), dec!(30), dec!(303)),
            tick("09:37", Some(dec!(10.3)), dec!(80), dec!(824)),
        ];
        let aggregator = five();
        let first = aggregator.aggregate(&ticks);

        let flattened: Vec<Tick> = first
            .iter()
            .flat_map(|c| {
                let t = c.label();
                vec![
                    tick(t, c.open, c.volume, c.amount),
                    tick(t, c.high, Decimal::ZERO, Decimal::ZERO),
                    tick(t, c.low, Decimal::ZERO, Decimal::ZERO),
                    tick(t, c.close, Decimal::ZERO, Decimal::ZERO),
                ]
            })
            .collect();

        assert_eq!(aggregator.aggregate(&flattened), first);
        assert_eq!(aggregator.aggregate(&ticks), first);
    }

    #[test]
    fn test_last_keeps_tail_after_full_pass() {
        let ticks: Vec<Tick> = (0..30)
            .map(|m| {
                let time = format!("{:02}:{:02}", 9 + (30 + m) / 60, (30 + m) % 60);
                tick(&time, Some(dec!(10)), dec!(1), Decimal::ZERO)
            })
            .collect();
        let candles = five().last(&ticks, 2);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].label(), "09:50");
        assert_eq!(candles[1].label(), "09:55");
        assert_eq!(candles[1].volume, dec!(5));
        assert_eq!(five().last(&ticks, 100).len(), 6);
    }

    #[test]
    fn test_ticks_needed_adds_one_bucket_of_slack() {
        assert_eq!(five().ticks_needed(48), 245);
        assert_eq!(CandleAggregator::new(60).unwrap().ticks_needed(4), 300);
    }

    #[test]
    fn test_session_offset() {
        assert_eq!(session_offset("09:30"), Some(0));
        assert_eq!(session_offset("09:29"), Some(-1));
        assert_eq!(session_offset("13:00"), Some(210));
        assert_eq!(session_offset("25:00"), None);
        assert_eq!(session_offset("0930"), None);
    }
}
