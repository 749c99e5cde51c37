use crate::cli::Format;
use hq_core::market::entity::{Candle, MinuteSeries, Quote, SearchHit, StockSummary};
use hq_market::service::Kline;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

const ABSENT: &str = "-";

/// 终端输出：JSON 为美化格式，文本为逐行摘要。
pub trait Render: Serialize {
    fn text(&self) -> String;

    fn render(&self, format: Format) -> anyhow::Result<String> {
        match format {
            Format::Json => Ok(serde_json::to_string_pretty(self)?),
            Format::Text => Ok(self.text()),
        }
    }
}

fn num(value: Option<Decimal>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |d| d.normalize().to_string())
}

fn candle_line(c: &Candle) -> String {
    format!(
        "{}  O {}  H {}  L {}  C {}  V {}  A {}",
        c.label(),
        num(c.open),
        num(c.high),
        num(c.low),
        num(c.close),
        c.volume.normalize(),
        c.amount.normalize()
    )
}

fn candles_text(candles: &[Candle]) -> String {
    if candles.is_empty() {
        return "无数据".to_string();
    }
    candles.iter().map(candle_line).collect::<Vec<_>>().join("\n")
}

fn ticks_text(series: &MinuteSeries) -> String {
    if series.data.is_empty() {
        return format!("{} 无分时数据", series.code);
    }
    let mut out = format!("{} {} 共 {} 笔", series.code, series.date, series.data.len());
    for t in &series.data {
        out.push_str(&format!(
            "\n{}  {}  {}  {}",
            t.time,
            num(t.price),
            t.volume.normalize(),
            t.amount.normalize()
        ));
    }
    out
}

impl Render for BTreeMap<String, Quote> {
    fn text(&self) -> String {
        if self.is_empty() {
            return "无数据".to_string();
        }
        self.values()
            .map(|q| {
                format!(
                    "{} {}  现价 {}  开 {}  高 {}  低 {}  昨收 {}  量 {}  {} {}  [{}]",
                    q.code,
                    q.name,
                    num(q.price),
                    num(q.open),
                    num(q.high),
                    num(q.low),
                    num(q.pre_close),
                    num(q.volume),
                    q.date.as_deref().unwrap_or(ABSENT),
                    q.time.as_deref().unwrap_or(ABSENT),
                    q.source
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Render for Kline {
    fn text(&self) -> String {
        match self {
            Kline::Ticks(series) => ticks_text(series),
            Kline::Candles(candles) => candles_text(candles),
        }
    }
}

impl Render for StockSummary {
    fn text(&self) -> String {
        format!(
            "{}\n\n[日线]\n{}\n\n[周线]\n{}\n\n[5分钟]\n{}\n\n[分时]\n{}",
            self.code,
            candles_text(&self.day),
            candles_text(&self.week),
            candles_text(&self.minute5),
            ticks_text(&self.tick)
        )
    }
}

impl Render for Option<Candle> {
    fn text(&self) -> String {
        match self {
            Some(c) => candle_line(c),
            None => "无数据".to_string(),
        }
    }
}

impl Render for Vec<SearchHit> {
    fn text(&self) -> String {
        if self.is_empty() {
            return "未找到匹配的证券".to_string();
        }
        self.iter()
            .enumerate()
            .map(|(i, h)| format!("{}. {} ({})  [{}]", i + 1, h.name, h.code, h.source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
