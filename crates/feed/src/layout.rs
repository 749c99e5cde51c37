use hq_core::common::decimal::parse_optional_decimal;
use hq_core::common::{MarketClass, Provider};
use hq_core::market::entity::Quote;
use rust_decimal::Decimal;

/// # Summary
/// 某一数据源/市场分类的报价字段定位表。
///
/// # Invariants
/// - 每个索引都指向上游分隔后的字段数组；越界或空字段一律视为缺失。
/// - `id` 带版本号，上游调整字段顺序时新增一张表而不是修改旧表。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteLayout {
    pub id: &'static str,
    pub source: Provider,
    // 低于该字段数的记录直接丢弃
    pub min_fields: usize,
    pub name: usize,
    pub price: Option<usize>,
    pub open: Option<usize>,
    pub high: Option<usize>,
    pub low: Option<usize>,
    pub pre_close: Option<usize>,
    pub volume: Option<usize>,
    pub amount: Option<usize>,
    pub change: Option<usize>,
    pub change_percent: Option<usize>,
    pub bid: Option<usize>,
    pub ask: Option<usize>,
    pub date: Option<usize>,
    pub time: Option<usize>,
    // 日期与时间合并在同一字段时使用，优先级高于 `date`/`time`
    pub datetime: Option<usize>,
}

/// 新浪 A 股：`名称,今开,昨收,现价,最高,最低,买一,卖一,成交量,成交额,...,日期(30),时间(31)`。
pub const SINA_CN_V1: QuoteLayout = QuoteLayout {
    id: "sina-cn/v1",
    source: Provider::Sina,
    min_fields: 32,
    name: 0,
    open: Some(1),
    pre_close: Some(2),
    price: Some(3),
    high: Some(4),
    low: Some(5),
    bid: Some(6),
    ask: Some(7),
    volume: Some(8),
    amount: Some(9),
    change: None,
    change_percent: None,
    date: Some(30),
    time: Some(31),
    datetime: None,
};

/// 新浪美股：`名称,现价,涨跌幅,日期时间,涨跌额,今开,...,最高(8),最低(9),成交量(10),...,昨收(26)`。
pub const SINA_US_V1: QuoteLayout = QuoteLayout {
    id: "sina-us/v1",
    source: Provider::Sina,
    min_fields: 30,
    name: 0,
    price: Some(1),
    change_percent: Some(2),
    datetime: Some(3),
    change: Some(4),
    open: Some(5),
    high: Some(8),
    low: Some(9),
    volume: Some(10),
    pre_close: Some(26),
    amount: None,
    bid: None,
    ask: None,
    date: None,
    time: None,
};

/// 腾讯港股/A 股：`市场~名称~代码~现价~昨收~今开~成交量~...~日期时间(30)~...~最高(33)~最低(34)`。
pub const TENCENT_V1: QuoteLayout = QuoteLayout {
    id: "tencent/v1",
    source: Provider::Tencent,
    min_fields: 35,
    name: 1,
    price: Some(3),
    pre_close: Some(4),
    open: Some(5),
    volume: Some(6),
    datetime: Some(30),
    high: Some(33),
    low: Some(34),
    amount: None,
    change: None,
    change_percent: None,
    bid: None,
    ask: None,
    date: None,
    time: None,
};

/// # Summary
/// 按数据源与市场分类选择布局表。
pub fn layout_for(provider: Provider, market: MarketClass) -> &'static QuoteLayout {
    match (provider, market) {
        (Provider::Sina, MarketClass::Us) => &SINA_US_V1,
        (Provider::Sina, _) => &SINA_CN_V1,
        (Provider::Tencent, _) => &TENCENT_V1,
    }
}

/// # Summary
/// 将已分隔的字段数组映射为规范 `Quote`。
///
/// # Logic
/// 1. 按 `(provider, market)` 选择布局表。
/// 2. 逐字段解码，单个字段失败只令该字段缺失。
///
/// # Arguments
/// * `provider`: 数据源。
/// * `market`: 市场分类。
/// * `code`: 解析器恢复出的代码，输出时统一小写。
/// * `fields`: 上游字段数组。
///
/// # Returns
/// 规范报价。
pub fn normalize(provider: Provider, market: MarketClass, code: &str, fields: &[&str]) -> Quote {
    layout_for(provider, market).apply(code, fields)
}

impl QuoteLayout {
    /// 按本表的定位把字段数组映射为 `Quote`。
    pub fn apply(&self, code: &str, fields: &[&str]) -> Quote {
        let mut quote = Quote::new(code, field(fields, Some(self.name)).unwrap_or(""), self.source);
        quote.price = number(fields, self.price);
        quote.open = number(fields, self.open);
        quote.high = number(fields, self.high);
        quote.low = number(fields, self.low);
        quote.pre_close = number(fields, self.pre_close);
        quote.volume = number(fields, self.volume);
        quote.amount = number(fields, self.amount);
        quote.change = number(fields, self.change);
        quote.change_percent = number(fields, self.change_percent);
        quote.bid = number(fields, self.bid);
        quote.ask = number(fields, self.ask);
        quote.date = field(fields, self.date).map(|d| d.replace('/', "-"));
        quote.time = field(fields, self.time).map(str::to_string);

        if let Some((date, time)) = field(fields, self.datetime).and_then(split_datetime) {
            quote.date = Some(date);
            quote.time = Some(time);
        }
        quote
    }
}

fn field<'a>(fields: &[&'a str], idx: Option<usize>) -> Option<&'a str> {
    let raw: &'a str = *fields.get(idx?)?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn number(fields: &[&str], idx: Option<usize>) -> Option<Decimal> {
    field(fields, idx).and_then(parse_optional_decimal)
}

/// # Summary
/// 拆分上游的合并日期时间字段。
///
/// # Logic
/// - `YYYYMMDDHHMMSS` → (`YYYY-MM-DD`, `HH:MM:SS`)。
/// - `YYYY/MM/DD HH:MM:SS` 或 `YYYY-MM-DD HH:MM:SS` → 以空格切分，日期中的 `/` 替换为 `-`。
fn split_datetime(raw: &str) -> Option<(String, String)> {
    if raw.len() == 14 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return Some((
            format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8]),
            format!("{}:{}:{}", &raw[8..10], &raw[10..12], &raw[12..14]),
        ));
    }
    let (date, time) = raw.split_once(' ')?;
    Some((date.trim().replace('/', "-"), time.trim().to_string()))
}
