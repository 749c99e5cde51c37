use crate::aggregator::CandleAggregator;
use crate::catalog::search_hot;
use crate::passthrough::passthrough;
use crate::router::route;
use futures::future::join_all;
use hq_core::common::{Granularity, Provider};
use hq_core::config::QueryConfig;
use hq_core::market::entity::{Candle, MinuteSeries, Quote, SearchHit, StockSummary};
use hq_core::market::error::MarketError;
use hq_core::market::port::{KlineProvider, QuoteProvider, SymbolSearch};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// # Summary
/// `kline` 查询的结果：`minute` 粒度返回原始分时，其余返回 K 线。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Kline {
    Ticks(MinuteSeries),
    Candles(Vec<Candle>),
}

/// # Summary
/// 行情查询门面，组合路由、重采样与透传。
///
/// # Invariants
/// - 所有公开方法都不会返回错误：上游失败一律降级为空结果或部分结果并记录日志。
/// - 不持有任何跨请求的可变状态。
pub struct MarketService {
    quote_providers: HashMap<Provider, Arc<dyn QuoteProvider>>,
    kline: Arc<dyn KlineProvider>,
    search: Arc<dyn SymbolSearch>,
    query: QueryConfig,
}

impl MarketService {
    /// # Summary
    /// 创建服务实例。
    ///
    /// # Arguments
    /// * `quote_providers`: 实时报价提供者，按各自的 `provider()` 标签登记；同一标签后者覆盖前者。
    /// * `kline`: 分时与 K 线提供者。
    /// * `search`: 代码联想提供者。
    /// * `query`: 查询默认值。
    pub fn new(
        quote_providers: Vec<Arc<dyn QuoteProvider>>,
        kline: Arc<dyn KlineProvider>,
        search: Arc<dyn SymbolSearch>,
        query: QueryConfig,
    ) -> Self {
        let quote_providers = quote_providers
            .into_iter()
            .map(|p| (p.provider(), p))
            .collect();
        Self {
            quote_providers,
            kline,
            search,
            query,
        }
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query
    }

    /// # Summary
    /// 批量获取实时报价。
    ///
    /// # Logic
    /// 1. 逐个路由，得到去重后的规范代码，并按首选数据源分组。
    /// 2. 各数据源分组并发请求，结果按代码合并。
    /// 3. 腾讯未应答的代码再交给新浪补查一次。
    ///
    /// # Returns
    /// 以规范代码为键的报价；只包含请求过且成功解析的代码。
    pub async fn quotes(&self, codes: &[String]) -> BTreeMap<String, Quote> {
        let mut seen = HashSet::new();
        let mut tencent_codes = Vec::new();
        let mut sina_codes = Vec::new();
        for r in codes.iter().map(|c| route(c)) {
            if r.code.is_empty() || !seen.insert(r.code.clone()) {
                continue;
            }
            match r.quote_provider {
                Provider::Tencent => tencent_codes.push(r.code),
                Provider::Sina => sina_codes.push(r.code),
            }
        }

        let groups = [
            (Provider::Tencent, tencent_codes.as_slice()),
            (Provider::Sina, sina_codes.as_slice()),
        ];
        let batches = join_all(
            groups
                .iter()
                .map(|(provider, codes)| self.fetch_from(*provider, codes)),
        )
        .await;

        let mut result: BTreeMap<String, Quote> = batches.into_iter().flatten().collect();

        let missing: Vec<String> = tencent_codes
            .into_iter()
            .filter(|c| !result.contains_key(c))
            .collect();
        if !missing.is_empty() {
            debug!("Falling back to sina for {:?}", missing);
            result.extend(self.fetch_from(Provider::Sina, &missing).await);
        }

        info!(
            "Quotes resolved {} of {} requested codes",
            result.len(),
            seen.len()
        );
        result
    }

    /// 单个代码的实时报价。
    pub async fn quote(&self, code: &str) -> Option<Quote> {
        let code = route(code).code;
        self.quotes(std::slice::from_ref(&code)).await.remove(&code)
    }

    async fn fetch_from(&self, provider: Provider, codes: &[String]) -> HashMap<String, Quote> {
        if codes.is_empty() {
            return HashMap::new();
        }
        let Some(source) = self.quote_providers.get(&provider) else {
            debug!("No {} quote provider configured", provider);
            return HashMap::new();
        };
        match source.fetch_quotes(codes).await {
            Ok(quotes) => quotes,
            Err(e) => {
                log_degraded(&format!("{} quotes", provider), &codes.join(","), &e);
                HashMap::new()
            }
        }
    }

    /// # Summary
    /// 获取当日分时序列。
    ///
    /// # Arguments
    /// * `code`: 任意大小写的代码。
    /// * `recent`: 只保留最近多少笔；None 表示全部。
    pub async fn minute(&self, code: &str, recent: Option<usize>) -> MinuteSeries {
        let code = route(code).code;
        let series = match self.kline.fetch_minute(&code).await {
            Ok(series) => series,
            Err(e) => {
                log_degraded("minute", &code, &e);
                return MinuteSeries::empty(&code);
            }
        };
        match recent {
            Some(n) => series.tail(n),
            None => series,
        }
    }

    /// # Summary
    /// 获取指定粒度的最近 `count` 根 K 线。
    ///
    /// # Logic
    /// - 分钟级：取 `count × 桶宽 + 桶宽` 笔分时，重采样后截取尾部 `count` 根。
    /// - 日/周/月：读取上游 K 线，排序去重后截取尾部 `count` 根。
    pub async fn candles(&self, code: &str, granularity: Granularity, count: usize) -> Vec<Candle> {
        let code = route(code).code;
        if let Some(width) = granularity.bucket_minutes() {
            let Some(aggregator) = CandleAggregator::new(width) else {
                return Vec::new();
            };
            let series = self
                .minute(&code, Some(aggregator.ticks_needed(count)))
                .await;
            return aggregator.last(&series.data, count);
        }

        match self.kline.fetch_bars(&code, granularity, count).await {
            Ok(bars) => passthrough(&bars, count),
            Err(e) => {
                log_degraded(&format!("{} bars", granularity), &code, &e);
                Vec::new()
            }
        }
    }

    /// # Summary
    /// CLI `kline` 子命令入口：`minute` 返回原始分时，其余返回 K 线。
    pub async fn kline(&self, code: &str, granularity: Granularity, count: usize) -> Kline {
        match granularity {
            Granularity::Minute => Kline::Ticks(self.minute(code, Some(count)).await),
            _ => Kline::Candles(self.candles(code, granularity, count).await),
        }
    }

    /// # Summary
    /// 多粒度汇总：日线、周线、5 分钟线与当日完整分时。
    ///
    /// # Logic
    /// 四个子查询并发执行，互不依赖；任一失败只令对应字段为空。
    pub async fn summarize(&self, code: &str) -> StockSummary {
        let code = route(code).code;
        let (day, week, minute5, tick) = tokio::join!(
            self.candles(&code, Granularity::Day, self.query.summary_day_count),
            self.candles(&code, Granularity::Week, self.query.summary_week_count),
            self.candles(&code, Granularity::Min5, self.query.summary_minute5_count),
            self.minute(&code, None)
        );
        StockSummary {
            code,
            day,
            week,
            minute5,
            tick,
        }
    }

    /// 最近一根日线，无数据时为 None。
    pub async fn latest_bar(&self, code: &str) -> Option<Candle> {
        self.candles(code, Granularity::Day, 1).await.pop()
    }

    /// # Summary
    /// 按名称或代码搜索证券。
    ///
    /// # Logic
    /// 1. 联想接口结果在前，失败时视为空。
    /// 2. `include_hot` 时追加内置常用表的匹配，已出现的代码不重复。
    /// 3. 整体截断为 `limit` 条。
    pub async fn search(&self, keyword: &str, limit: usize, include_hot: bool) -> Vec<SearchHit> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Vec::new();
        }

        let mut hits = match self.search.search(keyword).await {
            Ok(hits) => hits,
            Err(e) => {
                log_degraded("search", keyword, &e);
                Vec::new()
            }
        };

        if include_hot {
            let known: HashSet<String> = hits.iter().map(|h| h.code.clone()).collect();
            hits.extend(
                search_hot(keyword, limit)
                    .into_iter()
                    .filter(|h| !known.contains(&h.code)),
            );
        }
        hits.truncate(limit);
        hits
    }
}

/// # Summary
/// 将上游失败降级为空结果前记录日志。
///
/// # Logic
/// 不同失败模式使用不同的日志文本，便于区分“不支持该粒度”与“信封异常”等情况。
fn log_degraded(what: &str, code: &str, err: &MarketError) {
    match err {
        MarketError::Unsupported { .. } => {
            info!("{} for {}: {}, returning empty result", what, code, err)
        }
        MarketError::Envelope(msg) => {
            warn!("{} for {}: unexpected envelope ({}), returning empty result", what, code, msg)
        }
        MarketError::Network(_) | MarketError::Http(_) => {
            warn!("{} for {}: transport failed: {}", what, code, err)
        }
        MarketError::Parse(_) | MarketError::NotFound => {
            warn!("{} for {}: no usable data: {}", what, code, err)
        }
    }
}

