use hq_core::common::MarketClass;
use hq_core::market::entity::SearchHit;

pub const CATALOG_SOURCE: &str = "builtin";

/// 常用港股与美股，联想接口对这两个市场的覆盖不稳定，搜索时作为补充。
const HOT_SYMBOLS: &[(&str, &str, MarketClass)] = &[
    ("腾讯控股", "hk00700", MarketClass::Hk),
    ("中国移动", "hk00941", MarketClass::Hk),
    ("阿里巴巴-SW", "hk09988", MarketClass::Hk),
    ("美团-W", "hk03690", MarketClass::Hk),
    ("小米集团-W", "hk01810", MarketClass::Hk),
    ("比亚迪股份", "hk01211", MarketClass::Hk),
    ("京东集团-SW", "hk09618", MarketClass::Hk),
    ("网易-S", "hk09999", MarketClass::Hk),
    ("中芯国际", "hk00981", MarketClass::Hk),
    ("工商银行", "hk01398", MarketClass::Hk),
    ("建设银行", "hk00939", MarketClass::Hk),
    ("中国银行", "hk03988", MarketClass::Hk),
    ("招商银行", "hk03968", MarketClass::Hk),
    ("中国平安", "hk02318", MarketClass::Hk),
    ("中国石油股份", "hk00857", MarketClass::Hk),
    ("汇丰控股", "hk00005", MarketClass::Hk),
    ("长江实业", "hk01113", MarketClass::Hk),
    ("苹果", "gb_aapl", MarketClass::Us),
    ("谷歌", "gb_goog", MarketClass::Us),
    ("谷歌A类股", "gb_googl", MarketClass::Us),
    ("微软", "gb_msft", MarketClass::Us),
    ("亚马逊", "gb_amzn", MarketClass::Us),
    ("特斯拉", "gb_tsla", MarketClass::Us),
    ("英伟达", "gb_nvda", MarketClass::Us),
    ("Meta(FB)", "gb_meta", MarketClass::Us),
    ("伯克希尔-哈撒韦", "gb_brk_a", MarketClass::Us),
    ("强生", "gb_jnj", MarketClass::Us),
    ("可口可乐", "gb_ko", MarketClass::Us),
    ("麦当劳", "gb_mcd", MarketClass::Us),
    ("迪士尼", "gb_dis", MarketClass::Us),
    ("耐克", "gb_nke", MarketClass::Us),
];

/// 代码格式说明，供 CLI `guide` 子命令输出。
pub const CODE_GUIDE: &str = "\
代码格式

A 股
  sh + 6 位数字   上交所，如 sh600000、sh000001
  sz + 6 位数字   深交所，如 sz000001、sz300750
  bj + 6 位数字   北交所，如 bj832566

港股
  hk + 5 位数字   如 hk00700 (腾讯控股)、hk09988 (阿里巴巴)

美股
  gb_ + 代码      如 gb_aapl、gb_msft
  us + 代码       自动改写为 gb_ 前缀，如 usAAPL -> gb_aapl

不确定代码时可使用 `hq search <名称>` 查询。
";

/// # Summary
/// 在内置常用代码表中按名称或代码做子串匹配。
///
/// # Logic
/// 关键字与名称、代码都做大小写不敏感比较；先港股后美股，最多返回 `limit` 条。
pub fn search_hot(keyword: &str, limit: usize) -> Vec<SearchHit> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    HOT_SYMBOLS
        .iter()
        .filter(|(name, code, _)| name.to_lowercase().contains(&needle) || code.contains(&needle))
        .take(limit)
        .map(|(name, code, market)| SearchHit {
            name: (*name).to_string(),
            code: (*code).to_string(),
            original_code: None,
            full_code: None,
            market: *market,
            source: CATALOG_SOURCE.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_by_name_or_code() {
        let hits = search_hot("腾讯", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "hk00700");
        assert_eq!(hits[0].market, MarketClass::Hk);
        assert_eq!(hits[0].source, "builtin");

        let hits = search_hot("AAPL", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "苹果");

        assert_eq!(search_hot("meta", 10)[0].code, "gb_meta");
    }

    #[test]
    fn test_limit_and_empty_keyword() {
        assert_eq!(search_hot("银行", 2).len(), 2);
        assert_eq!(search_hot("银行", 10).len(), 4);
        assert!(search_hot("  ", 10).is_empty());
        assert!(search_hot("不存在", 10).is_empty());
    }
}
