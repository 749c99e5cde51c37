use hq_core::common::{MarketClass, Provider};

/// # Summary
/// 一个代码的路由结果。
///
/// # Invariants
/// - `code` 为小写规范代码，美股统一为 `gb_` 前缀。
/// - 分时与 K 线始终走 ifzq 接口，与 `quote_provider` 无关。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub code: String,
    pub market: MarketClass,
    // 实时报价首选数据源
    pub quote_provider: Provider,
}

/// # Summary
/// 将任意大小写的输入代码转为规范代码。
///
/// # Logic
/// 统一小写并去除首尾空白；`us<TICKER>` 改写为 `gb_<ticker>`。
pub fn canonical_code(code: &str) -> String {
    let lower = code.trim().to_lowercase();
    match lower.strip_prefix("us") {
        Some(ticker) if !ticker.is_empty() => format!("gb_{}", ticker),
        _ => lower,
    }
}

/// # Summary
/// 按代码前缀选择实时报价数据源。纯函数，对任意输入都有结果。
///
/// # Logic
/// - `hk`/`sh`/`sz` → 腾讯。
/// - `us`/`gb_` → 规范化为 `gb_` 后走新浪。
/// - `bj` 与未知前缀 → 原样小写后走新浪，尽力而为。
pub fn route(code: &str) -> Route {
    let code = canonical_code(code);
    let market = MarketClass::from_code(&code);
    let quote_provider = if ["hk", "sh", "sz"].iter().any(|p| code.starts_with(p)) {
        Provider::Tencent
    } else {
        Provider::Sina
    };
    Route {
        code,
        market,
        quote_provider,
    }
}
