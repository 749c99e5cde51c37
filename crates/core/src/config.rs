use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub query: QueryConfig,
}

/// 上游数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    // 单次请求超时（秒）
    pub timeout_secs: u64,
    pub user_agent: String,
    // 新浪实时报价 (Provider A)
    pub sina_quote_url: String,
    // 新浪代码联想
    pub sina_suggest_url: String,
    // 腾讯实时报价 (Provider B)
    pub tencent_quote_url: String,
    // 腾讯分时/K 线接口根地址
    pub ifzq_base_url: String,
}

/// 查询默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_count: usize,
    pub summary_day_count: usize,
    pub summary_week_count: usize,
    pub summary_minute5_count: usize,
    pub search_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
            sina_quote_url: "http://hq.sinajs.cn".to_string(),
            sina_suggest_url: "https://suggest3.sinajs.cn/suggest".to_string(),
            tencent_quote_url: "http://qt.gtimg.cn".to_string(),
            ifzq_base_url: "https://web.ifzq.gtimg.cn/appstock/app".to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_count: 30,
            summary_day_count: 5,
            summary_week_count: 20,
            summary_minute5_count: 48,
            search_limit: 10,
        }
    }
}
