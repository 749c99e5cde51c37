use thiserror::Error;

/// # Summary
/// 行情数据域错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 这些错误只在适配层与服务层之间流动，服务层负责将其降级为空结果。
#[derive(Error, Debug)]
pub enum MarketError {
    // 网络层错误，包含底层 HTTP 客户端错误信息（含超时与取消）
    #[error("Network error: {0}")]
    Network(String),
    // 非 2xx 响应
    #[error("HTTP status {0}")]
    Http(u16),
    // 信封错误：状态码不是成功哨兵值，或顶层结构不符合预期
    #[error("Envelope error: {0}")]
    Envelope(String),
    // 上游以空集合明确表示该市场不支持此粒度
    #[error("Granularity {granularity} unsupported for {code}")]
    Unsupported { code: String, granularity: String },
    // 数据解析错误，如 JSON 格式不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    // 请求的数据未找到
    #[error("Data not found")]
    NotFound,
}
