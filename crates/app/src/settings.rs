use anyhow::Context;
use config::{Config, Environment, File};
use hq_core::config::AppConfig;
use std::path::Path;

/// 环境变量前缀，层级之间以 `__` 分隔，如 `HQ__FEED__TIMEOUT_SECS`。
const ENV_PREFIX: &str = "HQ";

/// # Summary
/// 按层级加载配置。
///
/// # Logic
/// 1. 内置默认值。
/// 2. 可选的 TOML 文件，不存在时跳过。
/// 3. `HQ__` 前缀的环境变量。
///
/// # Returns
/// 合并后的配置；文件存在但格式错误时返回错误。
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
    let defaults = Config::try_from(&AppConfig::default()).context("serialize default config")?;
    let path_str = path.to_string_lossy();

    Config::builder()
        .add_source(defaults)
        .add_source(File::with_name(&path_str).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("load config from {}", path_str))?
        .try_deserialize()
        .context("deserialize config")
}
