mod cli;
mod render;
mod settings;

use clap::Parser;
use cli::{Cli, Commands};
use hq_core::config::AppConfig;
use hq_core::market::port::{QuoteProvider, Transport};
use hq_feed::http::HttpTransport;
use hq_feed::ifzq::IfzqProvider;
use hq_feed::sina::SinaProvider;
use hq_feed::tencent::TencentProvider;
use hq_market::catalog::CODE_GUIDE;
use hq_market::service::MarketService;
use render::Render;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// # Summary
/// 组装具体实现并注入 `MarketService`。
///
/// # Logic
/// 1. 以配置构造共享的 HTTP 传输层。
/// 2. 新浪同时承担报价补查与代码联想，腾讯负责港股与沪深报价，ifzq 负责分时与 K 线。
fn build_service(config: &AppConfig) -> anyhow::Result<MarketService> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.feed)?);

    let sina = Arc::new(SinaProvider::new(transport.clone(), &config.feed));
    let tencent = Arc::new(TencentProvider::new(transport.clone(), &config.feed));
    let ifzq = Arc::new(IfzqProvider::new(transport, &config.feed));

    let quote_providers: Vec<Arc<dyn QuoteProvider>> = vec![tencent, sina.clone()];
    Ok(MarketService::new(
        quote_providers,
        ifzq,
        sina,
        config.query.clone(),
    ))
}

/// # Summary
/// CLI 入口。
///
/// # Logic
/// 1. 初始化日志，输出到 stderr，stdout 只保留查询结果。
/// 2. 加载分层配置并组装服务。
/// 3. 执行子命令并按 `--format` 输出；查询无数据时同样正常退出。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Guide = cli.cmd {
        println!("{}", CODE_GUIDE);
        return Ok(());
    }

    let config = settings::load(&cli.config)?;
    let service = build_service(&config)?;
    let defaults = service.query_config().clone();
    info!("hq starting: {:?}", cli.cmd);

    let output = match cli.cmd {
        Commands::Quote { codes } => service.quotes(&codes).await.render(cli.format)?,
        Commands::Kline {
            code,
            granularity,
            count,
        } => service
            .kline(&code, granularity, count.unwrap_or(defaults.default_count))
            .await
            .render(cli.format)?,
        Commands::Summary { code } => service.summarize(&code).await.render(cli.format)?,
        Commands::Latest { code } => service.latest_bar(&code).await.render(cli.format)?,
        Commands::Search {
            keyword,
            limit,
            all,
        } => service
            .search(&keyword, limit.unwrap_or(defaults.search_limit), all)
            .await
            .render(cli.format)?,
        Commands::Guide => CODE_GUIDE.to_string(),
    };

    println!("{}", output);
    Ok(())
}
