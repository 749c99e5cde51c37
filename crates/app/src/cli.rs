use clap::{Parser, Subcommand, ValueEnum};
use hq_core::common::Granularity;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hq")]
#[command(about = "A 股 / 港股 / 美股行情查询", long_about = None)]
pub struct Cli {
    /// 配置文件路径 (TOML)，不存在时使用默认值
    #[arg(long, global = true, default_value = "hq.toml")]
    pub config: PathBuf,

    /// 输出格式
    #[arg(long, global = true, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 批量实时报价
    Quote {
        /// 代码列表，如 sh600000 hk00700 usAAPL
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// 分时或 K 线
    Kline {
        code: String,

        /// minute / 5min / 10min / 15min / 30min / 60min / day / week / month
        #[arg(short = 't', long = "type", default_value = "day", value_parser = parse_granularity)]
        granularity: Granularity,

        /// 返回条数，分时为分钟数；缺省取配置中的 default_count
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// 日线、周线、5 分钟线与当日分时汇总
    Summary { code: String },

    /// 最近一根日线
    Latest { code: String },

    /// 按名称或代码搜索
    Search {
        keyword: String,

        /// 最多返回条数；缺省取配置中的 search_limit
        #[arg(short = 'n', long = "number")]
        limit: Option<usize>,

        /// 同时搜索内置的常用港股/美股表
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// 打印代码格式说明
    Guide,
}

fn parse_granularity(s: &str) -> Result<Granularity, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kline_arguments() {
        let cli = Cli::try_parse_from(["hq", "kline", "sh600000", "-t", "5min", "-c", "48"]).unwrap();
        assert_eq!(cli.format, Format::Json);
        match cli.cmd {
            Commands::Kline {
                code,
                granularity,
                count,
            } => {
                assert_eq!(code, "sh600000");
                assert_eq!(granularity, Granularity::Min5);
                assert_eq!(count, Some(48));
            }
            other => unreachable!("{:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_granularity() {
        assert!(Cli::try_parse_from(["hq", "kline", "sh600000", "-t", "2min"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hq", "quote", "sh600000", "hk00700", "--format", "text"]).unwrap();
        assert_eq!(cli.format, Format::Text);
        assert!(matches!(cli.cmd, Commands::Quote { ref codes } if codes.len() == 2));

        let cli = Cli::try_parse_from(["hq", "search", "腾讯", "-n", "3", "--all"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Commands::Search { limit: Some(3), all: true, .. }
        ));
        assert!(Cli::try_parse_from(["hq", "quote"]).is_err());
    }
}
