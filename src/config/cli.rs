use crate::config::lookup_config::LookupConfig;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "naic-lookup")]
#[command(about = "Look up NAIC license and appointment data for an NPN across jurisdictions")]
pub struct CliArgs {
    /// National Producer Number to look up
    #[arg(long)]
    pub npn: String,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the NAIC API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override the number of jurisdictions queried at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Log line format written to stderr
    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliArgs {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn load_config(&self) -> Result<LookupConfig> {
        let mut config = match &self.config {
            Some(path) => LookupConfig::from_file(path)?,
            None => LookupConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.batch.concurrency = concurrency;
        }

        Ok(config)
    }
}
