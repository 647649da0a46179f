use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::toml_config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Options shared by every binary.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormatArg,
}

impl CommonArgs {
    pub fn load_config(&self) -> Result<AppConfig> {
        AppConfig::load(&self.config)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "party-invite")]
#[command(about = "HTTP service listing the customers close enough to be invited")]
pub struct ServerArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override the HTTP port from the configuration
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServerArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.http.port = port;
        }
    }
}
