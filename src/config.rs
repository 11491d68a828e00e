//! Configuration and CLI argument handling

use std::time::Duration;
use clap::Parser;

use crate::services::DEFAULT_BASE_URL;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "next-to-go")]
#[command(about = "A live next-to-go racing countdown service")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Racing API host or base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Seconds between race refreshes
    #[arg(short, long, default_value = "60")]
    pub refresh_secs: u64,

    /// Number of races requested per refresh
    #[arg(short = 'c', long, default_value = "20")]
    pub race_count: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Refresh period, never shorter than one second
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}
