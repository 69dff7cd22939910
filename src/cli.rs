//! Command-line argument parsing for market-glance.

use crate::config::{Config, DEFAULT_CONNECTION};
use crate::tui::headless::{parse_size, OutputFormat};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// In-memory warehouse used instead of a real connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MockWarehouseKind {
    /// Sample sectors, companies and prices.
    Demo,
    /// Every query returns an empty table.
    Empty,
    /// Every query fails with a connection error.
    Failing,
}

/// A terminal dashboard of sector positions and company prices.
#[derive(Parser, Debug)]
#[command(name = "market-glance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "MARKET_GLANCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Named connection from the config file
    #[arg(short = 'c', long, value_name = "NAME", default_value = DEFAULT_CONNECTION)]
    pub connection: String,

    /// Directory holding the dashboard query files
    #[arg(long, value_name = "DIR")]
    pub queries_dir: Option<PathBuf>,

    /// Seconds a query result stays cached
    #[arg(long, value_name = "SECS")]
    pub cache_ttl: Option<u64>,

    // === Headless mode options ===
    /// Run in headless mode (no terminal UI, for testing/automation)
    #[arg(long)]
    pub headless: bool,

    /// Use an in-memory warehouse instead of connecting
    #[arg(long, value_enum, value_name = "KIND")]
    pub mock: Option<MockWarehouseKind>,

    /// Comma-separated events to execute in headless mode (e.g., "key:tab,select:MSFT")
    #[arg(long, value_name = "EVENTS")]
    pub events: Option<String>,

    /// Path to script file with events (use "-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Screen size for headless mode (WIDTHxHEIGHT)
    #[arg(long, value_name = "SIZE", default_value = "120x40")]
    pub size: String,

    /// Output format for headless mode (text, json, frames)
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write output to file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Stop on first assertion failure
    #[arg(long)]
    pub fail_fast: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Overrides config values with those given on the command line.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.queries_dir {
            config.dashboard.queries_dir = dir.clone();
        }
        if let Some(ttl) = self.cache_ttl {
            config.dashboard.cache_ttl_secs = ttl;
        }
    }

    /// Parses the screen size from the --size argument.
    pub fn parse_screen_size(&self) -> std::result::Result<(u16, u16), String> {
        parse_size(&self.size)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates headless mode arguments.
    pub fn validate_headless(&self) -> std::result::Result<(), String> {
        if !self.headless {
            return Ok(());
        }

        if self.events.is_none() && self.script.is_none() {
            return Err("--headless requires --events or --script".to_string());
        }

        self.parse_screen_size()?;
        self.parse_output_format()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_defaults() {
        let cli = parse_args(&["market-glance"]);
        assert_eq!(cli.connection, "snowflake");
        assert_eq!(cli.size, "120x40");
        assert_eq!(cli.mock, None);
        assert!(!cli.headless);
    }

    #[test]
    fn test_parse_named_connection() {
        let cli = parse_args(&["market-glance", "--connection", "local"]);
        assert_eq!(cli.connection, "local");

        let cli = parse_args(&["market-glance", "-c", "staging"]);
        assert_eq!(cli.connection, "staging");
    }

    #[test]
    fn test_parse_config_path() {
        let cli = parse_args(&["market-glance", "--config", "/path/to/config.toml"]);
        assert_eq!(cli.config_path(), PathBuf::from("/path/to/config.toml"));
    }

    #[test]
    fn test_overrides_apply_to_dashboard_config() {
        let cli = parse_args(&[
            "market-glance",
            "--queries-dir",
            "/srv/queries",
            "--cache-ttl",
            "30",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.dashboard.queries_dir, PathBuf::from("/srv/queries"));
        assert_eq!(config.dashboard.cache_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_mock_kinds() {
        let cli = parse_args(&["market-glance", "--mock", "demo"]);
        assert_eq!(cli.mock, Some(MockWarehouseKind::Demo));
        let cli = parse_args(&["market-glance", "--mock", "failing"]);
        assert_eq!(cli.mock, Some(MockWarehouseKind::Failing));
        assert!(Cli::try_parse_from(["market-glance", "--mock", "sqlite"]).is_err());
    }

    #[test]
    fn test_parse_screen_size() {
        let cli = parse_args(&["market-glance", "--size", "80x24"]);
        assert_eq!(cli.parse_screen_size().unwrap(), (80, 24));

        let cli = parse_args(&["market-glance", "--size", "invalid"]);
        assert!(cli.parse_screen_size().is_err());
    }

    #[test]
    fn test_parse_output_format() {
        let cli = parse_args(&["market-glance", "--output", "json"]);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Json);

        let cli = parse_args(&["market-glance", "--output", "frames"]);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Frames);
    }

    #[test]
    fn test_validate_headless_requires_events_or_script() {
        let cli = parse_args(&["market-glance", "--headless", "--mock", "demo"]);
        let err = cli.validate_headless().unwrap_err();
        assert!(err.contains("requires --events or --script"));
    }

    #[test]
    fn test_validate_headless_with_events() {
        let cli = parse_args(&[
            "market-glance",
            "--headless",
            "--mock",
            "demo",
            "--events",
            "key:q",
        ]);
        assert!(cli.validate_headless().is_ok());
    }

    #[test]
    fn test_validate_headless_rejects_bad_output() {
        let cli = parse_args(&[
            "market-glance",
            "--headless",
            "--script",
            "-",
            "--output",
            "xml",
        ]);
        assert!(cli.validate_headless().is_err());
    }

    #[test]
    fn test_headless_output_file_and_fail_fast() {
        let cli = parse_args(&[
            "market-glance",
            "--headless",
            "--events",
            "key:q",
            "--output-file",
            "result.json",
            "--fail-fast",
        ]);
        assert_eq!(cli.output_file, Some(PathBuf::from("result.json")));
        assert!(cli.fail_fast);
    }
}
