//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Latency range table
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BucketTable {
    /// 12 ranges from 1ms to 10min
    Standard,
    /// 18 ranges from 1ms to 1min
    Fine,
}

/// reqpulse - Concurrent HTTP load generator
#[derive(Parser, Debug)]
#[command(name = "reqpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Basic Options ===
    /// Number of concurrent workers
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Requests per worker
    #[arg(short = 'n', long)]
    pub requests: Option<u64>,

    /// Time limit (e.g., 30, 30s, 5m, 1h); wins over --requests
    #[arg(short = 't', long)]
    pub time_limit: Option<String>,

    /// HTTP method (GET, HEAD, POST, PUT, PATCH, DELETE, CONNECT, OPTIONS, TRACE)
    #[arg(short = 'm', long)]
    pub method: Option<String>,

    /// Target URL
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Wait for every worker to be ready before starting
    #[arg(short = 'w', long)]
    pub pre_heat: bool,

    // === Request Options ===
    /// Proxy URL
    #[arg(long)]
    pub proxy: Option<String>,

    /// Extra header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body
    #[arg(long)]
    pub body: Option<String>,

    /// Per-request timeout (e.g., 30s, 2m)
    #[arg(long)]
    pub timeout: Option<String>,

    /// Verify server TLS certificates
    #[arg(long)]
    pub verify_tls: bool,

    /// Think time between requests of one worker (milliseconds)
    #[arg(long)]
    pub sleep_interval: Option<u64>,

    // === Output Options ===
    /// Progress interval in seconds
    #[arg(short = 'i', long)]
    pub print_interval: Option<u64>,

    /// Latency range table
    #[arg(long, value_enum)]
    pub buckets: Option<BucketTable>,

    /// Write the final report as JSON to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Disable progress lines
    #[arg(long)]
    pub no_live: bool,

    // === Runtime Options ===
    /// Grace period for in-flight requests after stop (e.g., 10s)
    #[arg(long)]
    pub shutdown_grace: Option<String>,

    /// TOML configuration file (CLI flags override it)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Validate and print configuration without running
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from([
            "reqpulse", "-c", "8", "-n", "100", "-m", "post", "-u", "http://localhost/", "-w", "-i", "5", "-d",
        ])
        .unwrap();
        assert_eq!(cli.concurrency, Some(8));
        assert_eq!(cli.requests, Some(100));
        assert_eq!(cli.method.as_deref(), Some("post"));
        assert_eq!(cli.url.as_deref(), Some("http://localhost/"));
        assert!(cli.pre_heat);
        assert_eq!(cli.print_interval, Some(5));
        assert!(cli.debug);
    }

    #[test]
    fn test_parse_repeated_headers() {
        let cli = Cli::try_parse_from([
            "reqpulse", "-u", "http://x/", "-H", "Accept: text/plain", "--header", "X-Id: 7",
        ])
        .unwrap();
        assert_eq!(cli.headers, vec!["Accept: text/plain", "X-Id: 7"]);
    }

    #[test]
    fn test_parse_buckets() {
        let cli = Cli::try_parse_from(["reqpulse", "--buckets", "fine"]).unwrap();
        assert_eq!(cli.buckets, Some(BucketTable::Fine));
        assert!(Cli::try_parse_from(["reqpulse", "--buckets", "coarse"]).is_err());
    }

    #[test]
    fn test_no_flags_leaves_overrides_unset() {
        let cli = Cli::try_parse_from(["reqpulse"]).unwrap();
        assert!(cli.concurrency.is_none());
        assert!(cli.requests.is_none());
        assert!(cli.time_limit.is_none());
        assert!(cli.headers.is_empty());
        assert!(!cli.verify_tls);
    }
}
