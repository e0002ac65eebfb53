//! CLI to Config conversion utilities

use crate::config::cli::{BucketTable, Cli};
use crate::config::workload::{CompletionMode, Header, HttpMethod};
use crate::config::Config;
use crate::error::ConfigError;
use crate::stats::BucketLayout;

/// Parse a duration string (e.g., "60", "60s", "5m", "1h") to seconds
pub fn parse_duration(s: &str) -> Result<u64, ConfigError> {
    let lower = s.trim().to_lowercase();

    let (num_str, multiplier) = if lower.ends_with("sec") || lower.ends_with('s') {
        (lower.trim_end_matches("sec").trim_end_matches('s'), 1u64)
    } else if lower.ends_with("min") || lower.ends_with('m') {
        (lower.trim_end_matches("min").trim_end_matches('m'), 60)
    } else if lower.ends_with("hr") || lower.ends_with('h') {
        (lower.trim_end_matches("hr").trim_end_matches('h'), 3600)
    } else {
        (lower.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidDuration(s.to_string()))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| ConfigError::InvalidDuration(s.to_string()))
}

/// Parse a "Name: value" header
pub fn parse_header(s: &str) -> Result<Header, ConfigError> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidHeader(s.to_string()))?;

    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidHeader(s.to_string()));
    }

    Ok(Header {
        name: name.to_string(),
        value: value.trim().to_string(),
    })
}

/// Convert CLI BucketTable to the stats BucketLayout
pub fn convert_bucket_table(table: BucketTable) -> BucketLayout {
    match table {
        BucketTable::Standard => BucketLayout::Standard,
        BucketTable::Fine => BucketLayout::Fine,
    }
}

/// Build a configuration from CLI arguments alone
pub fn build_config_from_cli(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_cli_overrides(cli, &mut config)?;
    Ok(config)
}

/// Overlay every flag the user actually passed onto `config`
///
/// A time limit wins over a request count. Zero for either means "not set",
/// matching how the flags default.
pub fn apply_cli_overrides(cli: &Cli, config: &mut Config) -> Result<(), ConfigError> {
    // Workload
    if let Some(concurrency) = cli.concurrency {
        config.workload.concurrency = concurrency;
    }

    let time_limit = cli
        .time_limit
        .as_deref()
        .map(parse_duration)
        .transpose()?
        .filter(|&seconds| seconds > 0);

    if let Some(seconds) = time_limit {
        config.workload.completion_mode = Some(CompletionMode::Duration { seconds });
    } else if let Some(per_worker) = cli.requests.filter(|&n| n > 0) {
        config.workload.completion_mode = Some(CompletionMode::Requests { per_worker });
    }

    if cli.pre_heat {
        config.workload.pre_heat = true;
    }
    if let Some(ms) = cli.sleep_interval {
        config.workload.sleep_interval_ms = ms;
    }
    if let Some(table) = cli.buckets {
        config.workload.buckets = convert_bucket_table(table);
    }

    // Request
    if let Some(ref method) = cli.method {
        config.request.method = method.parse::<HttpMethod>()?;
    }
    if let Some(ref url) = cli.url {
        config.request.url = Some(url.clone());
    }
    if !cli.headers.is_empty() {
        config.request.headers = cli
            .headers
            .iter()
            .map(|h| parse_header(h))
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(ref body) = cli.body {
        config.request.body = Some(body.clone());
    }
    if let Some(ref proxy) = cli.proxy {
        config.request.proxy = Some(proxy.clone());
    }
    if let Some(ref timeout) = cli.timeout {
        config.request.timeout_secs = parse_duration(timeout)?;
    }
    if cli.verify_tls {
        config.request.verify_tls = true;
    }

    // Output
    if let Some(interval) = cli.print_interval {
        config.output.print_interval_secs = interval;
    }
    if cli.no_live {
        config.output.no_live = true;
    }
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }

    // Runtime
    if cli.debug {
        config.runtime.debug = true;
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    if let Some(ref grace) = cli.shutdown_grace {
        config.runtime.shutdown_grace_secs = parse_duration(grace)?;
    }

    Ok(())
}
