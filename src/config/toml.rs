//! TOML configuration file parsing

use super::cli::Cli;
use super::cli_convert::apply_cli_overrides;
use super::Config;
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ConfigFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    parse_toml_string(&contents).map_err(|e| match e {
        ConfigError::ConfigFile { reason, .. } => ConfigError::ConfigFile {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config, ConfigError> {
    ::toml::from_str(contents).map_err(|e| ConfigError::ConfigFile {
        path: "<inline>".to_string(),
        reason: e.to_string(),
    })
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config, ConfigError> {
    apply_cli_overrides(cli, &mut config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::workload::{CompletionMode, HttpMethod};
    use crate::stats::BucketLayout;
    use clap::Parser;
    use std::io::Write;

    const BASIC: &str = r#"
[workload]
concurrency = 4
pre_heat = true
buckets = "fine"

[workload.completion_mode]
mode = "requests"
per_worker = 50

[request]
method = "post"
url = "http://localhost:8080/api"
body = "{}"

[[request.headers]]
name = "Content-Type"
value = "application/json"

[output]
print_interval_secs = 5
"#;

    #[test]
    fn test_parse_toml_basic() {
        let config = parse_toml_string(BASIC).unwrap();
        assert_eq!(config.workload.concurrency, 4);
        assert!(config.workload.pre_heat);
        assert_eq!(config.workload.buckets, BucketLayout::Fine);
        assert_eq!(
            config.workload.completion_mode,
            Some(CompletionMode::Requests { per_worker: 50 })
        );
        assert_eq!(config.request.method, HttpMethod::Post);
        assert_eq!(config.request.headers[0].name, "Content-Type");
        assert_eq!(config.output.print_interval_secs, 5);
        // Sections left out fall back to defaults
        assert_eq!(config.runtime.shutdown_grace_secs, 10);
        assert_eq!(config.request.timeout_secs, 30);
    }

    #[test]
    fn test_parse_toml_duration_mode() {
        let config = parse_toml_string(
            r#"
[workload.completion_mode]
mode = "duration"
seconds = 30
"#,
        )
        .unwrap();
        assert_eq!(
            config.workload.completion_mode,
            Some(CompletionMode::Duration { seconds: 30 })
        );
    }

    #[test]
    fn test_parse_toml_bad_method() {
        let err = parse_toml_string("[request]\nmethod = \"FETCH\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ConfigFile { .. }));
    }

    #[test]
    fn test_parse_toml_file_missing() {
        let err = parse_toml_file(Path::new("/nonexistent/reqpulse.toml")).unwrap_err();
        match err {
            ConfigError::ConfigFile { path, .. } => assert_eq!(path, "/nonexistent/reqpulse.toml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BASIC.as_bytes()).unwrap();

        let config = parse_toml_file(file.path()).unwrap();
        let cli = Cli::try_parse_from(["reqpulse", "-c", "16", "-t", "10s"]).unwrap();
        let merged = merge_cli_with_config(&cli, config).unwrap();

        assert_eq!(merged.workload.concurrency, 16);
        assert_eq!(
            merged.workload.completion_mode,
            Some(CompletionMode::Duration { seconds: 10 })
        );
        // Untouched by the CLI
        assert_eq!(merged.request.url.as_deref(), Some("http://localhost:8080/api"));
        assert!(merged.workload.pre_heat);
    }
}
