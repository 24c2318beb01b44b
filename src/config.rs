use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Flat string-keyed trigger arguments, as delivered by the host per
/// invocation. All values arrive as strings; each component parses and
/// validates the keys it consumes.
#[derive(Debug, Clone, Default)]
pub struct TriggerArgs(HashMap<String, String>);

impl TriggerArgs {
    pub fn new(args: HashMap<String, String>) -> Self {
        Self(args)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    /// Parse an optional argument, falling back to `default` when absent.
    /// A present but malformed value is fatal.
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.to_string(),
                reason: format!("expected {}", std::any::type_name::<T>()),
            }),
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for TriggerArgs {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

/// Configuration for the rolling-statistics processor
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Table whose writes are aggregated
    pub table_name: String,
    /// Bucket width. When set, rows are grouped into fixed time windows
    /// and each cycle starts fresh; when unset, aggregates merge with the
    /// previously persisted state.
    pub time_sampling: Option<Duration>,
}

impl StatsConfig {
    pub fn from_args(args: &TriggerArgs) -> Result<Self, ConfigError> {
        let table_name = args.require("table_name")?.to_string();
        let time_sampling = match args.get("time_sampling") {
            None => None,
            Some(raw) => Some(parse_duration(raw).map_err(|reason| ConfigError::Invalid {
                key: "time_sampling".to_string(),
                value: raw.to_string(),
                reason,
            })?),
        };
        Ok(Self { table_name, time_sampling })
    }

    /// Measurement the computed statistics are written to
    pub fn analytics_table(&self) -> String {
        format!("analytics_{}", self.table_name)
    }
}

/// Configuration for the sliding-window anomaly detector
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub table_name: String,
    pub field_name: String,
    /// Alert endpoint; `webhook_url`, with `slack_endpoint` accepted as an
    /// alias for deployments fronted by the Slack alert plugin.
    pub webhook_url: String,
    pub window_size: usize,
    pub z_score_threshold: f64,
    pub cooldown_seconds: u64,
    pub min_datapoints: usize,
    pub alert_title: String,
}

impl DetectorConfig {
    pub fn from_args(args: &TriggerArgs) -> Result<Self, ConfigError> {
        let webhook_url = args
            .get("webhook_url")
            .or_else(|| args.get("slack_endpoint"))
            .ok_or_else(|| ConfigError::Missing("webhook_url".to_string()))?
            .to_string();

        Ok(Self {
            table_name: args.require("table_name")?.to_string(),
            field_name: args.require("field_name")?.to_string(),
            webhook_url,
            window_size: args.parse_or("window_size", default_window_size())?,
            z_score_threshold: args.parse_or("z_score_threshold", default_z_score_threshold())?,
            cooldown_seconds: args.parse_or("cooldown_seconds", default_cooldown_seconds())?,
            min_datapoints: args.parse_or("min_datapoints", default_min_datapoints())?,
            alert_title: args
                .get("alert_title")
                .map(str::to_string)
                .unwrap_or_else(default_alert_title),
        })
    }
}

/// Parse a bucket width: `<n>` seconds, or `<n>` suffixed with
/// s/m/h/d. Zero-length widths are rejected.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (number, multiplier) = match raw.chars().last() {
        Some('s') => (&raw[..raw.len() - 1], 1),
        Some('m') => (&raw[..raw.len() - 1], 60),
        Some('h') => (&raw[..raw.len() - 1], 3600),
        Some('d') => (&raw[..raw.len() - 1], 86_400),
        Some(c) if c.is_ascii_digit() => (raw, 1),
        _ => return Err("expected <n>[s|m|h|d]".to_string()),
    };
    let n: u64 = number.parse().map_err(|_| "expected <n>[s|m|h|d]".to_string())?;
    if n == 0 {
        return Err("width must be positive".to_string());
    }
    Ok(Duration::from_secs(n * multiplier))
}

// Default value functions
fn default_window_size() -> usize { 5 }
fn default_z_score_threshold() -> f64 { 2.0 }
fn default_cooldown_seconds() -> u64 { 300 }
fn default_min_datapoints() -> usize { 5 }
fn default_alert_title() -> String { "Anomaly Alert".to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_defaults_apply() {
        let args = TriggerArgs::from([
            ("table_name", "cpu"),
            ("field_name", "usage"),
            ("webhook_url", "http://localhost:8181/alert"),
        ]);
        let config = DetectorConfig::from_args(&args).unwrap();
        assert_eq!(config.window_size, 5);
        assert_eq!(config.z_score_threshold, 2.0);
        assert_eq!(config.cooldown_seconds, 300);
        assert_eq!(config.min_datapoints, 5);
        assert_eq!(config.alert_title, "Anomaly Alert");
    }

    #[test]
    fn slack_endpoint_is_accepted_as_webhook_alias() {
        let args = TriggerArgs::from([
            ("table_name", "cpu"),
            ("field_name", "usage"),
            ("slack_endpoint", "http://localhost:8181/alert"),
        ]);
        let config = DetectorConfig::from_args(&args).unwrap();
        assert_eq!(config.webhook_url, "http://localhost:8181/alert");
    }

    #[test]
    fn missing_required_argument_is_fatal() {
        let args = TriggerArgs::from([("table_name", "cpu"), ("field_name", "usage")]);
        assert_eq!(
            DetectorConfig::from_args(&args).unwrap_err(),
            ConfigError::Missing("webhook_url".to_string())
        );
    }

    #[test]
    fn malformed_numeric_argument_is_fatal() {
        let args = TriggerArgs::from([
            ("table_name", "cpu"),
            ("field_name", "usage"),
            ("webhook_url", "http://localhost:8181/alert"),
            ("window_size", "five"),
        ]);
        assert!(matches!(
            DetectorConfig::from_args(&args),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn duration_grammar() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert!(parse_duration("0m").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn empty_string_argument_counts_as_missing() {
        let args = TriggerArgs::from([("table_name", "")]);
        assert!(StatsConfig::from_args(&args).is_err());
    }
}
