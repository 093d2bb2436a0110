use std::str::FromStr;
use std::time::Duration;

use worker::Env;

use crate::observability::LogFormat;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                      (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_REDIRECTS: u8 = 5;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime knobs read from Worker vars. Every field has a default, so a
/// deployment with no vars at all behaves like production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub user_agent: String,
    /// Bounds one outbound call end to end, body included.
    pub request_timeout: Duration,
    /// Bounds each redirect hop until response headers arrive.
    pub connect_timeout: Duration,
    pub max_redirects: u8,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Vars that were set but could not be parsed; the default was used instead.
    pub ignored_vars: Vec<&'static str>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
            ignored_vars: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn from_env(env: &Env) -> Self {
        Self::from_vars(|name| env.var(name).ok().map(|v| v.to_string()))
    }

    /// Builds the config from any var lookup. Blank values count as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(ua) = var("USER_AGENT") {
            config.user_agent = ua;
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = level;
        }

        let mut ignored = Vec::new();
        if let Some(secs) = parse_var::<u64>(var("FETCH_TIMEOUT_SECS"), "FETCH_TIMEOUT_SECS", &mut ignored) {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(var("CONNECT_TIMEOUT_SECS"), "CONNECT_TIMEOUT_SECS", &mut ignored) {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var::<u8>(var("MAX_REDIRECTS"), "MAX_REDIRECTS", &mut ignored) {
            config.max_redirects = max;
        }
        if let Some(format) = parse_var::<LogFormat>(var("LOG_FORMAT"), "LOG_FORMAT", &mut ignored) {
            config.log_format = format;
        }

        config.ignored_vars = ignored;
        config
    }

    /// Reports vars that fell back to defaults. Call after logging is up.
    pub fn log_ignored_vars(&self) {
        for name in &self.ignored_vars {
            tracing::warn!(var = name, "config.invalid_value_using_default");
        }
    }
}

fn parse_var<T: FromStr>(
    raw: Option<String>,
    name: &'static str,
    ignored: &mut Vec<&'static str>,
) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            ignored.push(name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> ResolverConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ResolverConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = load(&[]);
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_redirects, 5);
        assert!(config.user_agent.contains("Chrome/122"));
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("USER_AGENT", "xreel-test"),
            ("FETCH_TIMEOUT_SECS", "7"),
            ("CONNECT_TIMEOUT_SECS", " 3 "),
            ("MAX_REDIRECTS", "2"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(config.user_agent, "xreel-test");
        assert_eq!(config.request_timeout, Duration::from_secs(7));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.ignored_vars.is_empty());
    }

    #[test]
    fn unparseable_values_fall_back_and_are_reported() {
        let config = load(&[
            ("FETCH_TIMEOUT_SECS", "soon"),
            ("MAX_REDIRECTS", "999"),
            ("LOG_FORMAT", "xml"),
        ]);
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(
            config.ignored_vars,
            vec!["FETCH_TIMEOUT_SECS", "MAX_REDIRECTS", "LOG_FORMAT"]
        );
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("USER_AGENT", "   "), ("LOG_LEVEL", "")]);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.log_level, "info");
        assert!(config.ignored_vars.is_empty());
    }
}
