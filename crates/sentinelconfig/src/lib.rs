//! Sentinel client configuration file parser
//!
//! This crate parses the INI-style configuration files used to describe a
//! sentinel-monitored cluster: which master to look up, where the sentinels
//! live, and the timeouts to use when talking to sentinels and data nodes.
//!
//! # Example
//!
//! ```no_run
//! use sentinelconfig::{Duration, SentinelConf};
//!
//! let conf = SentinelConf::from_file("/etc/redis/sentinel-client.conf").unwrap();
//! let master = conf.master_name().unwrap();
//! let sentinels = conf.sentinel_addrs().unwrap();
//! let connect: Option<Duration> = conf
//!     .get_typed(SentinelConf::DEFAULT_SECTIONS, "sentinel connect timeout")
//!     .unwrap();
//! ```
//!
//! Keys are matched after normalization, so `sentinel_connect_timeout` and
//! `Sentinel Connect Timeout` name the same option.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Missing required option: {0}")]
    MissingOption(String),

    #[error("Invalid value for {key}: expected {expected}, got {value:?}")]
    InvalidValue {
        key: String,
        expected: &'static str,
        value: String,
    },
}

/// Types that can be read out of a configuration value
pub trait ConfigValue: Sized + Clone {
    fn parse_config_value(s: &str) -> Result<Self, ConfigError>;

    /// Name used in error messages
    fn type_name() -> &'static str;
}

/// Duration value with a unit suffix (us, ms, s, m, h). A bare number is seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration(pub std::time::Duration);

impl ConfigValue for Duration {
    fn parse_config_value(s: &str) -> Result<Self, ConfigError> {
        parse_duration(s).map(Duration)
    }

    fn type_name() -> &'static str {
        "duration"
    }
}

/// Plain unsigned integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Count(pub u64);

impl ConfigValue for Count {
    fn parse_config_value(s: &str) -> Result<Self, ConfigError> {
        s.trim()
            .replace('_', "")
            .parse()
            .map(Count)
            .map_err(|_| ConfigError::ParseError(format!("Invalid count: {}", s)))
    }

    fn type_name() -> &'static str {
        "count"
    }
}

impl ConfigValue for bool {
    fn parse_config_value(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ConfigError::ParseError(format!("Invalid bool: {}", s))),
        }
    }

    fn type_name() -> &'static str {
        "bool"
    }
}

impl ConfigValue for String {
    fn parse_config_value(s: &str) -> Result<Self, ConfigError> {
        Ok(s.to_string())
    }

    fn type_name() -> &'static str {
        "string"
    }
}

/// A named option with a default, looked up across a list of sections
pub struct ConfigOption<T: ConfigValue> {
    name: &'static str,
    default: T,
}

impl<T: ConfigValue> ConfigOption<T> {
    pub const fn new(name: &'static str, default: T) -> Self {
        Self { name, default }
    }

    /// Read the option, using the default when it is absent.
    ///
    /// A present but malformed value is an error rather than a silent fallback.
    pub fn get(&self, config: &SentinelConf, sections: &[&str]) -> Result<T, ConfigError> {
        Ok(config
            .get_typed(sections, self.name)?
            .unwrap_or_else(|| self.default.clone()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }
}

fn parse_duration(s: &str) -> Result<std::time::Duration, ConfigError> {
    let s = s.trim();

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let num_str = &s[..num_end];
    let unit = s[num_end..].trim().to_lowercase();

    let num: f64 = num_str
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("Invalid number: {:?}", num_str)))?;

    let seconds = match unit.as_str() {
        "" | "s" | "sec" | "secs" | "seconds" => num,
        "ms" | "msec" | "milliseconds" => num / 1_000.0,
        "us" | "usec" | "microseconds" => num / 1_000_000.0,
        "m" | "min" | "minutes" => num * 60.0,
        "h" | "hr" | "hours" => num * 3600.0,
        _ => {
            return Err(ConfigError::ParseError(format!(
                "Unknown time unit: {}",
                unit
            )))
        }
    };

    std::time::Duration::try_from_secs_f64(seconds)
        .map_err(|e| ConfigError::ParseError(format!("Invalid duration {:?}: {}", s, e)))
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A parsed sentinel client configuration file
#[derive(Debug, Clone, Default)]
pub struct SentinelConf {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SentinelConf {
    /// Sections searched by the convenience accessors, most specific first
    pub const DEFAULT_SECTIONS: &'static [&'static str] = &["sentinel", "global"];

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration text. Options before the first section header
    /// belong to `[global]`.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section = String::from("global");

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| {
                    ConfigError::ParseError(format!(
                        "line {}: unterminated section header",
                        lineno + 1
                    ))
                })?;
                current_section = name.trim().to_lowercase();
                sections.entry(current_section.clone()).or_default();
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                ConfigError::ParseError(format!("line {}: expected key = value", lineno + 1))
            })?;

            sections
                .entry(current_section.clone())
                .or_default()
                .insert(normalize_key(key), value.trim().to_string());
        }

        Ok(Self { sections })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(&section.to_lowercase())
            .and_then(|s| s.get(&normalize_key(key)))
            .map(|v| v.as_str())
    }

    /// First value found for `key`, checking `sections` in order
    pub fn get_with_fallback(&self, sections: &[&str], key: &str) -> Option<&str> {
        sections.iter().find_map(|section| self.get(section, key))
    }

    /// Typed lookup. `Ok(None)` when absent, an error when present but malformed.
    pub fn get_typed<T: ConfigValue>(
        &self,
        sections: &[&str],
        key: &str,
    ) -> Result<Option<T>, ConfigError> {
        match self.get_with_fallback(sections, key) {
            None => Ok(None),
            Some(raw) => T::parse_config_value(raw)
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: normalize_key(key),
                    expected: T::type_name(),
                    value: raw.to_string(),
                }),
        }
    }

    /// Name of the monitored master (`master name`)
    pub fn master_name(&self) -> Result<String, ConfigError> {
        self.get_with_fallback(Self::DEFAULT_SECTIONS, "master name")
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .ok_or_else(|| ConfigError::MissingOption("master name".to_string()))
    }

    /// Sentinel endpoints from the `sentinels` option.
    ///
    /// Accepts comma and/or whitespace separated `host:port` entries.
    pub fn sentinel_addrs(&self) -> Result<Vec<String>, ConfigError> {
        let raw = self
            .get_with_fallback(Self::DEFAULT_SECTIONS, "sentinels")
            .ok_or_else(|| ConfigError::MissingOption("sentinels".to_string()))?;

        let addrs = split_list(raw);
        if addrs.is_empty() {
            return Err(ConfigError::ParseError(
                "No sentinel addresses found in 'sentinels'".to_string(),
            ));
        }

        Ok(addrs)
    }

    pub fn sections(&self) -> Vec<&str> {
        self.sections.keys().map(|s| s.as_str()).collect()
    }
}

/// Split a comma and/or whitespace separated list, dropping empty entries
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
