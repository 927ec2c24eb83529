//! Application configuration.
//!
//! Values come from the environment (a `.env` file is loaded by the binary
//! through `dotenvy`). Anything unset or unparsable falls back to the
//! defaults below; command-line flags override both.

use std::str::FromStr;

use crate::api::logs::log_warning;
use crate::metrics::aggregate::DEFAULT_TOP_CUSTOMERS;
use crate::metrics::period::Granularity;
use crate::metrics::pipeline::ReportOptions;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum upload size (in bytes).
///
/// 50 MB limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Raw rows echoed back with each report.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

pub const ENV_PORT: &str = "KPIBOARD_PORT";
pub const ENV_MAX_UPLOAD_BYTES: &str = "KPIBOARD_MAX_UPLOAD_BYTES";
pub const ENV_TOP_CUSTOMERS: &str = "KPIBOARD_TOP_CUSTOMERS";
pub const ENV_GRANULARITY: &str = "KPIBOARD_GRANULARITY";
pub const ENV_PREVIEW_ROWS: &str = "KPIBOARD_PREVIEW_ROWS";

/// Runtime settings shared by the CLI and the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub max_upload_bytes: usize,
    pub top_customers: usize,
    pub granularity: Granularity,
    pub preview_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            top_customers: DEFAULT_TOP_CUSTOMERS,
            granularity: Granularity::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            port: read(&lookup, ENV_PORT, defaults.port),
            max_upload_bytes: read(&lookup, ENV_MAX_UPLOAD_BYTES, defaults.max_upload_bytes),
            top_customers: read(&lookup, ENV_TOP_CUSTOMERS, defaults.top_customers),
            granularity: read(&lookup, ENV_GRANULARITY, defaults.granularity),
            preview_rows: read(&lookup, ENV_PREVIEW_ROWS, defaults.preview_rows),
        }
    }

    /// Pipeline options seeded from these settings.
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            granularity: self.granularity,
            top_customers: self.top_customers,
            preview_rows: self.preview_rows,
            ..ReportOptions::default()
        }
    }
}

fn read<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log_warning(format!("Ignoring invalid {}='{}', using default", key, raw));
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.top_customers, 5);
    }

    #[test]
    fn test_values_read_from_env() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_PORT, "8080"),
            (ENV_GRANULARITY, "weekly"),
            (ENV_TOP_CUSTOMERS, " 3 "),
        ]));
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.granularity, Granularity::Weekly);
        assert_eq!(settings.top_customers, 3);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_PORT, "not-a-port"),
            (ENV_MAX_UPLOAD_BYTES, "-1"),
        ]));
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_report_options_from_settings() {
        let settings = Settings {
            granularity: Granularity::Daily,
            top_customers: 2,
            ..Settings::default()
        };
        let options = settings.report_options();
        assert_eq!(options.granularity, Granularity::Daily);
        assert_eq!(options.top_customers, 2);
        assert_eq!(options.delimiter, Some(';'));
    }
}
