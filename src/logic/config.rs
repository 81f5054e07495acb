//! Configuration module
//!
//! Everything the detector needs is collected once at startup into `Config`
//! and handed to the pipeline. Invalid values are rejected here, never
//! during per-frame evaluation.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::logic::gateway::{GatewayConfigError, GatewayId};
use crate::logic::registry::DeviceId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid tolerance {0}: expected a value between 0.0 and 1.0")]
    ToleranceOutOfRange(f64),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid tolerance override '{0}': expected DEVICE=FRACTION")]
    InvalidOverride(String),

    #[error(transparent)]
    Gateway(#[from] GatewayConfigError),
}

// ============================================================================
// TOLERANCE
// ============================================================================

/// Fraction of the baseline magnitude accepted as deviation, within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn new(fraction: f64) -> Result<Self, ConfigError> {
        if (0.0..=1.0).contains(&fraction) {
            Ok(Self(fraction))
        } else {
            Err(ConfigError::ToleranceOutOfRange(fraction))
        }
    }

    pub fn fraction(&self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl TryFrom<f64> for Tolerance {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tolerance> for f64 {
    fn from(t: Tolerance) -> f64 {
        t.0
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

// ============================================================================
// COMMAND LINE
// ============================================================================

/// LoRa RSSI relocation detector
#[derive(Debug, Default, Parser)]
#[command(name = APP_NAME, version, about)]
pub struct Cli {
    /// Tolerance fraction 0.0 - 1.0 [default: 0.1]
    #[arg(
        short = 'a',
        long = "variance",
        visible_alias = "tolerance",
        value_name = "FRACTION",
        value_parser = parse_tolerance
    )]
    pub tolerance: Option<Tolerance>,

    /// Raw frame JSON lines, '-' for stdin
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<String>,

    /// Telemetry JSON lines, '-' for stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,
}

fn parse_tolerance(value: &str) -> Result<Tolerance, String> {
    let fraction: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    Tolerance::new(fraction).map_err(|e| e.to_string())
}

// ============================================================================
// CONFIG
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Global tolerance fraction
    pub tolerance: Tolerance,

    /// Per-device tolerance, keyed by upper-case identifier
    pub tolerance_overrides: HashMap<DeviceId, Tolerance>,

    /// Directory holding debug/global/local_conf.json
    pub conf_dir: PathBuf,

    /// Explicit gateway id; takes precedence over the conf files
    pub gateway_id: Option<GatewayId>,

    pub audit_enabled: bool,
    pub audit_dir: PathBuf,

    /// `None` disables audit log rotation
    pub log_rotate_interval: Option<Duration>,

    /// Replay file, `None` for stdin
    pub input: Option<PathBuf>,

    /// Telemetry file, `None` for stdout
    pub output: Option<PathBuf>,

    pub resolve_dev_addr: bool,
    pub max_batch: usize,
    pub idle_sleep: Duration,
    pub max_backlog: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            tolerance_overrides: HashMap::new(),
            conf_dir: PathBuf::from("."),
            gateway_id: None,
            audit_enabled: DEFAULT_AUDIT_ENABLED,
            audit_dir: default_audit_dir(),
            log_rotate_interval: rotate_interval(DEFAULT_LOG_ROTATE_SECS),
            input: None,
            output: None,
            resolve_dev_addr: DEFAULT_RESOLVE_DEVADDR,
            max_batch: DEFAULT_MAX_BATCH,
            idle_sleep: Duration::from_millis(DEFAULT_IDLE_SLEEP_MS),
            max_backlog: DEFAULT_MAX_BACKLOG,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_TOLERANCE) {
            config.tolerance = Tolerance::new(parse_value(ENV_TOLERANCE, &v)?)?;
        }
        if let Some(v) = lookup(ENV_TOLERANCE_OVERRIDES) {
            config.tolerance_overrides = parse_overrides(&v)?;
        }
        if let Some(v) = lookup(ENV_CONF_DIR) {
            config.conf_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_GATEWAY_ID) {
            config.gateway_id = Some(v.parse()?);
        }
        if let Some(v) = lookup(ENV_AUDIT_ENABLED) {
            config.audit_enabled = parse_flag(ENV_AUDIT_ENABLED, &v)?;
        }
        if let Some(v) = lookup(ENV_AUDIT_DIR) {
            config.audit_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_LOG_ROTATE_SECS) {
            let secs: i64 = parse_value(ENV_LOG_ROTATE_SECS, &v)?;
            if secs == 0 || secs < -1 {
                return Err(invalid(ENV_LOG_ROTATE_SECS, &v));
            }
            config.log_rotate_interval = rotate_interval(secs);
        }
        if let Some(v) = lookup(ENV_INPUT) {
            config.input = stdio_path(v);
        }
        if let Some(v) = lookup(ENV_OUTPUT) {
            config.output = stdio_path(v);
        }
        if let Some(v) = lookup(ENV_RESOLVE_DEVADDR) {
            config.resolve_dev_addr = parse_flag(ENV_RESOLVE_DEVADDR, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_BATCH) {
            config.max_batch = parse_value(ENV_MAX_BATCH, &v)?;
            if config.max_batch == 0 {
                return Err(invalid(ENV_MAX_BATCH, &v));
            }
        }
        if let Some(v) = lookup(ENV_IDLE_SLEEP_MS) {
            config.idle_sleep = Duration::from_millis(parse_value(ENV_IDLE_SLEEP_MS, &v)?);
        }
        if let Some(v) = lookup(ENV_MAX_BACKLOG) {
            config.max_backlog = parse_value(ENV_MAX_BACKLOG, &v)?;
            if config.max_backlog == 0 {
                return Err(invalid(ENV_MAX_BACKLOG, &v));
            }
        }

        Ok(config)
    }

    /// Command line options win over the environment
    pub fn apply_cli(&mut self, cli: Cli) {
        if let Some(tolerance) = cli.tolerance {
            self.tolerance = tolerance;
        }
        if let Some(input) = cli.input {
            self.input = stdio_path(input);
        }
        if let Some(output) = cli.output {
            self.output = stdio_path(output);
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn default_audit_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("audit")
}

fn rotate_interval(secs: i64) -> Option<Duration> {
    u64::try_from(secs).ok().filter(|s| *s > 0).map(Duration::from_secs)
}

fn stdio_path(value: String) -> Option<PathBuf> {
    if value == STDIO_PATH {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

/// `DEVID=0.2,DEVID2=0.05`; identifiers are matched upper-case
fn parse_overrides(value: &str) -> Result<HashMap<DeviceId, Tolerance>, ConfigError> {
    let mut overrides = HashMap::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (id, fraction) = item
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(item.to_string()))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(ConfigError::InvalidOverride(item.to_string()));
        }
        let fraction: f64 = fraction
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidOverride(item.to_string()))?;
        overrides.insert(DeviceId::new(id.to_uppercase()), Tolerance::new(fraction)?);
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn cli(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once(APP_NAME).chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.tolerance.fraction(), 0.10);
        assert_eq!(config.max_batch, 16);
        assert_eq!(config.idle_sleep, Duration::from_millis(3));
        assert_eq!(config.log_rotate_interval, Some(Duration::from_secs(3600)));
        assert!(config.input.is_none());
        assert!(config.output.is_none());
        assert!(config.audit_enabled);
    }

    #[test]
    fn test_tolerance_bounds() {
        assert!(Tolerance::new(0.0).is_ok());
        assert!(Tolerance::new(1.0).is_ok());
        assert!(matches!(Tolerance::new(1.01), Err(ConfigError::ToleranceOutOfRange(_))));
        assert!(matches!(Tolerance::new(-0.1), Err(ConfigError::ToleranceOutOfRange(_))));
        assert!(Tolerance::new(f64::NAN).is_err());
    }

    #[test]
    fn test_tolerance_from_env_rejected_out_of_range() {
        let result = Config::from_lookup(lookup(&[(ENV_TOLERANCE, "1.5")]));
        assert!(matches!(result, Err(ConfigError::ToleranceOutOfRange(v)) if v == 1.5));

        let result = Config::from_lookup(lookup(&[(ENV_TOLERANCE, "ten")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_env_values() {
        let config = Config::from_lookup(lookup(&[
            (ENV_TOLERANCE, "0.25"),
            (ENV_INPUT, "frames.jsonl"),
            (ENV_OUTPUT, "-"),
            (ENV_LOG_ROTATE_SECS, "-1"),
            (ENV_AUDIT_ENABLED, "false"),
            (ENV_GATEWAY_ID, "AA555A0000000101"),
            (ENV_MAX_BATCH, "8"),
        ]))
        .unwrap();

        assert_eq!(config.tolerance.fraction(), 0.25);
        assert_eq!(config.input, Some(PathBuf::from("frames.jsonl")));
        assert_eq!(config.output, None);
        assert_eq!(config.log_rotate_interval, None);
        assert!(!config.audit_enabled);
        assert_eq!(config.gateway_id, Some(GatewayId(0xAA55_5A00_0000_0101)));
        assert_eq!(config.max_batch, 8);
    }

    #[test]
    fn test_invalid_rotation_interval() {
        for bad in ["0", "-5", "hourly"] {
            let result = Config::from_lookup(lookup(&[(ENV_LOG_ROTATE_SECS, bad)]));
            assert!(result.is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[(
            ENV_TOLERANCE_OVERRIDES,
            "26011bda=0.2, 01020304=0.05,",
        )]))
        .unwrap();

        let overrides = &config.tolerance_overrides;
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[&DeviceId::from("26011BDA")].fraction(), 0.2);
        assert_eq!(overrides[&DeviceId::from("01020304")].fraction(), 0.05);
        assert!(!overrides.contains_key(&DeviceId::from("FFFFFFFF")));
    }

    #[test]
    fn test_invalid_overrides() {
        for bad in ["26011BDA", "=0.2", "26011BDA=x"] {
            let result = Config::from_lookup(lookup(&[(ENV_TOLERANCE_OVERRIDES, bad)]));
            assert!(matches!(result, Err(ConfigError::InvalidOverride(_))), "{}", bad);
        }
        let result = Config::from_lookup(lookup(&[(ENV_TOLERANCE_OVERRIDES, "26011BDA=2")]));
        assert!(matches!(result, Err(ConfigError::ToleranceOutOfRange(_))));
    }

    #[test]
    fn test_zero_limits_rejected() {
        for key in [ENV_MAX_BATCH, ENV_MAX_BACKLOG] {
            let result = Config::from_lookup(lookup(&[(key, "0")]));
            assert!(matches!(result, Err(ConfigError::InvalidValue { .. })), "{}", key);
        }
        let config = Config::from_lookup(lookup(&[(ENV_MAX_BACKLOG, "1")])).unwrap();
        assert_eq!(config.max_backlog, 1);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = Config::from_lookup(lookup(&[(ENV_TOLERANCE, "0.25"), (ENV_INPUT, "frames.jsonl")])).unwrap();
        config.apply_cli(cli(&["-a", "0.05", "--input", "-", "-o", "out.jsonl"]).unwrap());

        assert_eq!(config.tolerance.fraction(), 0.05);
        assert_eq!(config.input, None);
        assert_eq!(config.output, Some(PathBuf::from("out.jsonl")));
    }

    #[test]
    fn test_cli_leaves_unset_options_alone() {
        let mut config = Config::from_lookup(lookup(&[(ENV_TOLERANCE, "0.25"), (ENV_OUTPUT, "out.jsonl")])).unwrap();
        config.apply_cli(cli(&[]).unwrap());

        assert_eq!(config.tolerance.fraction(), 0.25);
        assert_eq!(config.output, Some(PathBuf::from("out.jsonl")));
    }

    #[test]
    fn test_cli_tolerance_spellings() {
        for args in [
            &["--tolerance=0.2"][..],
            &["--tolerance", "0.2"],
            &["--variance=0.2"],
            &["-a", "0.2"],
            &["-a0.2"],
        ] {
            let parsed = cli(args).unwrap();
            assert_eq!(parsed.tolerance.map(|t| t.fraction()), Some(0.2), "{:?}", args);
        }
    }

    #[test]
    fn test_cli_errors() {
        use clap::error::ErrorKind;

        assert_eq!(cli(&["--variance", "1.2"]).unwrap_err().kind(), ErrorKind::ValueValidation);
        assert_eq!(cli(&["--tolerance=ten"]).unwrap_err().kind(), ErrorKind::ValueValidation);
        assert_eq!(cli(&["-a"]).unwrap_err().kind(), ErrorKind::InvalidValue);
        assert_eq!(cli(&["-r", "60"]).unwrap_err().kind(), ErrorKind::UnknownArgument);
        assert_eq!(cli(&["-h"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_tolerance_serde_validates() {
        let t: Tolerance = serde_json::from_str("0.3").unwrap();
        assert_eq!(t.fraction(), 0.3);
        assert!(serde_json::from_str::<Tolerance>("3.0").is_err());
        assert_eq!(Tolerance::new(0.1).unwrap().to_string(), "10.0%");
    }
}
