//! Gateway identity
//!
//! The audit log is keyed by the 64-bit gateway MAC, read from the packet
//! forwarder's JSON configuration files.
//!
//! # Precedence
//! - `debug_conf.json` present: it is the only file read
//! - otherwise `global_conf.json`, then `local_conf.json` overrides it
//! - a missing file is skipped, a broken one is an error

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{DEBUG_CONF_FILE, GLOBAL_CONF_FILE, LOCAL_CONF_FILE};

#[derive(Debug, Error)]
pub enum GatewayConfigError {
    #[error("Invalid gateway id '{0}': expected up to 16 hex digits")]
    InvalidId(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 64-bit gateway MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GatewayId(pub u64);

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl FromStr for GatewayId {
    type Err = GatewayConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 16 {
            return Err(GatewayConfigError::InvalidId(s.to_string()));
        }
        u64::from_str_radix(digits, 16)
            .map(GatewayId)
            .map_err(|_| GatewayConfigError::InvalidId(s.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfFile {
    gateway_conf: Option<GatewayConf>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayConf {
    #[serde(rename = "gateway_ID")]
    gateway_id: Option<String>,
}

/// Resolve the gateway id from the configuration directory.
///
/// Returns `Ok(None)` when no file defines one.
pub fn load_gateway_id(conf_dir: &Path) -> Result<Option<GatewayId>, GatewayConfigError> {
    let debug = conf_dir.join(DEBUG_CONF_FILE);
    if debug.exists() {
        log::info!("Found debug configuration file {}, other files ignored", debug.display());
        return read_gateway_id(&debug);
    }

    let mut id = None;
    for name in [GLOBAL_CONF_FILE, LOCAL_CONF_FILE] {
        let path = conf_dir.join(name);
        if !path.exists() {
            continue;
        }
        if let Some(found) = read_gateway_id(&path)? {
            log::info!("Gateway id {} read from {}", found, path.display());
            id = Some(found);
        }
    }

    if id.is_none() {
        log::warn!("No gateway id configured in {}", conf_dir.display());
    }
    Ok(id)
}

fn read_gateway_id(path: &Path) -> Result<Option<GatewayId>, GatewayConfigError> {
    let text = fs::read_to_string(path).map_err(|source| GatewayConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let conf: ConfFile =
        serde_json::from_str(&strip_json_comments(&text)).map_err(|source| GatewayConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    conf.gateway_conf
        .and_then(|g| g.gateway_id)
        .map(|s| s.parse::<GatewayId>())
        .transpose()
}

/// Remove `//` and `/* */` comments outside of string literals
fn strip_json_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, id: &str) {
        let body = format!(
            "{{\n  /* forwarder settings */\n  \"gateway_conf\": {{\n    \"gateway_ID\": \"{}\", // MAC\n    \"server_address\": \"http://router//x\"\n  }}\n}}\n",
            id
        );
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_parse_gateway_id() {
        assert_eq!("AA555A0000000101".parse::<GatewayId>().unwrap(), GatewayId(0xAA555A0000000101));
        assert_eq!("0x1".parse::<GatewayId>().unwrap(), GatewayId(1));
        assert!("".parse::<GatewayId>().is_err());
        assert!("XYZ".parse::<GatewayId>().is_err());
        assert!("11112222333344445".parse::<GatewayId>().is_err());
        assert_eq!(GatewayId(0xAB).to_string(), "00000000000000AB");
    }

    #[test]
    fn test_local_overrides_global() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), GLOBAL_CONF_FILE, "AA555A0000000000");
        write(dir.path(), LOCAL_CONF_FILE, "AA555A0000000101");

        let id = load_gateway_id(dir.path()).unwrap();
        assert_eq!(id, Some(GatewayId(0xAA555A0000000101)));
    }

    #[test]
    fn test_global_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), GLOBAL_CONF_FILE, "AA555A0000000000");

        assert_eq!(load_gateway_id(dir.path()).unwrap(), Some(GatewayId(0xAA555A0000000000)));
    }

    #[test]
    fn test_debug_conf_shadows_everything() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), GLOBAL_CONF_FILE, "AA555A0000000000");
        write(dir.path(), LOCAL_CONF_FILE, "AA555A0000000101");
        write(dir.path(), DEBUG_CONF_FILE, "00000000DEADBEEF");

        assert_eq!(load_gateway_id(dir.path()).unwrap(), Some(GatewayId(0xDEADBEEF)));
    }

    #[test]
    fn test_missing_files() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_gateway_id(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_broken_file_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(GLOBAL_CONF_FILE), "{ not json").unwrap();

        let result = load_gateway_id(dir.path());
        assert!(matches!(result, Err(GatewayConfigError::Parse { .. })));
    }

    #[test]
    fn test_strip_comments_keeps_strings() {
        let text = r#"{"a": "x//y", /* c */ "b": "q\"/*z*/" // tail
}"#;
        let value: serde_json::Value = serde_json::from_str(&strip_json_comments(text)).unwrap();
        assert_eq!(value["a"], "x//y");
        assert_eq!(value["b"], "q\"/*z*/");
    }
}
