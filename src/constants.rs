//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Environment variable names live next to the default they override.

/// App name
pub const APP_NAME: &str = "lora-rssi-detector";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Detection
// ============================================

/// Default tolerance fraction (10% of the baseline magnitude)
pub const DEFAULT_TOLERANCE: f64 = 0.10;
pub const ENV_TOLERANCE: &str = "LORA_TOLERANCE";

/// Per-device overrides, `DEVID=0.2,DEVID2=0.05`
pub const ENV_TOLERANCE_OVERRIDES: &str = "LORA_TOLERANCE_OVERRIDES";

/// Resolve device identifiers from the LoRaWAN frame header
pub const DEFAULT_RESOLVE_DEVADDR: bool = true;
pub const ENV_RESOLVE_DEVADDR: &str = "LORA_RESOLVE_DEVADDR";

// ============================================
// Frame source / pipeline
// ============================================

/// Frames fetched per batch (concentrator RX buffer depth)
pub const DEFAULT_MAX_BATCH: usize = 16;
pub const ENV_MAX_BATCH: &str = "LORA_MAX_BATCH";

/// Sleep when a fetch returns no frames (milliseconds)
pub const DEFAULT_IDLE_SLEEP_MS: u64 = 3;
pub const ENV_IDLE_SLEEP_MS: &str = "LORA_IDLE_SLEEP_MS";

/// Output records kept while the output sink is failing
pub const DEFAULT_MAX_BACKLOG: usize = 1024;
pub const ENV_MAX_BACKLOG: &str = "LORA_MAX_BACKLOG";

/// `-` selects stdin / stdout
pub const STDIO_PATH: &str = "-";
pub const ENV_INPUT: &str = "LORA_INPUT";
pub const ENV_OUTPUT: &str = "LORA_OUTPUT";

// ============================================
// Gateway configuration files
// ============================================

pub const ENV_CONF_DIR: &str = "LORA_CONF_DIR";
pub const ENV_GATEWAY_ID: &str = "LORA_GATEWAY_ID";

/// If present, all other configuration files are ignored
pub const DEBUG_CONF_FILE: &str = "debug_conf.json";
/// Network-wide configuration
pub const GLOBAL_CONF_FILE: &str = "global_conf.json";
/// Node specific configuration, overrides the global one
pub const LOCAL_CONF_FILE: &str = "local_conf.json";

// ============================================
// Audit log
// ============================================

pub const DEFAULT_AUDIT_ENABLED: bool = true;
pub const ENV_AUDIT_ENABLED: &str = "LORA_AUDIT_ENABLED";
pub const ENV_AUDIT_DIR: &str = "LORA_AUDIT_DIR";

/// Rotate the CSV audit log every hour; `-1` disables rotation
pub const DEFAULT_LOG_ROTATE_SECS: i64 = 3600;
pub const ENV_LOG_ROTATE_SECS: &str = "LORA_LOG_ROTATE_SECS";
