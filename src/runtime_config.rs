//! Environment-based runtime configuration.
//!
//! - `ROUTEKIT_STACK_SIZE` - coroutine stack size in bytes, decimal or
//!   `0x`-prefixed hex. Default `0x4000` (16 KB). Total memory is
//!   stack_size × concurrent coroutines; tune to handler depth.
//! - `ROUTEKIT_ADDR` - bind address, default `0.0.0.0:8080`.
//! - `ROUTEKIT_DATA_DIR` - directory the flat-file collections live in,
//!   default `data`.
//!
//! CLI flags on the service binary override these.

use std::env;
use std::path::PathBuf;

/// Runtime configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Stack size for handler coroutines in bytes.
    pub stack_size: usize,
    /// Address the HTTP server binds to.
    pub addr: String,
    /// Directory holding the flat-file collections.
    pub data_dir: PathBuf,
}

impl RuntimeConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = match env::var("ROUTEKIT_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        let addr = env::var("ROUTEKIT_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let data_dir = env::var("ROUTEKIT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        RuntimeConfig {
            stack_size,
            addr,
            data_dir,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_size: 0x4000,
            addr: "0.0.0.0:8080".to_string(),
            data_dir: PathBuf::from("data"),
        }
    }
}
