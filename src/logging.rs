//! Logger initialisation

use serde::{Deserialize, Serialize};
use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax, e.g.
/// `"info"` or `"scenegl=debug,winit=warn"`. When unset `RUST_LOG` is used,
/// falling back to `info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    /// Force ANSI colours on or off; `None` detects the terminal
    pub color: Option<bool>,
}

static INIT: Once = Once::new();

/// Initialise the global logger. Later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| install(config));
}

#[cfg(not(target_arch = "wasm32"))]
fn install(config: &LoggingConfig) {
    let mut builder = env_logger::Builder::new();

    match (&config.env_filter, std::env::var("RUST_LOG")) {
        (Some(filter), _) => {
            builder.parse_filters(filter);
        }
        (None, Ok(filter)) => {
            builder.parse_filters(&filter);
        }
        (None, Err(_)) => {
            builder.filter_level(log::LevelFilter::Info);
        }
    }

    builder.write_style(match config.color {
        Some(true) => env_logger::WriteStyle::Always,
        Some(false) => env_logger::WriteStyle::Never,
        None => env_logger::WriteStyle::Auto,
    });

    // Another logger may already be installed by the host application
    if let Err(e) = builder.try_init() {
        log::warn!("Logger not installed: {}", e);
        return;
    }
    log::debug!("Logging initialised");
}

#[cfg(target_arch = "wasm32")]
fn install(_config: &LoggingConfig) {}
