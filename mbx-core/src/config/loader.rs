//! TOML configuration loading
//!
//! Host tools and bench tests describe a node in TOML:
//!
//! ```toml
//! [broker]
//! sender_id = "mbx"
//! status_overflow = { block = { timeout_ms = 50 } }
//!
//! [radio]
//! mode = "TxOnly"
//! cycle_period_ms = 60000
//! ```
//!
//! Missing keys take their defaults.

use super::types::{ConfigError, NodeConfig};

/// Parse and validate a node configuration
pub fn parse_config(input: &str) -> Result<NodeConfig, ConfigError> {
    let config: NodeConfig = toml::from_str(input).map_err(|_e| {
        warn!("TOML parse error");
        ConfigError::TomlParse
    })?;
    let config = config.validated()?;
    debug!(
        "Loaded config for {}: radio period {} ms",
        config.broker.sender_id.as_str(),
        config.radio.cycle_period_ms
    );
    Ok(config)
}
