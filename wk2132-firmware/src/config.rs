//! Bridge configuration compiled in from `bridge.toml`
//!
//! `build.rs` validates the file on the host and emits plain constants, so
//! the firmware never parses TOML at runtime.

use heapless::String;
use wk2132_core::config::{BridgeConfig, ChannelConfig, ConfigError};
use wk2132_hal::Parity;

/// One `[[uart]]` entry as emitted by the build script
pub struct ChannelSpec {
    pub name: &'static str,
    pub channel: u8,
    pub baud_rate: u32,
    pub stop_bits: u8,
    pub parity: Parity,
}

include!(concat!(env!("OUT_DIR"), "/bridge_config.rs"));

/// Rebuild the validated [`BridgeConfig`] from the generated constants
pub fn bridge_config() -> Result<BridgeConfig, ConfigError> {
    let mut config = BridgeConfig {
        name: String::try_from(BRIDGE_NAME).map_err(|_| ConfigError::NameTooLong)?,
        address: ADDRESS,
        crystal: CRYSTAL,
        test_mode: TEST_MODE,
        max_transfer: MAX_TRANSFER,
        ..Default::default()
    };

    for spec in CHANNELS {
        let channel = ChannelConfig {
            channel: spec.channel,
            baud_rate: spec.baud_rate,
            stop_bits: spec.stop_bits,
            parity: spec.parity,
            ..Default::default()
        }
        .with_name(spec.name)?;
        config = config.with_channel(channel)?;
    }

    config.validate()?;
    Ok(config)
}
