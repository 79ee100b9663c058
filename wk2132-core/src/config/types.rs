//! Configuration type definitions
//!
//! These types describe one WK2132 chip and its UART channels. They are
//! usually produced from a TOML file at build time (see the firmware's
//! build script) and validated with [`BridgeConfig::validate`].

use heapless::{String, Vec};
use wk2132_hal::{Parity, StopBits, UartConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::validate::ConfigError;
use crate::regs::{CHANNEL_COUNT, DEFAULT_ADDRESS};

/// Maximum name length
pub const MAX_NAME_LEN: usize = 16;

/// Maximum channels per bridge
pub const MAX_CHANNELS: usize = CHANNEL_COUNT;

/// Default crystal frequency (Hz)
pub const DEFAULT_CRYSTAL: u32 = 14_745_600;

/// Default largest I2C transfer, in bytes
///
/// Matches the transmit buffer of common MCU I2C peripherals.
pub const DEFAULT_MAX_TRANSFER: u16 = 128;

/// Diagnostic mode of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestMode {
    /// Normal operation
    #[default]
    Off,
    /// Each channel periodically sends a counting pattern and checks it
    /// comes back (TX wired to RX)
    Loopback,
    /// Every received byte is sent back on the same channel
    Echo,
}

impl TestMode {
    /// Decode the numeric configuration value
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(TestMode::Off),
            1 => Some(TestMode::Loopback),
            2 => Some(TestMode::Echo),
            _ => None,
        }
    }

    /// Numeric configuration value
    pub fn value(&self) -> u8 {
        match self {
            TestMode::Off => 0,
            TestMode::Loopback => 1,
            TestMode::Echo => 2,
        }
    }

    /// Check if any diagnostic is active
    pub fn is_active(&self) -> bool {
        *self != TestMode::Off
    }
}

/// UART channel configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
    /// Channel name (for logs)
    pub name: String<MAX_NAME_LEN>,
    /// Channel number on the chip (0 or 1)
    pub channel: u8,
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Number of stop bits (1 or 2)
    pub stop_bits: u8,
    /// Parity mode
    pub parity: Parity,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            channel: 0,
            baud_rate: 115_200,
            stop_bits: 1,
            parity: Parity::None,
        }
    }
}

impl ChannelConfig {
    /// Create a channel configuration with 1 stop bit and no parity
    pub fn new(channel: u8, baud_rate: u32) -> Self {
        Self {
            channel,
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the channel name
    pub fn with_name(mut self, name: &str) -> Result<Self, ConfigError> {
        self.name = String::try_from(name).map_err(|_| ConfigError::NameTooLong)?;
        Ok(self)
    }

    /// Set the stop bits
    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits.count();
        self
    }

    /// Set the parity
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Typed stop bits, if the count is valid
    pub fn stop_bits(&self) -> Option<StopBits> {
        StopBits::from_count(self.stop_bits)
    }

    /// Line settings as a generic UART configuration
    pub fn uart_config(&self) -> Option<UartConfig> {
        Some(UartConfig {
            baudrate: self.baud_rate,
            parity: self.parity,
            stop_bits: self.stop_bits()?,
            ..Default::default()
        })
    }
}

/// Bridge (chip) configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BridgeConfig {
    /// Bridge name (for logs)
    pub name: String<MAX_NAME_LEN>,
    /// 7-bit base I2C address (low three bits must be zero)
    pub address: u8,
    /// Crystal frequency in Hz
    pub crystal: u32,
    /// Test mode (0 = off, 1 = loopback, 2 = echo)
    pub test_mode: u8,
    /// Largest single I2C FIFO transfer in bytes (1-256)
    pub max_transfer: u16,
    /// UART channels
    pub uart: Vec<ChannelConfig, MAX_CHANNELS>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: DEFAULT_ADDRESS,
            crystal: DEFAULT_CRYSTAL,
            test_mode: 0,
            max_transfer: DEFAULT_MAX_TRANSFER,
            uart: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with default settings and no channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel
    pub fn with_channel(mut self, channel: ChannelConfig) -> Result<Self, ConfigError> {
        self.uart
            .push(channel)
            .map_err(|_| ConfigError::TooManyChannels)?;
        Ok(self)
    }

    /// Decoded test mode, if the value is valid
    pub fn test_mode(&self) -> Option<TestMode> {
        TestMode::from_value(self.test_mode)
    }

    /// Find a channel configuration by channel number
    pub fn find_channel(&self, channel: u8) -> Option<&ChannelConfig> {
        self.uart.iter().find(|c| c.channel == channel)
    }
}
