//! Configuration validation
//!
//! Catches everything that can be checked without talking to the chip:
//! ranges, the address layout and duplicate channel numbers. The driver
//! repeats the per-channel checks when a channel is registered, so a
//! configuration that skipped this pass still cannot corrupt the bridge.

use super::types::{BridgeConfig, ChannelConfig, TestMode};
use crate::regs::{ADDRESS_SELECT_MASK, CHANNEL_COUNT, FIFO_SIZE};

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Two channels use the same channel number
    DuplicateChannel(u8),
    /// Channel number is not 0 or 1
    InvalidChannel(u8),
    /// More than two channels
    TooManyChannels,
    /// No channel configured
    NoChannels,
    /// Baud rate is zero
    InvalidBaudRate(u32),
    /// Stop bits is not 1 or 2
    InvalidStopBits(u8),
    /// Crystal frequency is zero
    InvalidCrystal,
    /// Address is not 7-bit or uses the channel/FIFO select bits
    InvalidAddress(u8),
    /// Unknown test mode value
    InvalidTestMode(u8),
    /// Transfer size outside 1..=256
    InvalidTransferSize(u16),
    /// Name longer than the maximum label length
    NameTooLong,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::DuplicateChannel(c) => write!(f, "duplicate channel number {}", c),
            ConfigError::InvalidChannel(c) => write!(f, "channel {} does not exist (0 or 1)", c),
            ConfigError::TooManyChannels => f.write_str("at most two channels per bridge"),
            ConfigError::NoChannels => f.write_str("at least one channel is required"),
            ConfigError::InvalidBaudRate(b) => write!(f, "invalid baud rate {}", b),
            ConfigError::InvalidStopBits(s) => write!(f, "stop bits must be 1 or 2, got {}", s),
            ConfigError::InvalidCrystal => f.write_str("crystal frequency must be positive"),
            ConfigError::InvalidAddress(a) => write!(f, "invalid base address {:#04x}", a),
            ConfigError::InvalidTestMode(m) => write!(f, "unknown test mode {}", m),
            ConfigError::InvalidTransferSize(n) => write!(f, "transfer size {} not in 1..=256", n),
            ConfigError::NameTooLong => f.write_str("name too long"),
        }
    }
}

impl ChannelConfig {
    /// Check the channel settings in isolation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel as usize >= CHANNEL_COUNT {
            return Err(ConfigError::InvalidChannel(self.channel));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate(self.baud_rate));
        }
        if self.stop_bits().is_none() {
            return Err(ConfigError::InvalidStopBits(self.stop_bits));
        }
        Ok(())
    }
}

impl BridgeConfig {
    /// Check the whole configuration
    ///
    /// Channels are checked in declaration order, so the first offending
    /// channel is the one reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_settings()?;
        if self.uart.is_empty() {
            return Err(ConfigError::NoChannels);
        }

        let mut seen = [false; CHANNEL_COUNT];
        for channel in &self.uart {
            channel.validate()?;
            let slot = &mut seen[channel.channel as usize];
            if *slot {
                return Err(ConfigError::DuplicateChannel(channel.channel));
            }
            *slot = true;
        }
        Ok(())
    }

    /// Check the chip-level settings, ignoring the channel list
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        validate_address(self.address)?;
        if self.crystal == 0 {
            return Err(ConfigError::InvalidCrystal);
        }
        if TestMode::from_value(self.test_mode).is_none() {
            return Err(ConfigError::InvalidTestMode(self.test_mode));
        }
        if self.max_transfer == 0 || self.max_transfer as usize > FIFO_SIZE {
            return Err(ConfigError::InvalidTransferSize(self.max_transfer));
        }
        Ok(())
    }
}

/// Check a base address
pub fn validate_address(address: u8) -> Result<(), ConfigError> {
    if address > 0x7F || address & ADDRESS_SELECT_MASK != 0 {
        return Err(ConfigError::InvalidAddress(address));
    }
    Ok(())
}
