//! Driver error type

use wk2132_core::config::ConfigError;

/// Errors returned by the bridge and its channels
///
/// `E` is the error type of the underlying [`I2cBus`](wk2132_hal::I2cBus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Invalid configuration
    Config(ConfigError),
    /// No device answered at the base address
    DeviceNotFound,
    /// I2C transaction failed
    Bus(E),
    /// No divisor reaches the rate within tolerance
    UnsupportedBaudRate {
        /// Requested rate
        baud_rate: u32,
    },
    /// Transmit buffer cannot take a single byte
    BufferFull,
    /// Bridge or channel used before initialization
    NotInitialized,
    /// `initialize()` called on a bridge that already ran it
    AlreadyInitialized,
    /// No channel registered at this index
    UnknownChannel(u8),
}

impl<E> From<ConfigError> for Error<E> {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl<E: core::fmt::Display> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(err) => write!(f, "configuration error: {}", err),
            Error::DeviceNotFound => f.write_str("no WK2132 at the configured address"),
            Error::Bus(err) => write!(f, "i2c: {}", err),
            Error::UnsupportedBaudRate { baud_rate } => {
                write!(f, "baud rate {} not reachable with this crystal", baud_rate)
            }
            Error::BufferFull => f.write_str("transmit buffer full"),
            Error::NotInitialized => f.write_str("not initialized"),
            Error::AlreadyInitialized => f.write_str("already initialized"),
            Error::UnknownChannel(index) => write!(f, "no channel {}", index),
        }
    }
}
