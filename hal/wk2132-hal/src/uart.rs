//! UART serial communication abstractions
//!
//! Byte-stream traits implemented by each bridge channel. Both directions
//! are non-blocking: writes are queued and reads return whatever has
//! already been received. The actual bus traffic happens in the driver's
//! periodic service step.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Queue data for transmission
    ///
    /// Never blocks. Returns the number of bytes accepted, which may be
    /// less than `data.len()` when the transmit buffer is nearly full; the
    /// caller must retry the remainder.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Queue a single byte
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.write(&[byte]).map(|_| ())
    }

    /// Push queued data towards the wire
    ///
    /// Implementations without a synchronous drain move as much as the
    /// hardware accepts now and leave the rest for the next service cycle.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Read received data
    ///
    /// Never blocks. Returns the number of bytes copied into `buf`, oldest
    /// first; zero when nothing has been received.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Number of bytes ready to be read
    fn available(&self) -> usize;

    /// Next byte to be read, without consuming it
    fn peek(&self) -> Option<u8>;

    /// Read a single byte if one is available
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut buf = [0u8; 1];
        let n = self.read(&mut buf)?;
        Ok((n == 1).then_some(buf[0]))
    }
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

impl DataBits {
    /// Bit count as a number
    pub fn bits(&self) -> u8 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

impl Parity {
    /// Upper-case name, as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Parity::None => "NONE",
            Parity::Even => "EVEN",
            Parity::Odd => "ODD",
        }
    }
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    /// Convert a stop-bit count (1 or 2)
    pub fn from_count(count: u8) -> Option<Self> {
        match count {
            1 => Some(StopBits::One),
            2 => Some(StopBits::Two),
            _ => None,
        }
    }

    /// Stop-bit count as a number
    pub fn count(&self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}
