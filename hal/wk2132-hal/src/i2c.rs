//! I2C bus abstractions
//!
//! Provides the transport trait the bridge driver is written against, and
//! an adapter for buses implementing [`embedded_hal::i2c::I2c`].

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

/// I2C bus master
///
/// Synchronous 7-bit-address transactions. Each call is bounded by the
/// transport's own timeout and reports NACK or timeout through `Error`.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read(self, address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::write_read(self, address, write_data, read_buf)
    }
}

/// Error from I2C operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Bus error (misplaced START/STOP)
    Bus,
    /// Arbitration lost
    ArbitrationLost,
    /// NACK received (address or data)
    Nack,
    /// Overrun
    Overrun,
    /// Timeout
    Timeout,
    /// Other error
    Other,
}

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Bus => BusError::Bus,
            ErrorKind::ArbitrationLoss => BusError::ArbitrationLost,
            ErrorKind::NoAcknowledge(_) => BusError::Nack,
            ErrorKind::Overrun => BusError::Overrun,
            _ => BusError::Other,
        }
    }
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            BusError::Bus => "bus error",
            BusError::ArbitrationLost => "arbitration lost",
            BusError::Nack => "no acknowledge",
            BusError::Overrun => "overrun",
            BusError::Timeout => "timeout",
            BusError::Other => "i2c error",
        };
        f.write_str(msg)
    }
}

/// [`I2cBus`] adapter for any `embedded-hal` 1.0 blocking I2C master
///
/// Errors are reduced to their [`ErrorKind`] so the driver does not have to
/// carry the platform error type around.
pub struct EhI2c<T> {
    inner: T,
}

impl<T: I2c> EhI2c<T> {
    /// Wrap an `embedded-hal` I2C bus
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Release the wrapped bus
    pub fn release(self) -> T {
        self.inner
    }
}

impl<T: I2c> I2cBus for EhI2c<T> {
    type Error = BusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.inner
            .write(address, data)
            .map_err(|e| BusError::from(e.kind()))
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.inner
            .read(address, buf)
            .map_err(|e| BusError::from(e.kind()))
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), BusError> {
        self.inner
            .write_read(address, write_data, read_buf)
            .map_err(|e| BusError::from(e.kind()))
    }
}
