//! WK2132 I2C dual-UART bridge driver
//!
//! The WK2132 puts two UARTs behind one I2C base address. This crate
//! provides:
//!
//! - [`Bridge`]: owns the bus and the chip-wide registers, initializes the
//!   chip and runs the periodic service step
//! - [`BridgeChannel`]: per-channel line parameters, software buffers and
//!   FIFO transfers
//! - [`ChannelUart`]: a channel handle implementing the generic
//!   [`UartTx`](wk2132_hal::UartTx) / [`UartRx`](wk2132_hal::UartRx) traits
//!
//! # Example
//!
//! ```ignore
//! let config = BridgeConfig::new()
//!     .with_channel(ChannelConfig::new(0, 9600))?
//!     .with_channel(ChannelConfig::new(1, 115_200))?;
//!
//! let mut bridge = Bridge::from_config(EhI2c::new(i2c), &config)?;
//! bridge.setup()?;
//!
//! loop {
//!     bridge.service();
//!     let mut uart = bridge.channel(0)?;
//!     while let Some(byte) = uart.read_byte()? {
//!         // ...
//!     }
//! }
//! ```
//!
//! # Logging
//!
//! Enable the `defmt` or the `log` feature to get driver logs through that
//! backend. Without either, logging compiles away.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod bridge;
pub mod channel;
pub mod error;
pub mod registers;
pub mod uart;

#[cfg(test)]
mod sim;

pub use bridge::{Bridge, ServiceReport};
pub use channel::{BridgeChannel, ChannelReport, ChannelStats};
pub use error::Error;
pub use registers::Scope;
pub use uart::ChannelUart;
