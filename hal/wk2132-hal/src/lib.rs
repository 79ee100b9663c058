//! WK2132 Hardware Abstraction Layer
//!
//! This crate defines the two seams of the bridge driver: the I2C transport
//! it consumes and the UART byte-stream interface each bridge channel
//! exposes. Platform HALs implement [`I2cBus`] (directly, or through the
//! [`i2c::EhI2c`] adapter for any `embedded-hal` 1.0 bus); application code
//! talks to a channel through [`UartTx`] and [`UartRx`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (wk2132-firmware, etc.)    │
//! └─────────────────────────────────────────┘
//!                     │  UartTx / UartRx
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  wk2132-driver (bridge + channels)      │
//! └─────────────────────────────────────────┘
//!                     │  I2cBus
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  embedded-hal I2C / platform HAL        │
//! └─────────────────────────────────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use i2c::{BusError, EhI2c, I2cBus};
pub use uart::{DataBits, Parity, StopBits, Uart, UartConfig, UartRx, UartTx};
