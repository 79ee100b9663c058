//! Board-agnostic core logic for the WK2132 bridge driver
//!
//! This crate contains everything about the chip that does not touch the
//! bus:
//!
//! - Register map and I2C address composition
//! - Baud-rate divisor computation
//! - Bounded byte buffers for the software side of each channel
//! - Bridge and channel lifecycle state machines
//! - Configuration types and validation
//! - Loopback self-test bookkeeping

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod baud;
pub mod buffer;
pub mod config;
pub mod regs;
pub mod selftest;
pub mod state;
