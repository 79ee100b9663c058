//! Embassy tasks
//!
//! - `service`: periodic bridge service step
//! - `relay`: forwards bytes between the two channels

pub mod relay;
pub mod service;

use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use wk2132_driver::Bridge;
use wk2132_hal::EhI2c;

/// I2C bus the bridge sits on
pub type BridgeBus = EhI2c<I2c<'static, I2C0, Blocking>>;

/// Bridge shared between tasks
pub type SharedBridge = Mutex<CriticalSectionRawMutex, Bridge<BridgeBus>>;
