//! WK2132 bridge firmware
//!
//! Drives a WK2132 I2C dual-UART bridge from an RP2040. The chip sits on
//! I2C0 (GP4 = SDA, GP5 = SCL); its configuration is compiled in from
//! `bridge.toml`.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::i2c::{self, I2c};
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use wk2132_driver::Bridge;
use wk2132_hal::EhI2c;

use crate::tasks::SharedBridge;

mod config;
mod tasks;

// Bridge shared by the service and relay tasks (must live forever)
static BRIDGE: StaticCell<SharedBridge> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("WK2132 bridge firmware starting...");

    let p = embassy_rp::init(Default::default());

    let bridge_config = match config::bridge_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Invalid bridge configuration: {}", e);
            return;
        }
    };

    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = config::I2C_FREQUENCY;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);
    info!("I2C0 initialized at {} Hz", config::I2C_FREQUENCY);

    let mut bridge = match Bridge::from_config(EhI2c::new(i2c), &bridge_config) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Bridge setup rejected: {}", e);
            return;
        }
    };

    if let Err(e) = bridge.setup() {
        error!("Bridge {} failed to start: {}", bridge.name(), e);
        return;
    }

    let bridge = BRIDGE.init(Mutex::new(bridge));

    spawner.spawn(tasks::service::service_task(bridge)).unwrap();
    info!("Service task spawned");

    if config::RELAY && config::CHANNELS.len() == 2 {
        spawner.spawn(tasks::relay::relay_task(bridge)).unwrap();
        info!("Relay task spawned");
    }

    info!("Initialization complete");
}
