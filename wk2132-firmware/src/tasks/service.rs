//! Service task
//!
//! Runs [`Bridge::service`](wk2132_driver::Bridge::service) on a fixed
//! interval and publishes the report for the relay task.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use wk2132_driver::ServiceReport;

use super::SharedBridge;
use crate::config::SERVICE_INTERVAL_MS;

/// Cycles between statistics dumps
const STATS_INTERVAL: u32 = 1000;

/// Signal carrying the latest service report
pub static SERVICE_SIGNAL: Signal<CriticalSectionRawMutex, ServiceReport> = Signal::new();

/// Service task - moves data between the chip FIFOs and the channel buffers
#[embassy_executor::task]
pub async fn service_task(bridge: &'static SharedBridge) {
    info!("Service task started ({} ms)", SERVICE_INTERVAL_MS);

    let mut ticker = Ticker::every(Duration::from_millis(SERVICE_INTERVAL_MS));

    loop {
        ticker.next().await;

        let mut bridge = bridge.lock().await;
        let report = bridge.service();

        if report.cycle % STATS_INTERVAL == 0 {
            for index in bridge.channel_indices() {
                if let Some(channel) = bridge.channel_ref(index) {
                    let stats = channel.stats();
                    info!(
                        "ch{}: sent={} received={} evicted={} rejected={} errors={}",
                        index,
                        stats.bytes_sent,
                        stats.bytes_received,
                        stats.rx_evicted,
                        stats.tx_rejected,
                        stats.bus_errors
                    );
                }
            }
        }

        drop(bridge);
        SERVICE_SIGNAL.signal(report);
    }
}
