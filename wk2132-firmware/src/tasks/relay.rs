//! Relay task
//!
//! Bridges channel 0 and channel 1 in both directions. Only bytes the
//! destination can queue are taken from the source, so nothing is dropped
//! inside the relay.

use defmt::*;
use wk2132_driver::BridgeChannel;

use super::service::SERVICE_SIGNAL;
use super::SharedBridge;

/// Relay task - forwards received bytes to the other channel
#[embassy_executor::task]
pub async fn relay_task(bridge: &'static SharedBridge) {
    info!("Relay task started");

    loop {
        // Reports only pace the relay; leftovers from a partial forward
        // are retried every cycle, whatever the latest report says
        SERVICE_SIGNAL.wait().await;

        let mut bridge = bridge.lock().await;
        for (from, to) in [(0, 1), (1, 0)] {
            if bridge.channel_ref(from).map_or(0, BridgeChannel::available) == 0 {
                continue;
            }
            match bridge.forward(from, to) {
                Ok(0) => {}
                Ok(n) => trace!("Relayed {} bytes ch{} -> ch{}", n, from, to),
                Err(e) => warn!("Relay ch{} -> ch{} failed: {}", from, to, e),
            }
        }
    }
}
