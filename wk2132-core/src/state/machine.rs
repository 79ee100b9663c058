//! State machine definitions

use super::events::{BridgeEvent, ChannelEvent};

/// Bridge lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeState {
    /// Constructed; channels may still be registered
    #[default]
    Created,
    /// Chip reset and global registers programmed
    Ready,
    /// Initialization failed; the chip state is unknown
    Failed,
}

impl BridgeState {
    /// Check if channels may be registered
    pub fn accepts_channels(&self) -> bool {
        matches!(self, BridgeState::Created)
    }

    /// Check if channel registers may be programmed
    pub fn is_ready(&self) -> bool {
        matches!(self, BridgeState::Ready)
    }

    /// Process an event and return the next state
    ///
    /// Initialization happens once: a bridge that is `Ready` or `Failed`
    /// ignores further initialization events.
    pub fn transition(self, event: BridgeEvent) -> Self {
        use BridgeEvent::*;
        use BridgeState::*;

        match (self, event) {
            (Created, InitSucceeded) => Ready,
            (Created, InitFailed) => Failed,
            _ => self,
        }
    }
}

/// Channel lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Registered with the bridge, nothing written to the chip yet
    #[default]
    Uninitialized,
    /// Line parameters programmed, waiting for the first service cycle
    Configured,
    /// Steady state: serviced every cycle
    Active,
}

impl ChannelState {
    /// Check if the application may queue and read bytes
    pub fn accepts_data(&self) -> bool {
        !matches!(self, ChannelState::Uninitialized)
    }

    /// Check if the service step moves bytes for this channel
    pub fn is_serviced(&self) -> bool {
        matches!(self, ChannelState::Configured | ChannelState::Active)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: ChannelEvent) -> Self {
        match (self, event) {
            // (Re)configuration always lands in Configured
            (_, ChannelEvent::Configured) => ChannelState::Configured,
            (ChannelState::Configured, ChannelEvent::Serviced) => ChannelState::Active,
            // Uninitialized channels are skipped by the service step
            (ChannelState::Uninitialized, ChannelEvent::Serviced) => ChannelState::Uninitialized,
            (ChannelState::Active, ChannelEvent::Serviced) => ChannelState::Active,
        }
    }
}
