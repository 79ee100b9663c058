//! Events that trigger state transitions

/// Events in the bridge lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeEvent {
    /// Chip answered and the global registers were programmed
    InitSucceeded,
    /// Chip did not answer, or a global register write failed
    InitFailed,
}

/// Events in a channel lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelEvent {
    /// Line parameters were written to the chip
    Configured,
    /// The periodic service step reached the channel
    Serviced,
}
