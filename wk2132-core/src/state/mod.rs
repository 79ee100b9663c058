//! Lifecycle state machines
//!
//! The bridge and each of its channels follow small, explicit state
//! machines. The driver checks them before touching the bus, so calling an
//! operation out of order returns an error instead of programming a chip
//! that was never reset.

pub mod events;
pub mod machine;

pub use events::{BridgeEvent, ChannelEvent};
pub use machine::{BridgeState, ChannelState};
