//! Configuration types
//!
//! Board-agnostic bridge and channel configuration, with the defaults of
//! the reference board and a validation pass run before the driver is
//! constructed.

pub mod types;
pub mod validate;

pub use types::*;
pub use validate::ConfigError;
