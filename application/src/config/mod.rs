//! Application-level configuration.
//!
//! - [`RelayParams`]: token budget, exchange deadline, fan-out width

pub mod relay_params;

pub use relay_params::RelayParams;
