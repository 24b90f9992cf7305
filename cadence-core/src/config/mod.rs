//! Configuration types
//!
//! Pin conditioning and output lane settings, optionally stored as postcard
//! binary data.

pub mod hardware;
pub mod types;

pub use hardware::*;
pub use types::*;
