//! Base-protocol event handlers (spec §4.4-§4.7), each a pure function
//! from current state + one decoded operation to a `Result` the
//! dispatcher either applies or logs as a rejection.

pub mod deploy;
pub mod inscribe_transfer;
pub mod mint;
pub mod spend;
