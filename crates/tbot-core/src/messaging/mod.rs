//! Transport-facing types: inbound events and the outbound sender port.

pub mod port;
pub mod types;
