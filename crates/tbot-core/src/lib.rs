//! Core domain + application logic for the translation bot.
//!
//! This crate is transport-agnostic. The directory service, the translation
//! API and the messaging transport live behind ports (traits) implemented in
//! adapter crates.

pub mod auth;
pub mod bot;
pub mod commands;
pub mod config;
pub mod directory;
pub mod domain;
pub mod envelope;
pub mod errors;
pub mod fanout;
pub mod language;
pub mod logging;
pub mod messaging;
pub mod notify;
pub mod ports;
pub mod router;
pub mod store;
pub mod threads;
pub mod utils;
pub mod words;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
