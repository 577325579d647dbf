//! `XdbgPrxy` Proxy Library
//!
//! Everything around the relay engine:
//! - Console reporter with the colored per-event trace
//! - Startup banner
//! - Pre-flight checks (IDE reachable, listen port free)
//! - Accept loop that pairs each PHP connection with a fresh IDE connection

pub mod banner;
pub mod console;
pub mod preflight;
pub mod server;
