//! `XdbgPrxy` Core Library
//!
//! Shared functionality for the Xdebug proxy:
//! - Full-duplex relay engine pairing a PHP stream with an IDE stream
//! - Relay observer side-channel and payload display helpers
//! - Configuration resolution and hierarchy
//! - Common error types and tracing initialization

pub mod config;
pub mod display;
pub mod error;
pub mod observer;
pub mod relay;
pub mod tracing_init;

pub use config::{ConfigOverrides, Endpoint, ProxyConfig};
pub use error::{Error, Result};
pub use observer::{RelayObserver, TracingObserver};
pub use relay::{CloseReason, SessionSummary, Side, run_relay};
