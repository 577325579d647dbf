//! Full-duplex relay between a PHP stream and an IDE stream.
//!
//! Each stream is split; its read half is drained by a [`StreamReader`] task
//! that turns reads into [`StreamEvent`]s, and the session pump multiplexes
//! both event channels, writing every chunk verbatim to the opposite write
//! half until one side closes.

mod event;
mod reader;
mod session;

pub use event::{CloseReason, Side, StreamEvent};
pub use reader::{READ_BUFFER_SIZE, StreamReader};
pub use session::{RelaySession, SessionState, SessionSummary, run_relay};
