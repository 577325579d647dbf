//! Colored console reporter.
//!
//! Prints one line per lifecycle event and per forwarded chunk to stdout.
//! Structured diagnostics go through `tracing` to stderr instead.

use std::io;

use crossterm::style::{Color, Stylize, style};

use xdbgprxy_core::display::{ChunkView, view_chunk};
use xdbgprxy_core::{CloseReason, ProxyConfig, RelayObserver, SessionSummary, Side};

const STATUS: Color = Color::Green;
const ERROR: Color = Color::Red;
const LOGO: Color = Color::Cyan;
const TO_IDE: Color = Color::Blue;
const TO_PHP: Color = Color::Red;

/// Human-readable reporter shared by the server and every relay session.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
    verbose: bool,
}

impl Console {
    pub const fn new(config: &ProxyConfig) -> Self {
        Self {
            color: !config.no_color,
            verbose: config.verbose,
        }
    }

    /// Lifecycle line (`+`, `-`, `?` prefixed messages).
    pub fn status(&self, line: &str) {
        print_line(&self.paint(line, STATUS));
    }

    /// Failure line (`!` prefixed messages).
    pub fn error(&self, line: &str) {
        print_line(&self.paint(line, ERROR));
    }

    pub fn logo(&self, art: &str) {
        for line in art.lines() {
            print_line(&self.paint(line, LOGO));
        }
    }

    /// Format the trace line for a chunk read from `from`.
    pub fn chunk_line(&self, from: Side, chunk: &[u8]) -> String {
        let (label, color) = match from {
            Side::Php => ("> ide: ", TO_IDE),
            Side::Ide => ("> php: ", TO_PHP),
        };
        match view_chunk(from, chunk, self.verbose) {
            ChunkView::Full(text) => format!("{label}{}", self.paint(&text, color)),
            ChunkView::Summary(bytes) => format!("{label}received {bytes} characters"),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Printed once both streams of a session are closed.
pub const COMPLETED_LINE: &str = "- Connection completed";

const fn peer_name(side: Side) -> &'static str {
    match side {
        Side::Php => "PHP",
        Side::Ide => "IDE",
    }
}

pub fn write_failed_line(to: Side, error: &io::Error) -> String {
    format!("! Error writing to {}: {error}", peer_name(to))
}

/// Line for the side whose closure ended the session. Read errors carry
/// their cause.
pub fn closed_line(side: Side, reason: &CloseReason) -> String {
    let peer = peer_name(side);
    match reason {
        CloseReason::EndOfStream => format!("! {peer} connection closed"),
        CloseReason::ReadError(e) => format!("! {peer} connection closed ({e})"),
    }
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}

impl RelayObserver for Console {
    fn chunk_received(&self, from: Side, chunk: &[u8]) {
        print_line(&self.chunk_line(from, chunk));
    }

    fn write_failed(&self, to: Side, error: &io::Error) {
        self.error(&write_failed_line(to, error));
    }

    fn side_closed(&self, side: Side, reason: &CloseReason) {
        let line = closed_line(side, reason);
        match reason {
            CloseReason::EndOfStream => self.status(&line),
            CloseReason::ReadError(_) => self.error(&line),
        }
    }

    fn session_finished(&self, _summary: &SessionSummary) {
        self.status(COMPLETED_LINE);
    }
}
