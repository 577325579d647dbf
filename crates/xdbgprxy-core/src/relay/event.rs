//! Events delivered by stream readers to the relay pump.

use std::fmt;

/// The peer a stream is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The PHP runtime (Xdebug, the debug client).
    Php,
    /// The IDE (the debug server).
    Ide,
}

impl Side {
    /// The side data read from `self` is written to.
    pub const fn peer(self) -> Self {
        match self {
            Self::Php => Self::Ide,
            Self::Ide => Self::Php,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::Ide => "ide",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stream stopped producing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed its end of the connection.
    EndOfStream,
    /// A read failed; the stream is treated as closed.
    ReadError(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream => f.write_str("end of stream"),
            Self::ReadError(e) => write!(f, "read error: {e}"),
        }
    }
}

/// One item produced by a [`StreamReader`](super::StreamReader).
///
/// `Data` chunks are never empty; closure is always an explicit `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Data(Vec<u8>),
    Closed(CloseReason),
}
