//! Relay session: pairs two duplex streams and pumps bytes between them.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf};
use tracing::debug;

use super::event::{CloseReason, Side, StreamEvent};
use super::reader::StreamReader;
use crate::observer::RelayObserver;

/// Lifecycle of a relay session. There is no way back from `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Paired,
    Relaying,
    Closed(Side),
    TornDown,
}

/// What happened during one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// The side whose read closure ended the session.
    pub closed_by: Side,
    pub reason: CloseReason,
    pub bytes_to_ide: u64,
    pub bytes_to_php: u64,
    pub chunks_to_ide: u64,
    pub chunks_to_php: u64,
    /// Forwarded chunks that could not be written and were dropped.
    pub write_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    bytes_to_ide: u64,
    bytes_to_php: u64,
    chunks_to_ide: u64,
    chunks_to_php: u64,
    write_errors: u64,
}

impl Counters {
    fn record_forwarded(&mut self, to: Side, len: usize) {
        let len = len as u64;
        match to {
            Side::Ide => {
                self.bytes_to_ide += len;
                self.chunks_to_ide += 1;
            }
            Side::Php => {
                self.bytes_to_php += len;
                self.chunks_to_php += 1;
            }
        }
    }

    fn into_summary(self, closed_by: Side, reason: CloseReason) -> SessionSummary {
        SessionSummary {
            closed_by,
            reason,
            bytes_to_ide: self.bytes_to_ide,
            bytes_to_php: self.bytes_to_php,
            chunks_to_ide: self.chunks_to_ide,
            chunks_to_php: self.chunks_to_php,
            write_errors: self.write_errors,
        }
    }
}

/// A PHP stream and an IDE stream being forwarded to each other.
///
/// The session exclusively owns both write halves; each read half lives in
/// its [`StreamReader`] task until teardown.
pub struct RelaySession<P, I> {
    php_writer: WriteHalf<P>,
    ide_writer: WriteHalf<I>,
    php_reader: StreamReader,
    ide_reader: StreamReader,
    state: SessionState,
    counters: Counters,
}

impl<P, I> RelaySession<P, I>
where
    P: AsyncRead + AsyncWrite + Send + 'static,
    I: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Split both streams and start their readers.
    pub fn pair(php: P, ide: I) -> Self {
        let (php_read, php_writer) = tokio::io::split(php);
        let (ide_read, ide_writer) = tokio::io::split(ide);
        Self {
            php_writer,
            ide_writer,
            php_reader: StreamReader::spawn(Side::Php, php_read),
            ide_reader: StreamReader::spawn(Side::Ide, ide_read),
            state: SessionState::Paired,
            counters: Counters::default(),
        }
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Relay until either side closes, then close both streams.
    pub async fn run(mut self, observer: &dyn RelayObserver) -> SessionSummary {
        self.transition(SessionState::Relaying);
        observer.session_started();

        let (closed_by, reason) = loop {
            // Unbiased: either side may win when both are ready. Ordering
            // only matters within one side, which the channel preserves.
            tokio::select! {
                event = self.php_reader.next_event() => match event {
                    StreamEvent::Data(chunk) => self.forward(Side::Php, &chunk, observer).await,
                    StreamEvent::Closed(reason) => break (Side::Php, reason),
                },
                event = self.ide_reader.next_event() => match event {
                    StreamEvent::Data(chunk) => self.forward(Side::Ide, &chunk, observer).await,
                    StreamEvent::Closed(reason) => break (Side::Ide, reason),
                },
            }
        };

        self.transition(SessionState::Closed(closed_by));
        observer.side_closed(closed_by, &reason);

        let counters = self.tear_down().await;
        let summary = counters.into_summary(closed_by, reason);
        observer.session_finished(&summary);
        summary
    }

    async fn forward(&mut self, from: Side, chunk: &[u8], observer: &dyn RelayObserver) {
        observer.chunk_received(from, chunk);
        let to = from.peer();
        let written = match to {
            Side::Ide => write_chunk(&mut self.ide_writer, chunk).await,
            Side::Php => write_chunk(&mut self.php_writer, chunk).await,
        };
        match written {
            Ok(()) => self.counters.record_forwarded(to, chunk.len()),
            // A failed write drops the chunk; only read closure ends the session.
            Err(e) => {
                self.counters.write_errors += 1;
                observer.write_failed(to, &e);
            }
        }
    }

    async fn tear_down(mut self) -> Counters {
        if let Err(e) = self.php_writer.shutdown().await {
            debug!(side = %Side::Php, error = %e, "Shutdown after close failed");
        }
        if let Err(e) = self.ide_writer.shutdown().await {
            debug!(side = %Side::Ide, error = %e, "Shutdown after close failed");
        }
        self.transition(SessionState::TornDown);

        let Self {
            php_writer,
            ide_writer,
            php_reader,
            ide_reader,
            counters,
            ..
        } = self;
        php_reader.stop().await;
        ide_reader.stop().await;
        // Dropping the last half of each stream releases the socket.
        drop(php_writer);
        drop(ide_writer);
        counters
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Relay session state");
        self.state = next;
    }
}

async fn write_chunk<W>(writer: &mut W, chunk: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(chunk).await?;
    writer.flush().await
}

/// Relay between `php` and `ide` until either side closes.
///
/// Returns only once both streams have been shut down and both readers have
/// stopped. Dropping the future early aborts both readers, which releases the
/// streams without the orderly shutdown.
pub async fn run_relay<P, I>(php: P, ide: I, observer: &dyn RelayObserver) -> SessionSummary
where
    P: AsyncRead + AsyncWrite + Send + 'static,
    I: AsyncRead + AsyncWrite + Send + 'static,
{
    RelaySession::pair(php, ide).run(observer).await
}
