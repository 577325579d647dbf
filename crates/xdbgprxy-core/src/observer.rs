//! Relay observer side-channel.
//!
//! The relay reports lifecycle events and every forwarded chunk through a
//! [`RelayObserver`]. Observers only ever see a borrowed copy of the chunk,
//! so nothing they do can change the bytes written to the peer.

use std::io;

use tracing::{debug, info, warn};

use crate::display::{ChunkView, view_chunk};
use crate::relay::{CloseReason, SessionSummary, Side};

/// Receives relay session events. All methods default to no-ops.
pub trait RelayObserver: Send + Sync {
    fn session_started(&self) {}

    /// A chunk was read from `from` and is about to be written to its peer.
    fn chunk_received(&self, _from: Side, _chunk: &[u8]) {}

    /// Writing a chunk to `to` failed; the chunk was dropped and the session
    /// carries on.
    fn write_failed(&self, _to: Side, _error: &io::Error) {}

    /// `side` stopped producing data and the session is ending.
    fn side_closed(&self, _side: Side, _reason: &CloseReason) {}

    fn session_finished(&self, _summary: &SessionSummary) {}
}

/// Both observers see every event, `A` first.
impl<A: RelayObserver, B: RelayObserver> RelayObserver for (A, B) {
    fn session_started(&self) {
        self.0.session_started();
        self.1.session_started();
    }

    fn chunk_received(&self, from: Side, chunk: &[u8]) {
        self.0.chunk_received(from, chunk);
        self.1.chunk_received(from, chunk);
    }

    fn write_failed(&self, to: Side, error: &io::Error) {
        self.0.write_failed(to, error);
        self.1.write_failed(to, error);
    }

    fn side_closed(&self, side: Side, reason: &CloseReason) {
        self.0.side_closed(side, reason);
        self.1.side_closed(side, reason);
    }

    fn session_finished(&self, summary: &SessionSummary) {
        self.0.session_finished(summary);
        self.1.session_finished(summary);
    }
}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver {
    verbose: bool,
}

impl TracingObserver {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl RelayObserver for TracingObserver {
    fn session_started(&self) {
        debug!("Relay session started");
    }

    fn chunk_received(&self, from: Side, chunk: &[u8]) {
        match view_chunk(from, chunk, self.verbose) {
            ChunkView::Full(text) => {
                debug!(from = %from, to = %from.peer(), bytes = chunk.len(), payload = %text, "Forwarding chunk");
            }
            ChunkView::Summary(bytes) => {
                debug!(from = %from, to = %from.peer(), bytes, "Forwarding chunk");
            }
        }
    }

    fn write_failed(&self, to: Side, error: &io::Error) {
        warn!(to = %to, error = %error, "Failed to forward chunk");
    }

    fn side_closed(&self, side: Side, reason: &CloseReason) {
        info!(side = %side, reason = %reason, "Connection closed");
    }

    fn session_finished(&self, summary: &SessionSummary) {
        info!(
            closed_by = %summary.closed_by,
            bytes_to_ide = summary.bytes_to_ide,
            bytes_to_php = summary.bytes_to_php,
            write_errors = summary.write_errors,
            "Relay session completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncWriteExt;

    struct Silent;

    impl RelayObserver for Silent {}

    #[tokio::test]
    async fn default_observer_methods_are_noops() {
        let (php_peer, php_local) = tokio::io::duplex(64);
        let (_ide_peer, ide_local) = tokio::io::duplex(64);
        drop(php_peer);
        let summary = crate::relay::run_relay(php_local, ide_local, &Silent).await;
        assert_eq!(summary.closed_by, Side::Php);
    }

    #[derive(Default)]
    struct Counting {
        chunks: AtomicUsize,
        finished: AtomicUsize,
    }

    impl RelayObserver for Counting {
        fn chunk_received(&self, _from: Side, _chunk: &[u8]) {
            self.chunks.fetch_add(1, Ordering::SeqCst);
        }

        fn session_finished(&self, _summary: &SessionSummary) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn paired_observers_both_see_events() {
        let (mut php_peer, php_local) = tokio::io::duplex(64);
        let (_ide_peer, ide_local) = tokio::io::duplex(64);
        php_peer.write_all(b"<init/>").await.unwrap();
        drop(php_peer);

        let observer = (Counting::default(), (TracingObserver::new(true), Counting::default()));
        let summary = crate::relay::run_relay(php_local, ide_local, &observer).await;

        assert_eq!(summary.reason, CloseReason::EndOfStream);
        assert_eq!(observer.0.chunks.load(Ordering::SeqCst), 1);
        assert_eq!(observer.0.finished.load(Ordering::SeqCst), 1);
        assert_eq!(observer.1.1.chunks.load(Ordering::SeqCst), 1);
        assert_eq!(observer.1.1.finished.load(Ordering::SeqCst), 1);
    }
}
