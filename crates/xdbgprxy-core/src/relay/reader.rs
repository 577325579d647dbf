//! Stream reader adapter: drains one read half into an event channel.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::event::{CloseReason, Side, StreamEvent};

/// Size of the intermediate read buffer; larger bursts arrive as several chunks.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Smallest bounded capacity tokio allows. The reader waits for the pump to
/// take each chunk, so a slow destination only stalls its own source.
const EVENT_CHANNEL_CAPACITY: usize = 1;

/// Background read pump for one side of a relay session.
///
/// Holds only read access; the write half stays with the session.
#[derive(Debug)]
pub struct StreamReader {
    side: Side,
    events: mpsc::Receiver<StreamEvent>,
    task: JoinHandle<()>,
}

impl StreamReader {
    /// Spawn a task that reads `reader` until end-of-stream or error.
    pub fn spawn<R>(side: Side, reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let task = tokio::spawn(read_loop(side, reader, tx));
        Self {
            side,
            events: rx,
            task,
        }
    }

    pub const fn side(&self) -> Side {
        self.side
    }

    /// Wait for the next event. Cancel-safe.
    ///
    /// A reader task that vanished without reporting closure (panic or
    /// abort) is reported as a read error.
    pub async fn next_event(&mut self) -> StreamEvent {
        match self.events.recv().await {
            Some(event) => event,
            None => StreamEvent::Closed(CloseReason::ReadError(
                "stream reader stopped unexpectedly".to_string(),
            )),
        }
    }

    /// Stop the read task and wait until the read half is released.
    pub async fn stop(mut self) {
        self.task.abort();
        // Either finished or cancelled; both are fine here.
        let _ = (&mut self.task).await;
    }
}

/// Dropping the reader without [`StreamReader::stop`] (for example when the
/// session future is cancelled) still ends the task, so the read half is not
/// kept alive past its session.
impl Drop for StreamReader {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn read_loop<R>(side: Side, mut reader: R, events: mpsc::Sender<StreamEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let reason = loop {
        match reader.read(&mut buf).await {
            Ok(0) => break CloseReason::EndOfStream,
            Ok(n) => {
                trace!(side = %side, bytes = n, "Read chunk");
                if events.send(StreamEvent::Data(buf[..n].to_vec())).await.is_err() {
                    debug!(side = %side, "Relay pump gone, stopping reader");
                    return;
                }
            }
            Err(e) => break CloseReason::ReadError(e.to_string()),
        }
    };
    debug!(side = %side, reason = %reason, "Stream closed");
    let _ = events.send(StreamEvent::Closed(reason)).await;
}
