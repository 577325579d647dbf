//! Accept loop pairing each PHP connection with a new IDE connection.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, info, info_span, warn};

use xdbgprxy_core::{Endpoint, ProxyConfig, TracingObserver, run_relay};

use crate::console::Console;
use crate::preflight::connect;

/// Pause after a failed `accept` so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listens for PHP and relays each connection to the IDE.
pub struct ProxyServer {
    listener: TcpListener,
    ide: Endpoint,
    sequential: bool,
    console: Console,
    tracer: TracingObserver,
}

impl ProxyServer {
    pub fn new(listener: TcpListener, config: &ProxyConfig, console: Console) -> Self {
        Self {
            listener,
            ide: config.ide.clone(),
            sequential: config.sequential,
            console,
            tracer: TracingObserver::new(config.verbose),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    ///
    /// Each session runs on its own task unless the server is sequential, in
    /// which case the next connection is accepted only after the current
    /// session has torn down. Accept and dial failures are logged and the
    /// loop keeps going.
    pub async fn serve(self) {
        self.console.status("+ Waiting for incoming PHP connections");
        let mut next_session: u64 = 0;
        loop {
            let (php, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept PHP connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            next_session += 1;

            let span = info_span!("session", id = next_session, peer = %peer);
            let session = handle_connection(php, self.ide.clone(), self.console, self.tracer)
                .instrument(span);
            if self.sequential {
                session.await;
            } else {
                tokio::spawn(session);
            }
        }
    }
}

async fn handle_connection(
    php: TcpStream,
    ide: Endpoint,
    console: Console,
    tracer: TracingObserver,
) {
    info!("Accepted PHP connection");
    console.status("- Received incoming connection from PHP");
    console.status("- Opening proxy connection to the IDE");

    let ide_stream = match connect(&ide).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(addr = %ide, error = %e, "Failed to connect to IDE, dropping PHP connection");
            console.error(&format!("! Could not connect to the IDE at {ide}: {e}"));
            return;
        }
    };

    run_relay(php, ide_stream, &(console, tracer)).await;
}
