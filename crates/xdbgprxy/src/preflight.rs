//! Startup checks run before the proxy accepts any connection.
//!
//! Both failures are fatal: there is no session to keep alive yet, so the
//! caller reports the guidance and exits non-zero.

use std::io;

use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use xdbgprxy_core::Endpoint;

#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error("IDE does not seem to be available at {addr}: {source}")]
    IdeUnreachable {
        addr: Endpoint,
        #[source]
        source: io::Error,
    },

    #[error("Port doesn't seem to be available at {addr}: {source}")]
    PortUnavailable {
        addr: Endpoint,
        #[source]
        source: io::Error,
    },
}

impl PreflightError {
    /// What the user should check next.
    pub const fn guidance(&self) -> &'static str {
        match self {
            Self::IdeUnreachable { .. } => {
                "Check if you are using the correct host and port, and that the debugger in your IDE is turned on."
            }
            Self::PortUnavailable { .. } => {
                "Stop the service occupying it or pick another --listen-port."
            }
        }
    }
}

/// Open and immediately close a connection to the IDE.
pub async fn check_ide_reachable(ide: &Endpoint) -> Result<(), PreflightError> {
    let stream = connect(ide)
        .await
        .map_err(|source| PreflightError::IdeUnreachable {
            addr: ide.clone(),
            source,
        })?;
    debug!(addr = %ide, "IDE is reachable");
    drop(stream);
    Ok(())
}

/// Bind the listening socket PHP will connect to.
pub async fn bind_listener(listen: &Endpoint) -> Result<TcpListener, PreflightError> {
    TcpListener::bind((listen.host.as_str(), listen.port))
        .await
        .map_err(|source| PreflightError::PortUnavailable {
            addr: listen.clone(),
            source,
        })
}

/// Dial `endpoint`, resolving the host name if needed.
pub async fn connect(endpoint: &Endpoint) -> io::Result<TcpStream> {
    TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await
}

/// The `php.ini` settings that point Xdebug at this proxy.
pub fn php_ini_hint(listen: &Endpoint) -> [String; 2] {
    [
        format!(
            "? Set 'xdebug.client_host={}' and 'xdebug.client_port={}'",
            listen.host, listen.port
        ),
        "  in your php.ini configuration to connect to this proxy.".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn reachable_ide_passes() {
        let ide = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = ide.local_addr().unwrap().port();
        check_ide_reachable(&Endpoint::new("127.0.0.1", port))
            .await
            .unwrap();
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn closed_ide_port_is_reported() {
        let ide = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = ide.local_addr().unwrap().port();
        drop(ide);

        let err = check_ide_reachable(&Endpoint::new("127.0.0.1", port))
            .await
            .unwrap_err();
        assert!(matches!(err, PreflightError::IdeUnreachable { .. }));
        assert!(err.guidance().contains("debugger in your IDE"));
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn occupied_port_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind_listener(&Endpoint::new("127.0.0.1", port))
            .await
            .unwrap_err();
        assert!(matches!(err, PreflightError::PortUnavailable { .. }));
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    }

    #[test]
    fn hint_names_listen_endpoint() {
        let [first, second] = php_ini_hint(&Endpoint::new("0.0.0.0", 9004));
        assert_eq!(
            first,
            "? Set 'xdebug.client_host=0.0.0.0' and 'xdebug.client_port=9004'"
        );
        assert!(second.contains("php.ini"));
    }
}
