#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! End-to-end tests over loopback TCP: PHP client -> proxy -> fake IDE.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use xdbgprxy::console::Console;
use xdbgprxy::preflight::bind_listener;
use xdbgprxy::server::ProxyServer;
use xdbgprxy_core::{Endpoint, ProxyConfig};

/// Start a proxy in front of `ide_port`, returning its address.
async fn start_proxy(ide_port: u16, sequential: bool) -> (SocketAddr, JoinHandle<()>) {
    let config = ProxyConfig {
        ide: Endpoint::new("127.0.0.1", ide_port),
        listen: Endpoint::new("127.0.0.1", 0),
        no_color: true,
        sequential,
        ..ProxyConfig::default()
    };
    let listener = bind_listener(&config.listen).await.unwrap();
    let server = ProxyServer::new(listener, &config, Console::new(&config));
    let addr = server.local_addr().unwrap();
    (addr, tokio::spawn(server.serve()))
}

async fn fake_ide() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn read_n(stream: &mut TcpStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut buf))
        .await
        .unwrap()
        .unwrap();
    buf
}

async fn read_eof(stream: &mut TcpStream) -> Vec<u8> {
    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    rest
}

#[tokio::test]
async fn dbgp_exchange_passes_through_unchanged() {
    let (ide, ide_port) = fake_ide().await;
    let (proxy, handle) = start_proxy(ide_port, false).await;

    let mut php = TcpStream::connect(proxy).await.unwrap();
    let (mut ide_conn, _) = ide.accept().await.unwrap();

    let init = b"487\x00<?xml version=\"1.0\"?><init appid=\"1\" idekey=\"PHPSTORM\"/>\x00";
    php.write_all(init).await.unwrap();
    assert_eq!(read_n(&mut ide_conn, init.len()).await, init);

    let commands = b"feature_set -i 1 -n max_depth -v 1\x00run -i 2\x00";
    ide_conn.write_all(commands).await.unwrap();
    assert_eq!(read_n(&mut php, commands.len()).await, commands);

    drop(php);
    assert!(read_eof(&mut ide_conn).await.is_empty());
    handle.abort();
}

#[tokio::test]
async fn large_payload_arrives_intact() {
    let (ide, ide_port) = fake_ide().await;
    let (proxy, handle) = start_proxy(ide_port, false).await;

    let mut php = TcpStream::connect(proxy).await.unwrap();
    let (mut ide_conn, _) = ide.accept().await.unwrap();

    let payload: Vec<u8> = (0..64 * 1024).map(|i: usize| (i % 253) as u8).collect();
    php.write_all(&payload).await.unwrap();
    php.shutdown().await.unwrap();

    assert_eq!(read_eof(&mut ide_conn).await, payload);
    handle.abort();
}

#[tokio::test]
async fn ide_hangup_closes_php_connection() {
    let (ide, ide_port) = fake_ide().await;
    let (proxy, handle) = start_proxy(ide_port, false).await;

    let mut php = TcpStream::connect(proxy).await.unwrap();
    let (ide_conn, _) = ide.accept().await.unwrap();
    drop(ide_conn);

    assert!(read_eof(&mut php).await.is_empty());
    handle.abort();
}

#[tokio::test]
async fn concurrent_sessions_are_independent() {
    let (ide, ide_port) = fake_ide().await;
    let (proxy, handle) = start_proxy(ide_port, false).await;

    let mut php_a = TcpStream::connect(proxy).await.unwrap();
    let (mut ide_a, _) = ide.accept().await.unwrap();
    let mut php_b = TcpStream::connect(proxy).await.unwrap();
    let (mut ide_b, _) = ide.accept().await.unwrap();

    // Sessions pair in accept order on both ends.
    php_a.write_all(b"session-a").await.unwrap();
    php_b.write_all(b"session-b").await.unwrap();
    assert_eq!(read_n(&mut ide_a, 9).await, b"session-a");
    assert_eq!(read_n(&mut ide_b, 9).await, b"session-b");

    // Closing one session leaves the other running.
    drop(php_a);
    assert!(read_eof(&mut ide_a).await.is_empty());

    ide_b.write_all(b"still here\x00").await.unwrap();
    assert_eq!(read_n(&mut php_b, 11).await, b"still here\x00");
    handle.abort();
}

#[tokio::test]
async fn unreachable_ide_drops_php_and_keeps_accepting() {
    let (ide, ide_port) = fake_ide().await;
    drop(ide);
    let (proxy, handle) = start_proxy(ide_port, true).await;

    for _ in 0..2 {
        let mut php = TcpStream::connect(proxy).await.unwrap();
        assert!(read_eof(&mut php).await.is_empty());
    }
    assert!(!handle.is_finished());
    handle.abort();
}
