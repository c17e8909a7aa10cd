//! End-to-end tests over loopback sockets.

use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

use pageserve::config::ServerConfig;
use pageserve::error::TransportError;
use pageserve::http::resource::FsStore;
use pageserve::server::{Listener, Server};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

fn loopback(max_workers: usize, max_queued: Option<usize>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_workers,
        max_queued,
        ..ServerConfig::default()
    }
}

fn pages(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), TransportError>>,
}

async fn start(cfg: ServerConfig, dir: &TempDir) -> Running {
    let server = Server::bind_with_store(&cfg, FsStore::new(dir.path()))
        .await
        .unwrap();
    let addr = server.local_addr();
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(server.run_until(async {
        let _ = stopped.await;
    }));

    Running { addr, stop, handle }
}

async fn exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(request).await.unwrap();

    let mut buf = Vec::new();
    client.read_to_end(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn test_get_existing_page() {
    let dir = pages(&[("hello.txt", "hi")]);
    let server = start(loopback(5, None), &dir).await;

    let resp = exchange(server.addr, b"GET /hello.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(resp, b"HTTP/1.1 200 OK\r\n\r\nhi\r\n".to_vec());
    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_get_missing_page() {
    let dir = pages(&[("hello.txt", "hi")]);
    let server = start(loopback(5, None), &dir).await;

    let resp = exchange(server.addr, b"GET /missing.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(resp, b"HTTP/1.1 404 NOT FOUND\r\n\r\n\r\n".to_vec());
    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_malformed_request_line() {
    let dir = pages(&[]);
    let server = start(loopback(5, None), &dir).await;

    let resp = exchange(server.addr, b"BLAH\r\n\r\n").await;

    assert_eq!(resp, b"HTTP/1.1 400 BAD REQUEST\r\n\r\n\r\n".to_vec());
    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_non_get_method() {
    let dir = pages(&[("hello.txt", "hi")]);
    let server = start(loopback(5, None), &dir).await;

    let resp = exchange(server.addr, b"POST /hello.txt HTTP/1.0\r\n\r\nbody").await;

    assert!(resp.starts_with(b"HTTP/1.1 404 NOT FOUND\r\n"));
    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_peer_sends_nothing() {
    let dir = pages(&[]);
    let server = start(loopback(5, None), &dir).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    client.shutdown().await.unwrap();
    let mut buf = Vec::new();
    client.read_to_end(&mut buf).await.unwrap();

    assert_eq!(buf, b"HTTP/1.1 500 INTERNAL SERVER ERROR\r\n\r\n\r\n".to_vec());
    server.stop.send(()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_get_their_own_bodies() {
    let files: Vec<(String, String)> = (0..5)
        .map(|i| (format!("page{}.txt", i), format!("contents of page {}", i)))
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();
    let dir = pages(&refs);
    let server = start(loopback(5, None), &dir).await;

    let clients: Vec<_> = files
        .iter()
        .cloned()
        .map(|(name, contents)| {
            let addr = server.addr;
            tokio::spawn(async move {
                let request = format!("GET /{} HTTP/1.1\r\n\r\n", name);
                let resp = exchange(addr, request.as_bytes()).await;
                (resp, format!("HTTP/1.1 200 OK\r\n\r\n{}\r\n", contents))
            })
        })
        .collect();

    for client in clients {
        let (resp, expected) = client.await.unwrap();
        assert_eq!(String::from_utf8(resp).unwrap(), expected);
    }
    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_requests_beyond_capacity_are_queued() {
    let dir = pages(&[("hello.txt", "hi")]);
    let server = start(loopback(1, None), &dir).await;

    // Occupy the only worker until we send the request.
    let mut slow = TcpStream::connect(server.addr).await.unwrap();

    let queued = tokio::spawn(exchange(server.addr, b"GET /hello.txt HTTP/1.1\r\n\r\n"));

    slow.write_all(b"GET /hello.txt HTTP/1.1\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    slow.read_to_end(&mut buf).await.unwrap();

    assert_eq!(buf, b"HTTP/1.1 200 OK\r\n\r\nhi\r\n".to_vec());
    assert_eq!(queued.await.unwrap(), b"HTTP/1.1 200 OK\r\n\r\nhi\r\n".to_vec());
    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_saturated_pool_drops_connection() {
    let dir = pages(&[("hello.txt", "hi")]);
    let server = start(loopback(1, Some(0)), &dir).await;

    let mut busy = TcpStream::connect(server.addr).await.unwrap();

    // Rejected: closed without a response.
    let mut rejected = TcpStream::connect(server.addr).await.unwrap();
    let mut buf = Vec::new();
    let _ = rejected.read_to_end(&mut buf).await;
    assert!(buf.is_empty());

    busy.write_all(b"GET /hello.txt HTTP/1.1\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    busy.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, b"HTTP/1.1 200 OK\r\n\r\nhi\r\n".to_vec());

    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_stop_releases_listening_socket() {
    let dir = pages(&[]);
    let server = start(loopback(2, None), &dir).await;

    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();

    assert!(TcpStream::connect(server.addr).await.is_err());
}

#[tokio::test]
async fn test_bind_port_in_use_is_fatal() {
    let first = Listener::bind(&loopback(1, None)).await.unwrap();

    let cfg = ServerConfig {
        port: first.local_addr().port(),
        ..loopback(1, None)
    };
    let err = Listener::bind(&cfg).await.err().unwrap();

    assert!(matches!(err, TransportError::Bind { .. }));
}

#[tokio::test]
async fn test_stop_lets_accepted_connection_finish() {
    let dir = pages(&[("hello.txt", "hi")]);
    let server = Server::bind_with_store(&loopback(2, None), FsStore::new(dir.path()))
        .await
        .unwrap();
    let addr = server.local_addr();
    let pool = server.pool().clone();
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(server.serve_until(async {
        let _ = stopped.await;
    }));

    let mut client = TcpStream::connect(addr).await.unwrap();
    while pool.active() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    stop.send(()).unwrap();
    while !pool.is_closed() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Listener is gone but the accepted connection is still being served.
    assert!(TcpStream::connect(addr).await.is_err());
    assert!(!handle.is_finished());

    client.write_all(b"GET /hello.txt HTTP/1.1\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    client.read_to_end(&mut buf).await.unwrap();

    assert_eq!(buf, b"HTTP/1.1 200 OK\r\n\r\nhi\r\n".to_vec());
    handle.await.unwrap().unwrap();
    assert_eq!(pool.active(), 0);
}
