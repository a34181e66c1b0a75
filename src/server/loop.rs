// Server loop module
// Accepts connections until shutdown, then waits for in-flight connections

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections on `listener` until `shutdown` resolves.
///
/// Must run inside a `tokio::task::LocalSet`; connections are spawned with
/// `spawn_local`. After shutdown the listener is closed and open connections
/// get up to `performance.connection_timeout` to finish.
pub async fn serve<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S)
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => break,
        }
    }

    drop(listener);
    let remaining = drain(&state).await;
    logger::log_shutdown_complete(remaining);
}

/// Wait for active connections to reach zero or the drain deadline to pass
async fn drain(state: &AppState) -> usize {
    let deadline =
        Instant::now() + Duration::from_secs(state.config.performance.connection_timeout);

    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 || Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_reusable_listener;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::task::LocalSet;

    async fn raw_get(addr: SocketAddr, path: &str, user_agent: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {path} HTTP/1.1\r\nHost: {addr}\r\nUser-Agent: {user_agent}\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    #[tokio::test]
    async fn test_serves_script_and_redirect_over_tcp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.sh"), b"#!/bin/sh\necho ok\n").unwrap();
        let cfg = Config::from_toml(&format!(
            "[assets]\ndir = {:?}\n\n[logging]\naccess_log = false\n\n[performance]\nconnection_timeout = 5\n",
            dir.path().display().to_string()
        ))
        .unwrap();
        let state = Arc::new(AppState::new(&cfg));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let local = LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(serve(listener, Arc::clone(&state), async move {
                    let _ = stop_rx.await;
                }));

                let script = raw_get(addr, "/anything?x=1", "curl/8.5.0").await;
                assert!(script.starts_with("HTTP/1.1 200 OK"), "{script}");
                assert!(script.ends_with("#!/bin/sh\necho ok\n"), "{script}");

                let redirect = raw_get(addr, "/", "Mozilla/5.0 (X11; Linux x86_64)").await;
                assert!(redirect.starts_with("HTTP/1.1 302 Found"), "{redirect}");
                assert!(
                    redirect
                        .to_ascii_lowercase()
                        .contains("location: https://github.com/uswriting/libdotnew\r\n"),
                    "{redirect}"
                );

                stop_tx.send(()).unwrap();
                server.await.unwrap();
                assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_connection_limit_rejects_extra_connections() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::from_toml(&format!(
            "[assets]\ndir = {:?}\n\n[logging]\naccess_log = false\n\n[performance]\nmax_connections = 0\nconnection_timeout = 5\n",
            dir.path().display().to_string()
        ))
        .unwrap();
        let state = Arc::new(AppState::new(&cfg));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let local = LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(serve(listener, Arc::clone(&state), async move {
                    let _ = stop_rx.await;
                }));

                // Rejected connections are closed before anything is read or written
                let mut stream = TcpStream::connect(addr).await.unwrap();
                let mut received = Vec::new();
                stream.read_to_end(&mut received).await.unwrap();
                assert!(received.is_empty());

                stop_tx.send(()).unwrap();
                server.await.unwrap();
                assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_drain_stops_at_deadline_with_open_connections() {
        let cfg = Config::from_toml("[performance]\nconnection_timeout = 1\n").unwrap();
        let state = AppState::new(&cfg);
        state.active_connections.store(1, Ordering::SeqCst);

        let started = Instant::now();
        assert_eq!(drain(&state).await, 1);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_drain_returns_immediately_when_idle() {
        let cfg = Config::from_toml("[performance]\nconnection_timeout = 30\n").unwrap();
        let state = AppState::new(&cfg);

        let started = Instant::now();
        assert_eq!(drain(&state).await, 0);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_shutdown_with_idle_connection_open() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::from_toml(&format!(
            "[assets]\ndir = {:?}\n\n[logging]\naccess_log = false\n\n[performance]\nconnection_timeout = 1\n",
            dir.path().display().to_string()
        ))
        .unwrap();
        let state = Arc::new(AppState::new(&cfg));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let local = LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(serve(listener, Arc::clone(&state), async move {
                    let _ = stop_rx.await;
                }));

                // Connect without sending a request and wait until it is counted
                let mut stream = TcpStream::connect(addr).await.unwrap();
                while state.active_connections.load(Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }

                let started = Instant::now();
                stop_tx.send(()).unwrap();
                server.await.unwrap();
                assert!(started.elapsed() < Duration::from_secs(5));

                // The idle connection is closed by its timeout
                let mut received = Vec::new();
                stream.read_to_end(&mut received).await.unwrap();
                assert!(received.is_empty());
                assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);
            })
            .await;
    }
}
