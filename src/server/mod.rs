// Server module entry point
// Listener setup, connection handling and graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_reusable_listener;
pub use server_loop::serve;

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

/// Serve until SIGINT/SIGTERM (Ctrl+C off Unix)
pub async fn run(listener: TcpListener, state: Arc<AppState>) {
    serve(listener, state, async {
        let signal = signal::wait_for_shutdown().await;
        logger::log_shutdown_requested(signal);
    })
    .await;
}
