mod config;
mod data;
#[cfg(feature = "desktop")]
mod launcher;
mod net;
mod processing;
mod render;
mod web;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Runtime;

use config::Config;
use web::AppContext;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    let host = config.host.unwrap_or_else(net::local_ip);
    let addr = SocketAddr::new(host, config.port);
    let headless = config.headless;
    let ctx = Arc::new(AppContext::new(config));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    if headless {
        run_headless(runtime, ctx, addr)
    } else {
        run_with_launcher(runtime, ctx, addr)
    }
}

fn run_headless(runtime: Runtime, ctx: Arc<AppContext>, addr: SocketAddr) -> anyhow::Result<()> {
    runtime.block_on(web::serve(ctx, addr, async {
        let _ = tokio::signal::ctrl_c().await;
    }))
}

/// Server on a background thread, launcher window on the main thread.
#[cfg(feature = "desktop")]
fn run_with_launcher(runtime: Runtime, ctx: Arc<AppContext>, addr: SocketAddr) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let done = Arc::new(AtomicBool::new(false));
    let server_done = done.clone();

    let server = std::thread::spawn(move || {
        let shutdown = async move {
            let _ = stop_rx.await;
        };
        if let Err(e) = runtime.block_on(web::serve(ctx, addr, shutdown)) {
            tracing::error!("Failed to start the server: {e:#}");
        }
        server_done.store(true, Ordering::Release);
    });

    let result = launcher::run(format!("http://{addr}"), done);

    let _ = stop_tx.send(());
    if server.join().is_err() {
        tracing::error!("server thread panicked");
    }
    result.map_err(|e| anyhow::anyhow!("launcher window failed: {e}"))
}

#[cfg(not(feature = "desktop"))]
fn run_with_launcher(runtime: Runtime, ctx: Arc<AppContext>, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::warn!("built without the desktop feature, serving headless");
    run_headless(runtime, ctx, addr)
}
