//! # photo2docx server
//!
//! Usage:
//!   photo2docx                  serve on 127.0.0.1:5000 and open the browser
//!   photo2docx --port 8080      serve on another port
//!   photo2docx --no-browser     headless start

use std::io;
use std::net::TcpListener;
use std::process::Command;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use photo2docx::server::Server;
use photo2docx::workspace::Workspace;

/// Lay out uploaded photos into a downloadable .docx report.
#[derive(Parser, Debug)]
#[command(
    name = "photo2docx",
    version,
    about = "Lay out uploaded photos into a downloadable .docx report"
)]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Do not open the upload page in the default browser.
    #[arg(long)]
    no_browser: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let workspace =
        Arc::new(Workspace::create().context("failed to create the scratch directory")?);
    init_signal_handlers(Arc::clone(&workspace))
        .context("failed to install signal handlers")?;

    let address = format!("{}:{}", cli.host, cli.port);
    let page_url = format!("http://{address}");
    let listener = match TcpListener::bind(&address) {
        Ok(listener) => listener,
        Err(error) if error.kind() == io::ErrorKind::AddrInUse => {
            // A server is already up on this address; just bring up its page.
            info!(%address, "address already in use, reusing the running server");
            if !cli.no_browser {
                open_browser(&page_url);
            }
            return Ok(());
        }
        Err(error) => return Err(error).context(format!("failed to bind {address}")),
    };

    if !cli.no_browser {
        open_browser(&page_url);
    }

    let server = Server::new(Arc::clone(&workspace));
    let outcome = server.serve(listener).context("server terminated");
    // The signal thread keeps a handle alive, so Drop alone cannot be
    // relied on here. Teardown runs at most once either way.
    workspace.teardown();
    outcome
}

/// Install handlers so the scratch directory is removed exactly once on
/// SIGINT, SIGTERM, or SIGHUP.
fn init_signal_handlers(workspace: Arc<Workspace>) -> io::Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
    thread::spawn(move || {
        for sig in signals.forever() {
            let signal_name = match sig {
                SIGINT => "SIGINT",
                SIGTERM => "SIGTERM",
                SIGHUP => "SIGHUP",
                _ => "UNKNOWN",
            };
            info!(signal = signal_name, "shutting down");
            workspace.teardown();
            std::process::exit(128 + sig);
        }
    });
    Ok(())
}

/// Open `url` with the platform opener. Failure only logs; the page is
/// still reachable by hand.
fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let spawned = Command::new("open").arg(url).spawn();
    #[cfg(target_os = "windows")]
    let spawned = Command::new("cmd").args(["/C", "start", "", url]).spawn();
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let spawned = Command::new("xdg-open").arg(url).spawn();

    match spawned {
        Ok(_) => info!(url, "opened the upload page"),
        Err(error) => warn!(%error, url, "could not open a browser"),
    }
}
