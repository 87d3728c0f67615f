//! Web server for the graph viewer
//!
//! Serves the viewer page and the exported document from a local directory
//! using Axum, scanning forward from the configured port until one binds.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::routes;

/// Errors that can occur when starting or running the server
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("{} not found. Run `kg-viewer export` first.", .0.display())]
    MissingData(PathBuf),

    #[error("Viewer page {} not found", .0.display())]
    MissingPage(PathBuf),

    #[error("Could not find an available port between {start} and {end}")]
    NoAvailablePort { start: u16, end: u16 },

    #[error("Server error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Shared application state
pub struct AppState {
    /// Directory files are served from
    pub root: PathBuf,
    /// Viewer page, relative to `root`
    pub page: String,
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub root: PathBuf,
    pub page: String,
    pub data: String,
    pub port: u16,
    pub port_attempts: u16,
    pub open_browser: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            page: "graph_viewer_simple.html".to_string(),
            data: "graph_data.json".to_string(),
            port: 8000,
            port_attempts: 10,
            open_browser: true,
        }
    }
}

/// Ensure the document and the viewer page exist under `root`
pub fn check_required_files(config: &ServeConfig) -> Result<(), ServeError> {
    let data = config.root.join(&config.data);
    if !data.is_file() {
        return Err(ServeError::MissingData(data));
    }

    let page = config.root.join(&config.page);
    if !page.is_file() {
        return Err(ServeError::MissingPage(page));
    }

    Ok(())
}

/// Bind the first free port in `start..start + attempts` on localhost
pub async fn bind_available_port(
    start: u16,
    attempts: u16,
) -> Result<(TcpListener, u16), ServeError> {
    for offset in 0..attempts {
        let Some(port) = start.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                let bound = listener.local_addr()?.port();
                return Ok((listener, bound));
            }
            Err(e) => debug!(port, error = %e, "port unavailable"),
        }
    }

    Err(ServeError::NoAvailablePort {
        start,
        end: start.saturating_add(attempts.saturating_sub(1)),
    })
}

/// URL of the viewer page for a bound port
pub fn page_url(port: u16, page: &str) -> String {
    format!("http://localhost:{}/{}", port, page.trim_start_matches('/'))
}

/// Start the web server and serve the viewer until Ctrl+C
pub async fn start_server(config: ServeConfig) -> Result<(), ServeError> {
    check_required_files(&config)?;

    let (listener, port) = bind_available_port(config.port, config.port_attempts).await?;
    if port != config.port {
        warn!("Port {} was in use, using port {} instead", config.port, port);
    }

    let state = Arc::new(AppState {
        root: config.root.clone(),
        page: config.page.clone(),
    });
    let app = routes::router(state);

    let url = page_url(port, &config.page);
    print_banner(&url, &config.root);

    if config.open_browser {
        match open::that(&url) {
            Ok(()) => info!("Browser opened"),
            Err(e) => {
                warn!("Could not open browser: {}", e);
                eprintln!("Please open {} manually", url);
            }
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("Server stopped.");
    Ok(())
}

fn print_banner(url: &str, root: &Path) {
    let rule = "=".repeat(60);
    eprintln!();
    eprintln!("{}", rule);
    eprintln!("Knowledge Graph Viewer serving {}", root.display());
    eprintln!("{}", rule);
    eprintln!();
    eprintln!("Open this URL in your browser:");
    eprintln!("   {}", url);
    eprintln!();
    eprintln!("Press Ctrl+C to stop the server");
    eprintln!("{}", rule);
    eprintln!();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
