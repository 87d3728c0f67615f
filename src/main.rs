//! kg-viewer CLI - Knowledge Graph Viewer
//!
//! Exports a GraphML knowledge graph to vis.js JSON and serves the viewer.
//!
//! Usage:
//!   kg-viewer export [OPTIONS]
//!   kg-viewer serve [OPTIONS]

use std::io::stdout;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use kg_viewer::{
    ViewerConfig, export_graph, load_config, load_config_file, load_graphml,
    web::{ServeConfig, start_server},
    write_document, write_export_summary,
};

/// kg-viewer - Browse a GraphML knowledge graph in the browser
#[derive(Parser, Debug)]
#[command(name = "kg-viewer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (default: search for kg-viewer.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a GraphML file into the viewer's JSON document
    Export(ExportArgs),
    /// Serve the viewer page and JSON document over local HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// GraphML file to read
    #[arg(long)]
    graphml: Option<PathBuf>,

    /// JSON file to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Max characters in a node tooltip
    #[arg(long)]
    node_title_limit: Option<usize>,

    /// Max characters in an edge tooltip
    #[arg(long)]
    edge_title_limit: Option<usize>,

    /// Separator between description segments (default: <SEP>)
    #[arg(long)]
    separator: Option<String>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Directory to serve
    #[arg(long)]
    root: Option<PathBuf>,

    /// Viewer page, relative to the root
    #[arg(long)]
    page: Option<String>,

    /// JSON document, relative to the root
    #[arg(long)]
    data: Option<String>,

    /// First port to try (default: 8000)
    #[arg(short, long)]
    port: Option<u16>,

    /// How many consecutive ports to try (default: 10)
    #[arg(long)]
    port_attempts: Option<u16>,

    /// Don't open browser automatically
    #[arg(long)]
    no_open: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(quiet: bool, verbose: u8) {
    let filter = match (quiet, verbose) {
        (true, _) => "error",
        (_, 0) => "info",
        (_, 1) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => load_config(Path::new("."))?,
    };

    match cli.command {
        Commands::Export(args) => run_export(&mut config, args),
        Commands::Serve(args) => run_serve(&mut config, args),
    }
}

fn run_export(
    config: &mut ViewerConfig,
    args: ExportArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    // CLI args override config, which overrides defaults
    if let Some(path) = args.graphml {
        config.export.graphml = path;
    }
    if let Some(path) = args.output {
        config.export.output = path;
    }
    if let Some(limit) = args.node_title_limit {
        config.export.node_title_limit = limit;
    }
    if let Some(limit) = args.edge_title_limit {
        config.export.edge_title_limit = limit;
    }
    if let Some(separator) = args.separator {
        config.export.separator = separator;
    }
    config.validate()?;

    let export = &config.export;
    info!("Loading knowledge graph from {}", export.graphml.display());
    let graph = load_graphml(&export.graphml)?;

    let doc = export_graph(&graph, &export.options())?;
    info!("Writing {}", export.output.display());
    write_document(&doc, &export.output)?;

    let mut out = stdout().lock();
    write_export_summary(&doc, &export.output, &mut out)?;

    Ok(())
}

fn run_serve(
    config: &mut ViewerConfig,
    args: ServeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(root) = args.root {
        config.serve.root = root;
    }
    if let Some(page) = args.page {
        config.serve.page = page;
    }
    if let Some(data) = args.data {
        config.serve.data = data;
    }
    if let Some(port) = args.port {
        config.serve.port = port;
    }
    if let Some(attempts) = args.port_attempts {
        config.serve.port_attempts = attempts;
    }
    if args.no_open {
        config.serve.open_browser = false;
    }
    config.validate()?;

    let serve = &config.serve;
    let server_config = ServeConfig {
        root: serve.root.clone(),
        page: serve.page.clone(),
        data: serve.data.clone(),
        port: serve.port,
        port_attempts: serve.port_attempts,
        open_browser: serve.open_browser,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(start_server(server_config))?;

    Ok(())
}
