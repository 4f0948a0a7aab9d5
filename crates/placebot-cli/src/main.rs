use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use placebot_canvas::{Canvas, build_zones};
use placebot_client::{HttpLogin, HttpSnapshotSource, WsFeedSource, fetch_pixel};
use placebot_core::config::{Config, LoggingConfig};
use placebot_scheduler::{CanvasMaintainer, DrawingFloor, Fleet, FleetSettings};

#[derive(Parser)]
#[command(
    name = "placebot",
    about = "Keep pixel art in place on a shared, rate-limited canvas",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (.yaml/.yml, otherwise JSON5)
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the fleet (default)
    Run,

    /// Validate the config and build the zone graph, then exit
    Check,

    /// Show who last painted a cell
    Pixel { x: i32, y: i32 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    init_logging(&config.logging, cli.verbose)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Check => check(&config),
        Commands::Pixel { x, y } => pixel(&config, x, y).await,
    }
}

/// `RUST_LOG` wins; otherwise `--verbose`, then `logging.level`, then info.
fn init_logging(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        "debug"
    } else {
        logging.level.as_deref().unwrap_or("info")
    };
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    for directive in &logging.filters {
        filter = filter.add_directive(directive.parse()?);
    }

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match (logging.format.as_str(), logging.output.as_str()) {
        ("json", "stdout") => builder.json().with_writer(std::io::stdout).try_init(),
        ("json", _) => builder.json().with_writer(std::io::stderr).try_init(),
        (_, "stdout") => builder.with_writer(std::io::stdout).try_init(),
        _ => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let (warnings, errors) = config.validate();
    for w in &warnings {
        warn!("{w}");
    }
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        bail!("{} configuration error(s)", errors.len());
    }

    // Any bad zone aborts here, before a single login.
    let drawer = build_zones(config.active_zones())?;
    info!(zones = ?drawer.names(), agents = config.users.len(), "Starting placebot");

    let canvas = Arc::new(Canvas::new(config.canvas.extent));
    let maintainer = CanvasMaintainer::new(
        canvas.clone(),
        Arc::new(HttpSnapshotSource::new(&config.endpoints)?),
        Arc::new(WsFeedSource::new(config.endpoints.clone())),
        Duration::from_secs(config.canvas.refresh_secs),
    )
    .spawn();

    let fleet = Fleet::new(
        config.users.clone(),
        Arc::new(HttpLogin::new(config.endpoints.clone())),
        Arc::new(DrawingFloor::new(canvas, drawer)),
        FleetSettings::from_config(&config.scheduler, &config.canvas),
    );

    let report = tokio::select! {
        report = fleet.run() => report,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            maintainer.abort();
            return Ok(());
        }
    };
    maintainer.abort();

    if report.started > 0 && report.failed_login == report.started {
        bail!("no agent could log in");
    }
    Ok(())
}

fn check(config: &Config) -> anyhow::Result<()> {
    let (warnings, errors) = config.validate();
    for w in &warnings {
        println!("warning: {w}");
    }
    for e in &errors {
        println!("error: {e}");
    }
    if !errors.is_empty() {
        bail!("{} configuration error(s)", errors.len());
    }

    let drawer = build_zones(config.active_zones())?;
    println!("Canvas extent: {}", config.canvas.extent);
    println!("Users: {}", config.users.len());
    println!("Zones ({}): {}", drawer.len(), drawer.names().join(", "));
    Ok(())
}

async fn pixel(config: &Config, x: i32, y: i32) -> anyhow::Result<()> {
    let info = fetch_pixel(&config.endpoints, x, y).await?;
    println!("({}, {}) color {}", info.x, info.y, info.color);
    println!("Painted by: {}", info.username);
    println!("Timestamp: {}", info.timestamp);
    Ok(())
}
