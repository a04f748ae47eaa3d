use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use transit_client::config::{load_config, ClientConfig};
use transit_client::models::{GeoPoint, StopFilter, TimeWindow, VehicleFilter};
use transit_client::observability::{logging, metrics};
use transit_client::{CancelSource, TransitClient};

#[derive(Parser)]
#[command(name = "transit-cli")]
#[command(about = "Diagnostic CLI for the transit data client", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the provider base URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Override the provider API key.
    #[arg(short, long)]
    key: Option<String>,

    /// Bypass the cache for this query.
    #[arg(long)]
    force_refresh: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all routes
    Routes,
    /// Show a single route
    Route { route_id: String },
    /// List stops, optionally filtered
    Stops {
        #[arg(long)]
        route: Option<String>,
        #[arg(long)]
        lat: Option<f64>,
        #[arg(long)]
        lon: Option<f64>,
        #[arg(long)]
        radius: Option<u32>,
    },
    /// List live vehicle positions
    Vehicles {
        #[arg(long)]
        route: Option<String>,
    },
    /// List scheduled stop events for a stop
    Schedules {
        stop_id: String,
        #[arg(long)]
        from: Option<u64>,
        #[arg(long)]
        to: Option<u64>,
    },
    /// Show usage statistics and connection state
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.url {
        config.provider.base_url = url;
    }
    if let Some(key) = cli.key {
        config.provider.api_key = key;
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let client = Arc::new(TransitClient::new(config)?);

    // Ctrl+C cancels the in-flight query instead of killing the process hard.
    let source = CancelSource::new();
    let token = source.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            source.cancel();
        }
    });

    let force = cli.force_refresh;
    match cli.command {
        Commands::Routes => {
            let routes = client.routes(force, &token).await?;
            print_json(&routes)?;
        }
        Commands::Route { route_id } => {
            let route = client.route(&route_id, force, &token).await?;
            print_json(&route)?;
        }
        Commands::Stops {
            route,
            lat,
            lon,
            radius,
        } => {
            let filter = StopFilter {
                route_id: route,
                center: match (lat, lon) {
                    (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
                    _ => None,
                },
                radius_m: radius,
            };
            let stops = client.stops(&filter, force, &token).await?;
            print_json(&stops)?;
        }
        Commands::Vehicles { route } => {
            let filter = VehicleFilter {
                route_id: route,
                mode: None,
            };
            let vehicles = client.vehicles(&filter, force, &token).await?;
            print_json(&vehicles)?;
        }
        Commands::Schedules { stop_id, from, to } => {
            let window = match (from, to) {
                (Some(from_epoch), Some(to_epoch)) => Some(TimeWindow {
                    from_epoch,
                    to_epoch,
                }),
                _ => None,
            };
            let schedules = client.schedules(&stop_id, window, force, &token).await?;
            print_json(&schedules)?;
        }
        Commands::Stats => {
            print_json(&*client.usage())?;
            println!("connection: {}", client.connection_state());
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
