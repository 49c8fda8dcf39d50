use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mapquery::api::AppState;
use mapquery::history::{HistorySink, LogHistorySink, MemoryHistorySink};
use mapquery::models::{AggregatedResult, Coordinate, RoutePath, SearchOutcome};
use mapquery::{MapQueryConfig, SearchPipeline, SearchSession, Services, telemetry, web};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, warn};

const HISTORY_CAPACITY: usize = 200;

#[derive(Parser, Debug)]
#[command(name = "mapquery", author, version, about = "Free-text map search: routes, nearby places and weather")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "MAPQUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single query, e.g. "hà nội đến đà nẵng", "cafe" or "hồ gươm"
    Search {
        /// Query text
        #[arg(required = true)]
        query: Vec<String>,
        #[command(flatten)]
        reference: ReferenceArgs,
    },
    /// Route between two places
    Route { from: String, to: String },
    /// Read queries from stdin; a new line supersedes the previous query
    Interactive {
        #[command(flatten)]
        reference: ReferenceArgs,
    },
    /// Address of a point and matching places around it
    Explore {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// What to look for around the point
        #[arg(long, default_value = "cafe")]
        keyword: String,
    },
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (overrides the configured one)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Caller position used for nearby searches
#[derive(clap::Args, Debug, Clone, Copy)]
struct ReferenceArgs {
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
}

impl ReferenceArgs {
    fn coordinate(self) -> Result<Option<Coordinate>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinate::new(lat, lon)?)),
            _ => Ok(None),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = MapQueryConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    telemetry::init(&config.logging, cli.verbose)?;
    debug!(port = config.server.port, "Configuration loaded");

    match cli.command {
        Command::Search { query, reference } => {
            let pipeline = build_pipeline(&config, Arc::new(LogHistorySink))?;
            let query = query.join(" ");
            match pipeline.search(&query, reference.coordinate()?).await {
                Ok(Some(outcome)) => print_outcome(&outcome),
                Ok(None) => println!("Nothing to search for."),
                Err(e) => fail(&e),
            }
        }
        Command::Route { from, to } => {
            let pipeline = build_pipeline(&config, Arc::new(LogHistorySink))?;
            match pipeline.route(&from, &to).await {
                Ok(route) => print_route(&route),
                Err(e) => fail(&e),
            }
        }
        Command::Explore { lat, lon, keyword } => {
            let pipeline = build_pipeline(&config, Arc::new(LogHistorySink))?;
            match pipeline.explore(Coordinate::new(lat, lon)?, &keyword).await {
                Ok(result) => print_aggregated(&result),
                Err(e) => fail(&e),
            }
        }
        Command::Interactive { reference } => {
            let pipeline = build_pipeline(&config, Arc::new(LogHistorySink))?;
            interactive(SearchSession::new(Arc::new(pipeline)), reference.coordinate()?).await?;
        }
        Command::Serve { port } => {
            let history = Arc::new(MemoryHistorySink::new(HISTORY_CAPACITY));
            let pipeline = build_pipeline(&config, history.clone())?;
            let state = AppState {
                pipeline: Arc::new(pipeline),
                history,
            };
            web::run(state, port.unwrap_or(config.server.port)).await?;
        }
    }

    Ok(())
}

fn build_pipeline(config: &MapQueryConfig, history: Arc<dyn HistorySink>) -> Result<SearchPipeline> {
    let services = Services::from_config(config, history)?;
    Ok(SearchPipeline::new(config, services))
}

async fn interactive(session: SearchSession, reference: Option<Coordinate>) -> Result<()> {
    println!("Type a query and press enter (\"exit\" to quit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        if line.is_empty() {
            continue;
        }
        let session = session.clone();
        in_flight.spawn(async move {
            let stamped = session.search(&line, reference).await;
            match session.settle(stamped) {
                Some(Ok(Some(outcome))) => print_outcome(&outcome),
                Some(Ok(None)) | None => {}
                Some(Err(e)) => eprintln!("Error: {}", e.user_message()),
            }
        });
        while in_flight.try_join_next().is_some() {}
    }

    // superseded queries settle to nothing; the latest one still gets printed
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            warn!("Query task failed: {}", e);
        }
    }
    Ok(())
}

fn fail(err: &mapquery::MapQueryError) -> ! {
    eprintln!("Error: {}", err.user_message());
    debug!("{err:?}");
    std::process::exit(1)
}

fn print_outcome(outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::Route(route) => print_route(route),
        SearchOutcome::Nearby(result) | SearchOutcome::Place(result) => print_aggregated(result),
    }
}

fn print_route(route: &RoutePath) {
    println!(
        "Route: {} km, {} h ({} points)",
        route.display_distance_km(),
        route.display_duration_hours(),
        route.points.len()
    );
    if route.alternatives > 1 {
        println!("  {} alternatives offered, showing the first", route.alternatives);
    }
}

fn print_aggregated(result: &AggregatedResult) {
    println!("📍 {}", result.place.display_name);
    println!("   {}", result.place.coordinate.format_coordinates());

    if let Some(weather) = &result.weather {
        let current = &weather.current;
        println!(
            "🌤  {} | {} | wind {} | humidity {}%",
            current.description,
            current.format_temperature(),
            current.format_wind(),
            current.humidity_pct
        );
        for point in weather.forecast_preview() {
            println!(
                "   {}  {:.1}°C  {}",
                point.timestamp.format("%a %H:%M"),
                point.temperature_c,
                point.description
            );
        }
    }

    if result.pois.is_empty() {
        println!("No places found nearby.");
    }
    for poi in &result.pois {
        println!("  • {} ({:.0} m)", poi.display_name, poi.distance_m);
    }
}
