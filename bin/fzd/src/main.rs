//! ---
//! fz_section: "01-core-functionality"
//! fz_subsection: "binary"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Binary entrypoint for the FaultZero daemon."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use fz_common::{init_tracing, AppConfig, MAX_SENSOR_WINDOW_DAYS};
use fz_core::{
    DashboardEngine, EngineOptions, InMemoryPreferenceStore, JsonFilePreferenceStore,
    PreferenceStore, Preferences,
};
use fz_fleet::{MachineId, Plant, TypeFilter, UserDirectory};
use fz_metrics::{new_registry, spawn_http_server, DaemonMetrics, EngineMetrics};
use fz_sim::{generate_sensor_data, Metric, SeededRandom};
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    author,
    version = concat!("FaultZero ", env!("CARGO_PKG_VERSION")),
    about = "FaultZero fleet telemetry daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "ID", help = "Act as this user instead of the stored one")]
    user: Option<String>,

    #[arg(long, help = "Override the selected plant (e.g. \"Plant B\")")]
    plant: Option<Plant>,

    #[arg(
        long = "type",
        value_name = "TYPE",
        help = "Override the machine type filter (All, Slitter, Inspection)"
    )]
    machine_type: Option<TypeFilter>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the engine until ctrl-c, logging each published snapshot")]
    Run {
        #[arg(long, help = "Enable the simulation ticker")]
        simulate: bool,
    },
    #[command(about = "Print the derived views as JSON")]
    Snapshot {
        #[arg(long, default_value_t = 0, help = "Apply this many simulation ticks first")]
        ticks: u32,
        #[arg(long, help = "Pretty-print the JSON output")]
        pretty: bool,
    },
    #[command(about = "Print a synthetic sensor series as JSON")]
    Sensor {
        #[arg(long, default_value_t = 1)]
        machine: MachineId,
        #[arg(long, default_value_t = Metric::Temperature)]
        metric: Metric,
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SENSOR_WINDOW_DAYS)),
            help = "Window in days; defaults to the configured window"
        )]
        days: Option<u32>,
    },
    #[command(about = "List the known users and their assignments")]
    Users,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/fzd.toml"));
    candidates.push(PathBuf::from("configs/fzd.example.toml"));

    let load_started = Instant::now();
    let loaded = AppConfig::load_with_source(&candidates)?;
    let config = loaded.config;
    let load_duration = load_started.elapsed();

    let registry = new_registry();
    let daemon_metrics = DaemonMetrics::new(registry.clone())?;
    daemon_metrics.observe_config_load(load_duration.as_secs_f64());
    daemon_metrics.inc_start();
    daemon_metrics.set_build_info(
        env!("CARGO_PKG_VERSION"),
        if cfg!(debug_assertions) { "debug" } else { "release" },
    );

    init_tracing("fzd", &config.logging)?;
    match &loaded.source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; running with defaults"),
    }

    let store: Box<dyn PreferenceStore> = match &config.preferences.path {
        Some(path) => Box::new(JsonFilePreferenceStore::new(path)),
        None => Box::new(InMemoryPreferenceStore::default()),
    };
    let mut preferences = store.load().unwrap_or_else(|err| {
        warn!(error = %err, "stored preferences unreadable; using defaults");
        Preferences::default()
    });
    if let Some(user) = &cli.user {
        preferences.user_id = Some(user.clone());
    }
    if let Some(plant) = cli.plant {
        preferences.plant = Some(plant);
    }
    if let Some(filter) = cli.machine_type {
        preferences.machine_type = Some(filter);
    }

    match cli.command.unwrap_or(Commands::Run { simulate: false }) {
        Commands::Run { simulate } => {
            let engine_metrics = EngineMetrics::new(registry.clone())?;
            let options =
                EngineOptions::from_config(config.engine.clone()).with_metrics(engine_metrics);
            let engine = DashboardEngine::from_preferences(options, &preferences)?;
            if simulate {
                engine.set_simulated_mode(true)?;
            }

            let metrics_server = if config.metrics.enabled {
                let server = spawn_http_server(registry.clone(), config.metrics.listen)?;
                info!(address = %server.addr(), "metrics exporter enabled");
                Some(server)
            } else {
                info!("metrics exporter disabled by configuration");
                None
            };

            run_engine(&engine).await?;

            store
                .save(&engine.preferences())
                .context("failed to store preferences on shutdown")?;
            if let Some(server) = metrics_server {
                server.shutdown().await?;
            }
        }
        Commands::Snapshot { ticks, pretty } => {
            let options = EngineOptions::from_config(config.engine.clone());
            let engine = DashboardEngine::from_preferences(options, &preferences)?;
            if ticks > 0 {
                engine.set_simulated_mode(true)?;
                for _ in 0..ticks {
                    engine.advance_simulation();
                }
            }
            let snapshot = engine.snapshot();
            let body = if pretty {
                serde_json::to_string_pretty(&snapshot)?
            } else {
                serde_json::to_string(&snapshot)?
            };
            println!("{}", body);
        }
        Commands::Sensor {
            machine,
            metric,
            days,
        } => {
            let days = days.unwrap_or(config.engine.sensor_window_days);
            let mut rng = SeededRandom::from_optional_seed(config.engine.random_seed);
            let series = generate_sensor_data(machine, metric, days, Utc::now(), &mut rng);
            println!("{}", serde_json::to_string(&series)?);
        }
        Commands::Users => {
            for user in UserDirectory::builtin().users() {
                let plants: Vec<&str> = user.assigned_plants.iter().map(Plant::as_str).collect();
                let types: Vec<&str> = user.allowed_types.iter().map(|t| t.as_str()).collect();
                println!(
                    "{:<8} {:<18} {:<10} plants=[{}] types=[{}]",
                    user.id,
                    user.name,
                    user.role,
                    plants.join(", "),
                    types.join(", ")
                );
            }
        }
    }

    Ok(())
}

async fn run_engine(engine: &DashboardEngine) -> Result<()> {
    engine.start()?;
    let mut snapshots = engine.subscribe();
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        user = %engine.current_user().id,
        simulated = engine.selection().simulated_mode,
        "daemon running; waiting for termination signal"
    );
    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                info!("ctrl-c received; shutting down");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let summary = &snapshot.views.fleet.dashboard_summary;
                info!(
                    revision = snapshot.revision,
                    machines = summary.total_machines,
                    healthy = summary.healthy_machines,
                    warning = summary.warning_machines,
                    critical = summary.critical_machines,
                    avg_health = summary.avg_health_score,
                    alerts = snapshot.views.fleet.alerts.len(),
                    "snapshot published"
                );
            }
        }
    }

    let stats = engine.shutdown().await;
    info!(ticks = stats.ticks, "engine stopped");
    Ok(())
}
