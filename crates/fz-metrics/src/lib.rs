//! ---
//! fz_section: "03-observability"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Metrics collection and export utilities."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, StatusCode};
use axum::routing::get;
use axum::{response::IntoResponse, Router};
use prometheus::{
    Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub type SharedRegistry = Arc<Registry>;

pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Serve `registry` at `/metrics` on `addr`. Port 0 picks a free port; the
/// bound address is available from [`MetricsServer::addr`].
pub fn spawn_http_server(registry: SharedRegistry, addr: SocketAddr) -> Result<MetricsServer> {
    let app = Router::new().route(
        "/metrics",
        get({
            let registry = registry.clone();
            move || metrics_handler(registry.clone())
        }),
    );

    let std_listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind metrics listener {}", addr))?;
    std_listener
        .set_nonblocking(true)
        .context("failed to configure metrics listener as non-blocking")?;
    let bound = std_listener
        .local_addr()
        .context("failed to read metrics listener address")?;
    let listener = TcpListener::from_std(std_listener)
        .context("failed to convert std listener into tokio listener")?;

    info!(address = %bound, "metrics server starting");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .context("metrics server encountered an error")?;
        Ok(())
    });

    Ok(MetricsServer {
        addr: bound,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}

async fn metrics_handler(registry: SharedRegistry) -> impl IntoResponse {
    let families = registry.gather();
    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&families) {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(prometheus::TEXT_FORMAT),
            )],
            body,
        ),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                )],
                String::from("metrics encoding error"),
            )
        }
    }
}

/// Handle to the running HTTP exporter.
#[derive(Debug)]
pub struct MetricsServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl MetricsServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and await task completion.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(anyhow::Error::new(join_err)),
        }
    }
}

/// Metrics recorded by the `fzd` process itself.
#[derive(Clone)]
pub struct DaemonMetrics {
    registry: SharedRegistry,
    starts_total: IntCounter,
    config_load_seconds: Histogram,
    build_info: GaugeVec,
}

impl DaemonMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let starts_total = IntCounter::with_opts(Opts::new(
            "fzd_starts_total",
            "Total number of times the FaultZero daemon has initialised",
        ))?;
        registry.register(Box::new(starts_total.clone()))?;

        let buckets = prometheus::exponential_buckets(0.001, 2.0, 16)
            .context("failed to construct histogram buckets")?;
        let config_load_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "fzd_config_load_seconds",
                "Time spent loading and validating configuration",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(config_load_seconds.clone()))?;

        let build_info = GaugeVec::new(
            Opts::new("fzd_build_info", "Build metadata for the running daemon binary"),
            &["version", "profile"],
        )?;
        registry.register(Box::new(build_info.clone()))?;

        Ok(Self {
            registry,
            starts_total,
            config_load_seconds,
            build_info,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn inc_start(&self) {
        self.starts_total.inc();
    }

    pub fn observe_config_load(&self, seconds: f64) {
        self.config_load_seconds.observe(seconds);
    }

    pub fn set_build_info(&self, version: &str, profile: &str) {
        self.build_info
            .with_label_values(&[version, profile])
            .set(1.0);
    }
}

/// Dashboard engine instrumentation: simulation ticks, recompute passes and
/// the fleet health picture of the last pass.
#[derive(Clone, Debug)]
pub struct EngineMetrics {
    registry: SharedRegistry,
    ticks_total: IntCounter,
    recomputes: IntCounterVec,
    machines_by_status: IntGaugeVec,
    avg_health: Gauge,
    recompute_seconds: Histogram,
}

impl EngineMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let ticks_total = IntCounter::with_opts(Opts::new(
            "fz_simulation_ticks_total",
            "Random-walk ticks applied to the live fleet",
        ))?;
        registry.register(Box::new(ticks_total.clone()))?;

        let recomputes = IntCounterVec::new(
            Opts::new(
                "fz_recomputes_total",
                "Derived-view recompute passes by trigger",
            ),
            &["trigger"],
        )?;
        registry.register(Box::new(recomputes.clone()))?;

        let machines_by_status = IntGaugeVec::new(
            Opts::new(
                "fz_visible_machines",
                "Selection-filtered machines by health status",
            ),
            &["status"],
        )?;
        registry.register(Box::new(machines_by_status.clone()))?;

        let avg_health = Gauge::with_opts(Opts::new(
            "fz_avg_health_score",
            "Average health score of the selection-filtered machines",
        ))?;
        registry.register(Box::new(avg_health.clone()))?;

        let buckets = prometheus::exponential_buckets(0.000_05, 2.0, 14)
            .context("failed to construct histogram buckets")?;
        let recompute_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "fz_recompute_seconds",
                "Wall time of one derived-view recompute pass",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(recompute_seconds.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            recomputes,
            machines_by_status,
            avg_health,
            recompute_seconds,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn inc_tick(&self) {
        self.ticks_total.inc();
    }

    pub fn ticks(&self) -> u64 {
        self.ticks_total.get()
    }

    pub fn record_recompute(&self, trigger: &str, seconds: f64) {
        self.recomputes.with_label_values(&[trigger]).inc();
        self.recompute_seconds.observe(seconds);
    }

    pub fn recomputes(&self, trigger: &str) -> u64 {
        self.recomputes.with_label_values(&[trigger]).get()
    }

    pub fn set_fleet_health(&self, healthy: usize, warning: usize, critical: usize, avg: f64) {
        for (status, count) in [("healthy", healthy), ("warning", warning), ("critical", critical)] {
            self.machines_by_status
                .with_label_values(&[status])
                .set(count as i64);
        }
        self.avg_health.set(avg);
    }
}

pub use prometheus;
