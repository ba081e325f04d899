//! ---
//! fz_section: "04-engine-orchestration"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Dashboard engine lifecycle, scheduling and preferences."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Refresh orchestration.
//!
//! [`recompute`] is the pure pass: filter, aggregate, alerts, energy/ROI,
//! insights and plant overview over the selection, then the focus views
//! (sensor history, anomalies, RUL) over the current fleet.
//! [`DashboardEngine`] owns the state those passes read and republishes a
//! snapshot after each one.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use fz_analytics::{
    aggregate, analyze_energy, generate_alerts, generate_anomalies, plant_overview,
    predict_rul, production_insights, AggregationContext, Alert, Anomaly, DashboardSummary,
    EnergyData, PlantStats, ProductionInsights, RulPrediction, INITIAL_RECENT_ANOMALIES,
};
use fz_common::EngineConfig;
use fz_fleet::{
    filter_accessible, filter_for_selection, FleetRegistry, Machine, MachineId, Plant,
    Selection, TypeFilter, User, UserDirectory,
};
use fz_metrics::EngineMetrics;
use fz_sim::{
    generate_sensor_data, simulate_tick, Metric, RandomSource, SeededRandom, SensorPoint,
};
use parking_lot::Mutex;
use serde::Serialize;
use strum::IntoStaticStr;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::{EngineError, Result};
use crate::preferences::Preferences;
use crate::scheduler::{SimulationTicker, TickOutcome, TickStats};

/// Machine and metric the sensor, anomaly and RUL views follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FocusTarget {
    pub machine_id: MachineId,
    pub metric: Metric,
}

impl Default for FocusTarget {
    fn default() -> Self {
        Self {
            machine_id: 1,
            metric: Metric::Temperature,
        }
    }
}

/// Everything one recompute pass reads.
#[derive(Debug, Clone, Copy)]
pub struct RecomputeInput<'a> {
    /// Current unfiltered fleet: live under simulation, baseline otherwise.
    pub fleet: &'a [Machine],
    pub user: &'a User,
    pub selection: &'a Selection,
    pub focus: FocusTarget,
    pub previous_anomalies: u32,
    pub sensor_window_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetViews {
    pub dashboard_summary: DashboardSummary,
    pub machine_status: Vec<Machine>,
    pub all_machine_status: Vec<Machine>,
    pub alerts: Vec<Alert>,
    pub energy_data: EnergyData,
    pub production_insights: ProductionInsights,
    pub plant_overview: Vec<PlantStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusViews {
    pub sensor_history: Vec<SensorPoint>,
    pub anomalies: Vec<Anomaly>,
    pub rul_prediction: RulPrediction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedViews {
    #[serde(flatten)]
    pub fleet: FleetViews,
    #[serde(flatten)]
    pub focus: FocusViews,
}

/// Selection-driven views in their fixed order: filter, aggregate, alerts,
/// energy/ROI, insights, plant overview.
pub fn derive_fleet_views(
    input: &RecomputeInput<'_>,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> FleetViews {
    let machine_status = filter_for_selection(input.fleet, input.user, input.selection);
    let all_machine_status = filter_accessible(input.fleet, input.user);
    let dashboard_summary = aggregate(
        &machine_status,
        &AggregationContext {
            previous_anomalies: input.previous_anomalies,
            simulated: input.selection.simulated_mode,
            now,
        },
        rng,
    );
    let alerts = generate_alerts(&machine_status, now, rng);
    let energy_data = analyze_energy(&machine_status, now, rng);
    let production_insights = production_insights(&machine_status, &energy_data, rng);
    let plant_overview = plant_overview(&all_machine_status, input.user);

    FleetViews {
        dashboard_summary,
        machine_status,
        all_machine_status,
        alerts,
        energy_data,
        production_insights,
        plant_overview,
    }
}

/// Focus views. Lookups use the unfiltered fleet, so a focus machine outside
/// the selection still resolves.
pub fn derive_focus_views(
    input: &RecomputeInput<'_>,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> FocusViews {
    let FocusTarget { machine_id, metric } = input.focus;
    FocusViews {
        sensor_history: generate_sensor_data(
            machine_id,
            metric,
            input.sensor_window_days,
            now,
            rng,
        ),
        anomalies: generate_anomalies(machine_id, input.fleet, now, rng),
        rul_prediction: predict_rul(machine_id, input.fleet, now, rng),
    }
}

pub fn recompute(
    input: &RecomputeInput<'_>,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> DerivedViews {
    let fleet = derive_fleet_views(input, now, rng);
    let focus = derive_focus_views(input, now, rng);
    DerivedViews { fleet, focus }
}

/// Published state after a recompute pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub revision: u64,
    pub user: User,
    pub selection: Selection,
    pub focus: FocusTarget,
    pub views: DerivedViews,
}

/// What caused a recompute pass; used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
enum Trigger {
    Init,
    Refresh,
    Selection,
    Focus,
    Tick,
}

/// Construction parameters for a [`DashboardEngine`].
pub struct EngineOptions {
    pub config: EngineConfig,
    pub directory: UserDirectory,
    pub rng: Box<dyn RandomSource>,
    pub metrics: Option<EngineMetrics>,
}

impl EngineOptions {
    /// Built-in users and a random source seeded from `config.random_seed`.
    pub fn from_config(config: EngineConfig) -> Self {
        let rng = Box::new(SeededRandom::from_optional_seed(config.random_seed));
        Self {
            config,
            directory: UserDirectory::builtin(),
            rng,
            metrics: None,
        }
    }

    pub fn with_directory(mut self, directory: UserDirectory) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl std::fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("config", &self.config)
            .field("users", &self.directory.len())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

struct EngineState {
    baseline: Vec<Machine>,
    live: Vec<Machine>,
    user: User,
    selection: Selection,
    focus: FocusTarget,
    rng: Box<dyn RandomSource>,
    views: DerivedViews,
    revision: u64,
    /// Bumped whenever the running ticker must become a no-op.
    ticker_epoch: u64,
}

impl EngineState {
    fn input(&self, sensor_window_days: u32) -> RecomputeInput<'_> {
        RecomputeInput {
            fleet: if self.selection.simulated_mode {
                &self.live
            } else {
                &self.baseline
            },
            user: &self.user,
            selection: &self.selection,
            focus: self.focus,
            previous_anomalies: self.views.fleet.dashboard_summary.recent_anomalies,
            sensor_window_days,
        }
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            revision: self.revision,
            user: self.user.clone(),
            selection: self.selection,
            focus: self.focus,
            views: self.views.clone(),
        }
    }
}

struct EngineShared {
    state: Mutex<EngineState>,
    snapshots: watch::Sender<Arc<EngineSnapshot>>,
    directory: UserDirectory,
    sensor_window_days: u32,
    tick_interval: Duration,
    metrics: Option<EngineMetrics>,
}

impl EngineShared {
    /// Full pass. The random source is moved out for the duration so the
    /// input can borrow the rest of the state.
    fn recompute_locked(&self, state: &mut EngineState, trigger: Trigger) {
        let started = Instant::now();
        let mut rng = std::mem::replace(&mut state.rng, Box::new(SeededRandom::new(0)));
        let views = recompute(&state.input(self.sensor_window_days), Utc::now(), rng.as_mut());
        state.rng = rng;
        state.views = views;
        self.publish(state, trigger, started);
    }

    /// Sensor history, anomalies and RUL only.
    fn refocus_locked(&self, state: &mut EngineState) {
        let started = Instant::now();
        let mut rng = std::mem::replace(&mut state.rng, Box::new(SeededRandom::new(0)));
        let focus =
            derive_focus_views(&state.input(self.sensor_window_days), Utc::now(), rng.as_mut());
        state.rng = rng;
        state.views.focus = focus;
        self.publish(state, Trigger::Focus, started);
    }

    fn publish(&self, state: &mut EngineState, trigger: Trigger, started: Instant) {
        state.revision += 1;
        let label: &'static str = trigger.into();
        let summary = &state.views.fleet.dashboard_summary;
        if let Some(metrics) = &self.metrics {
            metrics.record_recompute(label, started.elapsed().as_secs_f64());
            metrics.set_fleet_health(
                summary.healthy_machines,
                summary.warning_machines,
                summary.critical_machines,
                summary.avg_health_score,
            );
        }
        debug!(
            trigger = label,
            revision = state.revision,
            visible = summary.total_machines,
            "recomputed derived views"
        );
        self.snapshots.send_replace(Arc::new(state.snapshot()));
    }

    fn with_recompute<R>(&self, trigger: Trigger, f: impl FnOnce(&mut EngineState) -> R) -> R {
        let mut state = self.state.lock();
        let result = f(&mut state);
        self.recompute_locked(&mut state, trigger);
        result
    }

    /// One random-walk step over the live set. False when simulation is off.
    fn step(&self, state: &mut EngineState) -> bool {
        if !state.selection.simulated_mode {
            return false;
        }
        state.live = simulate_tick(&state.live, state.rng.as_mut());
        if let Some(metrics) = &self.metrics {
            metrics.inc_tick();
        }
        self.recompute_locked(state, Trigger::Tick);
        true
    }

    /// Ticker callback. A tick from a superseded epoch is a no-op.
    fn scheduled_tick(&self, epoch: u64) -> TickOutcome {
        let mut state = self.state.lock();
        if state.ticker_epoch != epoch {
            return TickOutcome::Stop;
        }
        if self.step(&mut state) {
            TickOutcome::Continue
        } else {
            TickOutcome::Stop
        }
    }
}

/// Owns the fleet, session inputs, focus, random source and last derived
/// views. Every mutation runs a synchronous recompute pass before returning.
///
/// The simulation ticker runs while the engine is started and simulation
/// mode is on. Lock order is ticker slot, then state.
pub struct DashboardEngine {
    shared: Arc<EngineShared>,
    ticker: Mutex<Option<SimulationTicker>>,
    started: Mutex<bool>,
}

impl DashboardEngine {
    /// Start as `config.default_user` with that user's default selection.
    pub fn new(options: EngineOptions) -> Result<Self> {
        Self::from_preferences(options, &Preferences::default())
    }

    /// Restore the stored user and selection, validated against that user.
    /// Unknown stored users fall back to the configured default user, then
    /// to the first user of the directory. A config that fails
    /// [`EngineConfig::validate`] is rejected.
    pub fn from_preferences(options: EngineOptions, preferences: &Preferences) -> Result<Self> {
        let EngineOptions {
            config,
            directory,
            mut rng,
            metrics,
        } = options;
        config
            .validate()
            .map_err(|err| EngineError::InvalidConfig(format!("{err:#}")))?;
        let metric: Metric = config.focus_metric.parse()?;
        let requested = preferences
            .user_id
            .as_deref()
            .unwrap_or(config.default_user.as_str());
        let user = directory
            .get(requested)
            .or_else(|| directory.get(&config.default_user))
            .or_else(|| directory.default_user())
            .cloned()
            .ok_or(EngineError::EmptyDirectory)?;
        if user.id != requested {
            warn!(requested, fallback = %user.id, "unknown user; falling back");
        }
        let selection = preferences.selection_for(&user);
        let focus = FocusTarget {
            machine_id: config.focus_machine,
            metric,
        };
        if !FleetRegistry::contains(focus.machine_id) {
            warn!(machine_id = focus.machine_id, "focus machine is not in the catalog");
        }

        let baseline = FleetRegistry::catalog();
        let live = baseline.clone();
        let started = Instant::now();
        let views = recompute(
            &RecomputeInput {
                fleet: &baseline,
                user: &user,
                selection: &selection,
                focus,
                previous_anomalies: INITIAL_RECENT_ANOMALIES,
                sensor_window_days: config.sensor_window_days,
            },
            Utc::now(),
            rng.as_mut(),
        );
        let state = EngineState {
            baseline,
            live,
            user,
            selection,
            focus,
            rng,
            views,
            revision: 0,
            ticker_epoch: 0,
        };
        let (snapshots, _) = watch::channel(Arc::new(state.snapshot()));
        let shared = EngineShared {
            state: Mutex::new(state),
            snapshots,
            directory,
            sensor_window_days: config.sensor_window_days,
            tick_interval: config.tick_interval,
            metrics,
        };
        {
            let mut state = shared.state.lock();
            shared.publish(&mut state, Trigger::Init, started);
            info!(
                user = %state.user.id,
                plant = %state.selection.selected_plant,
                machine_type = %state.selection.selected_machine_type,
                simulated = state.selection.simulated_mode,
                "dashboard engine initialised"
            );
        }

        Ok(Self {
            shared: Arc::new(shared),
            ticker: Mutex::new(None),
            started: Mutex::new(false),
        })
    }

    /// Let the engine drive simulation ticks itself. Needs a tokio runtime
    /// when simulation mode is on.
    pub fn start(&self) -> Result<()> {
        *self.started.lock() = true;
        info!(
            period_ms = self.shared.tick_interval.as_millis() as u64,
            "dashboard engine started"
        );
        let result = self.sync_ticker();
        if result.is_err() {
            *self.started.lock() = false;
        }
        result
    }

    /// Cancel any pending tick without waiting for the task.
    pub fn stop(&self) {
        *self.started.lock() = false;
        self.cancel_ticker();
        info!("dashboard engine stopped");
    }

    /// Like [`stop`](Self::stop), but waits for the ticker task to exit.
    pub async fn shutdown(&self) -> TickStats {
        *self.started.lock() = false;
        let ticker = self.ticker.lock().take();
        self.bump_epoch();
        let stats = match ticker {
            Some(ticker) => ticker.shutdown().await,
            None => TickStats::default(),
        };
        info!(ticks = stats.ticks, "dashboard engine shut down");
        stats
    }

    pub fn is_started(&self) -> bool {
        *self.started.lock()
    }

    /// True while a ticker task is alive.
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.read(EngineState::snapshot)
    }

    /// Receiver that sees a new snapshot after every recompute pass.
    pub fn subscribe(&self) -> watch::Receiver<Arc<EngineSnapshot>> {
        self.shared.snapshots.subscribe()
    }

    pub fn refresh_data(&self) {
        self.shared.with_recompute(Trigger::Refresh, |_| ());
    }

    /// Re-target the sensor, anomaly and RUL views and recompute only those.
    pub fn update_sensor_data(&self, machine_id: MachineId, metric: Metric) {
        let mut state = self.shared.state.lock();
        state.focus = FocusTarget { machine_id, metric };
        self.shared.refocus_locked(&mut state);
    }

    /// Switch user, keeping the selection where the new user may use it.
    pub fn set_user(&self, user_id: &str) -> Result<()> {
        let user = self.shared.directory.require(user_id)?.clone();
        self.shared.with_recompute(Trigger::Selection, |state| {
            state.user = user;
            state.selection.reconcile(&state.user);
        });
        Ok(())
    }

    /// Non-admin users see nothing for a plant outside their assignments.
    pub fn set_selected_plant(&self, plant: Plant) {
        self.shared.with_recompute(Trigger::Selection, |state| {
            state.selection.selected_plant = plant;
        });
    }

    pub fn set_selected_machine_type(&self, filter: TypeFilter) {
        self.shared.with_recompute(Trigger::Selection, |state| {
            state.selection.selected_machine_type = filter;
        });
    }

    /// Turning simulation off invalidates the running ticker under the state
    /// lock before the task is cancelled. Turning it on spawns the ticker
    /// when the engine is started.
    /// If the ticker cannot be spawned the previous mode is restored.
    pub fn set_simulated_mode(&self, enabled: bool) -> Result<()> {
        let previous = self.shared.with_recompute(Trigger::Selection, |state| {
            let previous = state.selection.simulated_mode;
            state.selection.simulated_mode = enabled;
            if !enabled {
                state.ticker_epoch += 1;
            }
            previous
        });
        if let Err(err) = self.sync_ticker() {
            warn!(error = %err, "simulation ticker unavailable; restoring previous mode");
            self.shared.with_recompute(Trigger::Selection, |state| {
                state.selection.simulated_mode = previous;
            });
            return Err(err);
        }
        Ok(())
    }

    /// Apply one tick on the caller's schedule. False when simulation is off.
    pub fn advance_simulation(&self) -> bool {
        let mut state = self.shared.state.lock();
        self.shared.step(&mut state)
    }

    pub fn dashboard_summary(&self) -> DashboardSummary {
        self.read(|s| s.views.fleet.dashboard_summary.clone())
    }

    pub fn machine_status(&self) -> Vec<Machine> {
        self.read(|s| s.views.fleet.machine_status.clone())
    }

    pub fn all_machine_status(&self) -> Vec<Machine> {
        self.read(|s| s.views.fleet.all_machine_status.clone())
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.read(|s| s.views.fleet.alerts.clone())
    }

    pub fn energy_data(&self) -> EnergyData {
        self.read(|s| s.views.fleet.energy_data.clone())
    }

    pub fn production_insights(&self) -> ProductionInsights {
        self.read(|s| s.views.fleet.production_insights.clone())
    }

    pub fn plant_overview(&self) -> Vec<PlantStats> {
        self.read(|s| s.views.fleet.plant_overview.clone())
    }

    pub fn sensor_history(&self) -> Vec<SensorPoint> {
        self.read(|s| s.views.focus.sensor_history.clone())
    }

    pub fn anomalies(&self) -> Vec<Anomaly> {
        self.read(|s| s.views.focus.anomalies.clone())
    }

    pub fn rul_prediction(&self) -> RulPrediction {
        self.read(|s| s.views.focus.rul_prediction.clone())
    }

    pub fn current_user(&self) -> User {
        self.read(|s| s.user.clone())
    }

    pub fn selection(&self) -> Selection {
        self.read(|s| s.selection)
    }

    pub fn focus(&self) -> FocusTarget {
        self.read(|s| s.focus)
    }

    /// Current user and selection in storable form.
    pub fn preferences(&self) -> Preferences {
        self.read(|s| Preferences::capture(&s.user, &s.selection))
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.shared.directory
    }

    fn read<R>(&self, f: impl FnOnce(&EngineState) -> R) -> R {
        f(&self.shared.state.lock())
    }

    fn bump_epoch(&self) -> u64 {
        let mut state = self.shared.state.lock();
        state.ticker_epoch += 1;
        state.ticker_epoch
    }

    fn cancel_ticker(&self) {
        let ticker = self.ticker.lock().take();
        self.bump_epoch();
        if let Some(mut ticker) = ticker {
            ticker.cancel();
        }
    }

    fn sync_ticker(&self) -> Result<()> {
        let wanted = *self.started.lock() && self.read(|s| s.selection.simulated_mode);
        if !wanted {
            self.cancel_ticker();
            return Ok(());
        }

        let mut slot = self.ticker.lock();
        if slot.as_ref().is_some_and(|ticker| !ticker.is_finished()) {
            return Ok(());
        }
        let epoch = self.bump_epoch();
        let shared: Weak<EngineShared> = Arc::downgrade(&self.shared);
        let ticker = SimulationTicker::spawn(self.shared.tick_interval, epoch, move || {
            match shared.upgrade() {
                Some(shared) => shared.scheduled_tick(epoch),
                None => TickOutcome::Stop,
            }
        })?;
        *slot = Some(ticker);
        Ok(())
    }
}

impl Drop for DashboardEngine {
    fn drop(&mut self) {
        if let Some(mut ticker) = self.ticker.get_mut().take() {
            self.shared.state.lock().ticker_epoch += 1;
            ticker.cancel();
        }
    }
}

impl std::fmt::Debug for DashboardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("DashboardEngine")
            .field("user", &state.user.id)
            .field("selection", &state.selection)
            .field("focus", &state.focus)
            .field("revision", &state.revision)
            .finish()
    }
}
