//! ---
//! fz_section: "01-core-functionality"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Shared primitives and utilities for the engine runtime."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Shared configuration and logging primitives for the FaultZero workspace.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, EngineConfig, LoadedAppConfig, LoggingConfig, MetricsConfig, PreferencesConfig,
    MAX_SENSOR_WINDOW_DAYS,
};
pub use logging::{init_tracing, LogFormat};
