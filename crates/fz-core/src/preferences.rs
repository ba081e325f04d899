//! ---
//! fz_section: "04-engine-orchestration"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Dashboard engine lifecycle, scheduling and preferences."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
//! Persisted session selection. The engine only reads these at construction;
//! writing them back is up to the host.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fz_fleet::{Plant, Selection, TypeFilter, User};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub user_id: Option<String>,
    pub plant: Option<Plant>,
    pub machine_type: Option<TypeFilter>,
    pub simulated: bool,
}

impl Preferences {
    pub fn capture(user: &User, selection: &Selection) -> Self {
        Self {
            user_id: Some(user.id.clone()),
            plant: Some(selection.selected_plant),
            machine_type: Some(selection.selected_machine_type),
            simulated: selection.simulated_mode,
        }
    }

    /// Selection for `user`, keeping stored values only where the user may
    /// still use them.
    pub fn selection_for(&self, user: &User) -> Selection {
        let mut selection = Selection::for_user(user);
        if let Some(plant) = self.plant {
            selection.selected_plant = plant;
        }
        if let Some(filter) = self.machine_type {
            selection.selected_machine_type = filter;
        }
        selection.simulated_mode = self.simulated;
        if selection.reconcile(user) {
            debug!(user = %user.id, "stored selection adjusted to user assignments");
        }
        selection
    }
}

pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<Preferences>;
    fn save(&self, preferences: &Preferences) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    inner: Mutex<Preferences>,
}

impl InMemoryPreferenceStore {
    pub fn new(initial: Preferences) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn load(&self) -> Result<Preferences> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, preferences: &Preferences) -> Result<()> {
        *self.inner.lock() = preferences.clone();
        Ok(())
    }
}

/// JSON file store. A missing file loads as defaults.
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn load(&self) -> Result<Preferences> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored preferences; using defaults");
                return Ok(Preferences::default());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read preferences from {}", self.path.display())
                })
            }
        };
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse preferences at {}", self.path.display()))
    }

    fn save(&self, preferences: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create preferences directory {}", parent.display())
            })?;
        }
        let body = serde_json::to_string_pretty(preferences)
            .context("failed to serialise preferences")?;
        fs::write(&self.path, body)
            .with_context(|| format!("failed to write preferences to {}", self.path.display()))?;
        info!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}
