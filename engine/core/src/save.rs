//! Save Format
//!
//! A save is one JSON document with independent blocks for the pet, the
//! evolution manager, the care tracker, settings and special-form flags.
//! This module only converts between that document and live engine
//! components; reading and writing files is the host's job.
//!
//! # Versions
//!
//! | Version | Layout |
//! |---------|--------|
//! | 1 | Flat pet stats, no evolution data |
//! | 2 | XP, form and history embedded in the `pet` block |
//! | 3 | Separate `evolution`, `care_tracker` and `special_flags` blocks |
//!
//! [`migrate`] lifts older documents to version 3 before they are parsed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::care::{CareTracker, CareTrackerState};
use crate::clock::{unix_seconds, SharedClock};
use crate::config::EngineConfig;
use crate::evolution::{
    EvolutionIntegrator, EvolutionManager, EvolutionManagerState, HistoryEntry, IntegratorState,
    PetStats,
};

/// Current save format version
pub const SAVE_VERSION: u32 = 3;

/// Longest offline stretch credited on load
pub const MAX_OFFLINE_SECS: i64 = 86_400;

const DEFAULT_PET_NAME: &str = "Blobby";
const DEFAULT_STAT: f64 = 80.0;
const MIGRATED_FORM_ID: &str = "bloblet";
const MIGRATED_STAGE: &str = "BABY";

// =============================================================================
// Errors
// =============================================================================

/// Errors from reading a save document
#[derive(Debug, Error)]
pub enum SaveError {
    /// Document is not valid JSON or does not fit the format
    #[error("Malformed save data: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by a newer engine
    #[error("Unsupported save version {0} (newest known is {SAVE_VERSION})")]
    UnsupportedVersion(u32),
}

// =============================================================================
// Blocks
// =============================================================================

fn default_name() -> String {
    DEFAULT_PET_NAME.to_string()
}

const fn default_stat() -> f64 {
    DEFAULT_STAT
}

const fn default_true() -> bool {
    true
}

/// The `pet` block
///
/// `form_id`, `stage` and `level` mirror the evolution block for older
/// readers. Keys this engine does not know are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetRecord {
    /// Display name
    #[serde(default = "default_name")]
    pub name: String,
    /// Last stat reading
    #[serde(default = "default_stat")]
    pub hunger: f64,
    /// Last stat reading
    #[serde(default = "default_stat")]
    pub happiness: f64,
    /// Last stat reading
    #[serde(default = "default_stat")]
    pub energy: f64,
    /// Mirror of the current form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    /// Mirror of the current stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Mirror of the current level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Version 2 XP location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    /// Version 2 history location
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evolution_history: Vec<HistoryEntry>,
    /// When the pet hatched
    #[serde(
        default,
        with = "unix_seconds::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_time: Option<DateTime<Utc>>,
    /// Creature type from the version 1 format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_creature_type: Option<String>,
    /// Unrecognised keys, written back unchanged
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PetRecord {
    /// A pet with default stats
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hunger: DEFAULT_STAT,
            happiness: DEFAULT_STAT,
            energy: DEFAULT_STAT,
            form_id: None,
            stage: None,
            level: None,
            xp: None,
            evolution_history: Vec::new(),
            birth_time: None,
            legacy_creature_type: None,
            extra: BTreeMap::new(),
        }
    }

    /// Stored stats as a tick reading
    #[must_use]
    pub fn stats(&self) -> PetStats {
        PetStats::new(self.hunger, self.happiness, self.energy)
    }

    /// Store a tick reading
    pub fn set_stats(&mut self, stats: PetStats) {
        self.hunger = stats.hunger;
        self.happiness = stats.happiness;
        self.energy = stats.energy;
    }

    fn fallback_evolution_state(&self) -> EvolutionManagerState {
        let defaults = EvolutionManagerState::default();
        EvolutionManagerState {
            total_xp: self.xp.unwrap_or(0),
            current_form_id: self.form_id.clone().unwrap_or(defaults.current_form_id),
            evolution_stage: self.stage.clone(),
            evolution_history: self.evolution_history.clone(),
            last_passive_xp_at: None,
        }
    }
}

impl Default for PetRecord {
    fn default() -> Self {
        Self::new(DEFAULT_PET_NAME)
    }
}

/// The `settings` block; unknown keys are preserved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether the host tends the pet on its own
    #[serde(default = "default_true")]
    pub auto_care_enabled: bool,
    /// Host-specific settings
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_care_enabled: true,
            extra: BTreeMap::new(),
        }
    }
}

/// Flags special-form rules depend on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialFlags {
    /// Stats ever fell to critical levels
    pub has_fainted: bool,
    /// Recovered from critical neglect
    pub was_revived: bool,
    /// Perfect-care streak in days
    pub consecutive_perfect_days: u32,
    /// Same streak under its older key
    pub perfect_care_streak: u32,
}

// =============================================================================
// Save Document
// =============================================================================

/// A complete save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Format version
    pub version: u32,
    /// When the save was written
    #[serde(
        default,
        alias = "last_save_time",
        with = "unix_seconds::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    /// Pet block
    #[serde(default)]
    pub pet: PetRecord,
    /// Evolution manager block; rebuilt from `pet` when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolution: Option<EvolutionManagerState>,
    /// Care tracker block
    #[serde(default)]
    pub care_tracker: CareTrackerState,
    /// Settings block
    #[serde(default)]
    pub settings: Settings,
    /// Special-form flags
    #[serde(default)]
    pub special_flags: SpecialFlags,
}

/// Components rebuilt from a save
#[derive(Debug)]
pub struct Restored {
    /// Ready-to-tick integrator
    pub integrator: EvolutionIntegrator,
    /// Pet block
    pub pet: PetRecord,
    /// Settings block
    pub settings: Settings,
    /// Special-form flags as saved
    pub special_flags: SpecialFlags,
    /// Time since the save, capped at [`MAX_OFFLINE_SECS`]
    pub offline: Duration,
}

impl SaveData {
    /// Parse a save document of any known version
    ///
    /// `now` stands in for timestamps older formats never recorded.
    ///
    /// # Errors
    ///
    /// [`SaveError::Json`] for malformed input, [`SaveError::UnsupportedVersion`]
    /// for documents newer than [`SAVE_VERSION`].
    pub fn from_json(json: &str, now: DateTime<Utc>) -> Result<Self, SaveError> {
        let raw: Value = serde_json::from_str(json)?;
        Self::from_value(raw, now)
    }

    /// Like [`from_json`](Self::from_json) for an already parsed document
    ///
    /// # Errors
    ///
    /// See [`from_json`](Self::from_json).
    pub fn from_value(raw: Value, now: DateTime<Utc>) -> Result<Self, SaveError> {
        let migrated = migrate(raw, now)?;
        Ok(serde_json::from_value(migrated)?)
    }

    /// Serialize as pretty JSON
    ///
    /// # Errors
    ///
    /// Only if a block contains a non-finite float.
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a save from live components
    #[must_use]
    pub fn capture(
        integrator: &EvolutionIntegrator,
        mut pet: PetRecord,
        settings: Settings,
        now: DateTime<Utc>,
    ) -> Self {
        let manager = integrator.manager();
        let tracker = integrator.tracker();
        let state = integrator.to_state();

        pet.form_id = Some(manager.current_form_id().to_string());
        pet.stage = Some(manager.evolution_stage().name().to_string());
        pet.level = Some(manager.level());
        // the evolution block is authoritative from version 3 on
        pet.xp = None;
        pet.evolution_history.clear();

        let streak = tracker.consecutive_perfect_days();
        let special_flags = SpecialFlags {
            has_fainted: tracker.was_critically_neglected(),
            was_revived: tracker.was_critically_neglected(),
            consecutive_perfect_days: streak,
            perfect_care_streak: streak,
        };

        Self {
            version: SAVE_VERSION,
            timestamp: Some(now),
            pet,
            evolution: Some(state.evolution_manager),
            care_tracker: state.care_tracker,
            settings,
            special_flags,
        }
    }

    /// Time since the save was written, between zero and one day
    #[must_use]
    pub fn offline_elapsed(&self, now: DateTime<Utc>) -> Duration {
        let cap = Duration::seconds(MAX_OFFLINE_SECS);
        self.timestamp
            .map_or_else(Duration::zero, |saved| now - saved)
            .clamp(Duration::zero(), cap)
    }

    /// Rebuild live components
    ///
    /// The passive-XP cursor is pulled forward so at most one day of
    /// offline XP is credited, and a saved revive flag re-arms the tracker's
    /// critical-neglect history.
    #[must_use]
    pub fn restore(self, config: &EngineConfig, clock: SharedClock) -> Restored {
        let now = clock.now();
        let offline = self.offline_elapsed(now);

        let mut evolution = self
            .evolution
            .unwrap_or_else(|| self.pet.fallback_evolution_state());
        let earliest = now - Duration::seconds(MAX_OFFLINE_SECS);
        evolution.last_passive_xp_at = evolution.last_passive_xp_at.map(|at| at.max(earliest));

        let manager = EvolutionManager::from_state(evolution, Arc::clone(&clock));
        let mut tracker =
            CareTracker::from_state(self.care_tracker, config.care.clone(), Arc::clone(&clock));
        if self.special_flags.was_revived && !tracker.was_critically_neglected() {
            tracker.mark_revived();
        }

        tracing::info!(
            form_id = manager.current_form_id(),
            level = manager.level(),
            offline_secs = offline.num_seconds(),
            "Save restored"
        );

        Restored {
            integrator: EvolutionIntegrator::from_parts(manager, tracker, config, clock),
            pet: self.pet,
            settings: self.settings,
            special_flags: self.special_flags,
            offline,
        }
    }

    /// Just the integrator block
    #[must_use]
    pub fn integrator_state(&self) -> IntegratorState {
        IntegratorState {
            evolution_manager: self
                .evolution
                .clone()
                .unwrap_or_else(|| self.pet.fallback_evolution_state()),
            care_tracker: self.care_tracker.clone(),
        }
    }
}

// =============================================================================
// Migration
// =============================================================================

/// Lift a save document of any known version to [`SAVE_VERSION`]
///
/// Non-object documents pass through untouched and fail at parse time.
///
/// # Errors
///
/// [`SaveError::UnsupportedVersion`] for documents newer than this engine.
pub fn migrate(raw: Value, now: DateTime<Utc>) -> Result<Value, SaveError> {
    let Value::Object(data) = raw else {
        return Ok(raw);
    };

    let version = data
        .get("version")
        .and_then(Value::as_u64)
        .map_or(1, |v| u32::try_from(v).unwrap_or(u32::MAX));

    match version {
        v if v > SAVE_VERSION => Err(SaveError::UnsupportedVersion(v)),
        SAVE_VERSION => Ok(Value::Object(data)),
        2 => {
            tracing::info!("Migrating save from v2 to v{SAVE_VERSION}");
            Ok(Value::Object(migrate_v2(data, now)))
        }
        _ => {
            tracing::info!("Migrating save from v1 to v{SAVE_VERSION}");
            Ok(Value::Object(migrate_v1(&data, now)))
        }
    }
}

fn migrate_v1(data: &Map<String, Value>, now: DateTime<Utc>) -> Map<String, Value> {
    let saved_at = data
        .get("last_save_time")
        .and_then(Value::as_f64)
        .filter(|s| *s > 0.0)
        .unwrap_or_else(|| unix_seconds::to_secs(&now));
    let hatched_at = saved_at - 86_400.0;
    let stat = |key: &str| data.get(key).and_then(Value::as_f64).unwrap_or(DEFAULT_STAT);

    let mut pet = json!({
        "name": data.get("name").and_then(Value::as_str).unwrap_or(DEFAULT_PET_NAME),
        "form_id": MIGRATED_FORM_ID,
        "stage": MIGRATED_STAGE,
        "level": 1,
        "hunger": stat("hunger"),
        "happiness": stat("happiness"),
        "energy": stat("energy"),
        "birth_time": hatched_at,
    });
    if let Some(creature_type) = data.get("creature_type") {
        pet["legacy_creature_type"] = creature_type.clone();
    }

    let migrated = json!({
        "version": SAVE_VERSION,
        "timestamp": saved_at,
        "pet": pet,
        "evolution": {
            "total_xp": 0,
            "current_form_id": MIGRATED_FORM_ID,
            "evolution_stage": MIGRATED_STAGE,
            "evolution_history": [
                { "form_id": MIGRATED_FORM_ID, "timestamp": hatched_at, "level": 1 }
            ],
            "last_time_xp_update": unix_seconds::to_secs(&now),
        },
        "settings": {
            "auto_care_enabled": data
                .get("auto_care_enabled")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        },
        "special_flags": SpecialFlags::default(),
    });

    match migrated {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn migrate_v2(mut data: Map<String, Value>, now: DateTime<Utc>) -> Map<String, Value> {
    data.insert("version".to_string(), json!(SAVE_VERSION));
    data.entry("special_flags")
        .or_insert_with(|| json!(SpecialFlags::default()));

    if !data.contains_key("evolution") {
        let pet = data.get("pet").and_then(Value::as_object);
        let has_progress = pet.is_some_and(|p| p.contains_key("xp") || p.contains_key("level"));
        if let Some(pet) = pet.filter(|_| has_progress) {
            let evolution = json!({
                "total_xp": pet.get("xp").cloned().unwrap_or(json!(0)),
                "current_form_id": pet.get("form_id").cloned().unwrap_or(json!(MIGRATED_FORM_ID)),
                "evolution_stage": pet.get("stage").cloned().unwrap_or(json!(MIGRATED_STAGE)),
                "evolution_history": pet.get("evolution_history").cloned().unwrap_or(json!([])),
                "last_time_xp_update": unix_seconds::to_secs(&now),
            });
            data.insert("evolution".to_string(), evolution);
        }
    }

    data
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::evolution::{EvolutionStage, Interaction};
    use pretty_assertions::assert_eq;

    fn secs(clock: &ManualClock) -> f64 {
        unix_seconds::to_secs(&clock.now())
    }

    // =========================================================================
    // Migration
    // =========================================================================

    #[test]
    fn test_migrate_v1_flat_save() {
        let clock = ManualClock::new();
        let saved_at = secs(&clock) - 3600.0;
        let v1 = json!({
            "name": "Mochi",
            "hunger": 42.0,
            "happiness": 55.5,
            "last_save_time": saved_at,
            "creature_type": "slime",
            "auto_care_enabled": false,
        });

        let save = SaveData::from_value(v1, clock.now()).unwrap();
        assert_eq!(save.version, SAVE_VERSION);
        assert_eq!(save.pet.name, "Mochi");
        assert_eq!(save.pet.hunger, 42.0);
        assert_eq!(save.pet.energy, DEFAULT_STAT);
        assert_eq!(save.pet.legacy_creature_type.as_deref(), Some("slime"));
        assert!(!save.settings.auto_care_enabled);

        let evolution = save.evolution.unwrap();
        assert_eq!(evolution.current_form_id, "bloblet");
        assert_eq!(evolution.evolution_stage.as_deref(), Some("BABY"));
        assert_eq!(evolution.evolution_history.len(), 1);
        assert_eq!(evolution.evolution_history[0].form_id, "bloblet");
        assert_eq!(evolution.evolution_history[0].level, 1);

        let hatched = unix_seconds::to_secs(&evolution.evolution_history[0].timestamp);
        assert!((hatched - (saved_at - 86_400.0)).abs() < 0.01);
    }

    #[test]
    fn test_migrate_v2_embedded_progress() {
        let clock = ManualClock::new();
        let v2 = json!({
            "version": 2,
            "last_save_time": secs(&clock) - 60.0,
            "pet": {
                "name": "Pip",
                "xp": 320,
                "level": 5,
                "form_id": "sleepy",
                "stage": "CHILD",
                "evolution_history": [
                    { "from_form": "bloblet", "to_form": "sleepy", "level_at_evolution": 5 }
                ]
            },
            "settings": { "volume": 3 }
        });

        let save = SaveData::from_value(v2, clock.now()).unwrap();
        assert_eq!(save.special_flags, SpecialFlags::default());
        assert_eq!(save.settings.extra.get("volume"), Some(&json!(3)));
        assert!(save.settings.auto_care_enabled);

        let evolution = save.evolution.unwrap();
        assert_eq!(evolution.total_xp, 320);
        assert_eq!(evolution.current_form_id, "sleepy");
        assert_eq!(evolution.evolution_history[0].form_id, "sleepy");
        assert_eq!(evolution.evolution_history[0].level, 5);
    }

    #[test]
    fn test_migrate_v2_without_progress_keeps_pet_only() {
        let clock = ManualClock::new();
        let v2 = json!({ "version": 2, "pet": { "name": "Pip" } });
        let save = SaveData::from_value(v2, clock.now()).unwrap();
        assert!(save.evolution.is_none());
        assert_eq!(save.integrator_state().evolution_manager.current_form_id, "egg");
    }

    #[test]
    fn test_newer_version_rejected() {
        let clock = ManualClock::new();
        let err = SaveData::from_value(json!({ "version": 9 }), clock.now()).unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_malformed_document_rejected() {
        let clock = ManualClock::new();
        assert!(matches!(
            SaveData::from_json("[1, 2]", clock.now()),
            Err(SaveError::Json(_))
        ));
        assert!(SaveData::from_json("{not json", clock.now()).is_err());
    }

    // =========================================================================
    // Capture and Restore
    // =========================================================================

    #[test]
    fn test_capture_restore_round_trip() {
        let clock = ManualClock::new();
        let config = EngineConfig::default();
        let mut integrator = EvolutionIntegrator::new(&config, clock.shared());
        integrator.grant_bonus_xp(300, "test");
        integrator.record_interaction(Interaction::Feed, Some(PetStats::new(0.0, 0.0, 0.0)));

        let mut settings = Settings::default();
        settings.extra.insert("theme".to_string(), json!("dark"));
        let save = SaveData::capture(&integrator, PetRecord::new("Mochi"), settings, clock.now());
        assert_eq!(save.pet.level, Some(integrator.manager().level()));
        assert_eq!(save.pet.form_id.as_deref(), Some("egg"));
        assert!(save.special_flags.has_fainted);

        let json = save.to_json().unwrap();
        clock.advance_secs(90);
        let restored = SaveData::from_json(&json, clock.now())
            .unwrap()
            .restore(&config, clock.shared());

        assert_eq!(restored.offline, Duration::seconds(90));
        assert_eq!(restored.pet.name, "Mochi");
        assert_eq!(restored.settings.extra.get("theme"), Some(&json!("dark")));
        assert_eq!(restored.integrator.manager().total_xp(), 305);
        assert_eq!(restored.integrator.manager().evolution_stage(), EvolutionStage::Egg);
        assert!(restored.integrator.tracker().was_critically_neglected());
        assert!(restored.integrator.force_evolution_check());
    }

    #[test]
    fn test_offline_time_capped() {
        let clock = ManualClock::new();
        let config = EngineConfig::default();
        let integrator = EvolutionIntegrator::new(&config, clock.shared());
        let save = SaveData::capture(&integrator, PetRecord::default(), Settings::default(), clock.now());

        clock.advance_days(3);
        assert_eq!(
            save.offline_elapsed(clock.now()),
            Duration::seconds(MAX_OFFLINE_SECS)
        );

        let mut restored = save.restore(&config, clock.shared());
        restored.integrator.process_evolution(PetStats::new(80.0, 80.0, 80.0));
        assert_eq!(restored.integrator.manager().total_xp(), 1440);
    }

    #[test]
    fn test_revive_flag_restored_without_tracker_block() {
        let clock = ManualClock::new();
        let v3 = json!({
            "version": 3,
            "special_flags": { "was_revived": true }
        });
        let restored = SaveData::from_value(v3, clock.now())
            .unwrap()
            .restore(&EngineConfig::default(), clock.shared());
        assert!(restored.integrator.tracker().was_critically_neglected());
        assert_eq!(restored.offline, Duration::zero());
    }
}
