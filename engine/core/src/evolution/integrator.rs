//! Evolution Integrator
//!
//! Facade the host tick loop talks to. It owns the event handler (which in
//! turn owns the manager and the care tracker), runs the per-tick cycle and
//! projects emitted events onto a coarse [`EvolutionStatus`] for UIs.
//!
//! # Example
//!
//! ```
//! use pet_engine_core::clock::ManualClock;
//! use pet_engine_core::config::EngineConfig;
//! use pet_engine_core::evolution::{EvolutionEventKind, EvolutionIntegrator, PetStats};
//!
//! let clock = ManualClock::new();
//! let mut integrator = EvolutionIntegrator::new(&EngineConfig::default(), clock.shared());
//!
//! integrator.grant_bonus_xp(1, "hatch");
//! let event = integrator.process_evolution(PetStats::new(80.0, 80.0, 80.0));
//! assert_eq!(event.map(|e| e.kind), Some(EvolutionEventKind::Ready));
//!
//! integrator.start_evolution().unwrap();
//! let done = integrator.complete_evolution().unwrap();
//! assert_eq!(done.new_form_id.as_deref(), Some("bloblet"));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::care::{CareEventKind, CareStyle, CareSummary, CareTracker, CareTrackerState};
use crate::clock::SharedClock;
use crate::config::EngineConfig;

use super::events::{CallbackId, EvolutionEvent, EvolutionEventHandler, EvolutionEventKind, SpecialForm};
use super::forms::{EvolutionForm, EvolutionStage};
use super::manager::{EvolutionManager, EvolutionManagerState, EvolutionPreview, HistoryEntry, XpSource};
use super::EvolutionError;

// =============================================================================
// Status
// =============================================================================

/// Coarse evolution status for presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvolutionStatus {
    /// Nothing pending
    #[default]
    Idle,
    /// Close to a stage-advancing level
    Imminent,
    /// Waiting for `start_evolution`
    Ready,
    /// Transition animation running
    Evolving,
    /// Celebration window after a completed evolution
    JustEvolved,
}

impl EvolutionStatus {
    /// Upper-case identifier
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Imminent => "IMMINENT",
            Self::Ready => "READY",
            Self::Evolving => "EVOLVING",
            Self::JustEvolved => "JUST_EVOLVED",
        }
    }
}

impl fmt::Display for EvolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
struct StatusTracker {
    status: EvolutionStatus,
    just_evolved_until: Option<DateTime<Utc>>,
}

impl StatusTracker {
    fn observe(&mut self, event: &EvolutionEvent, celebration: Duration) {
        self.status = match event.kind {
            EvolutionEventKind::Imminent => EvolutionStatus::Imminent,
            EvolutionEventKind::Ready => EvolutionStatus::Ready,
            EvolutionEventKind::Started => EvolutionStatus::Evolving,
            EvolutionEventKind::Complete | EvolutionEventKind::SpecialComplete => {
                self.just_evolved_until = Some(event.timestamp + celebration);
                EvolutionStatus::JustEvolved
            }
        };
    }

    fn expire(&mut self, now: DateTime<Utc>) {
        if self.status != EvolutionStatus::JustEvolved {
            return;
        }
        if self.just_evolved_until.map_or(true, |until| now >= until) {
            self.status = EvolutionStatus::Idle;
            self.just_evolved_until = None;
        }
    }

    fn reset(&mut self) {
        self.status = EvolutionStatus::Idle;
        self.just_evolved_until = None;
    }
}

// =============================================================================
// Interactions
// =============================================================================

/// Interaction name not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown interaction '{0}'")]
pub struct UnknownInteraction(pub String);

/// Something the owner did to the pet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    /// Fed
    Feed,
    /// Played with
    Play,
    /// Clicked
    Click,
    /// Petted
    Pet,
    /// Performed a trick
    Trick,
    /// Went to sleep
    SleepStart,
    /// Woke from a full sleep
    SleepComplete,
}

impl Interaction {
    /// All interactions
    pub const ALL: [Self; 7] = [
        Self::Feed,
        Self::Play,
        Self::Click,
        Self::Pet,
        Self::Trick,
        Self::SleepStart,
        Self::SleepComplete,
    ];

    /// Lower-case name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Click => "click",
            Self::Pet => "pet",
            Self::Trick => "trick",
            Self::SleepStart => "sleep_start",
            Self::SleepComplete => "sleep_complete",
        }
    }

    /// XP source credited, if any; falling asleep earns nothing
    #[must_use]
    pub const fn xp_source(&self) -> Option<XpSource> {
        match self {
            Self::Feed => Some(XpSource::Feed),
            Self::Play => Some(XpSource::Play),
            Self::Click | Self::Pet => Some(XpSource::Click),
            Self::Trick => Some(XpSource::Trick),
            Self::SleepStart => None,
            Self::SleepComplete => Some(XpSource::SleepComplete),
        }
    }

    /// Care event logged
    #[must_use]
    pub const fn care_event(&self) -> CareEventKind {
        match self {
            Self::Feed => CareEventKind::Feed,
            Self::Play => CareEventKind::Play,
            Self::Click | Self::Pet => CareEventKind::Attention,
            Self::Trick => CareEventKind::Trick,
            Self::SleepStart => CareEventKind::SleepStart,
            Self::SleepComplete => CareEventKind::SleepEnd,
        }
    }
}

impl FromStr for Interaction {
    type Err = UnknownInteraction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|i| i.name() == name)
            .ok_or_else(|| UnknownInteraction(s.to_string()))
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stat reading supplied by the host, each in 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PetStats {
    /// Fullness
    pub hunger: f64,
    /// Mood
    pub happiness: f64,
    /// Stamina
    pub energy: f64,
}

impl PetStats {
    /// Build a reading
    #[must_use]
    pub const fn new(hunger: f64, happiness: f64, energy: f64) -> Self {
        Self {
            hunger,
            happiness,
            energy,
        }
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Read-only picture of the evolution subsystem
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionState {
    /// Coarse status
    pub status: EvolutionStatus,
    /// Current form, if the id resolves
    pub current_form: Option<&'static EvolutionForm>,
    /// Recorded stage
    pub current_stage: EvolutionStage,
    /// Level
    pub level: u32,
    /// Lifetime XP
    pub total_xp: u64,
    /// `(xp into level, xp the next level costs)`
    pub xp_progress: (u64, u64),
    /// Fraction through the current level
    pub level_progress: f64,
    /// Current care style
    pub care_style: CareStyle,
    /// Successors with presentation likelihoods
    pub possible_evolutions: Vec<EvolutionPreview>,
    /// Completed evolutions
    pub evolution_history: Vec<HistoryEntry>,
    /// Target of a running transition
    pub pending_evolution: Option<String>,
    /// Special forms whose condition holds right now
    pub special_eligible: Vec<SpecialForm>,
}

/// Persisted integrator state; the event handler's transient flags are not
/// saved, so an interrupted transition reads as cancelled after a restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorState {
    /// Manager block
    pub evolution_manager: EvolutionManagerState,
    /// Tracker block
    pub care_tracker: CareTrackerState,
}

// =============================================================================
// Integrator
// =============================================================================

/// Unified entry point for the host loop
#[derive(Debug)]
pub struct EvolutionIntegrator {
    clock: SharedClock,
    handler: EvolutionEventHandler,
    status: Arc<Mutex<StatusTracker>>,
    status_listener: CallbackId,
}

impl EvolutionIntegrator {
    /// Fresh egg with an empty care history
    #[must_use]
    pub fn new(config: &EngineConfig, clock: SharedClock) -> Self {
        let manager = EvolutionManager::new(Arc::clone(&clock));
        let tracker = CareTracker::new(config.care.clone(), Arc::clone(&clock));
        Self::from_parts(manager, tracker, config, clock)
    }

    /// Rebuild from persisted state
    #[must_use]
    pub fn from_state(state: IntegratorState, config: &EngineConfig, clock: SharedClock) -> Self {
        let manager = EvolutionManager::from_state(state.evolution_manager, Arc::clone(&clock));
        let tracker =
            CareTracker::from_state(state.care_tracker, config.care.clone(), Arc::clone(&clock));
        Self::from_parts(manager, tracker, config, clock)
    }

    /// Wrap an existing manager and tracker
    #[must_use]
    pub fn from_parts(
        manager: EvolutionManager,
        tracker: CareTracker,
        config: &EngineConfig,
        clock: SharedClock,
    ) -> Self {
        let mut handler = EvolutionEventHandler::new(
            manager,
            tracker,
            config.evolution.clone(),
            Arc::clone(&clock),
        );

        let status = Arc::new(Mutex::new(StatusTracker::default()));
        let celebration = config.evolution.just_evolved_window();
        let listener_status = Arc::clone(&status);
        let status_listener =
            handler.add_callback(move |event| listener_status.lock().observe(event, celebration));

        Self {
            clock,
            handler,
            status,
            status_listener,
        }
    }

    /// Export state
    #[must_use]
    pub fn to_state(&self) -> IntegratorState {
        IntegratorState {
            evolution_manager: self.handler.manager().to_state(),
            care_tracker: self.handler.tracker().to_state(),
        }
    }

    /// The manager
    #[must_use]
    pub fn manager(&self) -> &EvolutionManager {
        self.handler.manager()
    }

    /// The care tracker
    #[must_use]
    pub fn tracker(&self) -> &CareTracker {
        self.handler.tracker()
    }

    /// The care tracker, mutably
    pub fn tracker_mut(&mut self) -> &mut CareTracker {
        self.handler.tracker_mut()
    }

    /// The event handler
    #[must_use]
    pub fn handler(&self) -> &EvolutionEventHandler {
        &self.handler
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Run one tick
    ///
    /// Awards passive XP, offers a stat snapshot (subject to the snapshot
    /// interval), lets the celebration window lapse, then polls the handler.
    pub fn process_evolution(&mut self, stats: PetStats) -> Option<EvolutionEvent> {
        self.handler.manager_mut().update_passive_xp();
        self.handler
            .tracker_mut()
            .record_snapshot(stats.hunger, stats.happiness, stats.energy, false);

        self.status.lock().expire(self.clock.now());

        self.handler.update()
    }

    /// Credit an interaction with XP and log it as a care event
    ///
    /// Returns the XP gained.
    pub fn record_interaction(&mut self, interaction: Interaction, stats: Option<PetStats>) -> u64 {
        let gained = interaction
            .xp_source()
            .map_or(0, |source| self.handler.manager_mut().add_xp(source, 1.0));

        let tracker = self.handler.tracker_mut();
        tracker.record_event(interaction.care_event(), None);
        if let Some(stats) = stats {
            tracker.record_snapshot(stats.hunger, stats.happiness, stats.energy, false);
        }

        tracing::debug!(interaction = interaction.name(), xp = gained, "Interaction recorded");
        gained
    }

    /// [`record_interaction`](Self::record_interaction) by name
    ///
    /// # Errors
    ///
    /// [`UnknownInteraction`] if the name is not recognised; nothing is recorded.
    pub fn record_named_interaction(
        &mut self,
        name: &str,
        stats: Option<PetStats>,
    ) -> Result<u64, UnknownInteraction> {
        let interaction = name.parse::<Interaction>()?;
        Ok(self.record_interaction(interaction, stats))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Begin the transition announced by the last READY event
    ///
    /// # Errors
    ///
    /// [`EvolutionError::NotReady`] unless the status is READY,
    /// [`EvolutionError::NoTarget`] if no form resolves, or the handler's
    /// error if it refuses the trigger.
    pub fn start_evolution(&mut self) -> Result<EvolutionEvent, EvolutionError> {
        let status = self.status();
        if status != EvolutionStatus::Ready {
            tracing::warn!(status = %status, "Cannot start evolution");
            return Err(EvolutionError::NotReady(status));
        }

        let Some(target) = self.handler.resolve_target() else {
            tracing::error!(
                form_id = self.handler.manager().current_form_id(),
                "Cannot start evolution: no target form found"
            );
            return Err(EvolutionError::NoTarget);
        };

        self.handler.trigger_evolution(target)
    }

    /// Finish the running transition
    ///
    /// # Errors
    ///
    /// Whatever the handler reports; the status returns to IDLE in that case.
    pub fn complete_evolution(&mut self) -> Result<EvolutionEvent, EvolutionError> {
        let result = self.handler.complete_evolution();
        if result.is_err() {
            self.status.lock().reset();
        }
        result
    }

    /// Abandon the running transition
    pub fn cancel_evolution(&mut self) {
        self.handler.cancel_evolution();
        self.status.lock().reset();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current coarse status
    #[must_use]
    pub fn status(&self) -> EvolutionStatus {
        self.status.lock().status
    }

    /// Full read-only snapshot
    #[must_use]
    pub fn evolution_status(&self) -> EvolutionState {
        let manager = self.handler.manager();
        let tracker = self.handler.tracker();

        EvolutionState {
            status: self.status(),
            current_form: manager.current_form(),
            current_stage: manager.evolution_stage(),
            level: manager.level(),
            total_xp: manager.total_xp(),
            xp_progress: manager.xp_to_next_level(),
            level_progress: manager.level_progress(),
            care_style: tracker.calculate_care_style(),
            possible_evolutions: manager.evolution_preview(Some(tracker)),
            evolution_history: manager.history().to_vec(),
            pending_evolution: self.handler.pending_form_id().map(str::to_string),
            special_eligible: self.handler.eligible_special_forms(),
        }
    }

    /// Care digest for the last 24 hours
    #[must_use]
    pub fn care_summary(&self) -> CareSummary {
        self.handler.tracker().care_summary()
    }

    /// Whether the pet is ready to evolve, without emitting anything
    #[must_use]
    pub fn force_evolution_check(&self) -> bool {
        self.handler.is_evolution_ready()
    }

    /// Award XP outside the interaction table
    pub fn grant_bonus_xp(&mut self, amount: u64, reason: &str) -> u64 {
        self.handler.manager_mut().add_xp_raw(amount, reason)
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Register an event callback; it runs after the status has been updated
    pub fn add_callback<F>(&mut self, callback: F) -> CallbackId
    where
        F: Fn(&EvolutionEvent) + Send + Sync + 'static,
    {
        self.handler.add_callback(callback)
    }

    /// Unregister an event callback
    ///
    /// The integrator's own status listener cannot be removed.
    pub fn remove_callback(&mut self, id: CallbackId) -> bool {
        if id == self.status_listener {
            tracing::warn!("Refusing to remove the status listener");
            return false;
        }
        self.handler.remove_callback(id)
    }
}

// =============================================================================
// Tests
// =============================================================================
