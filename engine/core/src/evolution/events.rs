//! Evolution Events
//!
//! The [`EvolutionEventHandler`] wraps an [`EvolutionManager`] and a
//! [`CareTracker`] in a transition protocol:
//!
//! ```text
//!            update()              update()            trigger_evolution()
//!   IDLE ─────────────▶ IMMINENT ─────────────▶ READY ─────────────────────▶ IN PROGRESS
//!     ▲                                                                         │
//!     └──────────────── complete_evolution() / cancel_evolution() ──────────────┘
//! ```
//!
//! Only one evolution may be in progress at a time. Every emitted event is
//! delivered to registered callbacks; a panicking callback is logged and
//! skipped without blocking the others.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::care::CareTracker;
use crate::clock::{unix_seconds, SharedClock};
use crate::config::EvolutionConfig;

use super::forms::{self, EvolutionForm};
use super::manager::EvolutionManager;
use super::EvolutionError;

// =============================================================================
// Event Types
// =============================================================================

/// What an [`EvolutionEvent`] announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvolutionEventKind {
    /// Within the XP margin of a stage-advancing level
    Imminent,
    /// Ready to evolve; carries the resolved target
    Ready,
    /// Transition animation has begun
    Started,
    /// Transition finished into a regular form
    Complete,
    /// Transition finished into a special form
    SpecialComplete,
}

/// Animation the presentation layer should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AnimationHint {
    /// Regular stage change
    #[default]
    #[serde(rename = "evolution_standard")]
    Standard,
    /// Golden transformation
    #[serde(rename = "evolution_golden")]
    Golden,
    /// Ghost emergence
    #[serde(rename = "evolution_ghost")]
    Ghost,
    /// Rainbow shimmer
    #[serde(rename = "evolution_rainbow")]
    Rainbow,
}

impl AnimationHint {
    /// Animation identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "evolution_standard",
            Self::Golden => "evolution_golden",
            Self::Ghost => "evolution_ghost",
            Self::Rainbow => "evolution_rainbow",
        }
    }
}

/// Something that happened in the evolution protocol; never mutated once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEvent {
    /// Event kind
    pub kind: EvolutionEventKind,
    /// When it was produced
    #[serde(with = "unix_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Form before the transition
    pub old_form_id: Option<String>,
    /// Form after the transition
    pub new_form_id: Option<String>,
    /// Animation to play
    pub animation: AnimationHint,
    /// Kind-specific extras (`level`, `is_special`, `xp_remaining`, ...)
    pub metadata: BTreeMap<String, Value>,
}

impl EvolutionEvent {
    fn new(kind: EvolutionEventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            timestamp,
            old_form_id: None,
            new_form_id: None,
            animation: AnimationHint::Standard,
            metadata: BTreeMap::new(),
        }
    }

    fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Target form, if the event names one
    #[must_use]
    pub fn new_form(&self) -> Option<&'static EvolutionForm> {
        self.new_form_id.as_deref().and_then(forms::form_by_id)
    }
}

/// Rare forms outside the normal successor graph, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialForm {
    /// Long perfect-care streak
    Golden,
    /// Evolving on a holiday
    Rainbow,
    /// Survived critical neglect
    Ghost,
}

impl SpecialForm {
    /// Priority order used when several are eligible
    pub const PRIORITY: [Self; 3] = [Self::Golden, Self::Rainbow, Self::Ghost];

    /// Catalog id
    #[must_use]
    pub const fn form_id(&self) -> &'static str {
        match self {
            Self::Golden => "golden",
            Self::Rainbow => "rainbow",
            Self::Ghost => "ghost",
        }
    }

    /// Animation played when evolving into this form
    #[must_use]
    pub const fn animation(&self) -> AnimationHint {
        match self {
            Self::Golden => AnimationHint::Golden,
            Self::Rainbow => AnimationHint::Rainbow,
            Self::Ghost => AnimationHint::Ghost,
        }
    }

    /// Special form for a catalog id
    #[must_use]
    pub fn from_form_id(id: &str) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|s| s.form_id() == id)
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Callback invoked for every emitted event
pub type EvolutionCallback = Box<dyn Fn(&EvolutionEvent) + Send + Sync>;

/// Handle returned on registration, used to remove a callback later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

/// Ordered set of evolution callbacks with per-callback panic isolation
pub struct EvolutionCallbackManager {
    next_id: u64,
    callbacks: Vec<(CallbackId, EvolutionCallback)>,
}

impl EvolutionCallbackManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            callbacks: Vec::new(),
        }
    }

    /// Register a callback; callbacks run in registration order
    pub fn on_evolution<F>(&mut self, callback: F) -> CallbackId
    where
        F: Fn(&EvolutionEvent) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Unregister a callback; returns whether it was registered
    pub fn remove(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cid, _)| *cid != id);
        self.callbacks.len() != before
    }

    /// Deliver `event` to every callback
    ///
    /// A panicking callback is logged and delivery continues with the next.
    pub fn notify(&self, event: &EvolutionEvent) {
        for (id, callback) in &self.callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::error!(
                    callback = id.0,
                    kind = ?event.kind,
                    "Evolution callback panicked"
                );
            }
        }
    }

    /// Number of registered callbacks
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Remove every callback
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }
}

impl Default for EvolutionCallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EvolutionCallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionCallbackManager")
            .field("callback_count", &self.callbacks.len())
            .finish()
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Drives the evolution transition protocol
///
/// Transient state (in progress, pending event, imminent notice) is never
/// persisted; after a restart an interrupted transition is simply gone and
/// the next `update()` re-detects readiness.
#[derive(Debug)]
pub struct EvolutionEventHandler {
    config: EvolutionConfig,
    clock: SharedClock,
    manager: EvolutionManager,
    tracker: CareTracker,
    callbacks: EvolutionCallbackManager,
    evolution_in_progress: bool,
    imminent_notified: bool,
    pending: Option<EvolutionEvent>,
}

impl EvolutionEventHandler {
    /// Wrap a manager and tracker
    #[must_use]
    pub fn new(
        manager: EvolutionManager,
        tracker: CareTracker,
        config: EvolutionConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            config,
            clock,
            manager,
            tracker,
            callbacks: EvolutionCallbackManager::new(),
            evolution_in_progress: false,
            imminent_notified: false,
            pending: None,
        }
    }

    /// The wrapped manager
    #[must_use]
    pub fn manager(&self) -> &EvolutionManager {
        &self.manager
    }

    /// The wrapped manager, mutably
    pub fn manager_mut(&mut self) -> &mut EvolutionManager {
        &mut self.manager
    }

    /// The wrapped tracker
    #[must_use]
    pub fn tracker(&self) -> &CareTracker {
        &self.tracker
    }

    /// The wrapped tracker, mutably
    pub fn tracker_mut(&mut self) -> &mut CareTracker {
        &mut self.tracker
    }

    /// Unwrap into the manager and tracker, dropping transient state
    #[must_use]
    pub fn into_parts(self) -> (EvolutionManager, CareTracker) {
        (self.manager, self.tracker)
    }

    /// Register an event callback
    pub fn add_callback<F>(&mut self, callback: F) -> CallbackId
    where
        F: Fn(&EvolutionEvent) + Send + Sync + 'static,
    {
        self.callbacks.on_evolution(callback)
    }

    /// Unregister an event callback
    pub fn remove_callback(&mut self, id: CallbackId) -> bool {
        self.callbacks.remove(id)
    }

    /// Number of registered callbacks
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.callback_count()
    }

    fn emit(&self, event: &EvolutionEvent) {
        self.callbacks.notify(event);
    }

    // =========================================================================
    // Detection
    // =========================================================================

    /// Whether the next level crosses a stage boundary and is within the
    /// configured XP margin
    ///
    /// Only the next level is considered; a single large XP gain can skip
    /// straight to ready.
    #[must_use]
    pub fn is_evolution_imminent(&self) -> bool {
        if self.manager.check_evolution_ready() {
            return false;
        }
        let (current, needed) = self.manager.xp_to_next_level();
        let remaining = needed.saturating_sub(current);
        let next_stage = EvolutionManager::stage_for_level(self.manager.level() + 1);

        next_stage > self.manager.evolution_stage()
            && remaining <= self.config.imminent_xp_threshold
    }

    /// Whether the pet should evolve now
    #[must_use]
    pub fn is_evolution_ready(&self) -> bool {
        self.manager.check_evolution_ready()
    }

    fn is_special_eligible(&self, special: SpecialForm) -> bool {
        match special {
            SpecialForm::Golden => self
                .tracker
                .check_perfect_care_streak(self.config.golden_perfect_days, self.config.golden_min_stat),
            SpecialForm::Rainbow => self.tracker.is_special_date(),
            SpecialForm::Ghost => self.tracker.was_critically_neglected(),
        }
    }

    /// Highest-priority special form the pet qualifies for right now
    ///
    /// Requires at least `special_min_level`. Golden beats Rainbow beats Ghost.
    #[must_use]
    pub fn check_special_evolution_eligibility(&self) -> Option<SpecialForm> {
        if self.manager.level() < self.config.special_min_level {
            return None;
        }
        SpecialForm::PRIORITY
            .into_iter()
            .find(|s| self.is_special_eligible(*s))
    }

    /// Every special form whose condition currently holds, ignoring level
    #[must_use]
    pub fn eligible_special_forms(&self) -> Vec<SpecialForm> {
        SpecialForm::PRIORITY
            .into_iter()
            .filter(|s| self.is_special_eligible(*s))
            .collect()
    }

    /// Target for the next evolution: a special form if eligible, else the
    /// manager's regular pick
    #[must_use]
    pub fn resolve_target(&self) -> Option<&'static str> {
        self.check_special_evolution_eligibility()
            .map(|s| s.form_id())
            .or_else(|| self.manager.calculate_evolution_form(Some(&self.tracker)))
    }

    /// Animation for evolving into `form_id`
    #[must_use]
    pub fn animation_for_form(&self, form_id: &str) -> AnimationHint {
        forms::canonical_form_id(form_id)
            .and_then(SpecialForm::from_form_id)
            .map_or(AnimationHint::Standard, |s| s.animation())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Poll for imminent or ready conditions
    ///
    /// Returns nothing while a transition is in progress. IMMINENT fires at
    /// most once per evolution cycle; READY fires on every call while ready.
    pub fn update(&mut self) -> Option<EvolutionEvent> {
        if self.evolution_in_progress {
            return None;
        }

        if !self.imminent_notified && self.is_evolution_imminent() {
            self.imminent_notified = true;
            let (current, needed) = self.manager.xp_to_next_level();
            let mut event = EvolutionEvent::new(EvolutionEventKind::Imminent, self.clock.now())
                .with_meta("xp_remaining", json!(needed.saturating_sub(current)));
            event.old_form_id = Some(self.manager.current_form_id().to_string());

            tracing::debug!(form_id = self.manager.current_form_id(), "Evolution imminent");
            self.emit(&event);
            return Some(event);
        }

        if !self.is_evolution_ready() {
            return None;
        }

        let Some(target) = self.resolve_target() else {
            tracing::error!(
                form_id = self.manager.current_form_id(),
                level = self.manager.level(),
                "Evolution ready but no target form resolves"
            );
            return None;
        };

        let is_special = forms::form_by_id(target).is_some_and(|f| f.is_special);
        let mut event = EvolutionEvent::new(EvolutionEventKind::Ready, self.clock.now())
            .with_meta("is_special", json!(is_special));
        event.old_form_id = Some(self.manager.current_form_id().to_string());
        event.new_form_id = Some(target.to_string());

        self.emit(&event);
        Some(event)
    }

    /// Begin a transition into `form_id`
    ///
    /// # Errors
    ///
    /// [`EvolutionError::AlreadyInProgress`] if a transition is running, or
    /// [`EvolutionError::UnknownForm`] for an id not in the catalog. State is
    /// unchanged in both cases.
    pub fn trigger_evolution(&mut self, form_id: &str) -> Result<EvolutionEvent, EvolutionError> {
        if self.evolution_in_progress {
            tracing::warn!(form_id, "Evolution already in progress");
            return Err(EvolutionError::AlreadyInProgress);
        }

        let Some(form) = forms::form_by_id(form_id) else {
            tracing::error!(form_id, "Cannot trigger evolution: form not found");
            return Err(EvolutionError::UnknownForm(form_id.to_string()));
        };

        let animation = self.animation_for_form(form.id);
        let mut event = EvolutionEvent::new(EvolutionEventKind::Started, self.clock.now())
            .with_meta("old_stage", json!(self.manager.evolution_stage().name()))
            .with_meta("new_stage", json!(form.stage.name()))
            .with_meta("level", json!(self.manager.level()))
            .with_meta("is_special", json!(form.is_special));
        event.old_form_id = Some(self.manager.current_form_id().to_string());
        event.new_form_id = Some(form.id.to_string());
        event.animation = animation;

        self.evolution_in_progress = true;
        self.pending = Some(event.clone());

        tracing::info!(
            from = self.manager.current_form_id(),
            to = form.id,
            animation = animation.as_str(),
            "Evolution started"
        );
        self.emit(&event);
        Ok(event)
    }

    /// Finish the pending transition
    ///
    /// If the manager rejects the target the transition is still cleared, so
    /// the state machine never stays stuck.
    ///
    /// # Errors
    ///
    /// [`EvolutionError::NothingPending`] without a started transition, or the
    /// manager's error if it rejects the target.
    pub fn complete_evolution(&mut self) -> Result<EvolutionEvent, EvolutionError> {
        let pending = match self.pending.take() {
            Some(pending) if self.evolution_in_progress => pending,
            _ => {
                tracing::warn!("No evolution in progress to complete");
                self.evolution_in_progress = false;
                return Err(EvolutionError::NothingPending);
            }
        };
        self.evolution_in_progress = false;

        let Some(new_form_id) = pending.new_form_id.clone() else {
            tracing::error!("Pending evolution has no target form");
            return Err(EvolutionError::NoTarget);
        };

        self.manager.execute_evolution(&new_form_id)?;
        self.imminent_notified = false;

        let form = self.manager.current_form();
        let is_special = form.is_some_and(|f| f.is_special);
        let kind = if is_special {
            EvolutionEventKind::SpecialComplete
        } else {
            EvolutionEventKind::Complete
        };

        let mut event = EvolutionEvent::new(kind, self.clock.now())
            .with_meta("form_name", json!(form.map_or("Unknown", |f| f.name)))
            .with_meta("form_description", json!(form.map_or("", |f| f.description)))
            .with_meta("stage", json!(self.manager.evolution_stage().name()))
            .with_meta("level", json!(self.manager.level()))
            .with_meta("total_evolutions", json!(self.manager.history().len()));
        event.old_form_id = pending.old_form_id;
        event.new_form_id = Some(self.manager.current_form_id().to_string());
        event.animation = pending.animation;

        tracing::info!(
            form_id = self.manager.current_form_id(),
            level = self.manager.level(),
            special = is_special,
            "Evolution completed"
        );
        self.emit(&event);
        Ok(event)
    }

    /// Abandon the pending transition without touching the manager
    pub fn cancel_evolution(&mut self) {
        if self.evolution_in_progress {
            tracing::info!("Evolution cancelled");
        }
        self.evolution_in_progress = false;
        self.pending = None;
    }

    /// Whether a transition is running
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.evolution_in_progress
    }

    /// Target of the running transition
    #[must_use]
    pub fn pending_form_id(&self) -> Option<&str> {
        self.pending.as_ref().and_then(|e| e.new_form_id.as_deref())
    }
}

// =============================================================================
// Tests
// =============================================================================
