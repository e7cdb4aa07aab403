//! Experience, Levels and Form Selection
//!
//! The [`EvolutionManager`] owns the pet's total XP, derives its level from
//! a tiered cost table, decides when the current form is due to advance and
//! which successor it should become.
//!
//! # Level Tiers
//!
//! | Levels | XP per level | Cumulative at tier end |
//! |--------|--------------|------------------------|
//! | 1-5    | 50           | 250                    |
//! | 6-15   | 100          | 1,250                  |
//! | 16-30  | 150          | 3,500                  |
//! | 31-100 | 200          | 17,500                 |
//!
//! Any XP at all puts the pet at level 1; level 0 means untouched.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::care::{CareStyle, CareTracker};
use crate::clock::{unix_seconds, SharedClock};

use super::forms::{self, EvolutionForm, EvolutionStage, STARTING_FORM_ID};
use super::EvolutionError;

// =============================================================================
// XP Sources
// =============================================================================

/// Where experience comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum XpSource {
    /// Feeding
    Feed,
    /// Play session
    Play,
    /// Click or pet
    Click,
    /// Trick performed
    Trick,
    /// One minute alive (passive)
    TimeAlive,
    /// Woke from a full sleep
    SleepComplete,
    /// Daily perfect-care bonus
    PerfectCareBonus,
    /// Granted on every completed evolution
    EvolutionBonus,
    /// Daily login
    DailyLogin,
}

impl XpSource {
    /// Base XP before any multiplier
    #[must_use]
    pub const fn base_xp(&self) -> u64 {
        match self {
            Self::Feed => 5,
            Self::Play => 10,
            Self::Click => 1,
            Self::Trick => 3,
            Self::TimeAlive => 1,
            Self::SleepComplete => 5,
            Self::PerfectCareBonus => 20,
            Self::EvolutionBonus => 50,
            Self::DailyLogin => 10,
        }
    }
}

// =============================================================================
// Level Math
// =============================================================================

/// A contiguous range of levels sharing one per-level cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelTier {
    /// First level in the tier
    pub level_min: u32,
    /// Last level in the tier (inclusive)
    pub level_max: u32,
    /// XP each level in the tier costs
    pub xp_per_level: u64,
}

impl LevelTier {
    const fn levels(&self) -> u32 {
        self.level_max - self.level_min + 1
    }

    const fn total_cost(&self) -> u64 {
        self.levels() as u64 * self.xp_per_level
    }
}

/// Level cost table, in order
pub const LEVEL_TIERS: [LevelTier; 4] = [
    LevelTier { level_min: 1, level_max: 5, xp_per_level: 50 },
    LevelTier { level_min: 6, level_max: 15, xp_per_level: 100 },
    LevelTier { level_min: 16, level_max: 30, xp_per_level: 150 },
    LevelTier { level_min: 31, level_max: 100, xp_per_level: 200 },
];

/// Highest reachable level
pub const MAX_LEVEL: u32 = 100;

/// Level for a total XP amount
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn level_for_xp(total_xp: u64) -> u32 {
    if total_xp == 0 {
        return 0;
    }

    let mut remaining = total_xp;
    let mut level = 0;
    for tier in &LEVEL_TIERS {
        let cost = tier.total_cost();
        if remaining >= cost {
            level = tier.level_max;
            remaining -= cost;
        } else {
            // remaining < cost, so the quotient fits in a u32
            level = tier.level_min - 1 + (remaining / tier.xp_per_level) as u32;
            break;
        }
    }
    level.max(1)
}

/// Total XP needed to reach `level`
///
/// Levels past [`MAX_LEVEL`] cost nothing further.
#[must_use]
pub fn xp_for_level(level: u32) -> u64 {
    LEVEL_TIERS
        .iter()
        .take_while(|tier| level >= tier.level_min)
        .map(|tier| u64::from(level.min(tier.level_max) - tier.level_min + 1) * tier.xp_per_level)
        .sum()
}

// =============================================================================
// History and Preview
// =============================================================================

fn default_history_form() -> String {
    STARTING_FORM_ID.to_string()
}

/// One completed evolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Form evolved into
    #[serde(default = "default_history_form", alias = "to_form")]
    pub form_id: String,
    /// When it happened
    #[serde(default, with = "unix_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Level at the time
    #[serde(default, alias = "level_at_evolution")]
    pub level: u32,
}

/// A possible next form and a presentation-only likelihood
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvolutionPreview {
    /// Candidate form
    pub form: &'static EvolutionForm,
    /// 0.0 if the level is short, 0.8 on style match, 0.5 for any-style forms, else 0.1
    pub likelihood: f64,
}

// =============================================================================
// Persisted State
// =============================================================================

/// Serializable form of an [`EvolutionManager`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionManagerState {
    /// Lifetime XP
    pub total_xp: u64,
    /// Current form id
    pub current_form_id: String,
    /// Stage name; missing or unknown falls back to the form's stage
    pub evolution_stage: Option<String>,
    /// Completed evolutions, oldest first
    pub evolution_history: Vec<HistoryEntry>,
    /// Passive XP cursor; missing means "now"
    #[serde(rename = "last_time_xp_update", with = "unix_seconds::option")]
    pub last_passive_xp_at: Option<DateTime<Utc>>,
}

impl Default for EvolutionManagerState {
    fn default() -> Self {
        Self {
            total_xp: 0,
            current_form_id: STARTING_FORM_ID.to_string(),
            evolution_stage: None,
            evolution_history: Vec::new(),
            last_passive_xp_at: None,
        }
    }
}

// =============================================================================
// Manager
// =============================================================================

/// XP, level and form bookkeeping
#[derive(Debug)]
pub struct EvolutionManager {
    clock: SharedClock,
    total_xp: u64,
    current_form_id: String,
    evolution_stage: EvolutionStage,
    evolution_history: Vec<HistoryEntry>,
    last_passive_xp_at: DateTime<Utc>,
}

impl EvolutionManager {
    /// A freshly laid egg with no XP
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        let now = clock.now();
        Self {
            clock,
            total_xp: 0,
            current_form_id: STARTING_FORM_ID.to_string(),
            evolution_stage: EvolutionStage::Egg,
            evolution_history: Vec::new(),
            last_passive_xp_at: now,
        }
    }

    /// Rebuild from saved state
    ///
    /// Legacy form ids are normalised to their canonical form. An unknown id
    /// restarts the pet as an egg; its XP is kept, so it re-walks the stages
    /// it has already earned.
    #[must_use]
    pub fn from_state(state: EvolutionManagerState, clock: SharedClock) -> Self {
        let (form, restarted) = match forms::form_by_id(&state.current_form_id) {
            Some(form) => (form, false),
            None => {
                tracing::warn!(
                    form_id = %state.current_form_id,
                    "Unknown form in saved state, restarting as egg"
                );
                (forms::starting_form(), true)
            }
        };

        let evolution_stage = state
            .evolution_stage
            .as_deref()
            .filter(|_| !restarted)
            .and_then(EvolutionStage::from_name)
            .unwrap_or(form.stage);

        let last_passive_xp_at = state.last_passive_xp_at.unwrap_or_else(|| clock.now());

        Self {
            clock,
            total_xp: state.total_xp,
            current_form_id: form.id.to_string(),
            evolution_stage,
            evolution_history: state.evolution_history,
            last_passive_xp_at,
        }
    }

    /// Export state
    #[must_use]
    pub fn to_state(&self) -> EvolutionManagerState {
        EvolutionManagerState {
            total_xp: self.total_xp,
            current_form_id: self.current_form_id.clone(),
            evolution_stage: Some(self.evolution_stage.name().to_string()),
            evolution_history: self.evolution_history.clone(),
            last_passive_xp_at: Some(self.last_passive_xp_at),
        }
    }

    // =========================================================================
    // XP
    // =========================================================================

    /// Award XP from `source`, scaled by `multiplier` and floored
    ///
    /// Negative or non-finite multipliers award nothing. Returns the XP gained.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn add_xp(&mut self, source: XpSource, multiplier: f64) -> u64 {
        let scaled = source.base_xp() as f64 * multiplier;
        let gained = if scaled.is_finite() && scaled > 0.0 {
            scaled.floor() as u64
        } else {
            0
        };
        self.total_xp = self.total_xp.saturating_add(gained);
        tracing::debug!(source = ?source, gained, total_xp = self.total_xp, "Gained XP");
        gained
    }

    /// Award an arbitrary amount of XP
    pub fn add_xp_raw(&mut self, amount: u64, reason: &str) -> u64 {
        self.total_xp = self.total_xp.saturating_add(amount);
        tracing::debug!(reason, gained = amount, total_xp = self.total_xp, "Gained XP");
        amount
    }

    /// Award one XP per whole minute since the last passive award
    ///
    /// The cursor only advances by the minutes consumed, so partial minutes
    /// carry over to the next call.
    pub fn update_passive_xp(&mut self) -> u64 {
        let elapsed = self.clock.now() - self.last_passive_xp_at;
        let whole_minutes = elapsed.num_minutes();
        if whole_minutes <= 0 {
            return 0;
        }

        self.last_passive_xp_at += Duration::minutes(whole_minutes);
        let minutes = u64::try_from(whole_minutes).unwrap_or(0);
        let gained = minutes.saturating_mul(XpSource::TimeAlive.base_xp());
        self.total_xp = self.total_xp.saturating_add(gained);
        tracing::debug!(minutes, gained, total_xp = self.total_xp, "Passive XP");
        gained
    }

    /// Lifetime XP
    #[must_use]
    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    /// Current level
    #[must_use]
    pub fn level(&self) -> u32 {
        level_for_xp(self.total_xp)
    }

    /// Total XP needed to reach `level`
    #[must_use]
    pub fn xp_for_level(level: u32) -> u64 {
        xp_for_level(level)
    }

    /// `(xp into the current level, xp the next level costs)`
    ///
    /// While below the level-1 mark (1-49 XP) the first value stays 0.
    #[must_use]
    pub fn xp_to_next_level(&self) -> (u64, u64) {
        let level = self.level();
        let current = xp_for_level(level);
        let next = xp_for_level(level + 1);
        (self.total_xp.saturating_sub(current), next - current)
    }

    /// Fraction of the way through the current level, 0.0-1.0
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn level_progress(&self) -> f64 {
        let (current, needed) = self.xp_to_next_level();
        if needed == 0 {
            return 1.0;
        }
        (current as f64 / needed as f64).min(1.0)
    }

    /// Stage implied by `level`
    #[must_use]
    pub fn stage_for_level(level: u32) -> EvolutionStage {
        EvolutionStage::for_level(level)
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// Current form id
    #[must_use]
    pub fn current_form_id(&self) -> &str {
        &self.current_form_id
    }

    /// Current catalog entry
    #[must_use]
    pub fn current_form(&self) -> Option<&'static EvolutionForm> {
        forms::form_by_id(&self.current_form_id)
    }

    /// Recorded stage of the current form
    #[must_use]
    pub fn evolution_stage(&self) -> EvolutionStage {
        self.evolution_stage
    }

    /// Completed evolutions, oldest first
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.evolution_history
    }

    /// Whether the level has outgrown the current stage and a successor exists
    #[must_use]
    pub fn check_evolution_ready(&self) -> bool {
        if self.current_form().is_none() || forms::successors(&self.current_form_id).is_empty() {
            return false;
        }
        Self::stage_for_level(self.level()) > self.evolution_stage
    }

    /// Care style used for form selection; Balanced without a tracker
    #[must_use]
    pub fn care_style(tracker: Option<&CareTracker>) -> CareStyle {
        tracker.map_or(CareStyle::Balanced, CareTracker::calculate_care_style)
    }

    /// Resolve which successor the pet should become
    ///
    /// First successor accepting the care style with its level met, else the
    /// first with its level met. `None` when not ready.
    #[must_use]
    pub fn calculate_evolution_form(&self, tracker: Option<&CareTracker>) -> Option<&'static str> {
        if !self.check_evolution_ready() {
            return None;
        }

        let style = Self::care_style(tracker);
        let level = self.level();
        let candidates = forms::successors(&self.current_form_id);

        candidates
            .iter()
            .find(|f| f.requirements.care_styles.contains(&style) && level >= f.requirements.min_level)
            .or_else(|| candidates.iter().find(|f| level >= f.requirements.min_level))
            .map(|f| f.id)
    }

    /// Switch to `new_form_id`, record it in history and grant the bonus
    ///
    /// # Errors
    ///
    /// [`EvolutionError::UnknownForm`] if the id is not in the catalog; the
    /// manager is left untouched.
    pub fn execute_evolution(&mut self, new_form_id: &str) -> Result<(), EvolutionError> {
        let Some(form) = forms::form_by_id(new_form_id) else {
            tracing::error!(form_id = new_form_id, "Cannot evolve: form not found");
            return Err(EvolutionError::UnknownForm(new_form_id.to_string()));
        };

        self.evolution_history.push(HistoryEntry {
            form_id: form.id.to_string(),
            timestamp: self.clock.now(),
            level: self.level(),
        });

        let old_form = std::mem::replace(&mut self.current_form_id, form.id.to_string());
        self.evolution_stage = form.stage;
        self.add_xp(XpSource::EvolutionBonus, 1.0);

        tracing::info!(
            from = %old_form,
            to = form.id,
            stage = form.stage.name(),
            level = self.level(),
            "Evolution complete"
        );
        Ok(())
    }

    /// Every successor with a presentation-only likelihood
    #[must_use]
    pub fn evolution_preview(&self, tracker: Option<&CareTracker>) -> Vec<EvolutionPreview> {
        let style = Self::care_style(tracker);
        let level = self.level();

        forms::successors(&self.current_form_id)
            .into_iter()
            .map(|form| {
                let req = &form.requirements;
                let likelihood = if level < req.min_level {
                    0.0
                } else if req.care_styles.contains(&style) {
                    0.8
                } else if req.care_styles.is_empty() {
                    0.5
                } else {
                    0.1
                };
                EvolutionPreview { form, likelihood }
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::CareConfig;

    fn manager() -> (EvolutionManager, ManualClock) {
        let clock = ManualClock::new();
        (EvolutionManager::new(clock.shared()), clock)
    }

    // =========================================================================
    // Level Math
    // =========================================================================

    #[test]
    fn test_level_zero_without_xp() {
        assert_eq!(level_for_xp(0), 0);
        assert_eq!(level_for_xp(1), 1);
        assert_eq!(level_for_xp(49), 1);
        assert_eq!(level_for_xp(50), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(xp_for_level(5), 250);
        assert_eq!(xp_for_level(6), 350);
        assert_eq!(xp_for_level(15), 1250);
        assert_eq!(xp_for_level(30), 3500);
        assert_eq!(xp_for_level(100), 17_500);
        assert_eq!(xp_for_level(101), 17_500);
        assert_eq!(level_for_xp(1_000_000), MAX_LEVEL);
    }

    #[test]
    fn test_level_xp_inverse_law() {
        for level in 0..=MAX_LEVEL {
            assert_eq!(level_for_xp(xp_for_level(level)), level, "level {level}");
        }
    }

    #[test]
    fn test_level_is_monotonic() {
        let mut last = 0;
        for xp in (0..20_000).step_by(7) {
            let level = level_for_xp(xp);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn test_xp_to_next_level() {
        let (mut m, _clock) = manager();
        m.add_xp_raw(240, "test");
        assert_eq!(m.level(), 4);
        assert_eq!(m.xp_to_next_level(), (40, 50));
        assert!((m.level_progress() - 0.8).abs() < 1e-9);

        m.add_xp_raw(17_500, "test");
        assert_eq!(m.xp_to_next_level().1, 0);
        assert!((m.level_progress() - 1.0).abs() < f64::EPSILON);
    }

    // =========================================================================
    // XP
    // =========================================================================

    #[test]
    fn test_add_xp_table_and_multiplier() {
        let (mut m, _clock) = manager();
        assert_eq!(m.add_xp(XpSource::Play, 1.0), 10);
        assert_eq!(m.add_xp(XpSource::Feed, 1.5), 7);
        assert_eq!(m.add_xp(XpSource::Trick, -2.0), 0);
        assert_eq!(m.add_xp(XpSource::Click, f64::NAN), 0);
        assert_eq!(m.total_xp(), 17);
    }

    #[test]
    fn test_passive_xp_carries_partial_minutes() {
        let (mut m, clock) = manager();
        clock.advance_secs(90);
        assert_eq!(m.update_passive_xp(), 1);
        clock.advance_secs(30);
        assert_eq!(m.update_passive_xp(), 1);
        clock.advance_secs(59);
        assert_eq!(m.update_passive_xp(), 0);
        clock.advance_minutes(10);
        assert_eq!(m.update_passive_xp(), 10);
        assert_eq!(m.total_xp(), 12);
    }

    // =========================================================================
    // Readiness and Selection
    // =========================================================================

    #[test]
    fn test_egg_scenario() {
        let (mut m, _clock) = manager();
        assert_eq!(m.level(), 0);
        assert!(!m.check_evolution_ready());

        m.add_xp_raw(50, "test");
        assert_eq!(m.level(), 1);
        assert!(m.check_evolution_ready());
        assert_eq!(m.calculate_evolution_form(None), Some("bloblet"));
    }

    #[test]
    fn test_bloblet_ready_at_level_five() {
        let (mut m, _clock) = manager();
        m.add_xp_raw(1, "test");
        m.execute_evolution("bloblet").unwrap();
        assert!(!m.check_evolution_ready());

        let needed = xp_for_level(5) - m.total_xp();
        m.add_xp_raw(needed - 1, "test");
        assert!(!m.check_evolution_ready());
        m.add_xp_raw(1, "test");
        assert!(m.check_evolution_ready());
        assert_eq!(m.calculate_evolution_form(None), Some("mellow"));
    }

    #[test]
    fn test_selection_uses_care_style() {
        let clock = ManualClock::new();
        let mut tracker = CareTracker::new(CareConfig::default(), clock.shared());
        tracker.record_play(10.0);
        tracker.record_play(10.0);
        tracker.record_snapshot(60.0, 90.0, 60.0, true);
        assert_eq!(tracker.calculate_care_style(), CareStyle::Playful);

        let mut m = EvolutionManager::from_state(
            EvolutionManagerState {
                total_xp: xp_for_level(5),
                current_form_id: "bloblet".to_string(),
                ..EvolutionManagerState::default()
            },
            clock.shared(),
        );
        assert_eq!(m.calculate_evolution_form(Some(&tracker)), Some("bouncy"));

        let preview = m.evolution_preview(Some(&tracker));
        let likelihoods: Vec<(&str, f64)> =
            preview.iter().map(|p| (p.form.id, p.likelihood)).collect();
        assert_eq!(
            likelihoods,
            vec![("bouncy", 0.8), ("mellow", 0.1), ("drowsy", 0.1)]
        );

        m.execute_evolution("bouncy").unwrap();
        assert_eq!(m.evolution_stage(), EvolutionStage::Child);
    }

    #[test]
    fn test_selection_falls_back_to_first_reachable() {
        let clock = ManualClock::new();
        let m = EvolutionManager::from_state(
            EvolutionManagerState {
                total_xp: xp_for_level(15),
                current_form_id: "bouncy".to_string(),
                ..EvolutionManagerState::default()
            },
            clock.shared(),
        );
        // Balanced matches neither sparky nor chonky
        assert_eq!(m.calculate_evolution_form(None), Some("sparky"));
    }

    #[test]
    fn test_terminal_form_never_ready() {
        let clock = ManualClock::new();
        let m = EvolutionManager::from_state(
            EvolutionManagerState {
                total_xp: 100_000,
                current_form_id: "golden".to_string(),
                ..EvolutionManagerState::default()
            },
            clock.shared(),
        );
        assert!(!m.check_evolution_ready());
        assert!(m.calculate_evolution_form(None).is_none());
        assert!(m.evolution_preview(None).is_empty());
    }

    // =========================================================================
    // Execution
    // =========================================================================

    #[test]
    fn test_execute_evolution_records_history_and_bonus() {
        let (mut m, _clock) = manager();
        m.add_xp_raw(10, "test");
        m.execute_evolution("bloblet").unwrap();

        assert_eq!(m.current_form_id(), "bloblet");
        assert_eq!(m.evolution_stage(), EvolutionStage::Baby);
        assert_eq!(m.total_xp(), 60);
        assert_eq!(m.history().len(), 1);
        assert_eq!(m.history()[0].level, 1);
    }

    #[test]
    fn test_execute_unknown_form_is_noop() {
        let (mut m, _clock) = manager();
        let err = m.execute_evolution("dragon").unwrap_err();
        assert_eq!(err, EvolutionError::UnknownForm("dragon".to_string()));
        assert_eq!(m.current_form_id(), "egg");
        assert!(m.history().is_empty());
        assert_eq!(m.total_xp(), 0);
    }

    #[test]
    fn test_execute_alias_stores_canonical_id() {
        let (mut m, _clock) = manager();
        m.execute_evolution("sleepy").unwrap();
        assert_eq!(m.current_form_id(), "drowsy");
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn test_state_round_trip() {
        let (mut m, clock) = manager();
        m.add_xp_raw(300, "test");
        m.execute_evolution("bloblet").unwrap();
        clock.advance_secs(150);

        let json = serde_json::to_string(&m.to_state()).unwrap();
        let state: EvolutionManagerState = serde_json::from_str(&json).unwrap();
        let mut restored = EvolutionManager::from_state(state, clock.shared());

        assert_eq!(restored.level(), m.level());
        assert_eq!(restored.current_form_id(), "bloblet");
        assert_eq!(restored.history(), m.history());
        assert_eq!(restored.update_passive_xp(), 2);
    }

    #[test]
    fn test_state_defaults_and_legacy_ids() {
        let clock = ManualClock::new();
        let state: EvolutionManagerState =
            serde_json::from_str(r#"{"total_xp": 400, "current_form_id": "cozy"}"#).unwrap();
        let m = EvolutionManager::from_state(state, clock.shared());
        assert_eq!(m.current_form_id(), "chonky");
        assert_eq!(m.evolution_stage(), EvolutionStage::Teen);

        let m = EvolutionManager::from_state(
            serde_json::from_str("{}").unwrap(),
            clock.shared(),
        );
        assert_eq!(m.current_form_id(), "egg");
        assert_eq!(m.total_xp(), 0);
    }

    #[test]
    fn test_unknown_saved_form_restarts_as_egg() {
        let clock = ManualClock::new();
        let state: EvolutionManagerState = serde_json::from_str(
            r#"{"total_xp": 300, "current_form_id": "dragon", "evolution_stage": "ADULT"}"#,
        )
        .unwrap();
        let m = EvolutionManager::from_state(state, clock.shared());
        assert_eq!(m.current_form_id(), "egg");
        assert_eq!(m.evolution_stage(), EvolutionStage::Egg);
        assert!(m.check_evolution_ready());
    }

    #[test]
    fn test_history_accepts_legacy_keys() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"from_form": "egg", "to_form": "bloblet", "timestamp": 100.0, "level_at_evolution": 1}"#,
        )
        .unwrap();
        assert_eq!(entry.form_id, "bloblet");
        assert_eq!(entry.level, 1);
    }
}
