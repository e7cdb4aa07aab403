//! Care Tracking
//!
//! The [`CareTracker`] keeps a rolling record of how the pet is being looked
//! after: a capped log of [`CareEvent`]s, periodic [`StatSnapshot`]s, and
//! per-day counters. From that history it derives the current [`CareStyle`],
//! which steers which form the pet evolves into.
//!
//! # Hysteresis
//!
//! Neglect is a latch. A snapshot only produces `NEGLECT_START`,
//! `CRITICAL_NEGLECT` or `NEGLECT_END` when it *crosses* the threshold, so a
//! pet left hungry for an hour yields one start event, not twelve.
//!
//! # Care Style Rules
//!
//! Evaluated in order over the tracking window (default one hour); the
//! first match wins:
//!
//! | # | Condition | Style |
//! |---|-----------|-------|
//! | 1 | ≥3 `NEGLECT_START` in window, or latch set | Neglected |
//! | 2 | no snapshots in window | Balanced |
//! | 3 | overall average > 85 and feeds > 2/h | Spoiled |
//! | 4 | plays > 1.5/h and happiness is the top average | Playful |
//! | 5 | interactions > 4/h, happiness > 70, energy > 70 | Pampered |
//! | 6 | otherwise | Balanced |

mod event;
mod style;

pub use event::{CareEvent, CareEventDetails, CareEventKind, DailyCareStats, StatSnapshot};
pub use style::CareStyle;

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{unix_seconds, SharedClock};
use crate::config::CareConfig;

/// `(month, day)` pairs that count as holidays for the Rainbow form
pub const SPECIAL_DATES: [(u32, u32); 4] = [(1, 1), (2, 14), (10, 31), (12, 25)];

/// Neglect starts within the window that force the Neglected style
const NEGLECT_EVENTS_FOR_STYLE: usize = 3;

/// Window used by [`CareTracker::care_summary`]
const SUMMARY_WINDOW_HOURS: f64 = 24.0;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Whether `date` is one of the [`SPECIAL_DATES`]
#[must_use]
pub fn is_special_date(date: NaiveDate) -> bool {
    SPECIAL_DATES.contains(&(date.month(), date.day()))
}

/// Average stats over a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatAverages {
    /// Mean hunger
    pub hunger: f64,
    /// Mean happiness
    pub happiness: f64,
    /// Mean energy
    pub energy: f64,
}

impl StatAverages {
    /// Mean of the three averages
    #[must_use]
    pub fn overall(&self) -> f64 {
        (self.hunger + self.happiness + self.energy) / 3.0
    }
}

/// 24-hour digest of care patterns for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareSummary {
    /// Style over the tracking window
    pub care_style: CareStyle,
    /// Feeds per hour over 24h
    pub feed_frequency: f64,
    /// Plays per hour over 24h
    pub play_frequency: f64,
    /// Interactions per hour over 24h
    pub attention_frequency: f64,
    /// Stat means over 24h, if any snapshots exist
    pub average_stats: Option<StatAverages>,
    /// Neglect latch
    pub is_neglected: bool,
    /// Sticky critical-neglect flag
    pub was_critical: bool,
    /// Current perfect-care streak in days
    pub perfect_care_days: u32,
    /// Events in the log
    pub total_events: usize,
    /// Snapshots in the log
    pub total_snapshots: usize,
}

/// Serializable form of a [`CareTracker`]
///
/// Every field defaults, so partial or older saves load with safe baselines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareTrackerState {
    /// Newest events (capped on export)
    pub events: Vec<CareEvent>,
    /// Snapshot log
    pub snapshots: Vec<StatSnapshot>,
    /// `YYYY-MM-DD` to counters
    pub daily_stats: BTreeMap<String, DailyCareStats>,
    /// Neglect latch
    pub is_neglected: bool,
    /// Sticky critical-neglect flag
    pub was_critical: bool,
    /// Perfect-care streak
    pub perfect_care_days: u32,
    /// Last day the streak was evaluated, `YYYY-MM-DD`
    pub last_perfect_check_date: Option<String>,
    /// When the last snapshot was accepted
    #[serde(rename = "last_snapshot_time", with = "unix_seconds::option")]
    pub last_snapshot_at: Option<DateTime<Utc>>,
}

/// Records care history and classifies the care style
#[derive(Debug)]
pub struct CareTracker {
    config: CareConfig,
    clock: SharedClock,
    events: VecDeque<CareEvent>,
    snapshots: VecDeque<StatSnapshot>,
    daily_stats: BTreeMap<String, DailyCareStats>,
    last_snapshot_at: Option<DateTime<Utc>>,
    is_neglected: bool,
    was_critical: bool,
    perfect_care_days: u32,
    last_perfect_check_date: Option<NaiveDate>,
}

impl CareTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new(config: CareConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            events: VecDeque::new(),
            snapshots: VecDeque::new(),
            daily_stats: BTreeMap::new(),
            last_snapshot_at: None,
            is_neglected: false,
            was_critical: false,
            perfect_care_days: 0,
            last_perfect_check_date: None,
        }
    }

    /// Rebuild a tracker from saved state
    ///
    /// Logs longer than the configured caps keep their newest entries. An
    /// unparsable streak date is treated as "never checked".
    #[must_use]
    pub fn from_state(state: CareTrackerState, config: CareConfig, clock: SharedClock) -> Self {
        let last_perfect_check_date = state.last_perfect_check_date.as_deref().and_then(|s| {
            NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
                .map_err(|e| {
                    tracing::warn!(date = s, error = %e, "Ignoring malformed perfect-care date");
                })
                .ok()
        });

        let mut tracker = Self::new(config, clock);
        tracker.events = state.events.into();
        tracker.snapshots = state.snapshots.into();
        trim_front(&mut tracker.events, tracker.config.max_events);
        trim_front(&mut tracker.snapshots, tracker.config.max_snapshots);
        tracker.daily_stats = state.daily_stats;
        tracker.last_snapshot_at = state.last_snapshot_at;
        tracker.is_neglected = state.is_neglected;
        tracker.was_critical = state.was_critical;
        tracker.perfect_care_days = state.perfect_care_days;
        tracker.last_perfect_check_date = last_perfect_check_date;
        tracker
    }

    /// Export state, keeping only the newest `export_event_limit` events
    #[must_use]
    pub fn to_state(&self) -> CareTrackerState {
        let skip = self
            .events
            .len()
            .saturating_sub(self.config.export_event_limit);
        CareTrackerState {
            events: self.events.iter().skip(skip).cloned().collect(),
            snapshots: self.snapshots.iter().copied().collect(),
            daily_stats: self.daily_stats.clone(),
            is_neglected: self.is_neglected,
            was_critical: self.was_critical,
            perfect_care_days: self.perfect_care_days,
            last_perfect_check_date: self
                .last_perfect_check_date
                .map(|d| d.format(DATE_KEY_FORMAT).to_string()),
            last_snapshot_at: self.last_snapshot_at,
        }
    }

    /// Configuration in effect
    #[must_use]
    pub fn config(&self) -> &CareConfig {
        &self.config
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Append an event stamped with the current time
    pub fn record_event(&mut self, kind: CareEventKind, details: Option<CareEventDetails>) {
        let event = CareEvent::new(kind, self.clock.now(), details);
        let date_key = self
            .clock
            .local_date(event.timestamp)
            .format(DATE_KEY_FORMAT)
            .to_string();
        self.daily_stats.entry(date_key).or_default().record(kind);

        tracing::trace!(kind = ?kind, "Recorded care event");
        self.events.push_back(event);
        trim_front(&mut self.events, self.config.max_events);
    }

    /// Record a feeding
    pub fn record_feed(&mut self, amount: f64) {
        self.record_event(CareEventKind::Feed, Some(detail("amount", amount)));
    }

    /// Record a play session
    pub fn record_play(&mut self, duration_secs: f64) {
        self.record_event(CareEventKind::Play, Some(detail("duration", duration_secs)));
    }

    /// Record the pet falling asleep
    pub fn record_sleep_start(&mut self) {
        self.record_event(CareEventKind::SleepStart, None);
    }

    /// Record the pet waking after `duration_secs`
    pub fn record_sleep_end(&mut self, duration_secs: f64) {
        self.record_event(
            CareEventKind::SleepEnd,
            Some(detail("duration", duration_secs)),
        );
    }

    /// Record a click or pet
    pub fn record_attention(&mut self) {
        self.record_event(CareEventKind::Attention, None);
    }

    /// Record a trick
    pub fn record_trick(&mut self) {
        self.record_event(CareEventKind::Trick, None);
    }

    /// Record a stat snapshot
    ///
    /// Skipped unless `snapshot_interval_secs` have passed since the last
    /// accepted snapshot or `force` is set. Returns whether it was accepted.
    pub fn record_snapshot(&mut self, hunger: f64, happiness: f64, energy: f64, force: bool) -> bool {
        let now = self.clock.now();
        if !force {
            if let Some(last) = self.last_snapshot_at {
                if now - last < self.config.snapshot_interval() {
                    return false;
                }
            }
        }

        let snapshot = StatSnapshot::new(hunger, happiness, energy, now);
        self.snapshots.push_back(snapshot);
        self.last_snapshot_at = Some(now);
        trim_front(&mut self.snapshots, self.config.max_snapshots);

        self.update_neglect_tracking(&snapshot);
        self.update_perfect_care_tracking(&snapshot);
        true
    }

    fn update_neglect_tracking(&mut self, snapshot: &StatSnapshot) {
        if snapshot.is_critical(self.config.neglect_threshold) {
            self.was_critical = true;
            if !self.is_neglected {
                tracing::info!(
                    hunger = snapshot.hunger,
                    happiness = snapshot.happiness,
                    energy = snapshot.energy,
                    "Critical neglect detected"
                );
                self.record_event(CareEventKind::CriticalNeglect, None);
                self.is_neglected = true;
            }
        } else if snapshot.is_neglected(self.config.low_stat_threshold) {
            if !self.is_neglected {
                tracing::debug!(minimum = snapshot.minimum(), "Neglect started");
                self.record_event(CareEventKind::NeglectStart, None);
                self.is_neglected = true;
            }
        } else if self.is_neglected {
            tracing::debug!("Neglect ended");
            self.record_event(CareEventKind::NeglectEnd, None);
            self.is_neglected = false;
        }
    }

    fn update_perfect_care_tracking(&mut self, snapshot: &StatSnapshot) {
        let today = self.clock.local_date(snapshot.timestamp);
        if self.last_perfect_check_date == Some(today) {
            return;
        }

        if snapshot.is_perfect(self.config.perfect_min_stat) {
            let continues = self
                .last_perfect_check_date
                .is_some_and(|last| (today - last).num_days() == 1);
            self.perfect_care_days = if continues {
                self.perfect_care_days.saturating_add(1)
            } else {
                1
            };
        } else {
            self.perfect_care_days = 0;
        }

        tracing::debug!(
            date = %today,
            streak = self.perfect_care_days,
            "Evaluated perfect-care day"
        );
        self.last_perfect_check_date = Some(today);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Events at or after `now - window`, optionally filtered by kind
    #[must_use]
    pub fn events_in_window(&self, window: Duration, kind: Option<CareEventKind>) -> Vec<&CareEvent> {
        let cutoff = self.clock.now() - window;
        self.events
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .collect()
    }

    /// Feeds per hour over the last `hours`
    #[must_use]
    pub fn feed_frequency(&self, hours: f64) -> f64 {
        self.frequency(hours, |k| k == CareEventKind::Feed)
    }

    /// Plays per hour over the last `hours`
    #[must_use]
    pub fn play_frequency(&self, hours: f64) -> f64 {
        self.frequency(hours, |k| k == CareEventKind::Play)
    }

    /// Feed, play, attention and trick events per hour over the last `hours`
    #[must_use]
    pub fn attention_frequency(&self, hours: f64) -> f64 {
        self.frequency(hours, |k| k.is_interaction())
    }

    #[allow(clippy::cast_precision_loss)]
    fn frequency(&self, hours: f64, matches: impl Fn(CareEventKind) -> bool) -> f64 {
        if hours <= 0.0 {
            return 0.0;
        }
        let count = self
            .events_in_window(hours_to_duration(hours), None)
            .into_iter()
            .filter(|e| matches(e.kind))
            .count();
        count as f64 / hours
    }

    /// Mean stats over the last `hours`, or `None` without snapshots
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_stats(&self, hours: f64) -> Option<StatAverages> {
        let cutoff = self.clock.now() - hours_to_duration(hours);
        let recent: Vec<&StatSnapshot> = self
            .snapshots
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .collect();
        if recent.is_empty() {
            return None;
        }

        let n = recent.len() as f64;
        Some(StatAverages {
            hunger: recent.iter().map(|s| s.hunger).sum::<f64>() / n,
            happiness: recent.iter().map(|s| s.happiness).sum::<f64>() / n,
            energy: recent.iter().map(|s| s.energy).sum::<f64>() / n,
        })
    }

    /// Classify the recent care pattern
    #[must_use]
    pub fn calculate_care_style(&self) -> CareStyle {
        let window_hours = self.config.tracking_window_hours();

        let neglect_starts = self
            .events_in_window(self.config.tracking_window(), Some(CareEventKind::NeglectStart))
            .len();
        if neglect_starts >= NEGLECT_EVENTS_FOR_STYLE || self.is_neglected {
            return CareStyle::Neglected;
        }

        let Some(avg) = self.average_stats(window_hours) else {
            return CareStyle::Balanced;
        };

        if avg.overall() > 85.0 && self.feed_frequency(window_hours) > 2.0 {
            return CareStyle::Spoiled;
        }

        if self.play_frequency(window_hours) > 1.5
            && avg.happiness >= avg.hunger
            && avg.happiness >= avg.energy
        {
            return CareStyle::Playful;
        }

        if self.attention_frequency(window_hours) > 4.0 && avg.happiness > 70.0 && avg.energy > 70.0 {
            return CareStyle::Pampered;
        }

        CareStyle::Balanced
    }

    /// Whether the perfect-care streak is at least `days` long at `min_stat`
    ///
    /// The streak is tracked against the configured `perfect_min_stat`, so a
    /// stricter `min_stat` than that can never be confirmed.
    #[must_use]
    pub fn check_perfect_care_streak(&self, days: u32, min_stat: f64) -> bool {
        min_stat <= self.config.perfect_min_stat && self.perfect_care_days >= days
    }

    /// Whether every stat has ever dropped below the critical threshold
    #[must_use]
    pub fn was_critically_neglected(&self) -> bool {
        self.was_critical
    }

    /// Flag the pet as having recovered from critical neglect
    pub fn mark_revived(&mut self) {
        self.was_critical = true;
    }

    /// Current neglect latch
    #[must_use]
    pub fn is_neglected(&self) -> bool {
        self.is_neglected
    }

    /// Current perfect-care streak in days
    #[must_use]
    pub fn consecutive_perfect_days(&self) -> u32 {
        self.perfect_care_days
    }

    /// Break the perfect-care streak
    pub fn reset_perfect_care_streak(&mut self) {
        self.perfect_care_days = 0;
    }

    /// Whether today is a holiday in the owner's calendar
    #[must_use]
    pub fn is_special_date(&self) -> bool {
        is_special_date(self.clock.today())
    }

    /// Digest of the last 24 hours
    #[must_use]
    pub fn care_summary(&self) -> CareSummary {
        CareSummary {
            care_style: self.calculate_care_style(),
            feed_frequency: self.feed_frequency(SUMMARY_WINDOW_HOURS),
            play_frequency: self.play_frequency(SUMMARY_WINDOW_HOURS),
            attention_frequency: self.attention_frequency(SUMMARY_WINDOW_HOURS),
            average_stats: self.average_stats(SUMMARY_WINDOW_HOURS),
            is_neglected: self.is_neglected,
            was_critical: self.was_critical,
            perfect_care_days: self.perfect_care_days,
            total_events: self.events.len(),
            total_snapshots: self.snapshots.len(),
        }
    }

    /// Event log, oldest first
    pub fn events(&self) -> impl Iterator<Item = &CareEvent> {
        self.events.iter()
    }

    /// Snapshot log, oldest first
    pub fn snapshots(&self) -> impl Iterator<Item = &StatSnapshot> {
        self.snapshots.iter()
    }

    /// Counters for one calendar day
    #[must_use]
    pub fn daily_stats(&self, date: NaiveDate) -> Option<&DailyCareStats> {
        self.daily_stats
            .get(&date.format(DATE_KEY_FORMAT).to_string())
    }
}

fn detail(key: &str, value: f64) -> CareEventDetails {
    let mut details = CareEventDetails::new();
    details.insert(key.to_string(), serde_json::json!(value));
    details
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn hours_to_duration(hours: f64) -> Duration {
    if !hours.is_finite() || hours <= 0.0 {
        return Duration::zero();
    }
    Duration::milliseconds((hours * 3_600_000.0).min(i64::MAX as f64) as i64)
}

fn trim_front<T>(log: &mut VecDeque<T>, cap: usize) {
    while log.len() > cap {
        log.pop_front();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use pretty_assertions::assert_eq;

    fn tracker() -> (CareTracker, ManualClock) {
        let clock = ManualClock::new();
        let tracker = CareTracker::new(CareConfig::default(), clock.shared());
        (tracker, clock)
    }

    fn count(tracker: &CareTracker, kind: CareEventKind) -> usize {
        tracker.events().filter(|e| e.kind == kind).count()
    }

    // =========================================================================
    // Recording
    // =========================================================================

    #[test]
    fn test_record_event_updates_daily_stats() {
        let (mut tracker, clock) = tracker();
        tracker.record_feed(25.0);
        tracker.record_play(10.0);
        tracker.record_attention();
        tracker.record_attention();

        let day = tracker.daily_stats(clock.today()).unwrap();
        assert_eq!(day.feed_count, 1);
        assert_eq!(day.play_count, 1);
        assert_eq!(day.attention_count, 2);

        let feed = tracker.events().next().unwrap();
        assert_eq!(
            feed.details.as_ref().unwrap().get("amount"),
            Some(&serde_json::json!(25.0))
        );
    }

    #[test]
    fn test_event_log_is_capped() {
        let clock = ManualClock::new();
        let config = CareConfig {
            max_events: 5,
            ..CareConfig::default()
        };
        let mut tracker = CareTracker::new(config, clock.shared());
        for _ in 0..8 {
            tracker.record_trick();
            clock.advance_secs(1);
        }
        tracker.record_feed(1.0);

        assert_eq!(tracker.events().count(), 5);
        assert_eq!(tracker.events().last().unwrap().kind, CareEventKind::Feed);
    }

    #[test]
    fn test_snapshot_interval_respected() {
        let (mut tracker, clock) = tracker();
        assert!(tracker.record_snapshot(50.0, 50.0, 50.0, false));
        clock.advance_secs(299);
        assert!(!tracker.record_snapshot(50.0, 50.0, 50.0, false));
        assert!(tracker.record_snapshot(50.0, 50.0, 50.0, true));
        clock.advance_secs(300);
        assert!(tracker.record_snapshot(50.0, 50.0, 50.0, false));
        assert_eq!(tracker.snapshots().count(), 3);
    }

    #[test]
    fn test_snapshot_log_is_capped() {
        let (mut tracker, clock) = tracker();
        for _ in 0..300 {
            tracker.record_snapshot(60.0, 60.0, 60.0, false);
            clock.advance_minutes(5);
        }
        assert_eq!(tracker.snapshots().count(), 288);
    }

    // =========================================================================
    // Neglect Hysteresis
    // =========================================================================

    #[test]
    fn test_critical_neglect_emitted_once() {
        let (mut tracker, _clock) = tracker();
        for _ in 0..5 {
            tracker.record_snapshot(0.0, 0.0, 0.0, true);
        }
        assert_eq!(count(&tracker, CareEventKind::CriticalNeglect), 1);
        assert!(tracker.is_neglected());

        tracker.record_snapshot(100.0, 100.0, 100.0, true);
        tracker.record_snapshot(100.0, 100.0, 100.0, true);
        assert_eq!(count(&tracker, CareEventKind::NeglectEnd), 1);
        assert!(!tracker.is_neglected());
    }

    #[test]
    fn test_neglect_start_and_end() {
        let (mut tracker, _clock) = tracker();
        tracker.record_snapshot(20.0, 90.0, 90.0, true);
        tracker.record_snapshot(25.0, 90.0, 90.0, true);
        assert_eq!(count(&tracker, CareEventKind::NeglectStart), 1);

        tracker.record_snapshot(50.0, 90.0, 90.0, true);
        assert_eq!(count(&tracker, CareEventKind::NeglectEnd), 1);
        assert!(!tracker.was_critically_neglected());
    }

    #[test]
    fn test_was_critical_is_sticky() {
        let (mut tracker, _clock) = tracker();
        tracker.record_snapshot(0.0, 0.0, 0.0, true);
        tracker.record_snapshot(100.0, 100.0, 100.0, true);
        assert!(tracker.was_critically_neglected());
    }

    #[test]
    fn test_gradual_decline_still_marks_critical() {
        let (mut tracker, _clock) = tracker();
        tracker.record_snapshot(20.0, 50.0, 50.0, true);
        tracker.record_snapshot(5.0, 5.0, 5.0, true);

        assert_eq!(count(&tracker, CareEventKind::NeglectStart), 1);
        assert_eq!(count(&tracker, CareEventKind::CriticalNeglect), 0);
        assert!(tracker.was_critically_neglected());
    }

    // =========================================================================
    // Perfect Care Streak
    // =========================================================================

    #[test]
    fn test_perfect_streak_consecutive_days() {
        let (mut tracker, clock) = tracker();
        for _ in 0..3 {
            tracker.record_snapshot(90.0, 90.0, 90.0, true);
            clock.advance_days(1);
        }
        assert_eq!(tracker.consecutive_perfect_days(), 3);
        assert!(tracker.check_perfect_care_streak(3, 80.0));
        assert!(!tracker.check_perfect_care_streak(4, 80.0));
        assert!(!tracker.check_perfect_care_streak(3, 90.0));
    }

    #[test]
    fn test_streak_check_bounded_by_tracked_floor() {
        let (mut tracker, _clock) = tracker();
        tracker.record_snapshot(95.0, 95.0, 95.0, true);

        // days were judged at the configured 80 floor, so a looser floor is
        // satisfied and a stricter one cannot be vouched for
        assert!(tracker.check_perfect_care_streak(1, 70.0));
        assert!(tracker.check_perfect_care_streak(1, 80.0));
        assert!(!tracker.check_perfect_care_streak(1, 80.5));

        let clock = ManualClock::new();
        let config = CareConfig {
            perfect_min_stat: 90.0,
            ..CareConfig::default()
        };
        let mut strict = CareTracker::new(config, clock.shared());
        strict.record_snapshot(95.0, 95.0, 95.0, true);
        assert!(strict.check_perfect_care_streak(1, 90.0));
    }

    #[test]
    fn test_perfect_streak_resets_after_gap() {
        let (mut tracker, clock) = tracker();
        for _ in 0..3 {
            tracker.record_snapshot(90.0, 90.0, 90.0, true);
            clock.advance_days(1);
        }
        // day 4 skipped
        clock.advance_days(1);
        tracker.record_snapshot(90.0, 90.0, 90.0, true);
        assert_eq!(tracker.consecutive_perfect_days(), 1);
    }

    #[test]
    fn test_perfect_streak_checked_once_per_day() {
        let (mut tracker, _clock) = tracker();
        tracker.record_snapshot(90.0, 90.0, 90.0, true);
        tracker.record_snapshot(10.0, 10.0, 10.0, true);
        assert_eq!(tracker.consecutive_perfect_days(), 1);
    }

    #[test]
    fn test_imperfect_day_breaks_streak() {
        let (mut tracker, clock) = tracker();
        tracker.record_snapshot(90.0, 90.0, 90.0, true);
        clock.advance_days(1);
        tracker.record_snapshot(90.0, 50.0, 90.0, true);
        assert_eq!(tracker.consecutive_perfect_days(), 0);

        tracker.reset_perfect_care_streak();
        assert_eq!(tracker.consecutive_perfect_days(), 0);
    }

    // =========================================================================
    // Care Style
    // =========================================================================

    #[test]
    fn test_style_balanced_without_data() {
        let (tracker, _clock) = tracker();
        assert_eq!(tracker.calculate_care_style(), CareStyle::Balanced);
    }

    #[test]
    fn test_style_spoiled() {
        let (mut tracker, clock) = tracker();
        for _ in 0..3 {
            tracker.record_feed(25.0);
            clock.advance_minutes(1);
        }
        tracker.record_snapshot(95.0, 90.0, 90.0, true);
        assert_eq!(tracker.calculate_care_style(), CareStyle::Spoiled);
    }

    #[test]
    fn test_style_playful() {
        let (mut tracker, _clock) = tracker();
        tracker.record_play(30.0);
        tracker.record_play(30.0);
        tracker.record_snapshot(60.0, 80.0, 60.0, true);
        assert_eq!(tracker.calculate_care_style(), CareStyle::Playful);
    }

    #[test]
    fn test_style_pampered() {
        let (mut tracker, _clock) = tracker();
        for _ in 0..5 {
            tracker.record_attention();
        }
        tracker.record_snapshot(60.0, 75.0, 80.0, true);
        assert_eq!(tracker.calculate_care_style(), CareStyle::Pampered);
    }

    #[test]
    fn test_style_neglected_beats_spoiled() {
        let (mut tracker, clock) = tracker();
        for _ in 0..3 {
            tracker.record_snapshot(20.0, 90.0, 90.0, true);
            clock.advance_minutes(1);
            tracker.record_snapshot(90.0, 90.0, 90.0, true);
            clock.advance_minutes(1);
        }
        for _ in 0..4 {
            tracker.record_feed(25.0);
        }
        for _ in 0..6 {
            tracker.record_snapshot(100.0, 100.0, 100.0, true);
        }
        assert!(!tracker.is_neglected());
        assert_eq!(count(&tracker, CareEventKind::NeglectStart), 3);
        assert_eq!(tracker.calculate_care_style(), CareStyle::Neglected);
    }

    #[test]
    fn test_style_neglected_while_latched() {
        let (mut tracker, _clock) = tracker();
        tracker.record_snapshot(10.0, 90.0, 90.0, true);
        assert_eq!(tracker.calculate_care_style(), CareStyle::Neglected);
    }

    #[test]
    fn test_style_window_expires_old_events() {
        let (mut tracker, clock) = tracker();
        for _ in 0..3 {
            tracker.record_play(10.0);
        }
        tracker.record_snapshot(60.0, 80.0, 60.0, true);
        clock.advance_minutes(61);
        tracker.record_snapshot(60.0, 80.0, 60.0, true);
        assert_eq!(tracker.calculate_care_style(), CareStyle::Balanced);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[test]
    fn test_frequencies_and_averages() {
        let (mut tracker, _clock) = tracker();
        tracker.record_feed(10.0);
        tracker.record_play(10.0);
        tracker.record_trick();
        tracker.record_sleep_start();
        tracker.record_snapshot(30.0, 60.0, 90.0, true);

        assert!((tracker.feed_frequency(1.0) - 1.0).abs() < 1e-9);
        assert!((tracker.attention_frequency(2.0) - 1.5).abs() < 1e-9);
        assert!(tracker.feed_frequency(0.0).abs() < f64::EPSILON);

        let avg = tracker.average_stats(1.0).unwrap();
        assert!((avg.overall() - 60.0).abs() < 1e-9);
        assert_eq!(
            tracker
                .events_in_window(Duration::hours(1), Some(CareEventKind::SleepStart))
                .len(),
            1
        );
    }

    #[test]
    fn test_special_dates() {
        assert!(is_special_date(NaiveDate::from_ymd_opt(2024, 10, 31).unwrap()));
        assert!(!is_special_date(NaiveDate::from_ymd_opt(2024, 10, 30).unwrap()));

        let clock = ManualClock::on_date(2024, 12, 25);
        let tracker = CareTracker::new(CareConfig::default(), clock.shared());
        assert!(tracker.is_special_date());
    }

    #[test]
    fn test_care_summary() {
        let (mut tracker, _clock) = tracker();
        tracker.record_feed(10.0);
        tracker.record_snapshot(0.0, 0.0, 0.0, true);

        let summary = tracker.care_summary();
        assert_eq!(summary.care_style, CareStyle::Neglected);
        assert!(summary.was_critical);
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.total_snapshots, 1);
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn test_state_round_trip_preserves_style() {
        let (mut tracker, clock) = tracker();
        tracker.record_play(10.0);
        tracker.record_play(10.0);
        tracker.record_snapshot(60.0, 85.0, 70.0, true);
        tracker.record_snapshot(0.0, 0.0, 0.0, true);
        tracker.record_snapshot(90.0, 90.0, 90.0, true);

        let json = serde_json::to_string(&tracker.to_state()).unwrap();
        let state: CareTrackerState = serde_json::from_str(&json).unwrap();
        let restored = CareTracker::from_state(state, CareConfig::default(), clock.shared());

        assert_eq!(restored.calculate_care_style(), tracker.calculate_care_style());
        assert_eq!(restored.to_state(), tracker.to_state());
        assert!(restored.was_critically_neglected());
    }

    #[test]
    fn test_export_caps_events() {
        let (mut tracker, _clock) = tracker();
        for _ in 0..600 {
            tracker.record_attention();
        }
        assert_eq!(tracker.to_state().events.len(), 500);
    }

    #[test]
    fn test_empty_state_loads_baseline() {
        let state: CareTrackerState = serde_json::from_str("{}").unwrap();
        let clock = ManualClock::new();
        let tracker = CareTracker::from_state(state, CareConfig::default(), clock.shared());
        assert_eq!(tracker.events().count(), 0);
        assert!(!tracker.is_neglected());
        assert_eq!(tracker.consecutive_perfect_days(), 0);
    }

    #[test]
    fn test_malformed_check_date_ignored() {
        let state = CareTrackerState {
            perfect_care_days: 4,
            last_perfect_check_date: Some("not-a-date".to_string()),
            ..CareTrackerState::default()
        };
        let clock = ManualClock::new();
        let mut tracker = CareTracker::from_state(state, CareConfig::default(), clock.shared());
        tracker.record_snapshot(90.0, 90.0, 90.0, true);
        assert_eq!(tracker.consecutive_perfect_days(), 1);
    }
}
