//! Care events, stat snapshots and daily aggregates

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::unix_seconds;

/// Free-form structured details attached to a care event
pub type CareEventDetails = BTreeMap<String, serde_json::Value>;

/// Kinds of care event the tracker records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareEventKind {
    /// Pet was fed
    Feed,
    /// Play session
    Play,
    /// Pet fell asleep
    SleepStart,
    /// Pet woke up
    SleepEnd,
    /// Click or pet attention
    #[serde(alias = "PET")]
    Attention,
    /// Trick performed
    Trick,
    /// A stat dropped below the neglect threshold
    NeglectStart,
    /// Stats recovered from neglect
    NeglectEnd,
    /// Every stat dropped below the critical threshold
    CriticalNeglect,
}

impl CareEventKind {
    /// Whether this kind counts as a direct owner interaction
    #[must_use]
    pub const fn is_interaction(&self) -> bool {
        matches!(self, Self::Feed | Self::Play | Self::Attention | Self::Trick)
    }
}

/// A single recorded care event; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareEvent {
    /// What happened
    #[serde(rename = "event_type")]
    pub kind: CareEventKind,
    /// When it happened
    #[serde(default, with = "unix_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Optional extra data (`amount`, `duration`, ...)
    #[serde(default)]
    pub details: Option<CareEventDetails>,
}

impl CareEvent {
    /// Create an event at `timestamp`
    #[must_use]
    pub fn new(kind: CareEventKind, timestamp: DateTime<Utc>, details: Option<CareEventDetails>) -> Self {
        Self {
            kind,
            timestamp,
            details,
        }
    }
}

fn default_stat() -> f64 {
    80.0
}

/// Pet stats sampled at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshot {
    /// Fullness, 0-100
    #[serde(default = "default_stat")]
    pub hunger: f64,
    /// Happiness, 0-100
    #[serde(default = "default_stat")]
    pub happiness: f64,
    /// Energy, 0-100
    #[serde(default = "default_stat")]
    pub energy: f64,
    /// When the sample was taken
    #[serde(default, with = "unix_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl StatSnapshot {
    /// Create a snapshot; stats are clamped to 0..=100
    #[must_use]
    pub fn new(hunger: f64, happiness: f64, energy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            hunger: clamp_stat(hunger),
            happiness: clamp_stat(happiness),
            energy: clamp_stat(energy),
            timestamp,
        }
    }

    /// Mean of the three stats
    #[must_use]
    pub fn average(&self) -> f64 {
        (self.hunger + self.happiness + self.energy) / 3.0
    }

    /// Lowest of the three stats
    #[must_use]
    pub fn minimum(&self) -> f64 {
        self.hunger.min(self.happiness).min(self.energy)
    }

    /// Any stat below `low_threshold`
    #[must_use]
    pub fn is_neglected(&self, low_threshold: f64) -> bool {
        self.minimum() < low_threshold
    }

    /// Every stat below `critical_threshold`
    #[must_use]
    pub fn is_critical(&self, critical_threshold: f64) -> bool {
        self.hunger < critical_threshold
            && self.happiness < critical_threshold
            && self.energy < critical_threshold
    }

    /// Every stat at or above `min_stat`
    #[must_use]
    pub fn is_perfect(&self, min_stat: f64) -> bool {
        self.minimum() >= min_stat
    }
}

fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Per-calendar-day interaction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyCareStats {
    /// Feeds
    pub feed_count: u32,
    /// Play sessions
    pub play_count: u32,
    /// Clicks and pets
    #[serde(alias = "pet_count")]
    pub attention_count: u32,
    /// Tricks
    pub trick_count: u32,
    /// Times the pet went to sleep
    pub sleep_count: u32,
    /// Neglect periods started
    pub neglect_periods: u32,
}

impl DailyCareStats {
    /// Bump the counter matching `kind`; other kinds are ignored
    pub fn record(&mut self, kind: CareEventKind) {
        let counter = match kind {
            CareEventKind::Feed => &mut self.feed_count,
            CareEventKind::Play => &mut self.play_count,
            CareEventKind::Attention => &mut self.attention_count,
            CareEventKind::Trick => &mut self.trick_count,
            CareEventKind::SleepStart => &mut self.sleep_count,
            CareEventKind::NeglectStart => &mut self.neglect_periods,
            CareEventKind::SleepEnd | CareEventKind::NeglectEnd | CareEventKind::CriticalNeglect => {
                return
            }
        };
        *counter = counter.saturating_add(1);
    }

    /// Total direct interactions for the day
    #[must_use]
    pub fn interactions(&self) -> u32 {
        self.feed_count
            .saturating_add(self.play_count)
            .saturating_add(self.attention_count)
            .saturating_add(self.trick_count)
    }
}
