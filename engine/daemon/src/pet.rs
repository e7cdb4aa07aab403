//! Pet body simulation
//!
//! The engine only observes stats; this module is what moves them. Stats
//! decay every tick, manual commands and auto-care push them back up.

use chrono::{DateTime, Duration, Utc};

use pet_engine_core::{Interaction, PetStats};

const HUNGER_DECAY_PER_SEC: f64 = 0.15;
const HAPPINESS_DECAY_PER_SEC: f64 = 0.08;
const ENERGY_DECAY_PER_SEC: f64 = 0.05;
const ENERGY_REGEN_PER_SEC: f64 = 0.3;

const FEED_AMOUNT: f64 = 25.0;
const FEED_HAPPINESS: f64 = 5.0;
const PLAY_HAPPINESS: f64 = 20.0;
const PLAY_ENERGY_COST: f64 = 10.0;
const PLAY_HUNGER_COST: f64 = 5.0;
const PLAY_MIN_ENERGY: f64 = 10.0;
const PET_HAPPINESS: f64 = 3.0;
const TRICK_HAPPINESS: f64 = 10.0;
const TRICK_ENERGY_COST: f64 = 5.0;

/// Auto-care food portion
pub const AUTO_FEED_AMOUNT: f64 = 15.0;
const AUTO_FEED_HAPPINESS: f64 = 3.0;
const AUTO_PLAY_AMOUNT: f64 = 12.0;
const AUTO_PLAY_ENERGY_COST: f64 = 5.0;
const AUTO_FEED_COOLDOWN_SECS: i64 = 30;
const AUTO_PLAY_COOLDOWN_SECS: i64 = 45;

const AUTO_HUNGER_THRESHOLD: f64 = 30.0;
const AUTO_HAPPINESS_THRESHOLD: f64 = 25.0;
const AUTO_ENERGY_THRESHOLD: f64 = 20.0;
const AUTO_WAKE_THRESHOLD: f64 = 80.0;

/// Something the pet did for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoAction {
    /// Found a snack
    Feed,
    /// Played alone
    Play,
    /// Dozed off
    Nap,
    /// Woke up rested
    Wake,
}

/// Mutable stats plus sleep and auto-care bookkeeping
#[derive(Debug, Clone)]
pub struct PetBody {
    stats: PetStats,
    sleeping: bool,
    auto_sleeping: bool,
    last_auto_feed: Option<DateTime<Utc>>,
    last_auto_play: Option<DateTime<Utc>>,
}

impl PetBody {
    pub fn new(stats: PetStats) -> Self {
        let mut body = Self {
            stats,
            sleeping: false,
            auto_sleeping: false,
            last_auto_feed: None,
            last_auto_play: None,
        };
        body.clamp();
        body
    }

    pub fn stats(&self) -> PetStats {
        self.stats
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    fn clamp(&mut self) {
        self.stats.hunger = self.stats.hunger.clamp(0.0, 100.0);
        self.stats.happiness = self.stats.happiness.clamp(0.0, 100.0);
        self.stats.energy = self.stats.energy.clamp(0.0, 100.0);
    }

    /// Let `elapsed` pass
    #[allow(clippy::cast_precision_loss)]
    pub fn decay(&mut self, elapsed: Duration) {
        let secs = elapsed.num_milliseconds().max(0) as f64 / 1000.0;
        self.stats.hunger -= HUNGER_DECAY_PER_SEC * secs;
        if self.sleeping {
            self.stats.energy += ENERGY_REGEN_PER_SEC * secs;
        } else {
            self.stats.happiness -= HAPPINESS_DECAY_PER_SEC * secs;
            self.stats.energy -= ENERGY_DECAY_PER_SEC * secs;
        }
        self.clamp();
    }

    /// Apply an owner interaction to the stats
    ///
    /// Returns `false` when the pet refuses (too tired to play, or woken
    /// while awake) and nothing should be recorded.
    pub fn interact(&mut self, interaction: Interaction) -> bool {
        match interaction {
            Interaction::Feed => {
                self.stats.hunger += FEED_AMOUNT;
                self.stats.happiness += FEED_HAPPINESS;
            }
            Interaction::Play => {
                if self.stats.energy < PLAY_MIN_ENERGY {
                    return false;
                }
                self.stats.happiness += PLAY_HAPPINESS;
                self.stats.energy -= PLAY_ENERGY_COST;
                self.stats.hunger -= PLAY_HUNGER_COST;
            }
            Interaction::Click | Interaction::Pet => {
                self.stats.happiness += PET_HAPPINESS;
            }
            Interaction::Trick => {
                self.stats.happiness += TRICK_HAPPINESS;
                self.stats.energy -= TRICK_ENERGY_COST;
            }
            Interaction::SleepStart => {
                self.sleeping = true;
                self.auto_sleeping = false;
            }
            Interaction::SleepComplete => {
                if !self.sleeping {
                    return false;
                }
                self.sleeping = false;
                self.auto_sleeping = false;
            }
        }
        self.clamp();
        true
    }

    /// Look after itself if a stat has run low
    ///
    /// At most one action per call, checked hunger first.
    pub fn auto_care(&mut self, now: DateTime<Utc>) -> Option<AutoAction> {
        if self.sleeping {
            if self.auto_sleeping && self.stats.energy >= AUTO_WAKE_THRESHOLD {
                self.sleeping = false;
                self.auto_sleeping = false;
                return Some(AutoAction::Wake);
            }
            return None;
        }

        if self.stats.hunger < AUTO_HUNGER_THRESHOLD
            && cooled_down(self.last_auto_feed, now, AUTO_FEED_COOLDOWN_SECS)
        {
            self.last_auto_feed = Some(now);
            self.stats.hunger += AUTO_FEED_AMOUNT;
            self.stats.happiness += AUTO_FEED_HAPPINESS;
            self.clamp();
            return Some(AutoAction::Feed);
        }

        if self.stats.energy < AUTO_ENERGY_THRESHOLD {
            self.sleeping = true;
            self.auto_sleeping = true;
            return Some(AutoAction::Nap);
        }

        if self.stats.happiness < AUTO_HAPPINESS_THRESHOLD
            && cooled_down(self.last_auto_play, now, AUTO_PLAY_COOLDOWN_SECS)
        {
            self.last_auto_play = Some(now);
            self.stats.happiness += AUTO_PLAY_AMOUNT;
            self.stats.energy -= AUTO_PLAY_ENERGY_COST;
            self.clamp();
            return Some(AutoAction::Play);
        }

        None
    }
}

fn cooled_down(last: Option<DateTime<Utc>>, now: DateTime<Utc>, secs: i64) -> bool {
    last.map_or(true, |at| now - at >= Duration::seconds(secs))
}
