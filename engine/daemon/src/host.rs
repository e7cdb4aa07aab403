//! Host tick driver
//!
//! Glues a [`PetBody`] to an [`EvolutionIntegrator`]: each tick decays the
//! stats, lets the pet look after itself, feeds the reading to the engine
//! and walks READY evolutions through their transformation sequence.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use pet_engine_core::save::{PetRecord, Settings};
use pet_engine_core::{
    EngineConfig, EvolutionEvent, EvolutionEventKind, EvolutionIntegrator, EvolutionStatus,
    Interaction, SaveData, SharedClock,
};

use crate::pet::{AutoAction, PetBody, AUTO_FEED_AMOUNT};

/// Length of the on-screen transformation before completion
const EVOLUTION_SEQUENCE_SECS: i64 = 4;

/// A line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Forward an interaction
    Interact(Interaction),
    /// Print the evolution status
    Status,
    /// Start a READY evolution
    Evolve,
    /// Write the save now
    Save,
    /// Save and exit
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim().to_ascii_lowercase();
        let command = match word.as_str() {
            "status" => Self::Status,
            "evolve" => Self::Evolve,
            "save" => Self::Save,
            "quit" | "exit" => Self::Quit,
            "sleep" => Self::Interact(Interaction::SleepStart),
            "wake" => Self::Interact(Interaction::SleepComplete),
            other => Self::Interact(other.parse::<Interaction>().map_err(|e| e.to_string())?),
        };
        Ok(command)
    }
}

/// One line of host output
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// Engine events produced this tick
    pub events: Vec<EvolutionEvent>,
    /// Status after the tick
    pub status: EvolutionStatus,
    /// Whether `status` differs from the previous tick's
    #[serde(skip)]
    pub status_changed: bool,
}

/// Everything the host owns for one pet
#[derive(Debug)]
pub struct Host {
    clock: SharedClock,
    integrator: EvolutionIntegrator,
    body: PetBody,
    pet: PetRecord,
    settings: Settings,
    auto_evolve: bool,
    last_tick: DateTime<Utc>,
    last_status: EvolutionStatus,
    sequence_ends_at: Option<DateTime<Utc>>,
}

impl Host {
    /// Start from a save, or a fresh egg when there is none
    pub fn new(
        save: Option<SaveData>,
        config: &EngineConfig,
        clock: SharedClock,
        auto_evolve: bool,
    ) -> Self {
        let now = clock.now();
        let (integrator, pet, settings, offline) = match save {
            Some(save) => {
                let restored = save.restore(config, clock.clone());
                (restored.integrator, restored.pet, restored.settings, restored.offline)
            }
            None => {
                info!("No save found, hatching a new pet");
                (
                    EvolutionIntegrator::new(config, clock.clone()),
                    PetRecord::default(),
                    Settings::default(),
                    Duration::zero(),
                )
            }
        };

        let mut body = PetBody::new(pet.stats());
        body.decay(offline);
        let last_status = integrator.status();

        Self {
            clock,
            integrator,
            body,
            pet,
            settings,
            auto_evolve,
            last_tick: now,
            last_status,
            sequence_ends_at: None,
        }
    }

    pub fn integrator(&self) -> &EvolutionIntegrator {
        &self.integrator
    }

    pub fn body(&self) -> &PetBody {
        &self.body
    }

    /// Advance the simulation to the clock's current instant
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        self.body.decay(now - self.last_tick);
        self.last_tick = now;

        if self.settings.auto_care_enabled {
            if let Some(action) = self.body.auto_care(now) {
                self.record_auto_action(action);
            }
        }

        let mut events = Vec::new();

        if let Some(ends_at) = self.sequence_ends_at {
            if now >= ends_at {
                self.sequence_ends_at = None;
                match self.integrator.complete_evolution() {
                    Ok(event) => events.push(event),
                    Err(e) => warn!(error = %e, "Evolution did not complete"),
                }
            }
        }

        if let Some(event) = self.integrator.process_evolution(self.body.stats()) {
            let ready = event.kind == EvolutionEventKind::Ready;
            events.push(event);
            if ready && self.auto_evolve {
                events.extend(self.start_evolution());
            }
        }

        let status = self.integrator.status();
        let status_changed = status != self.last_status;
        self.last_status = status;

        TickReport {
            events,
            status,
            status_changed,
        }
    }

    fn record_auto_action(&mut self, action: AutoAction) {
        debug!(?action, "Auto-care");
        match action {
            AutoAction::Feed => self.integrator.tracker_mut().record_feed(AUTO_FEED_AMOUNT),
            AutoAction::Play => self.integrator.tracker_mut().record_play(0.0),
            AutoAction::Nap => self.integrator.tracker_mut().record_sleep_start(),
            AutoAction::Wake => {
                self.integrator
                    .record_interaction(Interaction::SleepComplete, None);
            }
        }
    }

    /// Begin the transformation sequence if the engine is READY
    pub fn start_evolution(&mut self) -> Option<EvolutionEvent> {
        match self.integrator.start_evolution() {
            Ok(event) => {
                self.sequence_ends_at =
                    Some(self.clock.now() + Duration::seconds(EVOLUTION_SEQUENCE_SECS));
                Some(event)
            }
            Err(e) => {
                info!(error = %e, "Evolution not started");
                None
            }
        }
    }

    /// Apply an owner interaction; returns the XP gained
    pub fn interact(&mut self, interaction: Interaction) -> u64 {
        if !self.body.interact(interaction) {
            info!(interaction = %interaction, "Pet ignored the interaction");
            return 0;
        }
        self.integrator
            .record_interaction(interaction, Some(self.body.stats()))
    }

    /// Build a save from the current state
    pub fn save_data(&self) -> SaveData {
        let mut pet = self.pet.clone();
        pet.set_stats(self.body.stats());
        SaveData::capture(&self.integrator, pet, self.settings.clone(), self.clock.now())
    }
}
