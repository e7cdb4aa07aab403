//! Pet Engine Core - Headless Evolution and Care Tracking
//!
//! This crate is the simulation heart of a desktop virtual pet. It knows
//! nothing about windows, sprites or files: the host feeds it stat readings
//! and interaction notices, and it answers with evolution events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Host (daemon / UI)                       │
//! │   tick: process_evolution(stats)   input: record_interaction │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │          ▲ EvolutionEvent callbacks
//! ┌──────────────────────────────┼──────────┴────────────────────┐
//! │                       PET ENGINE CORE                        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                 EvolutionIntegrator                    │  │
//! │  │  ┌──────────────────────────────────────────────────┐  │  │
//! │  │  │             EvolutionEventHandler                │  │  │
//! │  │  │  ┌──────────────────┐   ┌─────────────────────┐  │  │  │
//! │  │  │  │ EvolutionManager │   │    CareTracker      │  │  │  │
//! │  │  │  │  XP / level /    │   │  events, snapshots, │  │  │  │
//! │  │  │  │  form selection  │   │  style, streaks     │  │  │  │
//! │  │  │  └──────────────────┘   └─────────────────────┘  │  │  │
//! │  │  └──────────────────────────────────────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │        Clock (injected)          forms (static catalog)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Overview
//!
//! - [`clock`]: Injectable time source
//! - [`config`]: TOML and environment configuration
//! - [`care`]: Care event log, stat snapshots and care-style classification
//! - [`evolution`]: XP, levels, the form catalog and the transition protocol
//! - [`save`]: Versioned save format with migrations from older layouts
//!
//! # Threading
//!
//! Everything here is synchronous. A host that ticks on one task and records
//! input on another must put the [`EvolutionIntegrator`] behind one mutex.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod care;
pub mod clock;
pub mod config;
pub mod evolution;
pub mod save;

pub use care::{
    CareEvent, CareEventKind, CareStyle, CareSummary, CareTracker, CareTrackerState, StatSnapshot,
};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_override,
    resolve_config_path, CareConfig, ConfigError, ConfigSource, EngineConfig, EvolutionConfig,
};
pub use evolution::{
    EvolutionError, EvolutionEvent, EvolutionEventKind, EvolutionIntegrator, EvolutionManager,
    EvolutionStage, EvolutionState, EvolutionStatus, Interaction, PetStats, SpecialForm, XpSource,
};
pub use save::{PetRecord, SaveData, SaveError, Settings, SpecialFlags, SAVE_VERSION};
