//! Evolution
//!
//! Four layers, each owning the one below:
//!
//! ```text
//! EvolutionIntegrator     status projection, tick cycle, interactions
//!   └─ EvolutionEventHandler   IMMINENT / READY / STARTED / COMPLETE protocol
//!        ├─ EvolutionManager   XP, levels, form selection
//!        └─ CareTracker        care style, neglect, streaks
//! ```
//!
//! The form catalog in [`forms`] is static data shared by all of them.

mod error;
mod events;
pub mod forms;
mod integrator;
mod manager;

pub use error::EvolutionError;
pub use events::{
    AnimationHint, CallbackId, EvolutionCallback, EvolutionCallbackManager, EvolutionEvent,
    EvolutionEventHandler, EvolutionEventKind, SpecialForm,
};
pub use forms::{EvolutionForm, EvolutionRequirements, EvolutionStage, VisualHints};
pub use integrator::{
    EvolutionIntegrator, EvolutionState, EvolutionStatus, IntegratorState, Interaction, PetStats,
    UnknownInteraction,
};
pub use manager::{
    level_for_xp, xp_for_level, EvolutionManager, EvolutionManagerState, EvolutionPreview,
    HistoryEntry, LevelTier, XpSource, LEVEL_TIERS, MAX_LEVEL,
};
