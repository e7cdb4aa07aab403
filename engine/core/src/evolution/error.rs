use thiserror::Error;

use super::integrator::EvolutionStatus;

/// Why an evolution transition did not happen
///
/// None of these are fatal. The state machine is left consistent and the
/// caller can simply try again on a later tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvolutionError {
    /// A transition is already running
    #[error("an evolution is already in progress")]
    AlreadyInProgress,

    /// `complete_evolution` without a started transition
    #[error("no evolution in progress to complete")]
    NothingPending,

    /// Form id not in the catalog
    #[error("unknown form '{0}'")]
    UnknownForm(String),

    /// Ready, but no successor resolves for the current level and style
    #[error("no evolution target resolves for the current form")]
    NoTarget,

    /// `start_evolution` while the integrator is not READY
    #[error("cannot start evolution while status is {0}")]
    NotReady(EvolutionStatus),
}
