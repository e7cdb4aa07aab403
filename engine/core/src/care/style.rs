//! Care style classification

use serde::{Deserialize, Serialize};

/// Classification of the recent caretaking pattern
///
/// Computed on demand by [`CareTracker::calculate_care_style`](super::CareTracker::calculate_care_style);
/// never stored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareStyle {
    /// Even care across all stats
    #[default]
    Balanced,
    /// High play frequency, happiness leads
    Playful,
    /// Lots of attention with happiness and energy kept high
    Pampered,
    /// Stats regularly drop below the neglect threshold
    Neglected,
    /// Overfed with stats always near the top
    Spoiled,
}

impl CareStyle {
    /// Every style, in declaration order
    pub const ALL: [Self; 5] = [
        Self::Balanced,
        Self::Playful,
        Self::Pampered,
        Self::Neglected,
        Self::Spoiled,
    ];

    /// Upper-case identifier used in saves and summaries
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Balanced => "BALANCED",
            Self::Playful => "PLAYFUL",
            Self::Pampered => "PAMPERED",
            Self::Neglected => "NEGLECTED",
            Self::Spoiled => "SPOILED",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Playful => "Playful",
            Self::Pampered => "Pampered",
            Self::Neglected => "Neglected",
            Self::Spoiled => "Spoiled",
        }
    }

    /// One-line description for presentation layers
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Balanced => "Well-rounded care with attention to all needs",
            Self::Playful => "Lots of play and activity, energetic lifestyle",
            Self::Pampered => "Showered with attention and affection",
            Self::Neglected => "Needs have been overlooked",
            Self::Spoiled => "Never wants for anything, always satisfied",
        }
    }
}

impl std::fmt::Display for CareStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
