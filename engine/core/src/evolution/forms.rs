//! Form Catalog
//!
//! Static reference data: every form a pet can take, the directed graph of
//! which forms may follow which, and the legacy ids older saves still use.
//! Nothing here is mutated at runtime; lookups go through an index built
//! once on first use.
//!
//! ```text
//! egg ─ bloblet ─┬─ bouncy ─┬─ sparky ── zapper
//!                │          └─ chonky ── floofy
//!                ├─ mellow ─┬─ chill ─── zen
//!                │          └─ hardy ─── scrapper
//!                └─ drowsy ─┬─ dreamy ── mystic
//!                           └─ chonky
//! ```
//!
//! Golden, Ghost and Rainbow sit outside the graph and are reached only
//! through special conditions.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::care::CareStyle;

// =============================================================================
// Stages
// =============================================================================

/// Coarse life phase a form belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvolutionStage {
    /// Not hatched
    #[default]
    Egg = 0,
    /// Levels 1-4
    Baby = 1,
    /// Levels 5-14
    Child = 2,
    /// Levels 15-29
    Teen = 3,
    /// Level 30 and up
    Adult = 4,
}

impl EvolutionStage {
    /// Numeric value (0-4)
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Stage from a numeric value; values above 4 clamp to Adult
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Egg,
            1 => Self::Baby,
            2 => Self::Child,
            3 => Self::Teen,
            _ => Self::Adult,
        }
    }

    /// The following stage, if any
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Egg => Some(Self::Baby),
            Self::Baby => Some(Self::Child),
            Self::Child => Some(Self::Teen),
            Self::Teen => Some(Self::Adult),
            Self::Adult => None,
        }
    }

    /// The preceding stage, if any
    #[must_use]
    pub const fn previous(&self) -> Option<Self> {
        match self {
            Self::Egg => None,
            Self::Baby => Some(Self::Egg),
            Self::Child => Some(Self::Baby),
            Self::Teen => Some(Self::Child),
            Self::Adult => Some(Self::Teen),
        }
    }

    /// Stage implied by a level
    #[must_use]
    pub const fn for_level(level: u32) -> Self {
        match level {
            0 => Self::Egg,
            1..=4 => Self::Baby,
            5..=14 => Self::Child,
            15..=29 => Self::Teen,
            _ => Self::Adult,
        }
    }

    /// Upper-case identifier used in saves
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Egg => "EGG",
            Self::Baby => "BABY",
            Self::Child => "CHILD",
            Self::Teen => "TEEN",
            Self::Adult => "ADULT",
        }
    }

    /// Parse an upper-case identifier
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "EGG" => Some(Self::Egg),
            "BABY" => Some(Self::Baby),
            "CHILD" => Some(Self::Child),
            "TEEN" => Some(Self::Teen),
            "ADULT" => Some(Self::Adult),
            _ => None,
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Egg => "Egg",
            Self::Baby => "Baby",
            Self::Child => "Child",
            Self::Teen => "Teen",
            Self::Adult => "Adult",
        }
    }
}

impl std::fmt::Display for EvolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// Forms
// =============================================================================

/// What it takes to evolve into a form
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvolutionRequirements {
    /// Minimum level
    pub min_level: u32,
    /// Accepted care styles; empty accepts any
    pub care_styles: &'static [CareStyle],
    /// Accepted predecessor ids (legacy ids included); empty accepts any
    pub from_forms: &'static [&'static str],
    /// Human description of a special unlock condition
    pub special_condition: Option<&'static str>,
}

impl EvolutionRequirements {
    /// Whether `style` is accepted
    #[must_use]
    pub fn accepts_style(&self, style: CareStyle) -> bool {
        self.care_styles.is_empty() || self.care_styles.contains(&style)
    }

    /// Whether level, style and predecessor all satisfy the requirements
    #[must_use]
    pub fn can_evolve(&self, level: u32, style: CareStyle, current_form: &str) -> bool {
        level >= self.min_level
            && self.accepts_style(style)
            && (self.from_forms.is_empty() || self.from_forms.contains(&current_form))
    }
}

/// Rendering hints; the engine never draws, it only hands these on
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualHints {
    /// Primary body color, `#RRGGBB`
    pub body_color: &'static str,
    /// Accent color, `#RRGGBB`
    pub accent_color: &'static str,
    /// Size relative to the base sprite
    pub size_multiplier: f64,
}

/// A catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvolutionForm {
    /// Unique id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Life phase
    pub stage: EvolutionStage,
    /// Requirements to evolve into this form
    pub requirements: EvolutionRequirements,
    /// Flavor text
    pub description: &'static str,
    /// Rendering hints
    pub visual: VisualHints,
    /// Rare form reached through special conditions
    pub is_special: bool,
    /// Teaser shown before a special form is unlocked
    pub unlock_hint: Option<&'static str>,
}

#[allow(clippy::too_many_arguments)]
const fn standard(
    id: &'static str,
    name: &'static str,
    stage: EvolutionStage,
    min_level: u32,
    care_styles: &'static [CareStyle],
    from_forms: &'static [&'static str],
    description: &'static str,
    colors: (&'static str, &'static str),
    size_multiplier: f64,
) -> EvolutionForm {
    EvolutionForm {
        id,
        name,
        stage,
        requirements: EvolutionRequirements {
            min_level,
            care_styles,
            from_forms,
            special_condition: None,
        },
        description,
        visual: VisualHints {
            body_color: colors.0,
            accent_color: colors.1,
            size_multiplier,
        },
        is_special: false,
        unlock_hint: None,
    }
}

#[allow(clippy::too_many_arguments)]
const fn special(
    id: &'static str,
    name: &'static str,
    care_styles: &'static [CareStyle],
    condition: &'static str,
    description: &'static str,
    colors: (&'static str, &'static str),
    size_multiplier: f64,
    unlock_hint: &'static str,
) -> EvolutionForm {
    EvolutionForm {
        id,
        name,
        stage: EvolutionStage::Adult,
        requirements: EvolutionRequirements {
            min_level: 30,
            care_styles,
            from_forms: &[],
            special_condition: Some(condition),
        },
        description,
        visual: VisualHints {
            body_color: colors.0,
            accent_color: colors.1,
            size_multiplier,
        },
        is_special: true,
        unlock_hint: Some(unlock_hint),
    }
}

use CareStyle::{Balanced, Neglected, Pampered, Playful, Spoiled};
use EvolutionStage::{Adult, Baby, Child, Egg, Teen};

/// Id every pet starts as
pub const STARTING_FORM_ID: &str = "egg";

static FORMS: [EvolutionForm; 18] = [
    standard("egg", "Egg", Egg, 0, &[], &[], "A mysterious wobbling egg", ("#FFF8F0", "#FFE4E1"), 0.7),
    standard("bloblet", "Bloblet", Baby, 1, &[], &["egg"], "A tiny, wobbly baby blob", ("#E8DAEF", "#CDB4DB"), 0.6),
    // child
    standard("bouncy", "Bouncy", Child, 5, &[Playful, Spoiled], &["bloblet"], "An energetic, springy blob", ("#FFD6E0", "#FFB6C1"), 0.8),
    standard("mellow", "Mellow", Child, 5, &[Balanced], &["bloblet"], "A calm, content blob", ("#B5E48C", "#95D5B2"), 0.8),
    standard("drowsy", "Drowsy", Child, 5, &[Pampered, Neglected], &["bloblet"], "A sleepy, dreamy blob", ("#A2D2FF", "#BDE0FE"), 0.8),
    // teen
    standard("sparky", "Sparky", Teen, 15, &[Playful], &["bouncy"], "Electric and excitable!", ("#FFF3B0", "#FFE66D"), 1.0),
    standard("chill", "Chill", Teen, 15, &[Balanced], &["mellow", "balanced"], "Cool and collected", ("#99E2B4", "#88D4AB"), 1.0),
    standard("dreamy", "Dreamy", Teen, 15, &[Pampered, Neglected], &["drowsy", "sleepy"], "Head in the clouds", ("#CDB4DB", "#E2C2FF"), 1.0),
    standard("hardy", "Hardy", Teen, 15, &[Neglected], &["mellow", "balanced"], "Tough and resilient", ("#D4C1EC", "#B8A9C9"), 1.0),
    standard("chonky", "Chonky", Teen, 15, &[Spoiled], &["bouncy", "drowsy", "sleepy"], "Well-fed and proud", ("#FFB5A7", "#FFCDB2"), 1.1),
    // adult
    standard("zapper", "Zapper", Adult, 30, &[Playful], &["sparky"], "Crackling with energy!", ("#FFF099", "#FFEB3B"), 1.2),
    standard("zen", "Zen", Adult, 30, &[Balanced], &["chill"], "Perfectly balanced", ("#A8E6CF", "#88D8B0"), 1.2),
    standard("mystic", "Mystic", Adult, 30, &[Pampered, Balanced], &["dreamy"], "Mysterious and ethereal", ("#DCD0FF", "#C8A2FF"), 1.2),
    standard("scrapper", "Scrapper", Adult, 30, &[Neglected], &["hardy"], "Battle-hardened survivor", ("#A9A9A9", "#808080"), 1.1),
    standard("floofy", "Floofy", Adult, 30, &[Pampered, Spoiled], &["chonky", "cozy"], "Maximum floof achieved", ("#FFDAB9", "#FFE4C4"), 1.3),
    // special
    special(
        "golden",
        "Golden",
        &[],
        "7 consecutive days of perfect care (all stats above 80)",
        "A legendary golden blob!",
        ("#FFD700", "#FFF8DC"),
        1.2,
        "Perfect care for 7 days...",
    ),
    special(
        "ghost",
        "Ghost",
        &[Neglected],
        "Revived from critical neglect",
        "Returned from beyond...",
        ("#E8E8E8", "#FFFFFF"),
        1.0,
        "What doesn't kill you...",
    ),
    special(
        "rainbow",
        "Rainbow",
        &[],
        "Evolved on a special date",
        "A prismatic wonder!",
        ("#FF69B4", "#87CEEB"),
        1.2,
        "Special occasions bring special forms...",
    ),
];

/// Successor graph; terminal forms are absent
const SUCCESSORS: &[(&str, &[&str])] = &[
    ("egg", &["bloblet"]),
    ("bloblet", &["bouncy", "mellow", "drowsy"]),
    ("bouncy", &["sparky", "chonky"]),
    ("mellow", &["chill", "hardy"]),
    ("drowsy", &["dreamy", "chonky"]),
    ("sparky", &["zapper"]),
    ("chill", &["zen"]),
    ("dreamy", &["mystic"]),
    ("hardy", &["scrapper"]),
    ("chonky", &["floofy"]),
];

/// Legacy ids from older saves and their canonical forms
pub const FORM_ALIASES: &[(&str, &str)] = &[
    ("balanced", "mellow"),
    ("sleepy", "drowsy"),
    ("zippy", "sparky"),
    ("cozy", "chonky"),
    ("dasher", "zapper"),
    ("loafer", "zen"),
];

fn index() -> &'static HashMap<&'static str, &'static EvolutionForm> {
    static INDEX: OnceLock<HashMap<&'static str, &'static EvolutionForm>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map: HashMap<&'static str, &'static EvolutionForm> =
            all_forms().iter().map(|f| (f.id, f)).collect();
        for (alias, canonical) in FORM_ALIASES {
            if let Some(form) = map.get(canonical).copied() {
                map.insert(*alias, form);
            }
        }
        map
    })
}

/// Every catalog entry
#[must_use]
pub fn all_forms() -> &'static [EvolutionForm] {
    &FORMS
}

/// The form every pet hatches from
#[must_use]
pub fn starting_form() -> &'static EvolutionForm {
    &FORMS[0]
}

/// Look up a form by id; legacy ids resolve to their canonical form
#[must_use]
pub fn form_by_id(id: &str) -> Option<&'static EvolutionForm> {
    index().get(id).copied()
}

/// Canonical id for `id`, resolving legacy aliases
#[must_use]
pub fn canonical_form_id(id: &str) -> Option<&'static str> {
    form_by_id(id).map(|f| f.id)
}

/// Forms that may follow `id`, in preference order
#[must_use]
pub fn successors(id: &str) -> Vec<&'static EvolutionForm> {
    let Some(canonical) = canonical_form_id(id) else {
        return Vec::new();
    };
    SUCCESSORS
        .iter()
        .find(|(from, _)| *from == canonical)
        .map(|(_, next)| next.iter().filter_map(|n| form_by_id(n)).collect())
        .unwrap_or_default()
}

/// Forms belonging to `stage`, special forms included
#[must_use]
pub fn forms_by_stage(stage: EvolutionStage) -> Vec<&'static EvolutionForm> {
    all_forms().iter().filter(|f| f.stage == stage).collect()
}

/// Progress toward each successor of `current_form_id`, 0.0-1.0
///
/// Weighted 70% on level (against the form's minimum) and 30% on whether
/// `style` is accepted.
#[must_use]
pub fn evolution_progress(
    current_form_id: &str,
    level: u32,
    style: CareStyle,
) -> Vec<(&'static str, f64)> {
    successors(current_form_id)
        .into_iter()
        .map(|form| {
            let req = &form.requirements;
            let level_progress = if req.min_level > 0 {
                (f64::from(level) / f64::from(req.min_level)).min(1.0)
            } else {
                1.0
            };
            let style_match = if req.accepts_style(style) { 1.0 } else { 0.0 };
            (form.id, level_progress * 0.7 + style_match * 0.3)
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
