//! Guided learning path.
//!
//! Expands the flat exercise catalog of one language into an ordered
//! curriculum. The curriculum replays every exercise once per
//! [`Representation`] in [`REPRESENTATION_ORDER`], and within each
//! representation walks the network tiers in [`NETWORK_ORDER`]:
//!
//! ```text
//! for representation in REPRESENTATION_ORDER      // outer
//!     for tier in NETWORK_ORDER                   // inner
//!         every exercise with that tier, in store order,
//!         with its representation replaced
//! ```
//!
//! Each resulting entry carries its zero-based position as `index`, which
//! clients use to ask for the entry after the one they are showing.
//!
//! The sequence is a pure function of the catalog; it is rebuilt from a
//! fresh store read on every request.

use serde::{Deserialize, Serialize};

use crate::exercise::{Exercise, NetworkTier, Representation};

/// Representation passes of the curriculum, in order.
pub const REPRESENTATION_ORDER: [Representation; 4] = [
    Representation::Iconic,
    Representation::Mixed,
    Representation::Global,
    Representation::Symbolic,
];

/// Network tiers walked within each representation pass, in order.
pub const NETWORK_ORDER: [NetworkTier; 3] = [
    NetworkTier::OneToOne,
    NetworkTier::OneToTwo,
    NetworkTier::OneToThree,
];

/// One position of the guided sequence.
///
/// Serializes as the exercise's own fields plus `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidedEntry {
    /// The exercise, with `representation` set to the curriculum pass.
    #[serde(flatten)]
    pub exercise: Exercise,

    /// Position of this entry in the sequence.
    pub index: usize,
}

/// The guided sequence of one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuidedSequence {
    entries: Vec<GuidedEntry>,
}

impl GuidedSequence {
    /// Builds the sequence for `language` from a catalog.
    ///
    /// Exercises in other languages, or whose network type is outside
    /// [`NETWORK_ORDER`], are skipped. The relative order of exercises
    /// sharing a tier is the catalog order.
    #[must_use]
    pub fn build(language: &str, catalog: &[Exercise]) -> Self {
        let tiered: Vec<(NetworkTier, &Exercise)> = catalog
            .iter()
            .filter(|exercise| exercise.language == language)
            .filter_map(|exercise| exercise.network_tier().map(|tier| (tier, exercise)))
            .collect();

        let tiered = &tiered;

        let entries = REPRESENTATION_ORDER
            .into_iter()
            .flat_map(move |representation| {
                NETWORK_ORDER.into_iter().flat_map(move |tier| {
                    tiered
                        .iter()
                        .filter(move |(exercise_tier, _)| *exercise_tier == tier)
                        .map(move |(_, exercise)| Exercise {
                            representation: representation.as_str().to_string(),
                            ..(**exercise).clone()
                        })
                })
            })
            .enumerate()
            .map(|(index, exercise)| GuidedEntry { exercise, index })
            .collect();

        Self { entries }
    }

    /// Returns the entry at `index`.
    ///
    /// Negative or past-the-end indices yield `None`.
    #[must_use]
    pub fn at(&self, index: i64) -> Option<&GuidedEntry> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.entries.get(index))
    }

    /// Returns the entry following the one at `index`.
    ///
    /// `index` is the raw text a client sent. Text that does not parse as an
    /// integer, and an index whose successor is out of range, yield `None`.
    #[must_use]
    pub fn after(&self, index: &str) -> Option<&GuidedEntry> {
        index
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|index| index.checked_add(1))
            .and_then(|next| self.at(next))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the sequence has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in order.
    #[must_use]
    pub fn entries(&self) -> &[GuidedEntry] {
        &self.entries
    }
}
