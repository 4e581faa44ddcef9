//! Bracket data models: entrants, slots and matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Division ID type
pub type DivisionId = i64;

/// Entrant ID type
pub type EntrantId = i64;

/// Seed number (1-based)
pub type Seed = u32;

/// Matches of one bracket keyed by slot
pub type MatchMap = BTreeMap<Slot, Match>;

/// Entrant registration record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    /// Entrant ID
    pub id: EntrantId,
    /// Division the entrant is registered in
    pub division_id: DivisionId,
    /// Display label
    pub label: String,
    /// Seed (None until the entrant is admitted into the bracket)
    pub seed: Option<Seed>,
}

impl Entrant {
    /// Create a new entrant registration
    pub fn new(id: EntrantId, division_id: DivisionId, label: impl Into<String>) -> Self {
        Self {
            id,
            division_id,
            label: label.into(),
            seed: None,
        }
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Which child of its parent a slot is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Upper,
    Lower,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Upper => write!(f, "upper"),
            Side::Lower => write!(f, "lower"),
        }
    }
}

/// Position of a match: round 0 is the first round, the highest round is the final
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub round: u32,
    pub index: u32,
}

impl Slot {
    pub fn new(round: u32, index: u32) -> Self {
        Self { round, index }
    }

    /// Slot of the match this one feeds into
    pub fn parent(&self) -> Slot {
        Slot::new(self.round + 1, self.index / 2)
    }

    /// The other child of this slot's parent
    pub fn sibling(&self) -> Slot {
        Slot::new(self.round, self.index ^ 1)
    }

    /// Upper and lower child slots (None for round 0)
    pub fn children(&self) -> Option<(Slot, Slot)> {
        if self.round == 0 {
            return None;
        }
        Some((
            Slot::new(self.round - 1, self.index * 2),
            Slot::new(self.round - 1, self.index * 2 + 1),
        ))
    }

    /// Which input of the parent this slot's winner fills
    pub fn side(&self) -> Side {
        if self.index % 2 == 0 {
            Side::Upper
        } else {
            Side::Lower
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.round, self.index)
    }
}

/// A single match in the bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Slot of the match
    pub slot: Slot,
    /// Upper input (winner of the upper child, or the upper round-0 position)
    pub upper: Option<EntrantId>,
    /// Lower input
    pub lower: Option<EntrantId>,
    /// Explicitly recorded winner
    pub winner: Option<EntrantId>,
    /// When the winner was recorded
    pub decided_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Create an undecided match
    pub fn new(slot: Slot, upper: Option<EntrantId>, lower: Option<EntrantId>) -> Self {
        Self {
            slot,
            upper,
            lower,
            winner: None,
            decided_at: None,
        }
    }

    /// A match with exactly one input present
    pub fn is_bye(&self) -> bool {
        self.upper.is_some() != self.lower.is_some()
    }

    /// Explicit winner, or the lone entrant of a bye
    pub fn resolved_winner(&self) -> Option<EntrantId> {
        if self.winner.is_some() {
            return self.winner;
        }
        if self.is_bye() {
            return self.upper.or(self.lower);
        }
        None
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_winner().is_some()
    }

    /// Whether the entrant is one of the inputs
    pub fn involves(&self, entrant: EntrantId) -> bool {
        self.upper == Some(entrant) || self.lower == Some(entrant)
    }

    /// Input on the given side
    pub fn input(&self, side: Side) -> Option<EntrantId> {
        match side {
            Side::Upper => self.upper,
            Side::Lower => self.lower,
        }
    }

    /// Same two inputs in the same order
    pub fn same_pairing(&self, other: &Match) -> bool {
        self.upper == other.upper && self.lower == other.lower
    }
}

/// Persisted shape of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub division_id: DivisionId,
    pub round_num: u32,
    pub round_slot: u32,
    pub upper_input: Option<EntrantId>,
    pub lower_input: Option<EntrantId>,
    pub winner: Option<EntrantId>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl MatchRecord {
    /// Build a record for a match in the given division
    pub fn from_match(division_id: DivisionId, m: &Match) -> Self {
        Self {
            division_id,
            round_num: m.slot.round,
            round_slot: m.slot.index,
            upper_input: m.upper,
            lower_input: m.lower,
            winner: m.winner,
            decided_at: m.decided_at,
        }
    }

    pub fn slot(&self) -> Slot {
        Slot::new(self.round_num, self.round_slot)
    }

    pub fn to_match(&self) -> Match {
        Match {
            slot: self.slot(),
            upper: self.upper_input,
            lower: self.lower_input,
            winner: self.winner,
            decided_at: self.decided_at,
        }
    }
}

/// One change to apply to the stored match rows of a division
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchChange {
    Insert(MatchRecord),
    Update(MatchRecord),
    Delete { division_id: DivisionId, slot: Slot },
}

impl MatchChange {
    pub fn slot(&self) -> Slot {
        match self {
            MatchChange::Insert(record) | MatchChange::Update(record) => record.slot(),
            MatchChange::Delete { slot, .. } => *slot,
        }
    }
}
