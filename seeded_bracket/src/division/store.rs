//! Storage contract for division brackets.
//!
//! The engine never owns persistence; it reads registrations and match rows
//! through [`BracketStore`] and writes back one [`BracketCommit`] per
//! mutation. [`MemoryStore`] is the in-process implementation used by tests
//! and embedders without a database.

use crate::bracket::models::{
    DivisionId, Entrant, EntrantId, MatchChange, MatchRecord, Seed, Slot,
};
use crate::errors::{BracketError, BracketResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Everything one mutation writes, applied atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BracketCommit {
    /// New seed per entrant (None clears the seed)
    pub seeds: Vec<(EntrantId, Option<Seed>)>,
    /// Match row changes in application order
    pub changes: Vec<MatchChange>,
}

impl BracketCommit {
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty() && self.changes.is_empty()
    }
}

/// Trait for bracket storage operations
#[async_trait]
pub trait BracketStore: Send + Sync {
    /// All entrant registrations of a division
    async fn entrants(&self, division: DivisionId) -> BracketResult<Vec<Entrant>>;

    /// All stored matches of a division
    async fn matches(&self, division: DivisionId) -> BracketResult<Vec<MatchRecord>>;

    /// Apply seeds and match changes together, or nothing at all
    async fn commit(&self, division: DivisionId, commit: BracketCommit) -> BracketResult<()>;
}

#[derive(Debug, Default)]
struct DivisionRecords {
    entrants: BTreeMap<EntrantId, Entrant>,
    matches: BTreeMap<Slot, MatchRecord>,
}

/// In-memory implementation of `BracketStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    divisions: RwLock<HashMap<DivisionId, DivisionRecords>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entrant (replaces an existing registration with the same id)
    pub async fn register(&self, entrant: Entrant) {
        let mut divisions = self.divisions.write().await;
        divisions
            .entry(entrant.division_id)
            .or_default()
            .entrants
            .insert(entrant.id, entrant);
    }
}

#[async_trait]
impl BracketStore for MemoryStore {
    async fn entrants(&self, division: DivisionId) -> BracketResult<Vec<Entrant>> {
        let divisions = self.divisions.read().await;
        Ok(divisions
            .get(&division)
            .map(|records| records.entrants.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn matches(&self, division: DivisionId) -> BracketResult<Vec<MatchRecord>> {
        let divisions = self.divisions.read().await;
        Ok(divisions
            .get(&division)
            .map(|records| records.matches.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn commit(&self, division: DivisionId, commit: BracketCommit) -> BracketResult<()> {
        let mut divisions = self.divisions.write().await;
        let records = divisions.entry(division).or_default();

        // Validate against a scratch copy of the match rows first
        let mut matches = records.matches.clone();
        for (entrant, _) in &commit.seeds {
            if !records.entrants.contains_key(entrant) {
                return Err(BracketError::Store(format!(
                    "Entrant {} is not registered in division {}",
                    entrant, division
                )));
            }
        }
        for change in &commit.changes {
            match change {
                MatchChange::Insert(record) => {
                    if matches.insert(record.slot(), record.clone()).is_some() {
                        return Err(BracketError::Store(format!(
                            "Match {} already exists in division {}",
                            record.slot(),
                            division
                        )));
                    }
                }
                MatchChange::Update(record) => {
                    if matches.insert(record.slot(), record.clone()).is_none() {
                        return Err(BracketError::Store(format!(
                            "Match {} does not exist in division {}",
                            record.slot(),
                            division
                        )));
                    }
                }
                MatchChange::Delete { slot, .. } => {
                    if matches.remove(slot).is_none() {
                        return Err(BracketError::Store(format!(
                            "Match {} does not exist in division {}",
                            slot, division
                        )));
                    }
                }
            }
        }

        records.matches = matches;
        for (entrant, seed) in commit.seeds {
            if let Some(registration) = records.entrants.get_mut(&entrant) {
                registration.seed = seed;
            }
        }
        Ok(())
    }
}
