//! Division bracket manager.
//!
//! Every mutating operation runs under the division's lock: read the current
//! registrations and matches, compute the new bracket in memory, diff it
//! against what was read and commit the difference in one call. Reads take
//! no lock and may observe a bracket between two commits.

use super::{
    locks::DivisionLocks,
    store::{BracketCommit, BracketStore},
};
use crate::bracket::{
    advancer::AdvanceOutcome,
    bye_seed::lowest_available_bye_seed,
    generator::generate_sized,
    layout::{BracketLayout, layout, unassigned_entrants},
    models::{DivisionId, Entrant, EntrantId, MatchMap, Seed, Side, Slot},
    seeding::bracket_size_for,
    state::BracketState,
};
use crate::config::BracketConfig;
use crate::errors::{BracketError, BracketResult};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Everything a bracket page needs
#[derive(Debug, Clone, Serialize)]
pub struct BracketView {
    pub division_id: DivisionId,
    pub layout: BracketLayout,
    /// Registered entrants not placed in any match
    pub unassigned: Vec<Entrant>,
    /// Seed to pre-fill when placing an unassigned entrant
    pub lowest_bye_seed: Seed,
    /// Display label per entrant
    pub labels: BTreeMap<EntrantId, String>,
    pub champion: Option<EntrantId>,
}

/// Registrations and bracket of a division as read under the lock
struct Snapshot {
    entrants: Vec<Entrant>,
    state: Option<BracketState>,
}

impl Snapshot {
    fn entrant(&self, id: EntrantId) -> BracketResult<&Entrant> {
        self.entrants.iter().find(|e| e.id == id).ok_or_else(|| {
            BracketError::Validation(format!("Entrant {} is not registered in this division", id))
        })
    }

    fn seeded(&self) -> Vec<(Seed, EntrantId)> {
        let mut seeded: Vec<_> = self
            .entrants
            .iter()
            .filter_map(|e| e.seed.map(|seed| (seed, e.id)))
            .collect();
        seeded.sort_unstable();
        seeded
    }

    fn state_mut(&mut self) -> BracketResult<&mut BracketState> {
        self.state.as_mut().ok_or_else(|| {
            BracketError::Validation("The bracket has not been generated yet".to_string())
        })
    }

    fn set_seed(&mut self, id: EntrantId, seed: Option<Seed>) {
        if let Some(entrant) = self.entrants.iter_mut().find(|e| e.id == id) {
            entrant.seed = seed;
        }
    }
}

/// Bracket manager
pub struct BracketManager<S: BracketStore> {
    store: Arc<S>,
    locks: DivisionLocks,
    config: BracketConfig,
}

impl<S: BracketStore> Clone for BracketManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            locks: self.locks.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: BracketStore> BracketManager<S> {
    /// Create a new bracket manager
    pub fn new(store: Arc<S>, config: BracketConfig) -> Self {
        Self {
            store,
            locks: DivisionLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &BracketConfig {
        &self.config
    }

    /// Generate the first round from the registered seeds
    ///
    /// Regenerating is allowed until the first result is recorded.
    pub async fn generate_bracket(&self, division: DivisionId) -> BracketResult<()> {
        self.mutate(division, "generate_bracket", |snapshot| {
            if snapshot.state.as_ref().is_some_and(BracketState::has_results) {
                return Err(BracketError::Validation(
                    "Results have been recorded; change seeds instead of regenerating".to_string(),
                ));
            }
            snapshot.state = Some(BracketState::from_seeds(&snapshot.seeded())?);
            Ok(())
        })
        .await
    }

    /// Replace the seed assignment of a division in one batch
    ///
    /// `proposal` lists entrants with their new seed (None unseeds). Entrants
    /// not listed keep their seed. The batch is rejected as a whole if any
    /// entrant is unknown or listed twice, a seed repeats, or a seed falls
    /// outside `[1, bracket_size]` for the resulting number of seeded
    /// entrants. If the bracket exists it is reconciled with the new seeds.
    pub async fn assign_seeds(
        &self,
        division: DivisionId,
        proposal: Vec<(EntrantId, Option<Seed>)>,
    ) -> BracketResult<()> {
        self.mutate(division, "assign_seeds", move |snapshot| {
            let mut listed = HashSet::new();
            for (id, seed) in &proposal {
                snapshot.entrant(*id)?;
                if !listed.insert(*id) {
                    return Err(BracketError::Validation(format!(
                        "Entrant {} appears more than once in the seed list",
                        id
                    )));
                }
                snapshot.set_seed(*id, *seed);
            }

            let seeded = snapshot.seeded();
            validate_seed_set(&seeded)?;

            if let Some(state) = snapshot.state.as_mut() {
                state.reseed(&seeded)?;
            }
            Ok(())
        })
        .await
    }

    /// Give an unseeded entrant a seed
    ///
    /// Before the bracket exists this only records the seed. Afterwards the
    /// seed must land on the empty side of a first-round bye whose entrant
    /// has not played a decided match yet.
    pub async fn admit_entrant(
        &self,
        division: DivisionId,
        entrant: EntrantId,
        seed: Seed,
    ) -> BracketResult<()> {
        self.mutate(division, "admit_entrant", move |snapshot| {
            let registration = snapshot.entrant(entrant)?;
            if let Some(existing) = registration.seed {
                return Err(BracketError::Validation(format!(
                    "Entrant {} already holds seed {}",
                    entrant, existing
                )));
            }
            if let Some(holder) = snapshot.entrants.iter().find(|e| e.seed == Some(seed)) {
                return Err(BracketError::Validation(format!(
                    "Seed {} is already held by {}",
                    seed, holder.label
                )));
            }

            snapshot.set_seed(entrant, Some(seed));
            let seeded = snapshot.seeded();

            let Some(state) = snapshot.state.as_mut() else {
                return validate_seed_set(&seeded);
            };

            if seed == 0 || seed > state.bracket_size() {
                return Err(BracketError::Validation(format!(
                    "Seed {} is outside [1, {}]",
                    seed,
                    state.bracket_size()
                )));
            }
            let (slot, side) = state.position_of_seed(seed)?;
            let opening = state
                .get(slot)
                .ok_or_else(|| BracketError::Validation(format!("No match exists at slot {}", slot)))?;
            if opening.input(side).is_some() || !opening.is_bye() {
                return Err(BracketError::Validation(format!(
                    "Seed {} would land on an occupied position in match {}",
                    seed, slot
                )));
            }
            state.reseed(&seeded)
        })
        .await
    }

    /// Seed that would face the entrant on `side` of a first-round bye
    ///
    /// Used to pre-fill the form for placing an unassigned entrant into an
    /// open slot.
    pub async fn opponent_seed_for(
        &self,
        division: DivisionId,
        slot: Slot,
        side: Side,
    ) -> BracketResult<Seed> {
        let snapshot = self.read(division).await?;
        let state = snapshot.state.as_ref().ok_or_else(|| {
            BracketError::Validation("The bracket has not been generated yet".to_string())
        })?;
        let m = state
            .get(slot)
            .filter(|m| m.slot.round == 0)
            .ok_or_else(|| {
                BracketError::Validation(format!("No first-round match exists at slot {}", slot))
            })?;
        let other = match side {
            Side::Upper => Side::Lower,
            Side::Lower => Side::Upper,
        };
        if m.input(other).is_some() {
            return Err(BracketError::Validation(format!(
                "Match {} has no open position",
                slot
            )));
        }
        let existing = m.input(side).ok_or_else(|| {
            BracketError::Validation(format!("Match {} has no {} entrant", slot, side))
        })?;
        let seed = snapshot.entrant(existing)?.seed.ok_or_else(|| {
            BracketError::Validation(format!("Entrant {} has no seed", existing))
        })?;
        Ok(state.bracket_size() + 1 - seed)
    }

    /// Record the winner of a match
    pub async fn record_winner(
        &self,
        division: DivisionId,
        slot: Slot,
        winner: EntrantId,
    ) -> BracketResult<()> {
        self.mutate(division, "record_winner", move |snapshot| {
            snapshot.state_mut()?.record_winner(slot, winner)
        })
        .await
    }

    /// Clear a recorded result along with every match that depended on it
    pub async fn reset_winner(&self, division: DivisionId, slot: Slot) -> BracketResult<Vec<Slot>> {
        self.mutate(division, "reset_winner", move |snapshot| {
            snapshot.state_mut()?.reset_winner(slot)
        })
        .await
    }

    /// Create the round after `round` once all its results are in
    pub async fn advance_round(
        &self,
        division: DivisionId,
        round: u32,
    ) -> BracketResult<AdvanceOutcome> {
        self.mutate(division, "advance_round", move |snapshot| {
            snapshot.state_mut()?.advance_round(round)
        })
        .await
    }

    /// Layout, unassigned entrants and default seed for a division
    pub async fn view(&self, division: DivisionId) -> BracketResult<BracketView> {
        let snapshot = self.read(division).await?;
        let empty = MatchMap::new();
        let (matches, grid) = match &snapshot.state {
            Some(state) => (
                state.matches(),
                layout(
                    state.matches(),
                    state.bracket_size(),
                    self.config.cell_unit_height_px,
                )?,
            ),
            None => (&empty, BracketLayout::default()),
        };

        Ok(BracketView {
            division_id: division,
            layout: grid,
            unassigned: unassigned_entrants(&snapshot.entrants, matches),
            lowest_bye_seed: lowest_available_bye_seed(&snapshot.entrants, matches),
            labels: snapshot
                .entrants
                .iter()
                .map(|e| (e.id, e.label.clone()))
                .collect(),
            champion: snapshot.state.as_ref().and_then(BracketState::champion),
        })
    }

    /// Default seed for manually placing an entrant
    pub async fn lowest_bye_seed(&self, division: DivisionId) -> BracketResult<Seed> {
        let snapshot = self.read(division).await?;
        let empty = MatchMap::new();
        let matches = snapshot
            .state
            .as_ref()
            .map_or(&empty, BracketState::matches);
        Ok(lowest_available_bye_seed(&snapshot.entrants, matches))
    }

    async fn read(&self, division: DivisionId) -> BracketResult<Snapshot> {
        let entrants = self.store.entrants(division).await?;
        let records = self.store.matches(division).await?;
        Ok(Snapshot {
            entrants,
            state: BracketState::restore(&records)?,
        })
    }

    async fn mutate<T, F>(&self, division: DivisionId, operation: &str, f: F) -> BracketResult<T>
    where
        F: FnOnce(&mut Snapshot) -> BracketResult<T> + Send,
    {
        let _guard = self.locks.acquire(division, &self.config).await?;

        let before = self.read(division).await?;
        let mut after = Snapshot {
            entrants: before.entrants.clone(),
            state: before.state.clone(),
        };

        let output = match f(&mut after) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Division {}: {} rejected: {}", division, operation, e);
                return Err(e);
            }
        };

        let commit = build_commit(division, &before, &after);
        if commit.is_empty() {
            log::debug!("Division {}: {} changed nothing", division, operation);
            return Ok(output);
        }

        let seed_count = commit.seeds.len();
        let change_count = commit.changes.len();
        self.store.commit(division, commit).await?;
        log::info!(
            "Division {}: {} committed {} seed change(s) and {} match change(s)",
            division,
            operation,
            seed_count,
            change_count
        );
        Ok(output)
    }
}

/// Seeds must be unique, fit the bracket implied by their count and leave
/// no first-round match without an entrant
fn validate_seed_set(seeded: &[(Seed, EntrantId)]) -> BracketResult<()> {
    let bracket_size = bracket_size_for(seeded.len());
    let mut holders: HashMap<Seed, EntrantId> = HashMap::new();
    for &(seed, entrant) in seeded {
        if seed == 0 || seed > bracket_size {
            return Err(BracketError::Validation(format!(
                "Seed {} of entrant {} is outside [1, {}]",
                seed, entrant, bracket_size
            )));
        }
        if let Some(other) = holders.insert(seed, entrant) {
            return Err(BracketError::Validation(format!(
                "Seed {} is assigned to both entrant {} and entrant {}",
                seed, other, entrant
            )));
        }
    }
    if seeded.len() >= 2 {
        generate_sized(seeded, bracket_size)?;
    }
    Ok(())
}

fn build_commit(division: DivisionId, before: &Snapshot, after: &Snapshot) -> BracketCommit {
    let old_seeds: HashMap<EntrantId, Option<Seed>> =
        before.entrants.iter().map(|e| (e.id, e.seed)).collect();
    let seeds = after
        .entrants
        .iter()
        .filter(|e| old_seeds.get(&e.id) != Some(&e.seed))
        .map(|e| (e.id, e.seed))
        .collect();

    let empty = MatchMap::new();
    let stored = before
        .state
        .as_ref()
        .map_or(&empty, BracketState::matches);
    let changes = match &after.state {
        Some(state) => state.diff(division, stored),
        None => Vec::new(),
    };

    BracketCommit { seeds, changes }
}
