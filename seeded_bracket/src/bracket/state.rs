//! Slot-indexed bracket arena.
//!
//! `BracketState` holds every known match of one division keyed by slot.
//! All mutations are computed here in memory; persistence only ever sees
//! the changes produced by [`BracketState::diff`].

use super::{
    advancer::{AdvanceOutcome, advance},
    generator::generate_sized,
    models::{DivisionId, EntrantId, Match, MatchChange, MatchMap, MatchRecord, Seed, Side, Slot},
    seeding::{bracket_size_for, round_count, slot_for_seed, validate_bracket_size},
};
use crate::errors::{BracketError, BracketResult};
use chrono::Utc;

/// In-memory bracket of one division
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketState {
    bracket_size: u32,
    matches: MatchMap,
}

impl BracketState {
    /// Bracket with no matches yet
    pub fn empty(bracket_size: u32) -> BracketResult<Self> {
        validate_bracket_size(bracket_size)?;
        Ok(Self {
            bracket_size,
            matches: MatchMap::new(),
        })
    }

    /// Build a fresh bracket from seeded entrants
    ///
    /// Round 0 is generated for the smallest fitting bracket and every match
    /// whose two children are already decided (byes meeting byes) is created
    /// straight away.
    pub fn from_seeds(seeded: &[(Seed, EntrantId)]) -> BracketResult<Self> {
        let mut state = Self::empty(bracket_size_for(seeded.len()))?;
        for m in generate_sized(seeded, state.bracket_size)? {
            state.matches.insert(m.slot, m);
        }
        state.fill_ready_matches();
        Ok(state)
    }

    /// Rebuild a bracket from stored match rows
    ///
    /// Round 0 is always stored in full, so its width gives the bracket size.
    pub fn restore(records: &[MatchRecord]) -> BracketResult<Option<Self>> {
        let Some(last_slot) = records
            .iter()
            .filter(|r| r.round_num == 0)
            .map(|r| r.round_slot)
            .max()
        else {
            if records.is_empty() {
                return Ok(None);
            }
            return Err(BracketError::Configuration(
                "Stored matches have no first round".to_string(),
            ));
        };

        let bracket_size = last_slot
            .checked_add(1)
            .and_then(|width| width.checked_mul(2))
            .and_then(u32::checked_next_power_of_two)
            .ok_or_else(|| {
                BracketError::Configuration(format!(
                    "Stored first-round slot {} does not fit any bracket",
                    last_slot
                ))
            })?;
        let mut state = Self::empty(bracket_size)?;
        let rounds = state.rounds();
        for record in records {
            let slot = record.slot();
            if slot.round >= rounds || slot.index >= state.matches_in_round(slot.round) {
                return Err(BracketError::Configuration(format!(
                    "Stored match {} lies outside a bracket of {}",
                    slot, bracket_size
                )));
            }
            state.matches.insert(slot, record.to_match());
        }
        Ok(Some(state))
    }

    pub fn bracket_size(&self) -> u32 {
        self.bracket_size
    }

    pub fn rounds(&self) -> u32 {
        round_count(self.bracket_size)
    }

    pub fn final_round(&self) -> u32 {
        self.rounds() - 1
    }

    pub fn matches_in_round(&self, round: u32) -> u32 {
        self.bracket_size >> (round + 1)
    }

    pub fn matches(&self) -> &MatchMap {
        &self.matches
    }

    pub fn get(&self, slot: Slot) -> Option<&Match> {
        self.matches.get(&slot)
    }

    /// Existing matches of a round, ordered by slot
    pub fn round(&self, round: u32) -> Vec<Match> {
        self.matches
            .range(Slot::new(round, 0)..Slot::new(round + 1, 0))
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Whether any match carries an explicitly recorded winner
    pub fn has_results(&self) -> bool {
        self.matches.values().any(|m| m.winner.is_some())
    }

    /// Winner of the final, once decided
    pub fn champion(&self) -> Option<EntrantId> {
        self.matches
            .get(&Slot::new(self.final_round(), 0))
            .and_then(Match::resolved_winner)
    }

    pub fn is_complete(&self) -> bool {
        self.champion().is_some()
    }

    /// Record the winner of a contested match
    ///
    /// A result can be recorded exactly once; use [`reset_winner`] first to
    /// change it. If the sibling match is already decided, the parent match
    /// is created.
    ///
    /// [`reset_winner`]: BracketState::reset_winner
    pub fn record_winner(&mut self, slot: Slot, winner: EntrantId) -> BracketResult<()> {
        let m = self.matches.get_mut(&slot).ok_or_else(|| {
            BracketError::Validation(format!("No match exists at slot {}", slot))
        })?;
        if m.is_bye() {
            return Err(BracketError::Validation(format!(
                "Match {} is a bye and needs no result",
                slot
            )));
        }
        if !m.involves(winner) {
            return Err(BracketError::Validation(format!(
                "Entrant {} is not playing in match {}",
                winner, slot
            )));
        }
        if let Some(existing) = m.winner {
            return Err(BracketError::Validation(format!(
                "Match {} already has winner {}; reset it before recording a new one",
                slot, existing
            )));
        }

        m.winner = Some(winner);
        m.decided_at = Some(Utc::now());
        self.fill_ready_matches();
        Ok(())
    }

    /// Clear a recorded result and drop everything built on it
    ///
    /// Every existing match above the slot depends on the old winner, so the
    /// whole chain up to the final is removed.
    ///
    /// Returns the slots that were removed.
    pub fn reset_winner(&mut self, slot: Slot) -> BracketResult<Vec<Slot>> {
        let m = self.matches.get_mut(&slot).ok_or_else(|| {
            BracketError::Validation(format!("No match exists at slot {}", slot))
        })?;
        if m.winner.is_none() {
            return Err(BracketError::Validation(format!(
                "Match {} has no recorded winner to reset",
                slot
            )));
        }
        m.winner = None;
        m.decided_at = None;
        Ok(self.remove_ancestors(slot))
    }

    /// Create the next round from a resolved round
    ///
    /// Existing next-round matches with the same pairing are left alone, so
    /// the call can be repeated safely. Nothing is written unless every
    /// check passes.
    ///
    /// # Errors
    ///
    /// `IncompleteRound` if the round is missing matches or results, and
    /// `Validation` if an existing next-round match has a different pairing.
    pub fn advance_round(&mut self, round: u32) -> BracketResult<AdvanceOutcome> {
        if round >= self.rounds() {
            return Err(BracketError::Configuration(format!(
                "Round {} is beyond the final of a bracket of {}",
                round, self.bracket_size
            )));
        }

        let current = self.round(round);
        let expected = self.matches_in_round(round);
        if current.len() as u32 != expected {
            let unresolved = (0..expected)
                .filter(|index| !self.matches.contains_key(&Slot::new(round, *index)))
                .collect();
            return Err(BracketError::IncompleteRound { round, unresolved });
        }

        let outcome = advance(&current)?;
        for next in outcome.matches() {
            if let Some(existing) = self
                .matches
                .get(&next.slot)
                .filter(|existing| !existing.same_pairing(next))
            {
                return Err(BracketError::Validation(format!(
                    "Match {} already pairs {:?} vs {:?}, expected {:?} vs {:?}",
                    next.slot, existing.upper, existing.lower, next.upper, next.lower
                )));
            }
        }
        for next in outcome.matches() {
            self.matches.entry(next.slot).or_insert_with(|| next.clone());
        }
        Ok(outcome)
    }

    /// Reconcile the bracket with a new seed assignment
    ///
    /// First-round matches whose pairing is unchanged keep their results.
    /// Any match whose inputs change must not have a recorded winner; if one
    /// does, the whole reseed is rejected and the state is left untouched.
    pub fn reseed(&mut self, seeded: &[(Seed, EntrantId)]) -> BracketResult<()> {
        let bracket_size = bracket_size_for(seeded.len());
        if bracket_size != self.bracket_size {
            if self.has_results() {
                return Err(BracketError::Validation(format!(
                    "Bracket size would change from {} to {} after results were recorded",
                    self.bracket_size, bracket_size
                )));
            }
            *self = Self::from_seeds(seeded)?;
            return Ok(());
        }

        let mut next = self.clone();
        for fresh in generate_sized(seeded, bracket_size)? {
            match next.matches.get(&fresh.slot) {
                Some(existing) if existing.same_pairing(&fresh) => {}
                Some(existing) if existing.winner.is_some() => {
                    return Err(BracketError::Validation(format!(
                        "Match {} already has a result and cannot be re-paired",
                        fresh.slot
                    )));
                }
                _ => {
                    next.matches.insert(fresh.slot, fresh);
                }
            }
        }
        next.prune_stale_matches()?;
        next.fill_ready_matches();
        *self = next;
        Ok(())
    }

    /// Round-0 position a seed would take, with the match it lands in
    pub fn position_of_seed(&self, seed: Seed) -> BracketResult<(Slot, Side)> {
        let position = slot_for_seed(seed, self.bracket_size)?;
        let side = if position % 2 == 0 {
            Side::Upper
        } else {
            Side::Lower
        };
        Ok((Slot::new(0, position / 2), side))
    }

    /// Changes that turn `stored` into this state
    ///
    /// Deletes come first, deepest round first, followed by updates and
    /// inserts in slot order.
    pub fn diff(&self, division_id: DivisionId, stored: &MatchMap) -> Vec<MatchChange> {
        let mut changes: Vec<MatchChange> = stored
            .keys()
            .rev()
            .filter(|slot| !self.matches.contains_key(slot))
            .map(|slot| MatchChange::Delete {
                division_id,
                slot: *slot,
            })
            .collect();

        for (slot, m) in &self.matches {
            match stored.get(slot) {
                None => changes.push(MatchChange::Insert(MatchRecord::from_match(division_id, m))),
                Some(old) if old != m => {
                    changes.push(MatchChange::Update(MatchRecord::from_match(division_id, m)))
                }
                Some(_) => {}
            }
        }
        changes
    }

    /// Create every missing match whose two children are decided
    fn fill_ready_matches(&mut self) {
        for round in 1..self.rounds() {
            for index in 0..self.matches_in_round(round) {
                let slot = Slot::new(round, index);
                if self.matches.contains_key(&slot) {
                    continue;
                }
                let Some((upper, lower)) = slot.children() else {
                    continue;
                };
                let upper = self.matches.get(&upper).and_then(Match::resolved_winner);
                let lower = self.matches.get(&lower).and_then(Match::resolved_winner);
                if let (Some(upper), Some(lower)) = (upper, lower) {
                    log::debug!("Creating match {}: {} vs {}", slot, upper, lower);
                    self.matches
                        .insert(slot, Match::new(slot, Some(upper), Some(lower)));
                }
            }
        }
    }

    /// Drop matches whose inputs no longer follow from their children
    fn prune_stale_matches(&mut self) -> BracketResult<()> {
        for round in 1..self.rounds() {
            for index in 0..self.matches_in_round(round) {
                let slot = Slot::new(round, index);
                let Some(m) = self.matches.get(&slot) else {
                    continue;
                };
                let Some((upper, lower)) = slot.children() else {
                    continue;
                };
                let expected_upper = self.matches.get(&upper).and_then(Match::resolved_winner);
                let expected_lower = self.matches.get(&lower).and_then(Match::resolved_winner);
                if m.upper == expected_upper && m.lower == expected_lower {
                    continue;
                }
                if m.winner.is_some() {
                    return Err(BracketError::Validation(format!(
                        "Match {} already has a result and cannot be re-paired",
                        slot
                    )));
                }
                self.matches.remove(&slot);
            }
        }
        Ok(())
    }

    fn remove_ancestors(&mut self, slot: Slot) -> Vec<Slot> {
        let mut removed = Vec::new();
        let mut current = slot;
        while current.round < self.final_round() {
            current = current.parent();
            if self.matches.remove(&current).is_some() {
                removed.push(current);
            }
        }
        removed
    }
}
