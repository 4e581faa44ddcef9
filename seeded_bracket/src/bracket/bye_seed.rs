//! Default seed offered when an operator places an unseeded entrant.

use super::models::{Entrant, MatchMap, Seed};
use std::collections::{BTreeSet, HashMap};

/// Seed to pre-fill when manually assigning an entrant to an open slot
///
/// Takes the seeds held by the division's registrations, removes the seeds
/// of entrants already sitting in the deepest round that has matches (round
/// 0 once the bracket exists), and returns the highest remaining seed. When
/// every seed is placed it falls back to the highest seed overall; with no
/// seeded registrations the default is seed 1.
pub fn lowest_available_bye_seed(registrations: &[Entrant], matches: &MatchMap) -> Seed {
    let mut seeds: BTreeSet<Seed> = registrations.iter().filter_map(|e| e.seed).collect();
    let Some(&max_seed) = seeds.last() else {
        return 1;
    };

    let seed_of: HashMap<_, _> = registrations
        .iter()
        .filter_map(|e| e.seed.map(|seed| (e.id, seed)))
        .collect();

    if let Some(deepest) = matches.keys().map(|slot| slot.round).min() {
        let placed = matches
            .values()
            .filter(|m| m.slot.round == deepest)
            .flat_map(|m| [m.upper, m.lower])
            .flatten();
        for entrant in placed {
            if let Some(seed) = seed_of.get(&entrant) {
                seeds.remove(seed);
            }
        }
    }

    seeds.last().copied().unwrap_or(max_seed)
}
