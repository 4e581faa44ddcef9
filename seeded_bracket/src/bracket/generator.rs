//! First-round generation from seeded entrants.

use super::{
    models::{EntrantId, Match, Seed, Slot},
    seeding::{bracket_size_for, seed_for_slot, validate_bracket_size},
};
use crate::errors::{BracketError, BracketResult};
use std::collections::BTreeMap;

/// Build round 0 for the given `(seed, entrant)` pairs
///
/// Seeds must be exactly `1..=n`. The bracket size is the smallest power of
/// two that fits `n`; positions left without an entrant turn the opposing
/// entrant's match into a bye. Output is ordered by slot, so the input order
/// does not matter.
///
/// # Errors
///
/// Returns `Validation` for fewer than 2 entrants, duplicate seeds or
/// entrants, or seeds outside `[1, n]`.
pub fn generate(entrants: &[(Seed, EntrantId)]) -> BracketResult<Vec<Match>> {
    if entrants.len() < 2 {
        return Err(BracketError::Validation(format!(
            "A bracket needs at least 2 entrants, got {}",
            entrants.len()
        )));
    }

    let max_seed = entrants.len() as Seed;
    if let Some((seed, entrant)) = entrants
        .iter()
        .find(|(seed, _)| *seed == 0 || *seed > max_seed)
    {
        return Err(BracketError::Validation(format!(
            "Seed {} of entrant {} is outside [1, {}]",
            seed, entrant, max_seed
        )));
    }

    generate_sized(entrants, bracket_size_for(entrants.len()))
}

/// Build round 0 for a bracket of an explicit size
///
/// Used once entrants have been admitted into bye positions, where seeds are
/// no longer contiguous. Seeds must lie in `[1, bracket_size]` and every
/// first-round match must have at least one entrant.
pub fn generate_sized(
    entrants: &[(Seed, EntrantId)],
    bracket_size: u32,
) -> BracketResult<Vec<Match>> {
    validate_bracket_size(bracket_size)?;
    if entrants.len() < 2 {
        return Err(BracketError::Validation(format!(
            "A bracket needs at least 2 entrants, got {}",
            entrants.len()
        )));
    }
    if entrants.len() > bracket_size as usize {
        return Err(BracketError::Validation(format!(
            "{} entrants do not fit a bracket of {}",
            entrants.len(),
            bracket_size
        )));
    }

    let mut by_seed: BTreeMap<Seed, EntrantId> = BTreeMap::new();
    for &(seed, entrant) in entrants {
        if seed == 0 || seed > bracket_size {
            return Err(BracketError::Validation(format!(
                "Seed {} of entrant {} is outside [1, {}]",
                seed, entrant, bracket_size
            )));
        }
        if let Some(existing) = by_seed.insert(seed, entrant) {
            return Err(BracketError::Validation(format!(
                "Seed {} is assigned to both entrant {} and entrant {}",
                seed, existing, entrant
            )));
        }
    }
    if let Some(entrant) = duplicate_entrant(entrants) {
        return Err(BracketError::Validation(format!(
            "Entrant {} holds more than one seed",
            entrant
        )));
    }

    let mut matches = Vec::with_capacity(bracket_size as usize / 2);
    for index in 0..bracket_size / 2 {
        let upper = by_seed.get(&seed_for_slot(2 * index, bracket_size)?).copied();
        let lower = by_seed
            .get(&seed_for_slot(2 * index + 1, bracket_size)?)
            .copied();
        if upper.is_none() && lower.is_none() {
            return Err(BracketError::Validation(format!(
                "First-round match {} has no entrant; fill seeds {} or {}",
                index,
                seed_for_slot(2 * index, bracket_size)?,
                seed_for_slot(2 * index + 1, bracket_size)?
            )));
        }
        matches.push(Match::new(Slot::new(0, index), upper, lower));
    }

    log::debug!(
        "Generated {} first-round matches ({} byes) for {} entrants",
        matches.len(),
        matches.iter().filter(|m| m.is_bye()).count(),
        entrants.len()
    );

    Ok(matches)
}

fn duplicate_entrant(entrants: &[(Seed, EntrantId)]) -> Option<EntrantId> {
    let mut ids: Vec<EntrantId> = entrants.iter().map(|(_, id)| *id).collect();
    ids.sort_unstable();
    ids.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(n: u32) -> Vec<(Seed, EntrantId)> {
        (1..=n).map(|seed| (seed, 100 + seed as EntrantId)).collect()
    }

    #[test]
    fn test_full_bracket_has_no_byes() {
        let matches = generate(&seeded(8)).unwrap();
        assert_eq!(matches.len(), 4);
        assert!(matches.iter().all(|m| !m.is_bye()));
        assert_eq!(matches[0].upper, Some(101));
        assert_eq!(matches[0].lower, Some(108));
    }

    #[test]
    fn test_five_entrants_three_byes() {
        let matches = generate(&seeded(5)).unwrap();
        assert_eq!(matches.len(), 4);
        let byes: Vec<_> = matches.iter().filter(|m| m.is_bye()).collect();
        assert_eq!(byes.len(), 3);
        assert!(byes.iter().any(|m| m.resolved_winner() == Some(101)));
        // 4 vs 5 is the only contested match
        assert_eq!(matches[1].upper, Some(104));
        assert_eq!(matches[1].lower, Some(105));
    }

    #[test]
    fn test_byes_have_no_explicit_winner() {
        let matches = generate(&seeded(6)).unwrap();
        for m in matches.iter().filter(|m| m.is_bye()) {
            assert_eq!(m.winner, None);
            assert!(m.is_resolved());
        }
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut reversed = seeded(7);
        reversed.reverse();
        assert_eq!(generate(&seeded(7)).unwrap(), generate(&reversed).unwrap());
    }

    #[test]
    fn test_two_entrants_make_a_final() {
        let matches = generate(&seeded(2)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].slot, Slot::new(0, 0));
    }

    #[test]
    fn test_rejects_too_few_entrants() {
        assert!(matches!(
            generate(&seeded(1)),
            Err(BracketError::Validation(_))
        ));
        assert!(matches!(generate(&[]), Err(BracketError::Validation(_))));
    }

    #[test]
    fn test_rejects_duplicate_seed() {
        let entrants = vec![(1, 10), (2, 11), (2, 12)];
        assert!(matches!(
            generate(&entrants),
            Err(BracketError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_seed_out_of_range() {
        let entrants = vec![(1, 10), (2, 11), (4, 12)];
        assert!(matches!(
            generate(&entrants),
            Err(BracketError::Validation(_))
        ));
        let zero = vec![(0, 10), (1, 11)];
        assert!(matches!(generate(&zero), Err(BracketError::Validation(_))));
    }

    #[test]
    fn test_rejects_entrant_seeded_twice() {
        let entrants = vec![(1, 10), (2, 10), (3, 12)];
        assert!(matches!(
            generate(&entrants),
            Err(BracketError::Validation(_))
        ));
    }

    #[test]
    fn test_sized_accepts_gaps() {
        // Seed 8 was admitted against seed 1 instead of seed 6
        let entrants = vec![(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (8, 8)];
        let matches = generate_sized(&entrants, 8).unwrap();
        assert_eq!(matches[0].lower, Some(8));
        assert!(matches[3].is_bye());
    }

    #[test]
    fn test_sized_rejects_empty_match() {
        // Seeds 4 and 5 share a match and are both missing
        let entrants = vec![(1, 1), (2, 2), (3, 3), (6, 6), (7, 7), (8, 8)];
        assert!(matches!(
            generate_sized(&entrants, 8),
            Err(BracketError::Validation(_))
        ));
    }
}
