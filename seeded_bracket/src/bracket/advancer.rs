//! Deriving the next round from a fully resolved round.

use super::models::{EntrantId, Match, Slot};
use crate::errors::{BracketError, BracketResult};

/// Result of advancing a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Pairings of the next round, ordered by slot
    Next(Vec<Match>),
    /// The round was the final
    Complete { champion: EntrantId },
}

impl AdvanceOutcome {
    /// Next-round matches (empty once the tournament is complete)
    pub fn matches(&self) -> &[Match] {
        match self {
            AdvanceOutcome::Next(matches) => matches,
            AdvanceOutcome::Complete { .. } => &[],
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, AdvanceOutcome::Complete { .. })
    }

    pub fn champion(&self) -> Option<EntrantId> {
        match self {
            AdvanceOutcome::Complete { champion } => Some(*champion),
            AdvanceOutcome::Next(_) => None,
        }
    }
}

/// Pair the winners of a resolved round into the next round
///
/// Match `2i`'s winner becomes the upper input and match `2i + 1`'s winner
/// the lower input of next-round match `i`. A single-match round is the
/// final and completes the tournament. The function is pure: calling it
/// twice with the same round yields identical pairings.
///
/// # Errors
///
/// Returns `IncompleteRound` if any match lacks a winner (no partial
/// output), and `Configuration` if the input is not one whole round.
pub fn advance(round_matches: &[Match]) -> BracketResult<AdvanceOutcome> {
    let Some(first) = round_matches.first() else {
        return Err(BracketError::Configuration(
            "Cannot advance an empty round".to_string(),
        ));
    };
    let round = first.slot.round;

    let mut ordered: Vec<&Match> = round_matches.iter().collect();
    ordered.sort_by_key(|m| m.slot);

    for (expected, m) in ordered.iter().enumerate() {
        if m.slot != Slot::new(round, expected as u32) {
            return Err(BracketError::Configuration(format!(
                "Round {} input is not contiguous: expected slot {}, found {}",
                round,
                Slot::new(round, expected as u32),
                m.slot
            )));
        }
    }
    if !ordered.len().is_power_of_two() {
        return Err(BracketError::Configuration(format!(
            "Round {} has {} matches, which is not a power of two",
            round,
            ordered.len()
        )));
    }

    let unresolved: Vec<u32> = ordered
        .iter()
        .filter(|m| !m.is_resolved())
        .map(|m| m.slot.index)
        .collect();
    if !unresolved.is_empty() {
        return Err(BracketError::IncompleteRound { round, unresolved });
    }

    let winners: Vec<EntrantId> = ordered
        .iter()
        .filter_map(|m| m.resolved_winner())
        .collect();

    if let [champion] = winners.as_slice() {
        return Ok(AdvanceOutcome::Complete {
            champion: *champion,
        });
    }

    let next = winners
        .chunks(2)
        .enumerate()
        .map(|(index, pair)| {
            Match::new(
                Slot::new(round + 1, index as u32),
                Some(pair[0]),
                Some(pair[1]),
            )
        })
        .collect();

    Ok(AdvanceOutcome::Next(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decided(round: u32, index: u32, upper: EntrantId, lower: EntrantId, winner: EntrantId) -> Match {
        let mut m = Match::new(Slot::new(round, index), Some(upper), Some(lower));
        m.winner = Some(winner);
        m
    }

    #[test]
    fn test_pairs_even_and_odd() {
        let round = vec![
            decided(0, 0, 1, 8, 1),
            decided(0, 1, 4, 5, 5),
            decided(0, 2, 2, 7, 7),
            decided(0, 3, 3, 6, 3),
        ];
        let next = advance(&round).unwrap();
        let matches = next.matches();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].slot, Slot::new(1, 0));
        assert_eq!((matches[0].upper, matches[0].lower), (Some(1), Some(5)));
        assert_eq!((matches[1].upper, matches[1].lower), (Some(7), Some(3)));
        assert!(matches.iter().all(|m| m.winner.is_none()));
    }

    #[test]
    fn test_byes_advance_implicitly() {
        let round = vec![
            Match::new(Slot::new(0, 0), Some(1), None),
            decided(0, 1, 4, 5, 4),
        ];
        let next = advance(&round).unwrap();
        assert_eq!(next.matches()[0].upper, Some(1));
        assert_eq!(next.matches()[0].lower, Some(4));
    }

    #[test]
    fn test_input_order_is_irrelevant() {
        let round = vec![decided(1, 1, 2, 3, 3), decided(1, 0, 1, 4, 1)];
        let next = advance(&round).unwrap();
        assert_eq!(next.matches()[0].slot, Slot::new(2, 0));
        assert_eq!(next.matches()[0].upper, Some(1));
        assert_eq!(next.matches()[0].lower, Some(3));
    }

    #[test]
    fn test_final_completes() {
        let outcome = advance(&[decided(2, 0, 1, 3, 3)]).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.champion(), Some(3));
        assert!(outcome.matches().is_empty());
    }

    #[test]
    fn test_incomplete_round_is_rejected() {
        let round = vec![
            decided(0, 0, 1, 4, 1),
            Match::new(Slot::new(0, 1), Some(2), Some(3)),
        ];
        match advance(&round) {
            Err(BracketError::IncompleteRound { round, unresolved }) => {
                assert_eq!(round, 0);
                assert_eq!(unresolved, vec![1]);
            }
            other => panic!("expected IncompleteRound, got {:?}", other),
        }
    }

    #[test]
    fn test_idempotent() {
        let round = vec![decided(0, 0, 1, 4, 4), decided(0, 1, 2, 3, 2)];
        assert_eq!(advance(&round).unwrap(), advance(&round).unwrap());
    }

    #[test]
    fn test_rejects_partial_round_input() {
        assert!(matches!(advance(&[]), Err(BracketError::Configuration(_))));
        let gap = vec![decided(0, 0, 1, 8, 1), decided(0, 2, 2, 7, 2)];
        assert!(matches!(advance(&gap), Err(BracketError::Configuration(_))));
        let odd = vec![
            decided(0, 0, 1, 8, 1),
            decided(0, 1, 4, 5, 4),
            decided(0, 2, 2, 7, 2),
        ];
        assert!(matches!(advance(&odd), Err(BracketError::Configuration(_))));
    }

    #[test]
    fn test_rejects_even_round_of_wrong_width() {
        // Six matches would pair into a round of three
        let six: Vec<Match> = (0..6)
            .map(|index| {
                let upper = 2 * index as EntrantId + 1;
                decided(0, index, upper, upper + 1, upper)
            })
            .collect();
        assert!(matches!(advance(&six), Err(BracketError::Configuration(_))));
    }
}
