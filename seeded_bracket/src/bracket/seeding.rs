//! Seed to bracket-position mapping.
//!
//! Positions are the `bracket_size` entry points of round 0; match `(0, i)`
//! hosts positions `2i` and `2i + 1`. Placement follows the standard seeded
//! layout: seeds 1 and 2 sit in opposite halves, the same holds recursively
//! inside every half, and the two positions of a first-round match always
//! hold seeds summing to `bracket_size + 1`. For 8 positions the order is
//! `1 8 4 5 2 7 3 6`.

use super::models::Seed;
use crate::errors::{BracketError, BracketResult};

/// Smallest power of two that fits `entrant_count` (at least 2)
pub fn bracket_size_for(entrant_count: usize) -> u32 {
    (entrant_count.max(2) as u32).next_power_of_two()
}

/// Number of rounds in a bracket of the given size
pub fn round_count(bracket_size: u32) -> u32 {
    bracket_size.trailing_zeros()
}

/// Check that `bracket_size` is a power of two and at least 2
pub fn validate_bracket_size(bracket_size: u32) -> BracketResult<()> {
    if bracket_size < 2 || !bracket_size.is_power_of_two() {
        return Err(BracketError::Configuration(format!(
            "Bracket size must be a power of two >= 2, got {}",
            bracket_size
        )));
    }
    Ok(())
}

/// Position of `seed` in round 0
///
/// # Errors
///
/// Returns `Configuration` for an invalid bracket size or a seed outside
/// `[1, bracket_size]`.
pub fn slot_for_seed(seed: Seed, bracket_size: u32) -> BracketResult<u32> {
    validate_bracket_size(bracket_size)?;
    if seed == 0 || seed > bracket_size {
        return Err(BracketError::Configuration(format!(
            "Seed {} is outside [1, {}]",
            seed, bracket_size
        )));
    }

    // Walk up the halvings: at each level a seed in the top half keeps the
    // upper position of its pair, otherwise it takes the lower one and its
    // partner's seed carries on.
    let mut seed = seed;
    let mut size = bracket_size;
    let mut bits = Vec::with_capacity(round_count(bracket_size) as usize);
    while size > 1 {
        if seed <= size / 2 {
            bits.push(0);
        } else {
            bits.push(1);
            seed = size + 1 - seed;
        }
        size /= 2;
    }

    Ok(bits.iter().rev().fold(0, |slot, bit| slot * 2 + bit))
}

/// Seed occupying `slot` in round 0
///
/// # Errors
///
/// Returns `Configuration` for an invalid bracket size or a slot outside
/// `[0, bracket_size)`.
pub fn seed_for_slot(slot: u32, bracket_size: u32) -> BracketResult<Seed> {
    validate_bracket_size(bracket_size)?;
    if slot >= bracket_size {
        return Err(BracketError::Configuration(format!(
            "Slot {} is outside [0, {})",
            slot, bracket_size
        )));
    }

    // Top-down: the bracket of size 2^k is built from the one of size
    // 2^(k-1) by pairing every seed s with 2^k + 1 - s.
    let levels = round_count(bracket_size);
    let mut seed = 1;
    let mut size = 1;
    for level in (0..levels).rev() {
        size *= 2;
        if (slot >> level) & 1 == 1 {
            seed = size + 1 - seed;
        }
    }

    Ok(seed)
}

/// Seeds in position order for a whole bracket
pub fn seed_order(bracket_size: u32) -> BracketResult<Vec<Seed>> {
    (0..bracket_size)
        .map(|slot| seed_for_slot(slot, bracket_size))
        .collect()
}
