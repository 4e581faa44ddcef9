//! Pure single-elimination bracket engine.
//!
//! This module implements:
//! - Seed to position mapping with the standard balanced placement
//! - First-round generation with byes
//! - Round advancement and completion detection
//! - The default seed offered for manual slot assignment
//! - A columnar layout grid for renderers
//! - A slot-indexed arena that applies results and diffs against storage
//!
//! Nothing here performs I/O; see [`crate::division`] for the locked,
//! store-backed operations.
//!
//! ## Example
//!
//! ```
//! use seeded_bracket::bracket::{BracketState, Slot};
//!
//! // Six entrants: seeds 1 and 2 get byes
//! let seeded: Vec<(u32, i64)> = (1..=6).map(|s| (s, s as i64)).collect();
//! let mut state = BracketState::from_seeds(&seeded).unwrap();
//! assert_eq!(state.bracket_size(), 8);
//!
//! state.record_winner(Slot::new(0, 1), 4).unwrap();
//! assert!(state.get(Slot::new(1, 0)).is_some());
//! ```

pub mod advancer;
pub mod bye_seed;
pub mod generator;
pub mod layout;
pub mod models;
pub mod seeding;
pub mod state;

pub use advancer::{AdvanceOutcome, advance};
pub use bye_seed::lowest_available_bye_seed;
pub use generator::{generate, generate_sized};
pub use layout::{
    BracketLayout, CellTag, LayoutCell, LayoutColumn, layout, unassigned_entrants,
};
pub use models::{
    DivisionId, Entrant, EntrantId, Match, MatchChange, MatchMap, MatchRecord, Seed, Side, Slot,
};
pub use seeding::{bracket_size_for, round_count, seed_for_slot, seed_order, slot_for_seed};
pub use state::BracketState;
