//! # Seeded Bracket
//!
//! A single-elimination bracket engine for seeded divisions.
//!
//! The engine places N seeded entrants onto a power-of-two bracket with
//! byes, derives each round from the previous round's winners, keeps the
//! bracket consistent as results and seeds change, and renders the match
//! tree as a columnar layout for any renderer.
//!
//! ## Core Modules
//!
//! - [`bracket`]: Pure engine (seeding, generation, advancement, layout, state)
//! - [`division`]: Per-division locking and the storage contract
//! - [`config`]: Environment-driven configuration
//! - [`errors`]: Error types shared by all operations
//!
//! ## Example
//!
//! ```
//! use seeded_bracket::bracket::{advance, generate, Slot};
//!
//! // Five entrants in a bracket of eight: seeds 1, 2 and 3 get byes
//! let entrants: Vec<(u32, i64)> = (1..=5).map(|s| (s, 100 + s as i64)).collect();
//! let mut round = generate(&entrants).unwrap();
//! assert_eq!(round.iter().filter(|m| m.is_bye()).count(), 3);
//!
//! // Seed 4 beats seed 5
//! round[1].winner = Some(104);
//! let next = advance(&round).unwrap();
//! assert_eq!(next.matches().len(), 2);
//! assert_eq!(next.matches()[0].slot, Slot::new(1, 0));
//! ```

/// Pure bracket computations over in-memory structures.
pub mod bracket;

/// Bracket engine configuration.
pub mod config;

/// Locked, store-backed operations per division.
pub mod division;

/// Error types.
pub mod errors;

pub use bracket::{
    AdvanceOutcome, BracketLayout, BracketState, DivisionId, Entrant, EntrantId, Match, Seed,
    Slot,
};
pub use config::{BracketConfig, ConfigError};
pub use division::{BracketManager, BracketStore, BracketView, MemoryStore};
pub use errors::{BracketError, BracketResult};
