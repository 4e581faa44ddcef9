//! Division module: locked, store-backed bracket operations.
//!
//! This module implements:
//! - BracketManager: every operation an operator performs on a division
//! - DivisionLocks: one exclusive writer per division with bounded waits
//! - BracketStore: the narrow read/write contract to external storage
//! - MemoryStore: an in-process store
//!
//! ## Example
//!
//! ```
//! use seeded_bracket::{
//!     bracket::{Entrant, Slot},
//!     config::BracketConfig,
//!     division::{BracketManager, MemoryStore},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     for (id, name) in [(1, "Alpha"), (2, "Bravo"), (3, "Charlie")] {
//!         store.register(Entrant::new(id, 7, name).with_seed(id as u32)).await;
//!     }
//!
//!     let manager = BracketManager::new(store, BracketConfig::default());
//!     manager.generate_bracket(7).await?;
//!
//!     // Seed 1 has a bye; 2 plays 3
//!     manager.record_winner(7, Slot::new(0, 1), 2).await?;
//!
//!     let view = manager.view(7).await?;
//!     assert_eq!(view.layout.columns.len(), 2);
//!     Ok(())
//! }
//! ```

pub mod locks;
pub mod manager;
pub mod store;

pub use locks::{DivisionGuard, DivisionLocks};
pub use manager::{BracketManager, BracketView};
pub use store::{BracketCommit, BracketStore, MemoryStore};
