//! `stocky-ledger` — the stock movement ledger vocabulary.
//!
//! A [`Movement`] is an immutable record of one stock change: it is written
//! exactly once and never edited or deleted. The arithmetic that turns a
//! requested adjustment into a `previous_stock -> new_stock` pair lives here
//! as a pure function so every write path shares the same rules.

pub mod movement;

pub use movement::{apply_movement, Movement, MovementDraft, MovementKind};
