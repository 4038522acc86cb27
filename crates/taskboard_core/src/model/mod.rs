//! Board domain model for cards, columns and effort observations.
//!
//! # Responsibility
//! - Define canonical records shared by ordering, burndown and persistence.
//! - Own value-level validation (display names, card colors, day keys).
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - A card is either placed (column + position) or unplaced (neither).

pub mod card;
pub mod effort;
pub mod view;
