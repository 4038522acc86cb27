//! Core use-case services.
//!
//! # Responsibility
//! - Validate input and map repository failures to semantic errors.
//! - Return post-mutation state so callers can build change events.
//!
//! # Invariants
//! - Services never hold a notifier or a connection directly.
//! - Out-of-range positions are clamped, never rejected.

pub mod board_service;
pub mod card_service;
pub mod effort_service;
