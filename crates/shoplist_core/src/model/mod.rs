//! Domain model for the shopping list.
//!
//! # Responsibility
//! - Define the location and shopping item records used by every layer.
//! - Keep field validation next to the data it guards.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - An item's `visitation_order` equals its location's order at every
//!   commit boundary.

pub mod location;
pub mod shopping_item;
pub mod validation;
