//! Flutter bridge crate for the shopping list core.

pub mod api;
