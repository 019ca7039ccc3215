//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep forms and the UI bridge decoupled from storage details.

pub mod item_service;
pub mod location_service;
