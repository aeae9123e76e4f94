//! Foundational low-level utilities shared across Rho crates.
//!
//! Provides character-budget text truncation used by the rendering and
//! error-surfacing layers.

pub mod text_utils;

pub use text_utils::truncate_with_ellipsis;
