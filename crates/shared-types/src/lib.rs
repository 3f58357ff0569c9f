//! # Shared Types Crate
//!
//! This crate contains the identity and device value types that travel inside
//! kex protocol messages.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate identity types are defined here.
//! - **Fixed Layout**: Identifiers are fixed-size byte arrays so that their
//!   binary encoding never depends on runtime content.
//! - **Hex at the Edges**: Identifiers are rendered and parsed as lowercase hex
//!   when they cross a text boundary (relay requests, configuration).

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
