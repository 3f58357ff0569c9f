//! Reusable `Handler` building blocks.

mod ordered;

pub use ordered::OrderedHandler;
