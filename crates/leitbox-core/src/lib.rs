//! leitbox-core — Leitner scheduling and review engine.
//!
//! This crate defines the fundamental data model, the box-transition and
//! due-date logic, the per-user review session state machine, and the
//! two-phase bulk word assignment workflow that the rest of the leitbox
//! system builds on.

pub mod assignment;
pub mod counter;
pub mod error;
pub mod extractor;
pub mod model;
pub mod scheduler;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;
