//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the procurement variant discriminator (`BidKind`) and its frozen
//!   base-column layouts
//! - the unit of work (`BidRecord`) and its validation
//! - inference outputs (`PredictionTriple`, `OutcomeRecord`, etc.)

pub mod types;

pub use types::*;
