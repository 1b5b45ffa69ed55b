//! Input/output helpers.
//!
//! - versioned model/vocabulary/scaler artifact loading (`artifacts`)
//! - JSON-lines batch record reading (`records`)
//! - CSV result export (`export`)

pub mod artifacts;
pub mod export;
pub mod records;

pub use artifacts::*;
pub use export::*;
pub use records::*;
