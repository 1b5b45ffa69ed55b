//! Feature engineering over ordered column frames.
//!
//! - `frame`: the append-only, order-preserving column table
//! - `engineer`: deterministic sub-transforms applied identically at train
//!   and inference time
//! - `explore`: training-time-only utilities (clustering, polynomial
//!   expansion, selection, projection) that never touch the inference path

pub mod engineer;
pub mod explore;
pub mod frame;

pub use engineer::*;
pub use explore::*;
pub use frame::*;
