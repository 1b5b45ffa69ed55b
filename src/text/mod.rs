//! Text handling: the tokenizer seam and the relevance scorer.
//!
//! - token tags + content filtering (`tokens`)
//! - frozen-vocabulary TF-IDF scoring (`scorer`)

pub mod scorer;
pub mod tokens;

pub use scorer::*;
pub use tokens::*;
