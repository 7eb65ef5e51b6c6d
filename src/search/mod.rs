//! Executable search submodule.
//!
//! - `PathCache`: session memo of resolved paths and availability
//! - `SearchEnv`: PATH/home/variable snapshot with placeholder expansion
//! - `PathSearcher`: the tiered, early-terminating search itself

mod cache;
mod env;
mod tiers;
mod version;

pub use cache::{CachedPath, PathCache};
pub use env::SearchEnv;
pub use tiers::PathSearcher;
