//! Settings for staging, cover selection, album spread and the player.
//!
//! Everything has a default; a config file and `STAGEPLAY__*` variables
//! only override what they name.

mod load;
mod schema;

pub use load::default_history_cache_path;
pub use schema::*;

#[cfg(test)]
mod tests;
