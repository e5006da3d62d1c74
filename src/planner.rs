//! Album-spread randomisation for large libraries: pick a random album that
//! has not been played recently, then a random track from it.

mod history;
mod spread;

pub use spread::AlbumSpreadPlanner;
#[cfg(test)]
use history::load_history;
#[cfg(test)]
use spread::history_size;

#[cfg(test)]
mod tests;
