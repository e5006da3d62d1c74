//! The lookahead window: stage tracks just ahead of the player and tear them
//! down once playback has moved past them.

mod lookahead;
mod source;
mod window;

pub use lookahead::{LookaheadScheduler, TopUp};
pub use source::TrackSource;
pub use window::SchedulerWindow;
