//! Cover art selection.
//!
//! For every staged track we gather candidate images (the track's folder,
//! the album root of multi-disc releases and the embedded picture), sort them
//! into two buckets and pick one winner.

mod candidate;
mod collect;
mod select;
mod tokens;

pub use candidate::CoverCandidate;
#[cfg(test)]
use candidate::{Bucket, CandidateSource, Scope};
pub use collect::{CoverQuery, collect_candidates};
pub use select::{CoverChoice, CoverSelector};
pub use tokens::album_tokens;
