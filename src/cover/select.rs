use std::cmp::{Ordering, Reverse};
use std::fs;

use tracing::warn;

use crate::config::CoverSettings;

use super::candidate::{Bucket, CoverCandidate};

/// Outcome of cover selection for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverChoice {
    pub winner: Option<CoverCandidate>,
    /// Every other candidate, best bucket first.
    pub others: Vec<CoverCandidate>,
}

impl CoverChoice {
    /// Ranked listing, one line per candidate, winner first and marked `[*]`.
    pub fn listing(&self) -> Vec<String> {
        let Some(winner) = &self.winner else {
            return vec!["[ ] no images found".to_string()];
        };
        std::iter::once(format!("[*] {}", winner.describe()))
            .chain(self.others.iter().map(|c| format!("[ ] {}", c.describe())))
            .collect()
    }

    /// Delete an extracted embedded picture that lost. Only the winning
    /// embedded file may survive selection.
    pub fn discard_losing_embedded(&self) {
        for candidate in self.others.iter().filter(|c| c.is_embedded()) {
            if let Err(e) = fs::remove_file(&candidate.path) {
                warn!("cannot remove {}: {e}", candidate.path.display());
            }
        }
    }
}

pub struct CoverSelector<'a> {
    settings: &'a CoverSettings,
}

type TieKey<'c> = (u8, usize, Reverse<u64>, Reverse<u64>, &'c str, &'c std::path::Path);

fn tie_key(c: &CoverCandidate) -> TieKey<'_> {
    (
        c.scope.rank(),
        c.front_rank.unwrap_or(usize::MAX),
        Reverse(c.area),
        Reverse(c.size_bytes),
        c.name.as_str(),
        c.path.as_path(),
    )
}

impl<'a> CoverSelector<'a> {
    pub fn new(settings: &'a CoverSettings) -> Self {
        Self { settings }
    }

    /// Pick the winner. Bucket 1 is preferred as a whole; if all of it is
    /// tiny and bucket 2 has something bigger, the best non-tiny bucket 2
    /// image wins instead. Deterministic for a given candidate set.
    pub fn select(&self, candidates: Vec<CoverCandidate>) -> CoverChoice {
        let (preferred, fallback): (Vec<&CoverCandidate>, Vec<&CoverCandidate>) = candidates
            .iter()
            .partition(|c| c.bucket == Bucket::Preferred);

        let tiny = self.settings.tiny_area;
        let all_preferred_tiny = preferred.iter().all(|c| c.area < tiny);
        let winner = if !preferred.is_empty() && all_preferred_tiny {
            let big: Vec<&CoverCandidate> =
                fallback.iter().copied().filter(|c| c.area >= tiny).collect();
            self.best_of(&big).or_else(|| self.best_of(&preferred))
        } else if !preferred.is_empty() {
            self.best_of(&preferred)
        } else {
            self.best_of(&fallback)
        };
        let winner_path = winner.map(|w| w.path.clone());

        let mut others: Vec<CoverCandidate> = Vec::new();
        let mut chosen = None;
        for candidate in candidates {
            if Some(&candidate.path) == winner_path.as_ref() && chosen.is_none() {
                chosen = Some(candidate);
            } else {
                others.push(candidate);
            }
        }
        others.sort_by(|a, b| a.bucket.cmp(&b.bucket).then_with(|| tie_key(a).cmp(&tie_key(b))));

        CoverChoice {
            winner: chosen,
            others,
        }
    }

    /// Areas within the override threshold of each other are settled by
    /// tie-breaks rather than raw size.
    pub(super) fn comparable(&self, a: u64, b: u64) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        hi == 0 || u128::from(lo) * 100 >= u128::from(hi) * u128::from(self.settings.area_threshold_pct)
    }

    fn beats(&self, challenger: &CoverCandidate, best: &CoverCandidate) -> bool {
        if self.comparable(challenger.area, best.area) {
            tie_key(challenger) < tie_key(best)
        } else {
            challenger.area > best.area
        }
    }

    fn best_of<'c>(&self, pool: &[&'c CoverCandidate]) -> Option<&'c CoverCandidate> {
        let mut ordered = pool.to_vec();
        ordered.sort_by(|a, b| compare(a, b));

        let mut iter = ordered.into_iter();
        let first = iter.next()?;
        Some(iter.fold(first, |best, c| if self.beats(c, best) { c } else { best }))
    }
}

fn compare(a: &CoverCandidate, b: &CoverCandidate) -> Ordering {
    tie_key(a).cmp(&tie_key(b))
}
