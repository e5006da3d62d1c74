/// Counters describing which player slots exist and which are gone.
///
/// Slots `0..appended` have been handed to the player, slots `0..cleaned`
/// have been torn down. `cleaned` never passes the observed position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerWindow {
    appended: usize,
    cleaned: usize,
    position: Option<usize>,
}

impl SchedulerWindow {
    /// Highest slot handed to the player.
    #[cfg(test)]
    pub fn highest_appended(&self) -> Option<usize> {
        self.appended.checked_sub(1)
    }

    /// Highest slot already torn down.
    #[cfg(test)]
    pub fn last_cleaned(&self) -> Option<usize> {
        self.cleaned.checked_sub(1)
    }

    /// Last position the player reported.
    #[cfg(test)]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Slot the next staged track will occupy.
    pub fn next_slot(&self) -> usize {
        self.appended
    }

    /// Number of slots that must exist for `lookahead` tracks to sit ahead of
    /// the current one. Before the first report only `lookahead` slots are
    /// wanted, so playback can start after a single track is staged.
    pub fn target(&self, lookahead: usize) -> usize {
        self.position.map_or(0, |p| p + 1) + lookahead
    }

    pub fn is_full(&self, lookahead: usize) -> bool {
        self.appended >= self.target(lookahead)
    }

    pub(super) fn record_append(&mut self) {
        self.appended += 1;
    }

    /// Move to `position` and return the slots that are now behind it and
    /// still need tearing down.
    pub(super) fn advance(&mut self, position: usize) -> std::ops::Range<usize> {
        self.position = Some(position);
        let start = self.cleaned;
        let end = position.min(self.appended).max(start);
        self.cleaned = end;
        start..end
    }
}
