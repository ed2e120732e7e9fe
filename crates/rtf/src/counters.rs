//! Counters for instrumentation and tests.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub tokens: u64,
    pub frames_pushed: u64,
    pub frames_discarded: u64,
    pub paragraph_splits: u64,
    /// Early closes of a frame whose child list grew past the limit.
    pub depth_splits: u64,
    pub commits: u64,
    pub groups_skipped: u64,
    pub zero_progress_recoveries: u64,
}
