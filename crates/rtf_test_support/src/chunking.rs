//! Chunk plans for streaming parity tests.

use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChunkPlan {
    Fixed { size: usize },
    /// Sizes are used in order; the rest of the input is one final chunk.
    Sizes { sizes: Vec<usize> },
    /// Split points, normalized to sorted, unique and inside `(0, len)`.
    Boundaries { indices: Vec<usize> },
}

impl fmt::Display for ChunkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkPlan::Fixed { size } => write!(f, "fixed size={size}"),
            ChunkPlan::Sizes { sizes } => {
                write!(f, "sizes count={} sizes={sizes:?}", sizes.len())
            }
            ChunkPlan::Boundaries { indices } => {
                write!(f, "boundaries count={} indices={indices:?}", indices.len())
            }
        }
    }
}

impl ChunkPlan {
    pub fn fixed(size: usize) -> Self {
        Self::Fixed { size }
    }

    pub fn sizes(sizes: impl Into<Vec<usize>>) -> Self {
        Self::Sizes {
            sizes: sizes.into(),
        }
    }

    pub fn boundaries(indices: impl Into<Vec<usize>>) -> Self {
        Self::Boundaries {
            indices: indices.into(),
        }
    }

    pub fn for_each_chunk(&self, bytes: &[u8], mut f: impl FnMut(&[u8])) {
        match self {
            ChunkPlan::Fixed { size } => {
                assert!(*size > 0, "chunk size must be > 0");
                for chunk in bytes.chunks(*size) {
                    f(chunk);
                }
            }
            ChunkPlan::Sizes { sizes } => {
                let mut offset = 0usize;
                for size in sizes {
                    assert!(*size > 0, "chunk size must be > 0");
                    if offset >= bytes.len() {
                        break;
                    }
                    let end = (offset + size).min(bytes.len());
                    f(&bytes[offset..end]);
                    offset = end;
                }
                if offset < bytes.len() {
                    f(&bytes[offset..]);
                }
            }
            ChunkPlan::Boundaries { indices } => {
                let mut points = indices.clone();
                points.sort_unstable();
                points.dedup();
                points.retain(|&idx| idx > 0 && idx < bytes.len());
                let mut last = 0usize;
                for idx in points {
                    f(&bytes[last..idx]);
                    last = idx;
                }
                if last < bytes.len() {
                    f(&bytes[last..]);
                }
            }
        }
    }
}

pub fn default_chunk_plans() -> &'static [ChunkPlan] {
    static PLANS: std::sync::OnceLock<Vec<ChunkPlan>> = std::sync::OnceLock::new();
    PLANS.get_or_init(|| {
        let mut plans = vec![ChunkPlan::fixed(64)];
        for size in [1, 2, 3, 4, 7] {
            plans.push(ChunkPlan::fixed(size));
        }
        plans.push(ChunkPlan::sizes(vec![1, 1, 2, 1, 4, 8, 16, 3, 7]));
        plans.push(ChunkPlan::sizes(vec![2, 3, 1, 5, 1, 1, 9, 2]));
        plans.push(ChunkPlan::boundaries(vec![1, 2, 4, 5, 6, 7]));
        plans
    })
}

pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    pub fn gen_range_usize(&mut self, start: usize, end: usize) -> usize {
        assert!(start < end, "invalid range: {start}..{end}");
        let span = (end - start) as u64;
        (self.next_u64() % span) as usize + start
    }

    pub fn gen_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "invalid length: {len}");
        self.gen_range_usize(0, len)
    }
}

/// Seeded split points for an input of `len` bytes, with a printable
/// summary for failure messages.
pub fn random_chunk_plan(len: usize, seed: u64) -> (ChunkPlan, String) {
    let mut rng = LcgRng::new(seed);
    if len <= 1 {
        let plan = ChunkPlan::fixed(1);
        return (plan, format!("fixed size=1 len={len} seed=0x{seed:016x}"));
    }
    let count = rng.gen_range_usize(1, len.min(64));
    let mut indices: Vec<usize> = (0..count).map(|_| rng.gen_range_usize(1, len)).collect();
    indices.sort_unstable();
    indices.dedup();
    let summary = format!(
        "boundaries count={} len={len} seed=0x{seed:016x} boundaries={indices:?}",
        indices.len()
    );
    (ChunkPlan::boundaries(indices), summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(plan: &ChunkPlan, input: &[u8]) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        plan.for_each_chunk(input, |chunk| out.push(chunk.to_vec()));
        out
    }

    #[test]
    fn every_plan_covers_the_input() {
        let input = b"{\\rtf1 abc}";
        for plan in default_chunk_plans() {
            let joined: Vec<u8> = collect(plan, input).concat();
            assert_eq!(joined, input, "{plan}");
        }
    }

    #[test]
    fn boundaries_are_normalized() {
        let plan = ChunkPlan::boundaries(vec![5, 0, 2, 2, 99]);
        assert_eq!(
            collect(&plan, b"abcdefg"),
            vec![b"ab".to_vec(), b"cde".to_vec(), b"fg".to_vec()]
        );
    }

    #[test]
    fn random_plans_are_deterministic() {
        let (a, summary_a) = random_chunk_plan(100, 7);
        let (b, summary_b) = random_chunk_plan(100, 7);
        assert_eq!(a, b);
        assert_eq!(summary_a, summary_b);
    }
}
