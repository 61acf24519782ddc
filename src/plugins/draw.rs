//! Draw engine: turns (variant rules, line count) into batches of sorted,
//! duplicate-free number sets.
//!
//! The engine owns its randomness source. Production callers use an
//! OS-seeded generator; tests inject a seeded `ChaCha8Rng` and get
//! bit-for-bit reproducible batches. Nothing here touches the filesystem.

use crate::core::config::LinePolicy;
use crate::core::error::LottoError;
use crate::core::output::{self, NumberFormat};
use crate::core::time;
use crate::plugins::rules::RuleSpec;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One generated line. Both sets are ascending and duplicate free; `secondary`
/// is empty for variants without a second group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawLine {
    pub primary: Vec<u32>,
    pub secondary: Vec<u32>,
}

impl DrawLine {
    /// `"01, 02, 03"` or `"01, 02, 03 - 04, 05"`.
    pub fn render(&self, fmt: &dyn NumberFormat) -> String {
        let main = output::render_set(&self.primary, fmt);
        if self.secondary.is_empty() {
            main
        } else {
            format!("{} - {}", main, output::render_set(&self.secondary, fmt))
        }
    }
}

/// A generated or loaded collection of lines for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub variant: String,
    pub line_count: u32,
    pub lines: Vec<DrawLine>,
    pub created_at: DateTime<Utc>,
    pub persisted: bool,
}

impl Batch {
    pub fn render_lines(&self, fmt: &dyn NumberFormat) -> Vec<String> {
        self.lines.iter().map(|line| line.render(fmt)).collect()
    }
}

/// Uniformly draw `pick` distinct values from `[start, end)`, sorted ascending.
///
/// Sparse partial Fisher-Yates: only displaced slots are kept in a map, so
/// memory grows with `pick` rather than with the pool size. After `i` swaps the
/// prefix is a uniform random `i`-permutation of the pool, so every
/// `pick`-subset is equally likely. Returns `None` when the range holds fewer
/// than `pick` values.
pub fn sample_sorted<R: Rng + ?Sized>(
    rng: &mut R,
    start: u32,
    end: u32,
    pick: u32,
) -> Option<Vec<u32>> {
    let span = end.checked_sub(start)?;
    if pick > span {
        return None;
    }
    let mut displaced: FxHashMap<u32, u32> = FxHashMap::default();
    displaced.reserve(pick as usize);
    let mut out = Vec::with_capacity(pick as usize);
    for i in 0..pick {
        let j = rng.random_range(i..span);
        let at_j = displaced.get(&j).copied().unwrap_or(j);
        let at_i = displaced.get(&i).copied().unwrap_or(i);
        displaced.insert(j, at_i);
        out.push(start + at_j);
    }
    out.sort_unstable();
    Some(out)
}

/// A `ChaCha8Rng` on its own stream. Parallel draws sharing a seed must each
/// take a distinct `stream` so their outputs are uncorrelated.
pub fn independent_stream(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

pub struct DrawEngine<R: Rng> {
    policy: LinePolicy,
    range_start: u32,
    rng: R,
}

impl DrawEngine<StdRng> {
    pub fn from_os_rng(policy: LinePolicy, range_start: u32) -> Self {
        Self::new(policy, range_start, StdRng::from_os_rng())
    }
}

impl DrawEngine<ChaCha8Rng> {
    pub fn seeded(policy: LinePolicy, range_start: u32, seed: u64) -> Self {
        Self::new(policy, range_start, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> DrawEngine<R> {
    pub fn new(policy: LinePolicy, range_start: u32, rng: R) -> Self {
        Self {
            policy,
            range_start,
            rng,
        }
    }

    pub fn policy(&self) -> &LinePolicy {
        &self.policy
    }

    pub fn range_start(&self) -> u32 {
        self.range_start
    }

    /// Generate `line_count` independent lines for `variant`.
    ///
    /// The returned batch is never persisted; saving it is the caller's decision.
    pub fn generate(
        &mut self,
        variant: &str,
        spec: &RuleSpec,
        line_count: u32,
    ) -> Result<Batch, LottoError> {
        self.policy.check(line_count)?;
        spec.validate(variant, self.range_start)?;

        let mut lines = Vec::with_capacity(line_count as usize);
        for _ in 0..line_count {
            lines.push(self.draw_line(variant, spec)?);
        }
        log::debug!("generated {} lines for {}", line_count, variant);

        Ok(Batch {
            variant: variant.to_string(),
            line_count,
            lines,
            created_at: time::now_secs(),
            persisted: false,
        })
    }

    fn draw_line(&mut self, variant: &str, spec: &RuleSpec) -> Result<DrawLine, LottoError> {
        let too_small = || LottoError::InvalidRule {
            variant: variant.to_string(),
            reason: "pool smaller than pick count".to_string(),
        };
        let primary = sample_sorted(
            &mut self.rng,
            self.range_start,
            spec.primary_pool,
            spec.primary_pick,
        )
        .ok_or_else(too_small)?;
        let secondary = if spec.has_secondary() {
            sample_sorted(
                &mut self.rng,
                self.range_start,
                spec.secondary_pool,
                spec.secondary_pick,
            )
            .ok_or_else(too_small)?
        } else {
            Vec::new()
        };
        Ok(DrawLine { primary, secondary })
    }
}
