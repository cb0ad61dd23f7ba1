use crate::domain::radar::{Month, Nation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Unit draws for one raw model, each in `[0, 1)`.
///
/// The engine maps these onto sales variance, prior rank jitter and the
/// new-entry roll; sources only decide where the numbers come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceDraw {
    pub sales: f64,
    pub prev_sales: f64,
    pub prior_rank: f64,
    pub new_entry: f64,
}

impl VarianceDraw {
    /// No variance, no rank movement, never a new entry.
    pub fn neutral() -> Self {
        Self {
            sales: 0.5,
            prev_sales: 0.5,
            prior_rank: 0.5,
            new_entry: 0.999,
        }
    }

    pub(crate) fn out_of_range_field(&self) -> Option<(&'static str, f64)> {
        [
            ("sales", self.sales),
            ("prev_sales", self.prev_sales),
            ("prior_rank", self.prior_rank),
            ("new_entry", self.new_entry),
        ]
        .into_iter()
        .find(|(_, v)| !(0.0..1.0).contains(v))
    }
}

pub trait VarianceSource: Send {
    fn name(&self) -> &'static str;

    /// Draw for the raw model at `index` (0-based input position).
    fn draw(&mut self, index: usize) -> VarianceDraw;
}

/// Reproducible draws: the same (month, nation) always yields the same numbers.
#[derive(Debug, Clone)]
pub struct SeededVariance {
    rng: StdRng,
}

impl SeededVariance {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn for_key(month: Month, nation: Nation) -> Self {
        Self::new(seed_for(month, nation))
    }
}

impl VarianceSource for SeededVariance {
    fn name(&self) -> &'static str {
        "seeded"
    }

    fn draw(&mut self, _index: usize) -> VarianceDraw {
        draw_from(&mut self.rng)
    }
}

/// Entropy-seeded draws for "fresh" sample data on every run.
#[derive(Debug, Clone)]
pub struct FreshVariance {
    rng: StdRng,
}

impl FreshVariance {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for FreshVariance {
    fn default() -> Self {
        Self::new()
    }
}

impl VarianceSource for FreshVariance {
    fn name(&self) -> &'static str {
        "fresh"
    }

    fn draw(&mut self, _index: usize) -> VarianceDraw {
        draw_from(&mut self.rng)
    }
}

/// Replays caller-supplied draws by index; positions past the end draw neutral.
#[derive(Debug, Clone)]
pub struct FixedVariance {
    draws: Vec<VarianceDraw>,
}

impl FixedVariance {
    pub fn new(draws: Vec<VarianceDraw>) -> Self {
        Self { draws }
    }
}

impl VarianceSource for FixedVariance {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn draw(&mut self, index: usize) -> VarianceDraw {
        self.draws
            .get(index)
            .copied()
            .unwrap_or_else(VarianceDraw::neutral)
    }
}

fn draw_from<R: Rng>(rng: &mut R) -> VarianceDraw {
    VarianceDraw {
        sales: rng.gen(),
        prev_sales: rng.gen(),
        prior_rank: rng.gen(),
        new_entry: rng.gen(),
    }
}

/// FNV-1a over `YYYYMM` + nation.
pub fn seed_for(month: Month, nation: Nation) -> u64 {
    let key = format!("{}{}", month.compact(), nation.as_str());
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}
