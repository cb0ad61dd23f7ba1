//! Momentum ranking: raw sales figures in, scored and re-ranked `CarModel`s out.
//!
//! The engine performs no randomness and no I/O. Variance comes from an injected
//! [`VarianceSource`]; everything downstream of the draws is deterministic.

pub mod error;
pub mod variance;

use crate::domain::radar::{danawa_url, CarModel, Month, Nation, RadarData};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::RankingError;
pub use variance::{FixedVariance, FreshVariance, SeededVariance, VarianceDraw, VarianceSource};

pub const MOM_ABS_SCALE: f64 = 500.0;
pub const MOM_PCT_CAP: f64 = 5.0;
pub const RANK_CHANGE_SCALE: f64 = 5.0;

pub const WEIGHT_MOM_ABS: f64 = 0.55;
pub const WEIGHT_MOM_PCT: f64 = 0.35;
pub const WEIGHT_RANK_CHANGE: f64 = 0.10;

/// Current-period sales swing around the base volume (+/- 20%).
pub const SALES_VARIANCE: f64 = 0.20;
/// Prior-period sales swing around the base volume (+/- 15%).
pub const PREV_SALES_VARIANCE: f64 = 0.15;
/// Prior rank lands within +/- half of this span of the input position.
pub const PRIOR_RANK_SPAN: f64 = 6.0;
pub const NEW_ENTRY_PROBABILITY: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
    pub name: String,
    pub brand: String,
    pub base_volume: f64,
}

impl RawModel {
    pub fn new(name: impl Into<String>, brand: impl Into<String>, base_volume: f64) -> Self {
        Self {
            name: name.into(),
            brand: brand.into(),
            base_volume,
        }
    }
}

/// Per-model figures for one period, before any derived metric is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub sales: u32,
    pub prev_sales: u32,
    /// Synthetic 1-based position in the prior period; may drift outside `1..=N`.
    pub prior_rank: i32,
    pub is_new_entry: bool,
}

impl Observation {
    /// Map unit draws onto a raw model at 1-based input `position`.
    pub fn from_draw(base_volume: f64, position: i32, draw: &VarianceDraw) -> Self {
        let sales_variance = (draw.sales * 2.0 - 1.0) * SALES_VARIANCE;
        let prev_variance = (draw.prev_sales * 2.0 - 1.0) * PREV_SALES_VARIANCE;
        let rank_jitter = ((draw.prior_rank - 0.5) * PRIOR_RANK_SPAN).round() as i32;

        Self {
            sales: scaled_volume(base_volume, sales_variance),
            prev_sales: scaled_volume(base_volume, prev_variance),
            prior_rank: position.saturating_add(rank_jitter),
            is_new_entry: draw.new_entry < NEW_ENTRY_PROBABILITY,
        }
    }
}

fn scaled_volume(base_volume: f64, variance: f64) -> u32 {
    // `as` saturates, so absurd base volumes clamp to u32::MAX instead of wrapping.
    (base_volume * (1.0 + variance)).round().max(0.0) as u32
}

/// Month-over-month movement after the new-entry override has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    pub prev_sales: u32,
    pub mom_abs: i64,
    pub mom_pct: f64,
    pub rank_change: i32,
}

impl Movement {
    pub fn derive(observation: &Observation, current_rank: i32) -> Self {
        let mom_abs = i64::from(observation.sales) - i64::from(observation.prev_sales);
        let mom_pct = if observation.prev_sales > 0 {
            mom_abs as f64 / f64::from(observation.prev_sales)
        } else {
            0.0
        };
        let rank_change = observation.prior_rank.saturating_sub(current_rank);

        // New entries have no baseline: whatever history the draws suggested is discarded.
        if observation.is_new_entry {
            return Self {
                prev_sales: 0,
                mom_abs: i64::from(observation.sales),
                mom_pct: 0.0,
                rank_change: 0,
            };
        }

        Self {
            prev_sales: observation.prev_sales,
            mom_abs,
            mom_pct,
            rank_change,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumSignals {
    pub z_mom_abs: f64,
    pub z_mom_pct: f64,
    pub z_rank_change: f64,
}

impl MomentumSignals {
    pub fn from_movement(movement: &Movement) -> Self {
        Self {
            z_mom_abs: movement.mom_abs as f64 / MOM_ABS_SCALE,
            z_mom_pct: movement.mom_pct.min(MOM_PCT_CAP),
            z_rank_change: f64::from(movement.rank_change) / RANK_CHANGE_SCALE,
        }
    }

    pub fn score(&self) -> f64 {
        WEIGHT_MOM_ABS * self.z_mom_abs
            + WEIGHT_MOM_PCT * self.z_mom_pct
            + WEIGHT_RANK_CHANGE * self.z_rank_change
    }
}

/// Draw variance for every raw model, then score and re-rank.
pub fn rank_models(
    raw: &[RawModel],
    month: Month,
    nation: Nation,
    source: &mut dyn VarianceSource,
) -> Result<Vec<CarModel>, RankingError> {
    let mut entries = Vec::with_capacity(raw.len());
    for (idx, model) in raw.iter().enumerate() {
        validate_raw(idx, model)?;

        let draw = source.draw(idx);
        if let Some((field, value)) = draw.out_of_range_field() {
            return Err(RankingError::new(
                idx,
                "variance",
                format!(
                    "{} draw {field}={value} is outside [0, 1)",
                    source.name()
                ),
            ));
        }

        let observation = Observation::from_draw(model.base_volume, position(idx), &draw);
        entries.push((model.clone(), observation));
    }

    rank_observations(entries, month, nation)
}

/// Score already-observed figures and re-rank.
///
/// Final order is score descending; equal scores keep their input order.
pub fn rank_observations(
    entries: Vec<(RawModel, Observation)>,
    month: Month,
    nation: Nation,
) -> Result<Vec<CarModel>, RankingError> {
    let url = danawa_url(month, nation);

    let mut scored: Vec<(usize, CarModel)> = Vec::with_capacity(entries.len());
    for (idx, (raw, observation)) in entries.into_iter().enumerate() {
        validate_raw(idx, &raw)?;

        let current_rank = position(idx);
        let movement = Movement::derive(&observation, current_rank);
        let score = MomentumSignals::from_movement(&movement).score();

        scored.push((
            idx,
            CarModel {
                id: Uuid::new_v4(),
                rank: current_rank as u32,
                name: raw.name,
                brand: raw.brand,
                sales: observation.sales,
                prev_sales: movement.prev_sales,
                mom_abs: movement.mom_abs,
                mom_pct: movement.mom_pct,
                rank_change: movement.rank_change,
                score,
                is_new_entry: observation.is_new_entry,
                nation,
                month,
                danawa_url: url.clone(),
            },
        ));
    }

    scored.sort_by(|a, b| {
        b.1.score
            .partial_cmp(&a.1.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(idx, (_, mut model))| {
            model.rank = idx as u32 + 1;
            model
        })
        .collect())
}

/// Rank `raw` into a full snapshot. `fetched_at` is kept at microsecond
/// precision so the value survives a TIMESTAMPTZ round trip unchanged.
pub fn build_snapshot(
    raw: &[RawModel],
    month: Month,
    nation: Nation,
    source: &mut dyn VarianceSource,
    fetched_at: DateTime<Utc>,
) -> Result<RadarData, RankingError> {
    let models = rank_models(raw, month, nation, source)?;
    Ok(RadarData {
        month,
        nation,
        models,
        fetched_at: fetched_at.trunc_subsecs(6),
    })
}

fn position(idx: usize) -> i32 {
    i32::try_from(idx + 1).unwrap_or(i32::MAX)
}

fn validate_raw(idx: usize, model: &RawModel) -> Result<(), RankingError> {
    if model.name.trim().is_empty() {
        return Err(RankingError::new(idx, "input", "name must be non-empty"));
    }
    if model.brand.trim().is_empty() {
        return Err(RankingError::new(
            idx,
            "input",
            format!("brand must be non-empty (model {})", model.name),
        ));
    }
    if !model.base_volume.is_finite() || model.base_volume < 0.0 {
        return Err(RankingError::new(
            idx,
            "input",
            format!(
                "base volume must be a finite non-negative number (model {}, got {})",
                model.name, model.base_volume
            ),
        ));
    }
    Ok(())
}
