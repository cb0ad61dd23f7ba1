use crate::domain::radar::CarModel;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_SALES: u32 = 300;
pub const DEFAULT_LIMIT: usize = 20;

/// Dashboard-side narrowing of a snapshot. Never renumbers `rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFilter {
    pub min_sales: u32,
    pub exclude_new_entries: bool,
    pub limit: usize,
}

impl Default for ModelFilter {
    fn default() -> Self {
        Self {
            min_sales: DEFAULT_MIN_SALES,
            exclude_new_entries: false,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ModelFilter {
    pub fn matches(&self, model: &CarModel) -> bool {
        model.sales >= self.min_sales && !(self.exclude_new_entries && model.is_new_entry)
    }

    /// Models are expected in snapshot (rank) order; that order is preserved.
    pub fn apply(&self, models: &[CarModel]) -> Vec<CarModel> {
        models
            .iter()
            .filter(|m| self.matches(m))
            .take(self.limit)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarStats {
    pub count: usize,
    /// Models with positive month-over-month change.
    pub rising: usize,
    pub total_sales: u64,
}

impl RadarStats {
    pub fn from_models(models: &[CarModel]) -> Self {
        Self {
            count: models.len(),
            rising: models.iter().filter(|m| m.mom_abs > 0).count(),
            total_sales: models.iter().map(|m| u64::from(m.sales)).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::radar::{Month, Nation};
    use crate::ranking::{rank_observations, Observation, RawModel};

    fn models() -> Vec<CarModel> {
        let entries = vec![
            (RawModel::new("Big", "A", 2000.0), obs(2000, 1500, false)),
            (RawModel::new("Small", "A", 200.0), obs(250, 100, false)),
            (RawModel::new("Fresh", "B", 900.0), obs(900, 0, true)),
            (RawModel::new("Down", "B", 800.0), obs(700, 800, false)),
        ];
        rank_observations(entries, Month::parse("2026-09").unwrap(), Nation::Domestic).unwrap()
    }

    fn obs(sales: u32, prev_sales: u32, is_new_entry: bool) -> Observation {
        Observation {
            sales,
            prev_sales,
            prior_rank: 1,
            is_new_entry,
        }
    }

    #[test]
    fn applies_threshold_and_keeps_rank_order() {
        let all = models();
        let out = ModelFilter::default().apply(&all);

        assert!(out.iter().all(|m| m.sales >= DEFAULT_MIN_SALES));
        assert!(!out.iter().any(|m| m.name == "Small"));
        for pair in out.windows(2) {
            assert!(pair[0].rank < pair[1].rank);
        }
    }

    #[test]
    fn excludes_new_entries_on_request() {
        let filter = ModelFilter {
            exclude_new_entries: true,
            ..ModelFilter::default()
        };
        let out = filter.apply(&models());
        assert!(out.iter().all(|m| !m.is_new_entry));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn truncates_to_limit() {
        let filter = ModelFilter {
            min_sales: 0,
            exclude_new_entries: false,
            limit: 1,
        };
        let out = filter.apply(&models());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rank, 1);
    }

    #[test]
    fn stats_count_rising_and_total() {
        let stats = RadarStats::from_models(&models());
        assert_eq!(stats.count, 4);
        // Big, Small and the new entry (momAbs = sales) rise; Down falls.
        assert_eq!(stats.rising, 3);
        assert_eq!(stats.total_sales, 2000 + 250 + 900 + 700);
    }

    #[test]
    fn stats_of_empty_snapshot() {
        let stats = RadarStats::from_models(&[]);
        assert_eq!(stats, RadarStats { count: 0, rising: 0, total_sales: 0 });
    }
}
