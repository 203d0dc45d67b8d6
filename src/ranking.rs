use crate::types::{RiskTier, ScoredSupplier};
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_TOP_N: usize = 3;

/// Fields a batch can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Pcs,
    OnTime48h,
    BulkLeadTimeDays,
    ReturnRate,
    Score,
}

impl SortField {
    fn key(self, s: &ScoredSupplier) -> f64 {
        match self {
            Self::Pcs => s.record.pcs as f64,
            Self::OnTime48h => s.record.on_time_48h,
            Self::BulkLeadTimeDays => s.record.bulk_lead_time_days,
            Self::ReturnRate => s.record.return_rate,
            Self::Score => s.score,
        }
    }
}

/// Stable sort by `field`. Equal keys keep their input order in both
/// directions.
pub fn rank_by_field(batch: &[ScoredSupplier], field: SortField, ascending: bool) -> Vec<ScoredSupplier> {
    let mut ranked = batch.to_vec();
    ranked.sort_by(|a, b| {
        let ord = field
            .key(a)
            .partial_cmp(&field.key(b))
            .unwrap_or(Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    ranked
}

/// Highest scores first, at most `n` records.
pub fn top_n_by_score(batch: &[ScoredSupplier], n: usize) -> Vec<ScoredSupplier> {
    let mut ranked = rank_by_field(batch, SortField::Score, false);
    ranked.truncate(n);
    ranked
}

/// Every record in `tier`, input order preserved. Empty when none match.
pub fn filter_risk(batch: &[ScoredSupplier], tier: RiskTier) -> Vec<ScoredSupplier> {
    batch.iter().filter(|s| s.risk == tier).cloned().collect()
}
