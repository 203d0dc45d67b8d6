// Risk classification and composite scoring.
//
// Both rules look at a single record only; nothing here depends on the rest
// of the batch, so deriving twice always yields the same tiers and scores.
use crate::error::KpiError;
use crate::types::{RejectedRecord, RiskTier, ScoredSupplier, SupplierRecord};
use tracing::{debug, warn};

pub const HIGH_RISK_ON_TIME_BELOW: f64 = 90.0;
pub const HIGH_RISK_RETURN_ABOVE: f64 = 15.0;
pub const MEDIUM_RISK_ON_TIME_BELOW: f64 = 93.0;
pub const MEDIUM_RISK_RETURN_ABOVE: f64 = 10.0;

pub const ON_TIME_WEIGHT: f64 = 0.5;
pub const RETURN_WEIGHT: f64 = 0.3;
pub const LEAD_TIME_WEIGHT: f64 = 0.2;

/// Classify a supplier from its on-time and return rates.
///
/// Rules are checked HIGH first, then MEDIUM; thresholds are strict, so a
/// value sitting exactly on a threshold is never the worse tier.
pub fn classify_risk(on_time_48h: f64, return_rate: f64) -> RiskTier {
    if on_time_48h < HIGH_RISK_ON_TIME_BELOW || return_rate > HIGH_RISK_RETURN_ABOVE {
        return RiskTier::High;
    }
    if on_time_48h < MEDIUM_RISK_ON_TIME_BELOW || return_rate > MEDIUM_RISK_RETURN_ABOVE {
        return RiskTier::Medium;
    }
    RiskTier::Low
}

/// Weighted composite score, higher is better.
///
/// `on_time_48h` and `return_rate` are used as given, even outside 0..=100.
/// A lead time that is zero, negative or not finite is rejected.
pub fn compute_score(
    on_time_48h: f64,
    return_rate: f64,
    bulk_lead_time_days: f64,
) -> Result<f64, KpiError> {
    if !bulk_lead_time_days.is_finite() || bulk_lead_time_days <= 0.0 {
        return Err(KpiError::invalid(
            "",
            format!("bulk_lead_time_days must be > 0, got {bulk_lead_time_days}"),
        ));
    }

    Ok((on_time_48h / 100.0) * ON_TIME_WEIGHT
        + (1.0 - return_rate / 100.0) * RETURN_WEIGHT
        + (1.0 / bulk_lead_time_days) * LEAD_TIME_WEIGHT)
}

pub fn derive(record: SupplierRecord) -> Result<ScoredSupplier, KpiError> {
    let score = compute_score(
        record.on_time_48h,
        record.return_rate,
        record.bulk_lead_time_days,
    )
    .map_err(|err| match err {
        KpiError::InvalidInput { reason, .. } => {
            KpiError::invalid(record.supplier.clone(), reason)
        }
        other => other,
    })?;
    let risk = classify_risk(record.on_time_48h, record.return_rate);

    Ok(ScoredSupplier {
        record,
        risk,
        score,
    })
}

/// Result of enriching a batch: the scored records in input order plus
/// anything that failed a precondition.
#[derive(Debug, Clone, Default)]
pub struct Derivation {
    pub suppliers: Vec<ScoredSupplier>,
    pub rejected: Vec<RejectedRecord>,
}

/// Enrich every record, dropping the ones `derive` rejects.
///
/// Fails with `EmptyBatch` when nothing survives.
pub fn derive_batch(records: Vec<SupplierRecord>) -> Result<Derivation, KpiError> {
    let mut out = Derivation::default();

    for record in records {
        match derive(record) {
            Ok(scored) => {
                debug!(
                    supplier = %scored.supplier(),
                    risk = %scored.risk,
                    score = scored.score,
                    "derived supplier kpis"
                );
                out.suppliers.push(scored);
            }
            Err(KpiError::InvalidInput { supplier, reason }) => {
                warn!(%supplier, %reason, "rejected supplier record");
                out.rejected.push(RejectedRecord {
                    row: None,
                    supplier,
                    reason,
                });
            }
            Err(other) => return Err(other),
        }
    }

    if out.suppliers.is_empty() {
        return Err(KpiError::EmptyBatch);
    }
    Ok(out)
}
