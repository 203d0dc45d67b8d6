// One analysis run: loaded batch -> scored batch -> dashboard + report.
use crate::config::PresentationConfig;
use crate::error::KpiError;
use crate::loader::LoadedBatch;
use crate::reports::SupplierReport;
use crate::scoring::derive_batch;
use crate::types::{RejectedRecord, ScoredSupplier};
use crate::views::Dashboard;
use chrono::NaiveDateTime;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Analysis {
    pub suppliers: Vec<ScoredSupplier>,
    /// Rows skipped while loading plus records refused during derivation.
    pub rejected: Vec<RejectedRecord>,
    pub dashboard: Dashboard,
    pub report: SupplierReport,
}

pub fn analyze(
    loaded: LoadedBatch,
    config: &PresentationConfig,
    generated_at: NaiveDateTime,
) -> Result<Analysis, KpiError> {
    let LoadedBatch { records, report } = loaded;
    let mut rejected = report.rejected;

    let derivation = derive_batch(records)?;
    rejected.extend(derivation.rejected);
    let suppliers = derivation.suppliers;

    let source = report.source.describe();
    let dashboard = Dashboard::build(&suppliers, &source, config);
    let report = SupplierReport::from_batch(&suppliers, config.top_n, generated_at);

    info!(
        source = %source,
        suppliers = suppliers.len(),
        rejected = rejected.len(),
        high_risk = dashboard.high_risk_suppliers.len(),
        "analysis complete"
    );

    Ok(Analysis {
        suppliers,
        rejected,
        dashboard,
        report,
    })
}
