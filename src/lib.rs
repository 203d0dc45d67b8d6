// Supplier KPI scoring, ranking and reporting.
//
// Flow: `loader` builds a batch, `scoring` attaches risk tiers and composite
// scores, `ranking` produces ordered/segmented views, and `views`, `reports`
// and `output` turn those into the dashboard and the printable report.
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod reports;
pub mod scoring;
pub mod telemetry;
pub mod types;
pub mod util;
pub mod views;

pub use error::KpiError;
pub use pipeline::{analyze, Analysis};
pub use ranking::{filter_risk, rank_by_field, top_n_by_score, SortField};
pub use scoring::{classify_risk, compute_score, derive_batch};
pub use types::{RiskTier, ScoredSupplier, SupplierRecord};
