use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Column names every input batch must supply, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "supplier",
    "pcs",
    "on_time_48h",
    "bulk_lead_time_days",
    "return_rate",
];

// Rows are read as optional strings so that empty cells and stray
// formatting are reported per record instead of failing the whole file.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub pcs: Option<String>,
    #[serde(default)]
    pub on_time_48h: Option<String>,
    #[serde(default)]
    pub bulk_lead_time_days: Option<String>,
    #[serde(default)]
    pub return_rate: Option<String>,
}

/// One supplier's raw KPI fields as loaded from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierRecord {
    pub supplier: String,
    pub pcs: u64,
    pub on_time_48h: f64,
    pub bulk_lead_time_days: f64,
    pub return_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const fn ordered() -> [RiskTier; 3] {
        [RiskTier::Low, RiskTier::Medium, RiskTier::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Chart colour used for the tier count bars.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#4CAF50",
            Self::Medium => "#FFC107",
            Self::High => "#F44336",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record enriched with its derived risk tier and composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSupplier {
    #[serde(flatten)]
    pub record: SupplierRecord,
    pub risk: RiskTier,
    pub score: f64,
}

impl ScoredSupplier {
    pub fn supplier(&self) -> &str {
        &self.record.supplier
    }
}

/// A record dropped during loading or derivation. `row` is the 1-based data
/// row in the source file; records refused after loading have none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub row: Option<usize>,
    pub supplier: String,
    pub reason: String,
}

// Table/CSV rows. Numbers are pre-formatted so the terminal preview and the
// exported CSV show the same values.

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ScoredRow {
    #[tabled(rename = "Supplier")]
    pub supplier: String,
    #[tabled(rename = "PCS")]
    pub pcs: u64,
    #[tabled(rename = "OnTime48h")]
    pub on_time_48h: String,
    #[tabled(rename = "BulkLeadTimeDays")]
    pub bulk_lead_time_days: String,
    #[tabled(rename = "ReturnRate")]
    pub return_rate: String,
    #[tabled(rename = "Risk")]
    pub risk: RiskTier,
    #[tabled(rename = "Score")]
    pub score: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SupplierRow {
    #[serde(rename = "Supplier")]
    #[tabled(rename = "Supplier")]
    pub supplier: String,
    #[serde(rename = "OnTime48h")]
    #[tabled(rename = "OnTime48h")]
    pub on_time_48h: String,
    #[serde(rename = "ReturnRate")]
    #[tabled(rename = "ReturnRate")]
    pub return_rate: String,
    #[serde(rename = "BulkLeadTimeDays")]
    #[tabled(rename = "BulkLeadTimeDays")]
    pub bulk_lead_time_days: String,
    #[serde(rename = "PCS")]
    #[tabled(rename = "PCS")]
    pub pcs: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiCardRow {
    #[tabled(rename = "Metric")]
    pub label: String,
    #[tabled(rename = "Value")]
    pub value: String,
}
