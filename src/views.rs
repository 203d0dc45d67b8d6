// Immutable view data for the dashboard.
//
// Everything a renderer needs (cards, chart series, colours, tables) is
// computed here from the scored batch; `output` only draws it.
use crate::config::PresentationConfig;
use crate::ranking::{filter_risk, rank_by_field, top_n_by_score, SortField};
use crate::types::{KpiCardRow, RiskTier, ScoredRow, ScoredSupplier, SupplierRow};
use crate::util::{average, format_int, format_number};
use serde::Serialize;

pub const HIGH_RISK_POINT_COLOR: &str = "#F44336";
pub const DEFAULT_POINT_COLOR: &str = "#2196F3";

#[derive(Debug, Clone, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarPoint {
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub title: &'static str,
    pub y_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_max: Option<f64>,
    pub bars: Vec<BarPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterChart {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<ScatterPoint>,
}

/// Supplier-count and mean KPIs shown as the four summary cards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub supplier_count: usize,
    pub mean_on_time_48h: f64,
    pub mean_return_rate: f64,
    pub mean_lead_time_days: f64,
}

impl KpiSummary {
    pub fn from_batch(batch: &[ScoredSupplier]) -> Self {
        let column = |f: fn(&ScoredSupplier) -> f64| batch.iter().map(f).collect::<Vec<_>>();
        Self {
            supplier_count: batch.len(),
            mean_on_time_48h: average(&column(|s| s.record.on_time_48h)),
            mean_return_rate: average(&column(|s| s.record.return_rate)),
            mean_lead_time_days: average(&column(|s| s.record.bulk_lead_time_days)),
        }
    }

    pub fn cards(&self) -> Vec<KpiCard> {
        vec![
            KpiCard {
                label: "Suppliers",
                value: format_int(self.supplier_count),
                caption: None,
            },
            KpiCard {
                label: "48h On-Time Rate",
                value: format!("{}%", format_number(self.mean_on_time_48h, 1)),
                caption: Some("(mean)"),
            },
            KpiCard {
                label: "Return Rate",
                value: format!("{}%", format_number(self.mean_return_rate, 1)),
                caption: Some("(mean)"),
            },
            KpiCard {
                label: "E2E Lead Time",
                value: format!("{} days", format_number(self.mean_lead_time_days, 1)),
                caption: Some("(mean)"),
            },
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub source: String,
    pub kpi_cards: Vec<KpiCard>,
    pub pcs_ranking: BarChart,
    pub on_time_ranking: BarChart,
    pub quality_vs_lead_time: ScatterChart,
    pub risk_counts: BarChart,
    pub top_suppliers: Vec<SupplierRow>,
    pub high_risk_suppliers: Vec<SupplierRow>,
    pub raw_data: Vec<ScoredRow>,
}

impl Dashboard {
    pub fn build(batch: &[ScoredSupplier], source: &str, config: &PresentationConfig) -> Self {
        let summary = KpiSummary::from_batch(batch);
        Self {
            title: config.title.clone(),
            source: source.to_string(),
            kpi_cards: summary.cards(),
            pcs_ranking: pcs_ranking(batch),
            on_time_ranking: on_time_ranking(batch),
            quality_vs_lead_time: quality_vs_lead_time(batch),
            risk_counts: risk_counts(batch),
            top_suppliers: top_n_by_score(batch, config.top_n)
                .iter()
                .map(supplier_row)
                .collect(),
            high_risk_suppliers: filter_risk(batch, RiskTier::High)
                .iter()
                .map(supplier_row)
                .collect(),
            raw_data: batch.iter().map(scored_row).collect(),
        }
    }

    pub fn card_rows(&self) -> Vec<KpiCardRow> {
        self.kpi_cards
            .iter()
            .map(|card| KpiCardRow {
                label: match card.caption {
                    Some(caption) => format!("{} {}", card.label, caption),
                    None => card.label.to_string(),
                },
                value: card.value.clone(),
            })
            .collect()
    }
}

fn pcs_ranking(batch: &[ScoredSupplier]) -> BarChart {
    BarChart {
        title: "PCS Ranking (monthly procurement volume)",
        y_label: "PCS",
        y_max: None,
        bars: rank_by_field(batch, SortField::Pcs, false)
            .into_iter()
            .map(|s| BarPoint {
                value: s.record.pcs as f64,
                label: s.record.supplier,
                color: None,
            })
            .collect(),
    }
}

fn on_time_ranking(batch: &[ScoredSupplier]) -> BarChart {
    BarChart {
        title: "48h On-Time Rate (procurement sub-stage)",
        y_label: "%",
        y_max: Some(100.0),
        bars: rank_by_field(batch, SortField::OnTime48h, false)
            .into_iter()
            .map(|s| BarPoint {
                value: s.record.on_time_48h,
                label: s.record.supplier,
                color: None,
            })
            .collect(),
    }
}

fn quality_vs_lead_time(batch: &[ScoredSupplier]) -> ScatterChart {
    ScatterChart {
        title: "Quality x Lead Time",
        x_label: "E2E lead time (days)",
        y_label: "Return rate (%)",
        points: batch
            .iter()
            .map(|s| ScatterPoint {
                label: s.record.supplier.clone(),
                x: s.record.bulk_lead_time_days,
                y: s.record.return_rate,
                color: if s.risk == RiskTier::High {
                    HIGH_RISK_POINT_COLOR
                } else {
                    DEFAULT_POINT_COLOR
                },
            })
            .collect(),
    }
}

// Always lists all three tiers in LOW, MEDIUM, HIGH order, zero counts
// included, so the chart layout does not shift between batches.
fn risk_counts(batch: &[ScoredSupplier]) -> BarChart {
    BarChart {
        title: "Risk Classification (first-pass rules)",
        y_label: "Suppliers",
        y_max: None,
        bars: RiskTier::ordered()
            .into_iter()
            .map(|tier| BarPoint {
                label: tier.label().to_string(),
                value: batch.iter().filter(|s| s.risk == tier).count() as f64,
                color: Some(tier.color()),
            })
            .collect(),
    }
}

pub fn supplier_row(s: &ScoredSupplier) -> SupplierRow {
    SupplierRow {
        supplier: s.record.supplier.clone(),
        on_time_48h: format_number(s.record.on_time_48h, 1),
        return_rate: format_number(s.record.return_rate, 1),
        bulk_lead_time_days: format_number(s.record.bulk_lead_time_days, 1),
        pcs: format_int(s.record.pcs),
    }
}

pub fn scored_row(s: &ScoredSupplier) -> ScoredRow {
    ScoredRow {
        supplier: s.record.supplier.clone(),
        pcs: s.record.pcs,
        on_time_48h: format_number(s.record.on_time_48h, 1),
        bulk_lead_time_days: format_number(s.record.bulk_lead_time_days, 1),
        return_rate: format_number(s.record.return_rate, 1),
        risk: s.risk,
        score: format!("{:.4}", s.score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::sample_batch;
    use crate::scoring::derive_batch;

    fn sample() -> Vec<ScoredSupplier> {
        derive_batch(sample_batch().records)
            .expect("sample derives")
            .suppliers
    }

    #[test]
    fn kpi_cards_show_counts_and_means() {
        let summary = KpiSummary::from_batch(&sample());
        assert_eq!(summary.supplier_count, 5);
        let values: Vec<String> = summary.cards().into_iter().map(|c| c.value).collect();
        assert_eq!(values, vec!["5", "92.8%", "10.0%", "9.1 days"]);
    }

    #[test]
    fn scatter_marks_only_high_risk_red() {
        let dashboard = Dashboard::build(&sample(), "sample", &PresentationConfig::default());
        let red: Vec<&str> = dashboard
            .quality_vs_lead_time
            .points
            .iter()
            .filter(|p| p.color == HIGH_RISK_POINT_COLOR)
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(red, vec!["盈豊紡織"]);
    }

    #[test]
    fn risk_counts_cover_every_tier() {
        let dashboard = Dashboard::build(&sample(), "sample", &PresentationConfig::default());
        let counts: Vec<(String, f64, Option<&str>)> = dashboard
            .risk_counts
            .bars
            .into_iter()
            .map(|b| (b.label, b.value, b.color))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("LOW".to_string(), 3.0, Some("#4CAF50")),
                ("MEDIUM".to_string(), 1.0, Some("#FFC107")),
                ("HIGH".to_string(), 1.0, Some("#F44336")),
            ]
        );
    }

    #[test]
    fn bar_charts_are_sorted_descending() {
        let dashboard = Dashboard::build(&sample(), "sample", &PresentationConfig::default());
        let pcs: Vec<f64> = dashboard.pcs_ranking.bars.iter().map(|b| b.value).collect();
        assert_eq!(pcs, vec![1340.0, 1157.0, 747.0, 366.0, 271.0]);

        let on_time: Vec<&str> = dashboard
            .on_time_ranking
            .bars
            .iter()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(
            on_time,
            vec!["義文紡織", "宇鑫布業", "潤都布業", "新皇紡織", "盈豊紡織"]
        );
        assert_eq!(dashboard.on_time_ranking.y_max, Some(100.0));
    }

    #[test]
    fn top_table_respects_configured_n() {
        let config = PresentationConfig {
            top_n: 2,
            ..PresentationConfig::default()
        };
        let dashboard = Dashboard::build(&sample(), "sample", &config);
        assert_eq!(dashboard.top_suppliers.len(), 2);
        assert_eq!(dashboard.top_suppliers[0].pcs, "1,340");
        assert_eq!(dashboard.raw_data.len(), 5);
    }
}
