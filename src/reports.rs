// Printable supplier report.
//
// The report is assembled from precomputed views (summary, top suppliers,
// HIGH-risk suppliers) and laid out as fixed-height text pages.
use crate::ranking::{filter_risk, top_n_by_score};
use crate::types::{RiskTier, ScoredSupplier};
use crate::util::format_number;
use crate::views::KpiSummary;
use chrono::NaiveDateTime;
use serde::Serialize;

pub const REPORT_TITLE: &str = "Supplier KPI Analysis Report";
pub const PAGE_BREAK: char = '\u{000C}';

/// One supplier line in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierSummary {
    pub supplier: String,
    pub on_time_48h: f64,
    pub return_rate: f64,
    pub bulk_lead_time_days: f64,
}

impl From<&ScoredSupplier> for SupplierSummary {
    fn from(s: &ScoredSupplier) -> Self {
        Self {
            supplier: s.record.supplier.clone(),
            on_time_48h: s.record.on_time_48h,
            return_rate: s.record.return_rate,
            bulk_lead_time_days: s.record.bulk_lead_time_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierReport {
    pub generated_at: NaiveDateTime,
    pub summary: Vec<(String, String)>,
    pub top_suppliers: Vec<SupplierSummary>,
    pub high_risk_suppliers: Vec<SupplierSummary>,
}

impl SupplierReport {
    pub fn new(
        generated_at: NaiveDateTime,
        summary: Vec<(String, String)>,
        top_suppliers: Vec<SupplierSummary>,
        high_risk_suppliers: Vec<SupplierSummary>,
    ) -> Self {
        Self {
            generated_at,
            summary,
            top_suppliers,
            high_risk_suppliers,
        }
    }

    /// Build the three report inputs from a scored batch.
    pub fn from_batch(batch: &[ScoredSupplier], top_n: usize, generated_at: NaiveDateTime) -> Self {
        let top = top_n_by_score(batch, top_n);
        let high = filter_risk(batch, RiskTier::High);
        Self::new(
            generated_at,
            summary_entries(batch, &top, &high),
            top.iter().map(SupplierSummary::from).collect(),
            high.iter().map(SupplierSummary::from).collect(),
        )
    }

    /// Report body as lines, before pagination.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            REPORT_TITLE.to_string(),
            format!("Generated at: {}", self.generated_at.format("%Y-%m-%d %H:%M")),
            String::new(),
            "1. Summary".to_string(),
        ];
        for (label, value) in &self.summary {
            lines.push(format!("  - {}: {}", label, value));
        }

        lines.push(String::new());
        lines.push("2. Recommended Suppliers (Top)".to_string());
        if self.top_suppliers.is_empty() {
            lines.push("  - None".to_string());
        }
        for s in &self.top_suppliers {
            lines.push(format!(
                "  - {} | 48h: {:.1}% | Return: {:.1}% | LeadTime: {:.1} days",
                s.supplier, s.on_time_48h, s.return_rate, s.bulk_lead_time_days
            ));
        }

        lines.push(String::new());
        lines.push("3. High Risk Suppliers".to_string());
        if self.high_risk_suppliers.is_empty() {
            lines.push("  - None".to_string());
        }
        for s in &self.high_risk_suppliers {
            lines.push(format!(
                "  - {} | 48h: {:.1}% | Return: {:.1}%",
                s.supplier, s.on_time_48h, s.return_rate
            ));
        }
        lines
    }

    /// Split into pages of exactly `lines_per_page` lines; the last two lines
    /// of every page are a blank spacer and the `Page i of n` footer.
    pub fn paginate(&self, lines_per_page: usize) -> Vec<Vec<String>> {
        let body_height = lines_per_page.saturating_sub(2).max(1);
        let lines = self.lines();
        let chunks: Vec<&[String]> = lines.chunks(body_height).collect();
        let total = chunks.len();

        chunks
            .into_iter()
            .enumerate()
            .map(|(idx, chunk)| {
                let mut page = chunk.to_vec();
                page.resize(body_height, String::new());
                page.push(String::new());
                page.push(format!("Page {} of {}", idx + 1, total));
                page
            })
            .collect()
    }

    /// Pages joined with form feeds, ready to write or print.
    pub fn render(&self, lines_per_page: usize) -> String {
        self.paginate(lines_per_page)
            .into_iter()
            .map(|page| page.join("\n"))
            .collect::<Vec<_>>()
            .join(format!("\n{PAGE_BREAK}").as_str())
            + "\n"
    }
}

fn summary_entries(
    batch: &[ScoredSupplier],
    top: &[ScoredSupplier],
    high: &[ScoredSupplier],
) -> Vec<(String, String)> {
    let kpis = KpiSummary::from_batch(batch);
    let mut entries = vec![
        ("Suppliers analysed".to_string(), kpis.supplier_count.to_string()),
        (
            "Average 48h on-time rate".to_string(),
            format!("{}%", format_number(kpis.mean_on_time_48h, 1)),
        ),
        (
            "Average return rate".to_string(),
            format!("{}%", format_number(kpis.mean_return_rate, 1)),
        ),
        (
            "Average lead time".to_string(),
            format!("{} days", format_number(kpis.mean_lead_time_days, 1)),
        ),
        ("High risk suppliers".to_string(), high.len().to_string()),
    ];
    if let Some(best) = top.first() {
        entries.push((
            "Best composite score".to_string(),
            format!("{} ({:.4})", best.supplier(), best.score),
        ));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::sample_batch;
    use crate::scoring::derive_batch;
    use chrono::NaiveDate;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn sample_report() -> SupplierReport {
        let batch = derive_batch(sample_batch().records).unwrap().suppliers;
        SupplierReport::from_batch(&batch, 3, generated_at())
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let lines = sample_report().lines();
        let pos = |needle: &str| {
            lines
                .iter()
                .position(|l| l == needle)
                .unwrap_or_else(|| panic!("missing {needle}"))
        };
        assert_eq!(lines[0], REPORT_TITLE);
        assert_eq!(lines[1], "Generated at: 2025-01-15 09:30");
        assert!(pos("1. Summary") < pos("2. Recommended Suppliers (Top)"));
        assert!(pos("2. Recommended Suppliers (Top)") < pos("3. High Risk Suppliers"));
    }

    #[test]
    fn supplier_lines_follow_report_format() {
        let lines = sample_report().lines();
        assert!(lines.contains(
            &"  - 宇鑫布業 | 48h: 95.0% | Return: 6.5% | LeadTime: 6.6 days".to_string()
        ));
        assert!(lines.contains(&"  - 盈豊紡織 | 48h: 83.0% | Return: 12.2%".to_string()));
        assert!(lines.contains(&"  - Best composite score: 宇鑫布業 (0.7858)".to_string()));
    }

    #[test]
    fn empty_risk_list_renders_none() {
        let report = SupplierReport::new(generated_at(), Vec::new(), Vec::new(), Vec::new());
        let lines = report.lines();
        let risk_header = lines
            .iter()
            .position(|l| l == "3. High Risk Suppliers")
            .unwrap();
        assert_eq!(lines[risk_header + 1], "  - None");
    }

    #[test]
    fn pages_have_fixed_height_and_footers() {
        let report = sample_report();
        let body = report.lines().len();
        let pages = report.paginate(10);
        assert_eq!(pages.len(), body.div_ceil(8));
        for (idx, page) in pages.iter().enumerate() {
            assert_eq!(page.len(), 10);
            assert_eq!(page[9], format!("Page {} of {}", idx + 1, pages.len()));
        }
    }

    #[test]
    fn render_separates_pages_with_form_feed() {
        let report = sample_report();
        let rendered = report.render(10);
        let pages = report.paginate(10).len();
        assert_eq!(rendered.matches(PAGE_BREAK).count(), pages - 1);
        assert!(rendered.ends_with(&format!("Page {pages} of {pages}\n")));
    }
}
