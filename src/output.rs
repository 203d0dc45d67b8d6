// Rendering boundary: terminal tables, text bar charts and output files.
use crate::error::KpiError;
use crate::reports::{SupplierReport, REPORT_TITLE};
use crate::types::RejectedRecord;
use crate::views::{BarChart, Dashboard, ScatterChart};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const SCORED_CSV: &str = "suppliers_scored.csv";
pub const TOP_CSV: &str = "top_suppliers.csv";
pub const HIGH_RISK_CSV: &str = "high_risk_suppliers.csv";
pub const DASHBOARD_JSON: &str = "dashboard.json";
pub const REPORT_TXT: &str = "supplier_report.txt";
pub const REPORT_PDF: &str = "supplier_report.pdf";

const BAR_WIDTH: usize = 40;

// A4 portrait with a 2cm margin.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const MAX_LINE_HEIGHT_MM: f32 = 7.0;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), KpiError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), KpiError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write every run artefact under `dir`, creating it if needed.
pub fn write_outputs(dir: &Path, dashboard: &Dashboard, report: &str) -> Result<Vec<PathBuf>, KpiError> {
    std::fs::create_dir_all(dir)?;

    let scored = dir.join(SCORED_CSV);
    write_csv(&scored, &dashboard.raw_data)?;
    let top = dir.join(TOP_CSV);
    write_csv(&top, &dashboard.top_suppliers)?;
    let high = dir.join(HIGH_RISK_CSV);
    write_csv(&high, &dashboard.high_risk_suppliers)?;
    let json = dir.join(DASHBOARD_JSON);
    write_json(&json, dashboard)?;
    let txt = dir.join(REPORT_TXT);
    std::fs::write(&txt, report)?;

    let written = vec![scored, top, high, json, txt];
    info!(dir = %dir.display(), files = written.len(), "wrote report outputs");
    Ok(written)
}

/// Lay the paginated report out on A4 pages, one report page per PDF page.
///
/// The title and numbered section headings are set in bold. The built-in
/// Helvetica face only covers WinAnsi, so characters outside it are dropped
/// from the PDF text; the `.txt` report keeps them.
pub fn render_pdf(report: &SupplierReport, lines_per_page: usize) -> Result<Vec<u8>, KpiError> {
    let pages = report.paginate(lines_per_page);
    let line_height =
        ((PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) / lines_per_page.max(1) as f32).min(MAX_LINE_HEIGHT_MM);

    let (doc, first_page, first_layer) = PdfDocument::new(
        REPORT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (idx, lines) in pages.iter().enumerate() {
        let (page, layer) = if idx == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);

        for (n, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = PAGE_HEIGHT_MM - MARGIN_MM - n as f32 * line_height;
            let (size, font) = match line_kind(line) {
                LineKind::Title => (16.0, &bold),
                LineKind::Heading => (12.0, &bold),
                LineKind::Body => (10.0, &regular),
            };
            layer.use_text(line.as_str(), size, Mm(MARGIN_MM), Mm(y), font);
        }
    }

    Ok(doc.save_to_bytes()?)
}

/// Write the PDF rendering of `report` into `dir`.
pub fn write_pdf(dir: &Path, report: &SupplierReport, lines_per_page: usize) -> Result<PathBuf, KpiError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(REPORT_PDF);
    let bytes = render_pdf(report, lines_per_page)?;
    std::fs::write(&path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote pdf report");
    Ok(path)
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind {
    Title,
    Heading,
    Body,
}

fn line_kind(line: &str) -> LineKind {
    if line == REPORT_TITLE {
        return LineKind::Title;
    }
    // Section headings are the unindented `1. Summary` style lines.
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(d), Some('.')) if d.is_ascii_digit() => LineKind::Heading,
        _ => LineKind::Body,
    }
}

pub fn table_string<T>(rows: &[T]) -> Option<String>
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return None;
    }
    Some(Table::new(rows.to_vec()).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], empty_text: &str)
where
    T: Tabled + Clone,
{
    match table_string(rows) {
        Some(table) => println!("{}\n", table),
        None => println!("{}\n", empty_text),
    }
}

/// Horizontal text bars scaled to the largest value (or the chart's fixed
/// `y_max`). Colour hints are printed as tags since the terminal is plain.
pub fn bar_chart_lines(chart: &BarChart) -> Vec<String> {
    let max = chart
        .y_max
        .unwrap_or_else(|| chart.bars.iter().map(|b| b.value).fold(0.0, f64::max));
    let label_width = chart
        .bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!("{} [{}]", chart.title, chart.y_label)];
    for bar in &chart.bars {
        let filled = if max > 0.0 {
            ((bar.value / max) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize
        } else {
            0
        };
        let pad = label_width - bar.label.chars().count();
        let mut line = format!(
            "{}{} | {} {}",
            bar.label,
            " ".repeat(pad),
            "#".repeat(filled),
            trim_float(bar.value)
        );
        if let Some(color) = bar.color {
            line.push_str(&format!(" ({color})"));
        }
        lines.push(line);
    }
    lines
}

pub fn scatter_lines(chart: &ScatterChart) -> Vec<String> {
    let mut lines = vec![format!(
        "{} [x: {}, y: {}]",
        chart.title, chart.x_label, chart.y_label
    )];
    for p in &chart.points {
        lines.push(format!(
            "{} @ ({}, {}) {}",
            p.label,
            trim_float(p.x),
            trim_float(p.y),
            p.color
        ));
    }
    lines
}

fn trim_float(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// Print the whole dashboard to stdout.
pub fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", dashboard.title);
    println!("(Source: {})\n", dashboard.source);

    preview_table_rows(&dashboard.card_rows(), "(no data)");

    for chart in [
        &dashboard.pcs_ranking,
        &dashboard.on_time_ranking,
    ] {
        println!("{}\n", bar_chart_lines(chart).join("\n"));
    }
    println!("{}\n", scatter_lines(&dashboard.quality_vs_lead_time).join("\n"));
    println!("{}\n", bar_chart_lines(&dashboard.risk_counts).join("\n"));

    println!("Top {} Priority Suppliers", dashboard.top_suppliers.len());
    preview_table_rows(&dashboard.top_suppliers, "None");
    println!("Watch List (HIGH risk)");
    preview_table_rows(&dashboard.high_risk_suppliers, "None");
    println!("Raw Data");
    preview_table_rows(&dashboard.raw_data, "(no rows)");
}

pub fn print_rejected(rejected: &[RejectedRecord]) {
    if rejected.is_empty() {
        return;
    }
    println!("Note: {} row(s) skipped:", rejected.len());
    for r in rejected {
        let name = if r.supplier.is_empty() { "<unnamed>" } else { r.supplier.as_str() };
        match r.row {
            Some(row) => println!("  row {}: {} ({})", row, name, r.reason),
            None => println!("  {} ({})", name, r.reason),
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::BarPoint;

    fn chart(y_max: Option<f64>) -> BarChart {
        BarChart {
            title: "Test",
            y_label: "PCS",
            y_max,
            bars: vec![
                BarPoint {
                    label: "long name".to_string(),
                    value: 100.0,
                    color: None,
                },
                BarPoint {
                    label: "b".to_string(),
                    value: 50.0,
                    color: Some("#F44336"),
                },
            ],
        }
    }

    #[test]
    fn bars_scale_to_largest_value() {
        let lines = bar_chart_lines(&chart(None));
        assert_eq!(lines[0], "Test [PCS]");
        assert_eq!(lines[1], format!("long name | {} 100", "#".repeat(40)));
        assert_eq!(
            lines[2],
            format!("b         | {} 50 (#F44336)", "#".repeat(20))
        );
    }

    #[test]
    fn bars_respect_fixed_axis_maximum() {
        let lines = bar_chart_lines(&chart(Some(200.0)));
        assert!(lines[1].contains(&format!("| {} 100", "#".repeat(20))));
    }

    fn sample_report() -> SupplierReport {
        let batch = crate::scoring::derive_batch(crate::loader::sample_batch().records)
            .expect("sample derives")
            .suppliers;
        let at = chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .expect("valid timestamp");
        SupplierReport::from_batch(&batch, 3, at)
    }

    #[test]
    fn pdf_report_is_a_pdf_document() {
        let bytes = render_pdf(&sample_report(), 48).expect("pdf renders");
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn short_pages_spill_onto_more_pdf_pages() {
        let report = sample_report();
        let one_page = render_pdf(&report, 48).expect("pdf renders");
        let many_pages = render_pdf(&report, 10).expect("pdf renders");
        assert!(report.paginate(10).len() > 1);
        assert!(many_pages.len() > one_page.len());
    }

    #[test]
    fn write_pdf_creates_the_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_pdf(&dir.path().join("out"), &sample_report(), 48).expect("pdf written");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(REPORT_PDF));
        let bytes = std::fs::read(&path).expect("pdf readable");
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn headings_are_recognised() {
        assert_eq!(line_kind(REPORT_TITLE), LineKind::Title);
        assert_eq!(line_kind("1. Summary"), LineKind::Heading);
        assert_eq!(line_kind("3. High Risk Suppliers"), LineKind::Heading);
        assert_eq!(line_kind("  - Suppliers: 5"), LineKind::Body);
        assert_eq!(line_kind("Page 1 of 1"), LineKind::Body);
    }

    #[test]
    fn empty_tables_render_placeholder() {
        let rows: Vec<crate::types::SupplierRow> = Vec::new();
        assert!(table_string(&rows).is_none());
    }
}
