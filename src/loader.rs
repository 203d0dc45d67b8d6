use crate::error::KpiError;
use crate::types::{RawRow, RejectedRecord, SupplierRecord, REQUIRED_COLUMNS};
use crate::util::{parse_count_safe, parse_f64_safe};
use calamine::{open_workbook_auto, Reader};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Where a batch came from; shown to the user alongside the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Sample,
    File(String),
}

impl DataSource {
    pub fn describe(&self) -> String {
        match self {
            DataSource::Sample => "built-in sample data".to_string(),
            DataSource::File(path) => path.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub source: DataSource,
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone)]
pub struct LoadedBatch {
    pub records: Vec<SupplierRecord>,
    pub report: LoadReport,
}

/// The five-supplier reference dataset used when no file is selected.
pub fn sample_batch() -> LoadedBatch {
    let rows: [(&str, u64, f64, f64, f64); 5] = [
        ("宇鑫布業", 1340, 95.0, 6.6, 6.5),
        ("義文紡織", 1157, 96.0, 7.9, 8.2),
        ("盈豊紡織", 747, 83.0, 14.9, 12.2),
        ("潤都布業", 366, 95.0, 7.2, 14.6),
        ("新皇紡織", 271, 95.0, 9.0, 8.4),
    ];
    let records: Vec<SupplierRecord> = rows
        .iter()
        .map(|&(supplier, pcs, on_time_48h, bulk_lead_time_days, return_rate)| SupplierRecord {
            supplier: supplier.to_string(),
            pcs,
            on_time_48h,
            bulk_lead_time_days,
            return_rate,
        })
        .collect();

    let report = LoadReport {
        source: DataSource::Sample,
        total_rows: records.len(),
        loaded_rows: records.len(),
        rejected: Vec::new(),
    };
    LoadedBatch { records, report }
}

/// Load a `.csv`/`.tsv` file, or the first sheet of an `.xlsx`/`.xls`/`.ods`
/// workbook.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<LoadedBatch, KpiError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mut loaded = match ext.as_str() {
        "csv" => load_from_reader(std::fs::File::open(path)?, b',')?,
        "tsv" => load_from_reader(std::fs::File::open(path)?, b'\t')?,
        "xlsx" | "xlsm" | "xls" | "ods" => load_from_workbook(path)?,
        other => {
            return Err(KpiError::SourceFormat {
                detail: format!(
                    "unsupported file type '{other}'; expected .csv, .tsv, .xlsx, .xls or .ods"
                ),
            })
        }
    };

    loaded.report.source = DataSource::File(path.display().to_string());
    info!(
        path = %path.display(),
        rows = loaded.report.total_rows,
        rejected = loaded.report.rejected.len(),
        "loaded supplier file"
    );
    Ok(loaded)
}

/// Delimited text with a header row.
pub fn load_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<LoadedBatch, KpiError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let rows = rdr.into_records().map(|r| r.map_err(KpiError::from));
    load_rows(&headers, rows)
}

/// First worksheet of a workbook; its first row is the header.
pub fn load_from_workbook<P: AsRef<Path>>(path: P) -> Result<LoadedBatch, KpiError> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| KpiError::SourceFormat {
            detail: "workbook has no worksheets".to_string(),
        })??;

    let mut rows = range.rows().map(|cells| {
        let mut record: StringRecord = cells.iter().map(|cell| cell.to_string()).collect();
        record.trim();
        record
    });
    let headers = rows.next().unwrap_or_default();
    load_rows(&headers, rows.map(Ok))
}

/// Check the header once for the required columns, then parse every row.
///
/// Row-level problems (blank cells, bad numbers, duplicate names) reject only
/// that row. A missing column fails the batch before any row is read.
fn load_rows<I>(headers: &StringRecord, rows: I) -> Result<LoadedBatch, KpiError>
where
    I: Iterator<Item = Result<StringRecord, KpiError>>,
{
    validate_columns(headers)?;

    let mut total_rows = 0usize;
    let mut records = Vec::new();
    let mut rejected = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for result in rows {
        let record = result?;
        // Spreadsheets often carry trailing blank rows.
        if record.iter().all(str::is_empty) {
            continue;
        }
        total_rows += 1;
        let row: RawRow = record.deserialize(Some(headers))?;
        match parse_row(row) {
            Ok(record) if !seen.insert(record.supplier.clone()) => {
                rejected.push(RejectedRecord {
                    row: Some(total_rows),
                    supplier: record.supplier,
                    reason: "duplicate supplier name".to_string(),
                });
            }
            Ok(record) => records.push(record),
            Err(KpiError::InvalidInput { supplier, reason }) => {
                rejected.push(RejectedRecord {
                    row: Some(total_rows),
                    supplier,
                    reason,
                });
            }
            Err(other) => return Err(other),
        }
    }

    for r in &rejected {
        warn!(row = ?r.row, supplier = %r.supplier, reason = %r.reason, "skipped input row");
    }

    if total_rows == 0 {
        return Err(KpiError::EmptyBatch);
    }

    let report = LoadReport {
        source: DataSource::Sample,
        total_rows,
        loaded_rows: records.len(),
        rejected,
    };
    Ok(LoadedBatch { records, report })
}

/// Fails with the missing names, in canonical column order.
pub fn validate_columns(headers: &StringRecord) -> Result<(), KpiError> {
    let present: HashSet<&str> = headers.iter().map(|h| h.trim_start_matches('\u{feff}')).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(**col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(KpiError::Schema { missing })
    }
}

fn parse_row(row: RawRow) -> Result<SupplierRecord, KpiError> {
    let supplier = row
        .supplier
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| KpiError::invalid("", "supplier name is empty"))?
        .to_string();

    let pcs = match parse_count_safe(row.pcs.as_deref()) {
        Some(v) if v >= 0 => v as u64,
        Some(v) => {
            return Err(KpiError::invalid(
                supplier,
                format!("pcs must be >= 0, got {v}"),
            ))
        }
        None => {
            return Err(KpiError::invalid(
                supplier,
                format!(
                    "pcs is missing or not a whole number ({:?})",
                    row.pcs.as_deref().unwrap_or("")
                ),
            ))
        }
    };

    let field = |name: &str, value: Option<&str>| -> Result<f64, KpiError> {
        parse_f64_safe(value).ok_or_else(|| {
            KpiError::invalid(
                supplier.clone(),
                format!("{name} is missing or not a number ({:?})", value.unwrap_or("")),
            )
        })
    };

    let on_time_48h = field("on_time_48h", row.on_time_48h.as_deref())?;
    let bulk_lead_time_days = field("bulk_lead_time_days", row.bulk_lead_time_days.as_deref())?;
    let return_rate = field("return_rate", row.return_rate.as_deref())?;

    // `parse_f64_safe` already refuses non-finite cells.
    if bulk_lead_time_days <= 0.0 {
        return Err(KpiError::invalid(
            supplier,
            format!("bulk_lead_time_days must be > 0, got {bulk_lead_time_days}"),
        ));
    }

    Ok(SupplierRecord {
        supplier,
        pcs,
        on_time_48h,
        bulk_lead_time_days,
        return_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "supplier,pcs,on_time_48h,bulk_lead_time_days,return_rate\n";

    fn load(body: &str) -> Result<LoadedBatch, KpiError> {
        load_from_reader(Cursor::new(format!("{HEADER}{body}")), b',')
    }

    #[test]
    fn sample_batch_has_five_unique_suppliers() {
        let sample = sample_batch();
        assert_eq!(sample.records.len(), 5);
        assert_eq!(sample.report.source, DataSource::Sample);
        let names: HashSet<&str> = sample.records.iter().map(|r| r.supplier.as_str()).collect();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn missing_columns_are_listed_in_canonical_order() {
        let err = load_from_reader(Cursor::new("supplier,on_time_48h\nA,95\n"), b',').unwrap_err();
        match err {
            KpiError::Schema { missing } => assert_eq!(
                missing,
                vec!["pcs", "bulk_lead_time_days", "return_rate"]
            ),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let err = load_from_reader(
            Cursor::new("Supplier,pcs,on_time_48h,bulk_lead_time_days,return_rate\nA,1,95,6,5\n"),
            b',',
        )
        .unwrap_err();
        assert!(matches!(err, KpiError::Schema { missing } if missing == vec!["supplier"]));
    }

    #[test]
    fn extra_columns_and_column_order_do_not_matter() {
        let csv = "return_rate,note,supplier,bulk_lead_time_days,pcs,on_time_48h\n6.5,x,宇鑫布業,6.6,\"1,340\",95.0\n";
        let loaded = load_from_reader(Cursor::new(csv), b',').expect("loads");
        assert_eq!(
            loaded.records,
            vec![SupplierRecord {
                supplier: "宇鑫布業".to_string(),
                pcs: 1340,
                on_time_48h: 95.0,
                bulk_lead_time_days: 6.6,
                return_rate: 6.5,
            }]
        );
    }

    #[test]
    fn bad_rows_are_rejected_individually() {
        let loaded = load(
            "A,10,95,6.6,6.5\n\
             B,10,95,0,6.5\n\
             C,-3,95,6.6,6.5\n\
             D,10,,6.6,6.5\n\
             ,10,95,6.6,6.5\n\
             A,11,96,7,7\n\
             E,10,95,-1,6.5\n",
        )
        .expect("batch loads");

        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.report.total_rows, 7);
        let rows: Vec<Option<usize>> = loaded.report.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![Some(2), Some(3), Some(4), Some(5), Some(6), Some(7)]);
        assert!(loaded.report.rejected[0].reason.contains("bulk_lead_time_days"));
        assert!(loaded.report.rejected[1].reason.contains("pcs must be >= 0"));
        assert!(loaded.report.rejected[2].reason.contains("on_time_48h"));
        assert!(loaded.report.rejected[3].reason.contains("supplier name"));
        assert_eq!(loaded.report.rejected[4].reason, "duplicate supplier name");
    }

    #[test]
    fn header_only_file_is_an_empty_batch() {
        assert!(matches!(load(""), Err(KpiError::EmptyBatch)));
    }

    #[test]
    fn malformed_rows_are_a_source_format_error() {
        // Ragged row: more fields than the header.
        let err = load("A,10,95,6.6,6.5,extra,fields\n").unwrap_err();
        assert!(matches!(err, KpiError::SourceFormat { .. }), "got {err:?}");
    }

    #[test]
    fn tsv_files_use_tab_delimiter() {
        let tsv = "supplier\tpcs\ton_time_48h\tbulk_lead_time_days\treturn_rate\nA\t1\t95\t6\t5\n";
        let loaded = load_from_reader(Cursor::new(tsv), b'\t').expect("loads");
        assert_eq!(loaded.records[0].supplier, "A");
    }

    #[test]
    fn overflowing_number_cells_are_rejected_with_their_row() {
        let huge = format!("1{}", "0".repeat(400));
        let loaded = load(&format!(
            "A,10,95,6.6,6.5\n\
             B,-1,95,6.6,6.5\n\
             C,10,{huge},6.6,6.5\n\
             D,10,95,{huge},6.5\n"
        ))
        .expect("batch loads");

        let names: Vec<&str> = loaded.records.iter().map(|r| r.supplier.as_str()).collect();
        assert_eq!(names, vec!["A"]);
        let rejected: Vec<(Option<usize>, &str)> = loaded
            .report
            .rejected
            .iter()
            .map(|r| (r.row, r.supplier.as_str()))
            .collect();
        assert_eq!(rejected, vec![(Some(2), "B"), (Some(3), "C"), (Some(4), "D")]);
        assert!(loaded.report.rejected[1].reason.contains("on_time_48h"));
        assert!(loaded.report.rejected[2].reason.contains("bulk_lead_time_days"));
    }

    #[test]
    fn first_sheet_of_a_workbook_loads_like_csv() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/suppliers.xlsx");
        let loaded = load_from_path(path).expect("workbook loads");

        assert_eq!(loaded.report.source, DataSource::File(path.to_string()));
        assert_eq!(loaded.report.total_rows, 4);
        assert_eq!(
            loaded.records[0],
            SupplierRecord {
                supplier: "宇鑫布業".to_string(),
                pcs: 1340,
                on_time_48h: 95.0,
                bulk_lead_time_days: 6.6,
                return_rate: 6.5,
            }
        );
        assert_eq!(loaded.records.len(), 3);
        assert_eq!(loaded.report.rejected.len(), 1);
        assert_eq!(loaded.report.rejected[0].row, Some(4));
        assert!(loaded.report.rejected[0].reason.contains("bulk_lead_time_days"));
    }

    #[test]
    fn unknown_extensions_are_refused() {
        for path in ["suppliers.json", "suppliers"] {
            let err = load_from_path(path).unwrap_err();
            assert!(matches!(err, KpiError::SourceFormat { .. }), "{path}: {err:?}");
        }
    }

    #[test]
    fn unreadable_workbook_is_a_load_error() {
        let err = load_from_path("./does-not-exist.xlsx").unwrap_err();
        assert!(
            matches!(err, KpiError::SourceFormat { .. } | KpiError::Io(_)),
            "got {err:?}"
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_from_path("./does-not-exist.csv").unwrap_err();
        assert!(matches!(err, KpiError::Io(_)));
    }
}
