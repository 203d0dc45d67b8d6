use crate::ranking::DEFAULT_TOP_N;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_LINES_PER_PAGE: usize = 48;
pub const MIN_LINES_PER_PAGE: usize = 10;

/// Top-level configuration, read once at start-up and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    /// Also write `supplier_report.pdf` next to the text report.
    pub export_pdf: bool,
    pub presentation: PresentationConfig,
    pub telemetry: TelemetryConfig,
}

/// Settings the dashboard and report renderers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationConfig {
    pub title: String,
    pub top_n: usize,
    pub lines_per_page: usize,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            title: "Supplier KPI Dashboard".to_string(),
            top_n: DEFAULT_TOP_N,
            lines_per_page: DEFAULT_LINES_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a whole number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be true or false, got '{value}'")]
    InvalidFlag { key: &'static str, value: String },
    #[error("{key} must be at least {min}, got {value}")]
    OutOfRange {
        key: &'static str,
        min: usize,
        value: usize,
    },
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let output_dir = env::var("SUPPLIER_KPI_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let top_n = read_usize("SUPPLIER_KPI_TOP_N", DEFAULT_TOP_N, 1)?;
        let lines_per_page = read_usize(
            "SUPPLIER_KPI_LINES_PER_PAGE",
            DEFAULT_LINES_PER_PAGE,
            MIN_LINES_PER_PAGE,
        )?;
        let export_pdf = read_bool("SUPPLIER_KPI_PDF", false)?;
        let log_level = env::var("SUPPLIER_KPI_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            output_dir,
            export_pdf,
            presentation: PresentationConfig {
                top_n,
                lines_per_page,
                ..PresentationConfig::default()
            },
            telemetry: TelemetryConfig { log_level },
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        output_dir: Option<PathBuf>,
        top_n: Option<usize>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(n) = top_n {
            self.presentation.top_n = check_min("--top", n, 1)?;
        }
        Ok(self)
    }
}

fn read_usize(key: &'static str, default: usize, min: usize) -> Result<usize, ConfigError> {
    match env::var(key) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidNumber { key, value: raw.clone() })?;
            check_min(key, value, min)
        }
        Err(_) => Ok(default),
    }
}

fn read_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key, value: raw }),
    }
}

fn check_min(key: &'static str, value: usize, min: usize) -> Result<usize, ConfigError> {
    if value < min {
        Err(ConfigError::OutOfRange { key, min, value })
    } else {
        Ok(value)
    }
}
