// Entry point and high-level CLI flow.
//
// `--batch` runs load -> analyse -> render -> write once and exits. Without
// it the interactive menu runs:
// - Option [1] loads a CSV/TSV file (or the sample data) and reports what
//   was skipped.
// - Option [2] renders the dashboard and writes the report files.
// - After generating reports, the user can go back to the menu or exit.
// - End of input (Ctrl-D or a closed pipe) leaves the menu at any prompt.
use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use supplier_kpi::config::AppConfig;
use supplier_kpi::loader::{self, LoadedBatch};
use supplier_kpi::{analyze, output, telemetry, util};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "supplier-kpi",
    about = "Score, rank and report on supplier KPIs from a CSV/TSV file or the built-in sample",
    version
)]
struct Cli {
    /// Supplier data file (.csv, .tsv, .xlsx, .xls or .ods). Uses the built-in
    /// sample when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Directory for the CSV, JSON and report outputs
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Number of suppliers in the recommended list
    #[arg(long)]
    top: Option<usize>,
    /// Also export the report as PDF
    #[arg(long)]
    pdf: bool,
    /// Run once without the interactive menu
    #[arg(long)]
    batch: bool,
}

// Session state for the interactive menu, owned by `run_menu`.
struct Session {
    config: AppConfig,
    data: Option<LoadedBatch>,
}

/// Next trimmed line from `reader`, or `None` once input is exhausted or
/// unreadable.
fn read_answer<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Read a single line of input after printing `prompt`.
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();
    read_answer(&mut io::stdin().lock())
}

/// Ask whether to go back to the report selection menu.
///
/// Returns `true` for `Y`, `false` for `N` or end of input.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(answer) = read_line("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn load(input: Option<&PathBuf>) -> Result<LoadedBatch, Box<dyn Error>> {
    let loaded = match input {
        Some(path) => loader::load_from_path(path)?,
        None => {
            info!("no input file selected; using sample data");
            loader::sample_batch()
        }
    };

    let report = &loaded.report;
    println!(
        "Processing dataset... ({} rows read, {} usable) from {}",
        util::format_int(report.total_rows),
        util::format_int(report.loaded_rows),
        report.source.describe()
    );
    output::print_rejected(&report.rejected);
    Ok(loaded)
}

fn generate(loaded: LoadedBatch, config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let analysis = analyze(loaded, &config.presentation, Local::now().naive_local())?;

    output::print_dashboard(&analysis.dashboard);

    let lines_per_page = config.presentation.lines_per_page;
    let report_text = analysis.report.render(lines_per_page);
    let mut written = output::write_outputs(&config.output_dir, &analysis.dashboard, &report_text)?;
    if config.export_pdf {
        written.push(output::write_pdf(&config.output_dir, &analysis.report, lines_per_page)?);
    }
    println!("Outputs saved:");
    for path in &written {
        println!("  {}", path.display());
    }
    println!();
    output::print_rejected(&analysis.rejected);
    Ok(())
}

fn handle_load(session: &mut Session) {
    let Some(answer) = read_line("Data file (.csv/.tsv/.xlsx, blank for sample data): ") else {
        return;
    };
    let input = (!answer.is_empty()).then(|| PathBuf::from(answer));
    match load(input.as_ref()) {
        Ok(loaded) => session.data = Some(loaded),
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

fn handle_generate_reports(session: &Session) {
    let Some(data) = session.data.clone() else {
        println!("Error: No data loaded. Please load a file first (option 1).\n");
        return;
    };
    if let Err(e) = generate(data, &session.config) {
        eprintln!("Report generation failed: {}\n", e);
    }
}

fn run_menu(mut session: Session) {
    loop {
        println!("Supplier KPI Dashboard:");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_line("Enter choice: ") else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut session),
            "2" => {
                println!();
                handle_generate_reports(&session);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?.with_overrides(cli.output_dir, cli.top)?;
    config.export_pdf |= cli.pdf;
    telemetry::init(&config.telemetry)?;

    if cli.batch {
        let loaded = load(cli.input.as_ref())?;
        return generate(loaded, &config);
    }

    // A file given on the command line is preloaded into the menu session.
    let data = match cli.input {
        Some(path) => Some(load(Some(&path))?),
        None => None,
    };
    run_menu(Session { config, data });
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
