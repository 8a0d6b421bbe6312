//! CLI tool for inventory-reports - builds reports from API payloads
//!
//! Usage:
//!   inventory_reports_cli pdf <entity> <records.json> [options]
//!   inventory_reports_cli xlsx <entity> <records.json> [options]
//!   inventory_reports_cli inspect <report.xlsx>
//!
//! Options:
//!   -o <path>           Output file (default: the report's download name)
//!   --logo <path>       PNG or JPEG logo (overrides the config's logo)
//!   --config <path>     JSON export configuration
//!   --filter <tab>      all | active | inactive (default: all)
//!
//! Entities: equipment_type, department, inventory. Set RUST_LOG for logs.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::path::PathBuf;

use inventory_reports::cell_ref::cell_address;
use inventory_reports::config::ExportConfig;
use inventory_reports::entity::{EntityKind, StatusFilter};
use inventory_reports::logo::LogoImage;
use inventory_reports::report::{render_report, ReportFormat};
use inventory_reports::xlsx::reader::read_workbook;

const USAGE: &str = "Usage: inventory_reports_cli <pdf|xlsx> <entity> <records.json> \
[-o out] [--logo path] [--config path] [--filter all|active|inactive]\n       \
inventory_reports_cli inspect <report.xlsx>";

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

struct ExportArgs {
    format: ReportFormat,
    kind: EntityKind,
    input: PathBuf,
    output: Option<PathBuf>,
    logo: Option<PathBuf>,
    config: Option<PathBuf>,
    filter: StatusFilter,
}

fn parse_export_args(format: ReportFormat, args: &[String]) -> ExportArgs {
    if args.len() < 2 {
        fail(USAGE);
    }
    let kind = EntityKind::parse(&args[0])
        .unwrap_or_else(|| fail(&format!("Unknown entity: {}", args[0])));
    let mut parsed = ExportArgs {
        format,
        kind,
        input: PathBuf::from(&args[1]),
        output: None,
        logo: None,
        config: None,
        filter: StatusFilter::All,
    };

    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        let value = rest
            .next()
            .unwrap_or_else(|| fail(&format!("Missing value for {flag}")));
        match flag.as_str() {
            "-o" | "--output" => parsed.output = Some(PathBuf::from(value)),
            "--logo" => parsed.logo = Some(PathBuf::from(value)),
            "--config" => parsed.config = Some(PathBuf::from(value)),
            "--filter" => {
                parsed.filter = StatusFilter::parse(value)
                    .unwrap_or_else(|| fail(&format!("Unknown filter: {value}")));
            }
            _ => fail(&format!("Unknown option: {flag}\n{USAGE}")),
        }
    }
    parsed
}

fn export(args: ExportArgs) {
    let config = match &args.config {
        Some(path) => ExportConfig::load(path)
            .unwrap_or_else(|e| fail(&format!("Error loading config {}: {e}", path.display()))),
        None => ExportConfig::default(),
    };

    let logo = match args.logo.as_ref().or(config.logo.as_ref()) {
        Some(path) => {
            let bytes = fs::read(path)
                .unwrap_or_else(|e| fail(&format!("Error reading logo {}: {e}", path.display())));
            Some(
                LogoImage::from_bytes(bytes)
                    .unwrap_or_else(|e| fail(&format!("Error in logo {}: {e}", path.display()))),
            )
        }
        None => None,
    };

    let payload = fs::read_to_string(&args.input)
        .unwrap_or_else(|e| fail(&format!("Error reading {}: {e}", args.input.display())));

    let now = chrono::Local::now().naive_local();
    let report = render_report(
        args.format,
        args.kind,
        &payload,
        args.filter,
        logo.as_ref(),
        &config,
        now,
    )
    .unwrap_or_else(|e| fail(&format!("Error building report: {e}")));

    let output = args.output.unwrap_or_else(|| PathBuf::from(&report.filename));
    if let Err(e) = fs::write(&output, &report.bytes) {
        fail(&format!("Error writing {}: {e}", output.display()));
    }
    eprintln!("Written: {} ({} bytes)", output.display(), report.bytes.len());
}

fn inspect(path: &str) {
    let data = fs::read(path).unwrap_or_else(|e| fail(&format!("Error reading {path}: {e}")));
    let workbook =
        read_workbook(&data).unwrap_or_else(|e| fail(&format!("Error reading XLSX: {e}")));

    for sheet in &workbook.sheets {
        println!("Sheet: {}", sheet.name);
        println!("  frozen rows: {}", sheet.frozen_rows);
        println!("  merges: {}", sheet.merges.join(", "));
        println!("  logo: {}", if sheet.has_drawing { "yes" } else { "no" });
        for (col, row, cell) in sheet.cells_by_row() {
            if cell.text.is_empty() {
                continue;
            }
            let mut marks = Vec::new();
            if let Some(font) = workbook.font(cell) {
                if font.bold {
                    marks.push("bold".to_string());
                }
                if let Some(color) = &font.color {
                    marks.push(color.clone());
                }
            }
            if marks.is_empty() {
                println!("  {:<6} {}", cell_address(col, row), cell.text);
            } else {
                println!("  {:<6} {}  [{}]", cell_address(col, row), cell.text, marks.join(", "));
            }
        }
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        fail(USAGE);
    }

    match args[1].as_str() {
        "inspect" => inspect(&args[2]),
        command => {
            let format = ReportFormat::parse(command)
                .unwrap_or_else(|| fail(&format!("Unknown command: {command}\n{USAGE}")));
            export(parse_export_args(format, &args[2..]));
        }
    }
}
