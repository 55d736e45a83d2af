//! headcount - find EPUB files with few or no headings

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use headcount::{Error, HeadingTally, Report, ScanOptions, scan};

#[derive(Parser)]
#[command(name = "headcount")]
#[command(version, about = "Find EPUB files with few or no headings", long_about = None)]
#[command(after_help = "EXAMPLES:
    headcount ~/books                  List EPUBs with 2 or fewer headings
    headcount --json ~/books           Report every EPUB as JSON
    headcount                          Ask for the folder, then scan it")]
struct Cli {
    /// Folder to scan recursively (prompted for when omitted)
    #[arg(value_name = "FOLDER")]
    folder: Option<PathBuf>,

    /// Print every scanned EPUB as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Log more detail to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let folder = match &cli.folder {
        Some(folder) => folder.clone(),
        None => prompt_folder()?,
    };
    let folder = absolute(&folder);

    let report = match scan(&folder, &ScanOptions::default()) {
        Ok(report) => report,
        Err(Error::NotADirectory(path)) => {
            eprintln!("Folder not found: {}", path.display());
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    let mut out = io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &JsonReport::from(&report))?;
        writeln!(out)?;
    } else {
        report.write_text(&mut out)?;
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,headcount={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn prompt_folder() -> anyhow::Result<PathBuf> {
    let mut stdout = io::stdout();
    write!(stdout, "Folder: ")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read folder from stdin")?;

    Ok(PathBuf::from(line.trim()))
}

/// Canonical path if it exists, otherwise made absolute without touching
/// the filesystem. An empty path is the current directory.
fn absolute(path: &Path) -> PathBuf {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[derive(Serialize)]
struct JsonReport {
    root: String,
    threshold: usize,
    archives: Vec<JsonArchive>,
}

#[derive(Serialize)]
struct JsonArchive {
    path: String,
    file_name: String,
    headings: Option<usize>,
    unknown: Option<String>,
    flagged: bool,
}

impl From<&Report> for JsonReport {
    fn from(report: &Report) -> Self {
        let archives = report
            .entries
            .iter()
            .map(|entry| JsonArchive {
                path: entry.path.display().to_string(),
                file_name: entry.file_name().into_owned(),
                headings: entry.tally.count(),
                unknown: match &entry.tally {
                    HeadingTally::Known(_) => None,
                    HeadingTally::Unknown(e) => Some(e.to_string()),
                },
                flagged: entry.tally.is_at_most(report.threshold),
            })
            .collect();

        JsonReport {
            root: report.root.display().to_string(),
            threshold: report.threshold,
            archives,
        }
    }
}
