//! CLI tool for roster download and CSV extraction

use pharmacy_roster::{extract_records, pipeline, ROSTER_URL};
use std::env;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() > 2 || args.get(1).map(|a| a == "--help" || a == "-h").unwrap_or(false) {
        eprintln!("Usage: {} [pdf_file]", args[0]);
        eprintln!();
        eprintln!("With no arguments, downloads the current community pharmacy");
        eprintln!("roster and writes date-stamped files under pdf/ and data/.");
        eprintln!("With a path, parses a local roster PDF and writes the CSV");
        eprintln!("next to it.");
        process::exit(1);
    }

    match args.get(1) {
        None => {
            match pipeline::run(ROSTER_URL, Path::new("pdf"), Path::new("data")) {
                Ok(summary) => {
                    println!("Downloaded PDF to: {}", summary.pdf_path.display());
                    println!(
                        "Extracted {} records from {} pages ({} rows skipped)",
                        summary.records, summary.pages, summary.skipped_rows
                    );
                    println!("Saved CSV to: {}", summary.csv_path.display());
                    if summary.records == 0 {
                        eprintln!("Warning: output is empty");
                        process::exit(2);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        Some(pdf_file) => {
            let pdf_path = Path::new(pdf_file);
            let csv_path = pdf_path.with_extension("csv");

            match extract_records(pdf_path)
                .and_then(|(records, skipped)| {
                    pipeline::write_csv(&records, &csv_path)?;
                    Ok((records.len(), skipped))
                }) {
                Ok((records, skipped)) => {
                    println!("Extracted {} records ({} rows skipped)", records, skipped);
                    println!("Saved CSV to: {}", csv_path.display());
                    if records == 0 {
                        eprintln!("Warning: output is empty");
                        process::exit(2);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}
