use clap::{Arg, Command};
use metric::runner;
use std::fs;
use std::path::Path;

fn main() {
    let matches = Command::new("metric")
        .about("The Metric programming language interpreter")
        .arg(
            Arg::new("file")
                .help("Metric source file to execute (.metric extension required)")
                .value_name("FILE")
                .index(1),
        )
        .get_matches();

    match matches.get_one::<String>("file") {
        Some(file_path) => run_file(file_path),
        None => {
            eprintln!("Usage: metric <file.metric>");
            std::process::exit(1);
        }
    }
}

fn run_file(path_str: &str) {
    if !path_str.ends_with(".metric") {
        eprintln!(
            "\x1b[31mError: File '{}' does not have .metric extension\x1b[0m",
            path_str
        );
        eprintln!("Metric programs should use the .metric file extension");
        std::process::exit(1);
    }

    let path = Path::new(path_str);
    if !path.exists() {
        eprintln!("\x1b[31mError: File '{}' not found\x1b[0m", path_str);
        std::process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            if !runner::run(&source, Some(path_str)) {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("\x1b[31mError reading file '{}': {}\x1b[0m", path_str, e);
            std::process::exit(1);
        }
    }
}
