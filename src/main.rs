//! Tabula - a spreadsheet computation engine with a line-oriented shell

mod repl;

use std::env;
use std::fs;
use std::path::PathBuf;

use tabula_core::{ImportOptions, Sheet};

fn print_usage() {
    eprintln!("Usage: tabula [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                 CSV file to load on startup");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <CMD>    Run a shell command and exit (can be repeated)");
    eprintln!("  -h, --help             Print help");
    eprintln!();
    eprintln!("Without -c, tabula reads commands interactively from stdin.");
    eprintln!("Type 'help' at the prompt for the command list.");
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut file_path: Option<PathBuf> = None;
    let mut commands: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a value");
                    std::process::exit(1);
                }
                commands.push(args[i].to_string());
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if file_path.is_none() {
                    file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    let mut sheet = Sheet::new();
    if let Some(path) = &file_path {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: cannot read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        };
        if let Err(e) = sheet.import_plain_text(&text, &ImportOptions::default()) {
            eprintln!("Error: cannot import {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    if commands.is_empty() {
        if let Err(e) = repl::run(&mut sheet) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    for command in &commands {
        match repl::execute(&mut sheet, command) {
            Ok(repl::Reply::Text(text)) => println!("{}", text),
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
