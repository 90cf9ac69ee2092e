use std::{env, fs, process::ExitCode};

use lodestone::{run_source, SourceBuffer};

const USAGE: &str = "usage: lodestone [-h] [-v] [-ep <text>] [<path>]";
const VERSION: &str = concat!("lodestone ", env!("CARGO_PKG_VERSION"));

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("-h") => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Some("-v") => {
            println!("{VERSION}");
            return ExitCode::SUCCESS;
        }
        Some("-ep") => {
            let Some(text) = args.get(1) else {
                eprintln!("-ep requires an argument\n{USAGE}");
                return ExitCode::FAILURE;
            };
            return evaluate(SourceBuffer::new("", "cli", "sysmel", text.as_str()));
        }
        Some(path) => return evaluate(match read_file(path) {
            Ok(text) => SourceBuffer::new("", path, "sysmel", text),
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        }),
        None => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    }
}

fn evaluate(buffer: std::rc::Rc<SourceBuffer>) -> ExitCode {
    match run_source(buffer) {
        Ok(value) => {
            println!("{}", value.print_string());
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("reading {path}: {err}"))
}
