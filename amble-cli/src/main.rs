//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = amble_cli::run() {
        eprintln!("amble: {err}");
        std::process::exit(1);
    }
}
