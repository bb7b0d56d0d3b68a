//! Binary for gatelock

#![warn(missing_docs)]

mod cmd;

use clap::Parser;

#[doc(hidden)]
fn main() {
    let cli = cmd::Cli::parse();

    let res = match cli.command {
        cmd::Commands::Lock(a) => a.run(),
        cmd::Commands::Show(a) => a.run(),
    };
    if let Err(e) = res {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
