//! natded - interactive natural deduction proof editor

use clap::Parser;
use natded_cli::{cli::Cli, output::print_error, run};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            print_error(&format!("{:#}", e));
            1
        }
    };
    let _ = std::io::stdout().flush();
    std::process::exit(code);
}
