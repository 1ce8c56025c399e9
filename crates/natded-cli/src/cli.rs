//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use natded_core::Locale;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "natded")]
#[command(author, version, about = "Interactive natural deduction proof editor", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print formulas with ASCII connectives
    #[arg(long, global = true)]
    pub ascii: bool,

    /// Keyword language for formula input (en, fr, de)
    #[arg(long, global = true)]
    pub locale: Option<Locale>,

    /// Only enable these rules (can be specified multiple times)
    #[arg(long = "include-rule", value_name = "CODE", global = true)]
    pub include_rules: Vec<String>,

    /// Disable these rules (can be specified multiple times)
    #[arg(long = "exclude-rule", value_name = "CODE", global = true)]
    pub exclude_rules: Vec<String>,

    /// Don't load configuration file
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Log filter, e.g. `debug` or `natded_core=trace` (overrides RUST_LOG)
    #[arg(long, value_name = "FILTER", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive proof editor (default)
    Repl {
        /// Session file to open
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Check a session file and report which proofs are complete
    Check {
        /// Session file (.ndp)
        file: PathBuf,
    },

    /// Parse a formula and print its canonical form
    Parse {
        /// Formula text
        expr: String,

        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the enabled inference rules
    Rules,

    /// Generate shell completion scripts
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Initialize default configuration file
    Init,
}
