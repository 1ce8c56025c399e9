//! natded CLI Library
//!
//! Terminal front-end for the natded-core proof engine. The binary is a thin
//! wrapper around [`run`]; the pieces are public so the REPL command language
//! and rendering can be driven from Rust code and tests.
//!
//! # Module Overview
//!
//! - [`cli`]: clap argument definitions
//! - [`config`]: `.natdedrc` configuration
//! - [`shell`]: REPL command language over a workspace
//! - [`repl`]: rustyline front-end for the shell
//! - [`render`]: outline rendering of proof trees
//! - [`storage`]: file-backed session storage
//! - [`output`]: colored messages

pub mod cli;
pub mod config;
pub mod output;
pub mod render;
pub mod repl;
pub mod shell;
pub mod storage;

use anyhow::{Context, Result};
use clap::CommandFactory;
use natded_core::syntax::parse;
use natded_core::{parse_session, print_expr, Notation, RuleCatalog};
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands, ConfigCommand};
use config::Config;
use output::{enable_colors, format_parse_error, print_header, print_info, print_success};
use render::{render_placed, render_rule};
use repl::Repl;
use shell::Shell;
use storage::FileStorage;

/// Exit code of `check` when some proof still has open goals.
pub const EXIT_INCOMPLETE: i32 = 2;

/// Install the stderr log subscriber.
///
/// `--log-level` wins over `RUST_LOG`; without either only warnings show.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

/// Configuration from file (unless disabled) with command-line overrides.
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if cli.no_config {
        Config::default()
    } else {
        Config::load_default()?
    };

    if cli.no_color {
        config.colored = false;
    }
    if cli.ascii {
        config.notation = Notation::Ascii;
    }
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    if !cli.include_rules.is_empty() {
        config.rules.include = Some(cli.include_rules.clone());
    }
    config.rules.exclude.extend(cli.exclude_rules.iter().cloned());

    Ok(config)
}

/// Run the CLI. Returns the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    init_logging(cli.log_level.as_deref())?;
    let config = resolve_config(&cli)?;
    enable_colors(config.colored);

    match &cli.command {
        None => repl_mode(config, None),
        Some(Commands::Repl { file }) => repl_mode(config, file.as_deref()),
        Some(Commands::Check { file }) => check_file(&config, file),
        Some(Commands::Parse { expr, json }) => {
            parse_formula(&config, expr, *json)?;
            Ok(0)
        }
        Some(Commands::Rules) => {
            list_rules(&config);
            Ok(0)
        }
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "natded", &mut std::io::stdout());
            Ok(0)
        }
        Some(Commands::Config { command }) => {
            handle_config_command(command, &config)?;
            Ok(0)
        }
    }
}

fn storage_for(config: &Config) -> FileStorage {
    match &config.session.data_dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default(),
    }
}

fn repl_mode(config: Config, file: Option<&Path>) -> Result<i32> {
    let mut shell = Shell::new(&config, storage_for(&config));
    if let Some(path) = file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        shell.open(&text)?;
    }
    let mut repl = Repl::new(config, shell)?;
    repl.run()?;
    Ok(0)
}

fn check_file(config: &Config, path: &Path) -> Result<i32> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    let items = parse_session(&text)
        .with_context(|| format!("Invalid session file: {}", path.display()))?;

    print_header(&format!("Checking: {}", path.display()));
    for (i, placed) in items.iter().enumerate() {
        print!("{}", render_placed(i, placed, config.notation));
    }

    let complete = items.iter().filter(|p| p.tree.is_complete()).count();
    let summary = format!("{} of {} proofs complete", complete, items.len());
    if complete == items.len() {
        print_success(&summary);
        Ok(0)
    } else {
        print_info(&summary);
        Ok(EXIT_INCOMPLETE)
    }
}

fn parse_formula(config: &Config, text: &str, json: bool) -> Result<()> {
    let expr = parse(text, config.locale)
        .map_err(|e| anyhow::anyhow!(format_parse_error(text, &e)))
        .context("Failed to parse formula")?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&expr).context("Failed to serialize to JSON")?
        );
    } else {
        println!("{}", print_expr(&expr, config.notation));
    }
    Ok(())
}

fn list_rules(config: &Config) {
    let catalog = RuleCatalog::filtered(&config.rules);
    if catalog.is_empty() {
        print_info("No rules enabled");
        return;
    }
    for rule in catalog.iter() {
        println!("{}", render_rule(rule, config.notation));
    }
}

fn handle_config_command(command: &ConfigCommand, config: &Config) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        ConfigCommand::Path => {
            let path = Config::config_path();
            println!("{}", path.display());
        }
        ConfigCommand::Init => {
            let path = Config::create_default()?;
            print_success(&format!("Created config file: {}", path.display()));
        }
    }

    Ok(())
}
