//! Interactive REPL mode for the natded CLI

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{Config as EditorConfig, DefaultEditor};
use std::path::PathBuf;

use crate::config::Config;
use crate::output::{print_error, print_header};
use crate::shell::{Outcome, Shell};

pub struct Repl {
    shell: Shell,
    config: Config,
    history_path: PathBuf,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(config: Config, shell: Shell) -> Result<Self> {
        let history_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(&config.repl.history_file);

        let editor_config = EditorConfig::builder()
            .max_history_size(config.repl.max_history)?
            .auto_add_history(true)
            .build();
        let mut editor = DefaultEditor::with_config(editor_config)?;

        // Load history if it exists
        if history_path.exists() {
            let _ = editor.load_history(&history_path);
        }

        Ok(Self {
            shell,
            config,
            history_path,
            editor,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        print_header("natded proof editor");
        println!("Type 'help' for available commands, 'exit' to quit\n");

        loop {
            let readline = self.editor.readline(&self.config.repl.prompt);

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }

                    match self.shell.execute_line(line) {
                        Ok(Outcome::Output(text)) => print!("{}", text),
                        Ok(Outcome::Exit) => break,
                        Err(e) => print_error(&format!("{:#}", e)),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    print_error(&format!("Read error: {}", err));
                    break;
                }
            }
        }

        // Save history
        if self.config.repl.auto_save {
            let _ = self.editor.save_history(&self.history_path);
        }

        println!("\nGoodbye!");
        Ok(())
    }
}
