//! The REPL command language.
//!
//! A line is parsed into a [`Command`] and executed against a [`Shell`], which
//! owns the workspace. Trees are referred to by their index in `show`, nodes
//! by their outline number within a tree.

use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use natded_core::syntax::parse;
use natded_core::{
    print_expr, Detached, Expr, History, Locale, NodeId, Notation, RuleCatalog, Storage,
    Substitution, Workspace,
};
use std::fmt::Write;
use tracing::debug;

use crate::config::Config;
use crate::output::format_parse_error;
use crate::render::{render_placed, render_rule, render_workspace, resolve};
use crate::storage::FileStorage;

/// A parsed REPL command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Goal(String),
    Axiom(String),
    Rule(String),
    Apply {
        code: String,
        tree: usize,
        node: usize,
        bindings: Option<String>,
    },
    Show(Option<usize>),
    Merge {
        source: usize,
        target: usize,
        node: usize,
        bindings: Option<String>,
    },
    Assume {
        tree: usize,
        owner: usize,
        goal: usize,
    },
    Detach {
        tree: usize,
        node: usize,
    },
    Specialize {
        tree: usize,
        bindings: String,
    },
    Move {
        tree: usize,
        x: f64,
        y: f64,
    },
    Delete(usize),
    Undo,
    Redo,
    Reset,
    Save(Option<String>),
    Load(Option<String>),
    Rules,
    Help,
    Exit,
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim_start()),
        None => (text, ""),
    }
}

fn take_number<'a>(rest: &'a str, what: &str) -> Result<(usize, &'a str)> {
    let (word, rest) = split_word(rest);
    if word.is_empty() {
        bail!("Missing {}", what);
    }
    let n = word
        .parse::<usize>()
        .with_context(|| format!("Invalid {} '{}'", what, word))?;
    Ok((n, rest))
}

fn take_coordinate<'a>(rest: &'a str, what: &str) -> Result<(f64, &'a str)> {
    let (word, rest) = split_word(rest);
    let n = word
        .parse::<f64>()
        .with_context(|| format!("Invalid {} '{}'", what, word))?;
    if !n.is_finite() {
        bail!("Invalid {} '{}' (must be a finite number)", what, word);
    }
    Ok((n, rest))
}

fn require_text<'a>(rest: &'a str, usage: &str) -> Result<&'a str> {
    let rest = rest.trim();
    if rest.is_empty() {
        bail!("Usage: {}", usage);
    }
    Ok(rest)
}

fn expect_end(rest: &str) -> Result<()> {
    let rest = rest.trim();
    if !rest.is_empty() {
        bail!("Unexpected '{}'", rest);
    }
    Ok(())
}

/// Optional trailing `with <bindings>`.
fn take_bindings(rest: &str) -> Result<Option<String>> {
    let (word, after) = split_word(rest);
    match word {
        "" => Ok(None),
        "with" => Ok(Some(require_text(after, "... with <meta> = <expr>; ...")?.to_string())),
        other => bail!("Unexpected '{}' (expected 'with')", other),
    }
}

fn optional_word(rest: &str) -> Option<String> {
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

impl Command {
    pub fn parse(line: &str) -> Result<Command> {
        let (word, rest) = split_word(line);
        let command = match word {
            "goal" | "g" => Command::Goal(require_text(rest, "goal <formula>")?.to_string()),
            "axiom" | "ax" => Command::Axiom(require_text(rest, "axiom <formula>")?.to_string()),
            "rule" | "r" => {
                let (code, rest) = split_word(require_text(rest, "rule <code>")?);
                expect_end(rest)?;
                Command::Rule(code.to_string())
            }
            "apply" | "a" => {
                let (code, rest) = split_word(require_text(rest, "apply <code> <tree> <node>")?);
                let (tree, rest) = take_number(rest, "tree index")?;
                let (node, rest) = take_number(rest, "node number")?;
                Command::Apply {
                    code: code.to_string(),
                    tree,
                    node,
                    bindings: take_bindings(rest)?,
                }
            }
            "show" | "s" | "ls" => {
                if rest.trim().is_empty() {
                    Command::Show(None)
                } else {
                    let (tree, rest) = take_number(rest, "tree index")?;
                    expect_end(rest)?;
                    Command::Show(Some(tree))
                }
            }
            "merge" | "m" => {
                let (source, rest) = take_number(rest, "source tree")?;
                let (target, rest) = take_number(rest, "target tree")?;
                let (node, rest) = take_number(rest, "goal number")?;
                Command::Merge {
                    source,
                    target,
                    node,
                    bindings: take_bindings(rest)?,
                }
            }
            "assume" => {
                let (tree, rest) = take_number(rest, "tree index")?;
                let (owner, rest) = take_number(rest, "discharging node")?;
                let (goal, rest) = take_number(rest, "goal number")?;
                expect_end(rest)?;
                Command::Assume { tree, owner, goal }
            }
            "detach" => {
                let (tree, rest) = take_number(rest, "tree index")?;
                let (node, rest) = take_number(rest, "node number")?;
                expect_end(rest)?;
                Command::Detach { tree, node }
            }
            "specialize" | "spec" => {
                let (tree, rest) = take_number(rest, "tree index")?;
                let bindings = require_text(rest, "specialize <tree> <meta> = <expr>; ...")?;
                Command::Specialize {
                    tree,
                    bindings: bindings.to_string(),
                }
            }
            "move" | "mv" => {
                let (tree, rest) = take_number(rest, "tree index")?;
                let (x, rest) = take_coordinate(rest, "x coordinate")?;
                let (y, rest) = take_coordinate(rest, "y coordinate")?;
                expect_end(rest)?;
                Command::Move { tree, x, y }
            }
            "delete" | "del" | "rm" => {
                let (tree, rest) = take_number(rest, "tree index")?;
                expect_end(rest)?;
                Command::Delete(tree)
            }
            "undo" | "u" => Command::Undo,
            "redo" => Command::Redo,
            "reset" => Command::Reset,
            "save" => Command::Save(optional_word(rest)),
            "load" => Command::Load(optional_word(rest)),
            "rules" => Command::Rules,
            "help" | "h" | "?" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "" => bail!("Empty command"),
            other => bail!("Unknown command '{}'. Type 'help' for a list.", other),
        };
        Ok(command)
    }

    /// Whether the command may change the workspace.
    pub fn is_edit(&self) -> bool {
        !matches!(
            self,
            Command::Show(_) | Command::Save(_) | Command::Rules | Command::Help | Command::Exit
        )
    }
}

/// What the REPL should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Output(String),
    Exit,
}

/// An interactive editing session over one workspace.
pub struct Shell {
    workspace: Workspace,
    locale: Locale,
    notation: Notation,
    storage: FileStorage,
    session_key: String,
    autosave: bool,
    history_limit: usize,
}

impl Shell {
    pub fn new(config: &Config, storage: FileStorage) -> Self {
        let history_limit = config.session.history_limit;
        let workspace = Workspace::new(RuleCatalog::filtered(&config.rules))
            .with_history(History::with_limit(history_limit));
        Shell {
            workspace,
            locale: config.locale,
            notation: config.notation,
            storage,
            session_key: config.session.key.clone(),
            autosave: config.session.autosave,
            history_limit,
        }
    }

    /// Start from a saved session; `reset` returns to it.
    pub fn open(&mut self, text: &str) -> Result<()> {
        let catalog = self.workspace.catalog().clone();
        self.workspace = Workspace::from_json(catalog, text)
            .context("Failed to read session")?
            .with_history(History::with_limit(self.history_limit));
        Ok(())
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn execute_line(&mut self, line: &str) -> Result<Outcome> {
        let command = Command::parse(line)?;
        self.execute(command)
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, "executing");
        let edit = command.is_edit();
        let outcome = self.dispatch(command)?;
        if edit && self.autosave {
            self.workspace
                .save(&mut self.storage, &self.session_key)
                .context("Autosave failed")?;
        }
        Ok(outcome)
    }

    fn formula(&self, text: &str) -> Result<Expr> {
        parse(text, self.locale).map_err(|e| anyhow!(format_parse_error(text, &e)))
    }

    /// `name = formula; ...` into a substitution over metavariables.
    fn bindings(&self, text: &str) -> Result<Substitution> {
        let mut sigma = Substitution::empty();
        for part in text.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (lhs, rhs) = part
                .split_once('=')
                .ok_or_else(|| anyhow!("Expected '<meta> = <formula>', found '{}'", part))?;
            let name = match self.formula(lhs.trim())? {
                Expr::MetaVariable(name) => name,
                other => bail!("'{}' is not a metavariable", other),
            };
            sigma.bind(name, self.formula(rhs.trim())?);
        }
        Ok(sigma)
    }

    fn optional_bindings(&self, text: Option<&str>) -> Result<Substitution> {
        text.map_or_else(|| Ok(Substitution::empty()), |t| self.bindings(t))
    }

    fn node(&self, tree: usize, number: usize) -> Result<NodeId> {
        let t = self.workspace.tree(tree)?;
        resolve(t, number).ok_or_else(|| anyhow!("Tree [{}] has no node {}", tree, number))
    }

    fn show(&self, index: usize) -> Result<String> {
        Ok(render_placed(
            index,
            self.workspace.placed(index)?,
            self.notation,
        ))
    }

    fn merged(&self, index: usize, complete: bool) -> Result<String> {
        let mut out = self.show(index)?;
        if complete {
            out.push_str(&format!("{} Proof complete\n", "✓".green().bold()));
        }
        Ok(out)
    }

    fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        let text = match command {
            Command::Goal(text) => {
                let expr = self.formula(&text)?;
                let index = self.workspace.add_goal(expr);
                self.show(index)?
            }
            Command::Axiom(text) => {
                let expr = self.formula(&text)?;
                let index = self.workspace.add_axiom(expr);
                self.show(index)?
            }
            Command::Rule(code) => {
                let index = self.workspace.add_rule(&code)?;
                self.show(index)?
            }
            Command::Apply {
                code,
                tree,
                node,
                bindings,
            } => {
                let goal = self.node(tree, node)?;
                let choices = self.optional_bindings(bindings.as_deref())?;
                match self.workspace.apply_rule(&code, tree, goal, &choices)? {
                    Some(outcome) => self.merged(outcome.index, outcome.complete)?,
                    None => format!("Rule '{}' does not match goal {} of [{}]\n", code, node, tree),
                }
            }
            Command::Show(Some(index)) => self.show(index)?,
            Command::Show(None) => render_workspace(self.workspace.items(), self.notation),
            Command::Merge {
                source,
                target,
                node,
                bindings,
            } => {
                let goal = self.node(target, node)?;
                let choices = self.optional_bindings(bindings.as_deref())?;
                match self.workspace.merge(source, target, goal, &choices)? {
                    Some(outcome) => self.merged(outcome.index, outcome.complete)?,
                    None => format!(
                        "[{}] does not match goal {} of [{}]\n",
                        source, node, target
                    ),
                }
            }
            Command::Assume { tree, owner, goal } => {
                let owner_id = self.node(tree, owner)?;
                let goal_id = self.node(tree, goal)?;
                match self.workspace.merge_assumption(tree, owner_id, goal_id)? {
                    Some(outcome) => self.merged(outcome.index, outcome.complete)?,
                    None => format!(
                        "The hypothesis of node {} does not match goal {}\n",
                        owner, goal
                    ),
                }
            }
            Command::Detach { tree, node } => {
                let id = self.node(tree, node)?;
                match self.workspace.detach(tree, id)? {
                    Detached::Subtree { index } => {
                        format!("{}\n{}", self.show(tree)?, self.show(index)?)
                    }
                    Detached::Assumption { expr } => format!(
                        "Assumption [{}] reopened as a goal\n{}",
                        print_expr(&expr, self.notation),
                        self.show(tree)?
                    ),
                }
            }
            Command::Specialize { tree, bindings } => {
                let sigma = self.bindings(&bindings)?;
                self.workspace.specialize(tree, &sigma)?;
                self.show(tree)?
            }
            Command::Move { tree, x, y } => {
                self.workspace.move_to(tree, x, y)?;
                self.show(tree)?
            }
            Command::Delete(index) => {
                self.workspace.delete(index)?;
                format!("Deleted [{}]\n", index)
            }
            Command::Undo => {
                if self.workspace.undo() {
                    render_workspace(self.workspace.items(), self.notation)
                } else {
                    "Nothing to undo\n".to_string()
                }
            }
            Command::Redo => {
                if self.workspace.redo() {
                    render_workspace(self.workspace.items(), self.notation)
                } else {
                    "Nothing to redo\n".to_string()
                }
            }
            Command::Reset => {
                self.workspace.reset();
                render_workspace(self.workspace.items(), self.notation)
            }
            Command::Save(key) => {
                let key = key.unwrap_or_else(|| self.session_key.clone());
                let json = self.workspace.to_document_json()?;
                self.storage.write(&key, &json)?;
                format!("Saved to {}\n", self.storage.path_for(&key).display())
            }
            Command::Load(key) => {
                let key = key.unwrap_or_else(|| self.session_key.clone());
                if !self.workspace.load(&self.storage, &key)? {
                    bail!("No session at {}", self.storage.path_for(&key).display());
                }
                format!(
                    "Loaded {} trees from {}\n",
                    self.workspace.len(),
                    self.storage.path_for(&key).display()
                )
            }
            Command::Rules => {
                let mut out = String::new();
                for rule in self.workspace.catalog().iter() {
                    writeln!(out, "{}", render_rule(rule, self.notation))?;
                }
                out
            }
            Command::Help => HELP.to_string(),
            Command::Exit => return Ok(Outcome::Exit),
        };
        Ok(Outcome::Output(text))
    }
}

pub const HELP: &str = "\
Trees:
  goal <formula>                       Add an open goal
  axiom <formula>                      Add an axiom
  rule <code>                          Add a fresh instance of a rule
  show [tree]                          Show the workspace or one tree
  move <tree> <x> <y>                  Move a tree
  delete <tree>                        Delete a tree
Proving:
  apply <code> <tree> <goal> [with …]  Apply a rule to an open goal
  merge <src> <dst> <goal> [with …]    Drop tree <src> onto a goal of <dst>
  assume <tree> <node> <goal>          Close a goal with the hypothesis node discharges
  detach <tree> <node>                 Cut out a subtree or reopen an assumption
  specialize <tree> <bindings>         Replace metavariables, e.g. a = P & Q; b = R
Session:
  undo, redo, reset                    History
  save [file], load [file]             Persist the workspace
  rules                                List the enabled rules
  help, exit
";

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> (Shell, tempfile::TempDir) {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let shell = Shell::new(&Config::default(), FileStorage::new(dir.path()));
        (shell, dir)
    }

    fn run(shell: &mut Shell, line: &str) -> String {
        match shell.execute_line(line).unwrap() {
            Outcome::Output(text) => text,
            Outcome::Exit => panic!("unexpected exit"),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("goal P & Q").unwrap(),
            Command::Goal("P & Q".to_string())
        );
        assert_eq!(
            Command::parse("apply andE2 0 3 with a = P").unwrap(),
            Command::Apply {
                code: "andE2".to_string(),
                tree: 0,
                node: 3,
                bindings: Some("a = P".to_string()),
            }
        );
        assert_eq!(
            Command::parse("  merge 1 0 2 ").unwrap(),
            Command::Merge {
                source: 1,
                target: 0,
                node: 2,
                bindings: None,
            }
        );
        assert_eq!(Command::parse("show").unwrap(), Command::Show(None));
        assert_eq!(Command::parse("save").unwrap(), Command::Save(None));
        assert_eq!(Command::parse("q").unwrap(), Command::Exit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("goal").is_err());
        assert!(Command::parse("move 0 nan 1").is_err());
        assert!(Command::parse("move 0 1 -inf").is_err());
        assert!(Command::parse("merge 1 x 2").is_err());
        assert!(Command::parse("apply andI 0 1 using a = P").is_err());
        assert!(Command::parse("delete 0 1").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn test_prove_identity() {
        let (mut shell, _dir) = shell();
        let out = run(&mut shell, "goal P => P");
        assert!(out.contains("? P ⇒ P"));

        run(&mut shell, "apply implI 0 1");
        let out = run(&mut shell, "assume 0 1 2");
        assert!(out.contains("Proof complete"));
        assert!(shell.workspace().is_complete(0).unwrap());
    }

    #[test]
    fn test_merge_with_choices() {
        let (mut shell, _dir) = shell();
        run(&mut shell, "goal Q");
        run(&mut shell, "rule andE2");
        let out = run(&mut shell, "merge 1 0 1 with a = P");
        assert!(out.contains("? P ⋀ Q"));
        assert_eq!(shell.workspace().len(), 1);
    }

    #[test]
    fn test_apply_with_choices_on_shared_names() {
        let (mut shell, _dir) = shell();
        run(&mut shell, "rule implI");
        let out = run(&mut shell, "apply andE1 0 2 with b = Q");
        assert!(out.contains("a ⇒ b"));
        assert!(out.contains("? b ⋀ Q"));
        assert!(shell.execute_line("apply andE1 0 3 with c = Q").is_err());
    }

    #[test]
    fn test_rejected_merge_reports_and_keeps_state() {
        let (mut shell, _dir) = shell();
        run(&mut shell, "goal P");
        run(&mut shell, "axiom Q");
        let out = run(&mut shell, "merge 1 0 1");
        assert!(out.contains("does not match"));
        assert_eq!(shell.workspace().len(), 2);
    }

    #[test]
    fn test_specialize_and_bindings() {
        let (mut shell, _dir) = shell();
        run(&mut shell, "rule andI");
        let out = run(&mut shell, "specialize 0 a = P | R; ?b = ~S");
        assert!(out.contains("(P ⋁ R) ⋀ ¬S"));

        assert!(shell.execute_line("specialize 0 P = Q").is_err());
        assert!(shell.execute_line("specialize 0 a").is_err());
    }

    #[test]
    fn test_detach_and_undo() {
        let (mut shell, _dir) = shell();
        run(&mut shell, "goal P & Q");
        run(&mut shell, "apply andI 0 1");
        let out = run(&mut shell, "detach 0 1");
        assert!(out.contains("[1]"));
        assert_eq!(shell.workspace().len(), 2);
        run(&mut shell, "undo");
        assert_eq!(shell.workspace().len(), 1);
        assert_eq!(run(&mut shell, "redo").matches("[1]").count(), 1);
    }

    #[test]
    fn test_errors_surface() {
        let (mut shell, _dir) = shell();
        assert!(shell.execute_line("goal P &").is_err());
        assert!(shell.execute_line("rule nosuch").is_err());
        assert!(shell.execute_line("show 4").is_err());
        run(&mut shell, "goal P");
        let err = shell.execute_line("apply andI 0 9").unwrap_err();
        assert!(err.to_string().contains("no node 9"));
    }

    #[test]
    fn test_save_and_load_files() {
        let (mut shell, dir) = shell();
        run(&mut shell, "goal P => Q");
        let out = run(&mut shell, "save lecture");
        assert!(out.contains("lecture.ndp"));
        assert!(dir.path().join("lecture.ndp").exists());

        run(&mut shell, "delete 0");
        let out = run(&mut shell, "load lecture");
        assert!(out.contains("Loaded 1 trees"));
        assert!(shell.execute_line("load missing").is_err());
    }

    #[test]
    fn test_autosave() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.session.autosave = true;
        config.session.key = "auto".to_string();
        let mut shell = Shell::new(&config, FileStorage::new(dir.path()));
        shell.execute_line("goal P").unwrap();
        assert!(dir.path().join("auto.ndp").exists());
    }

    #[test]
    fn test_filtered_rules() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.rules.exclude = vec!["tnd".to_string()];
        let mut shell = Shell::new(&config, FileStorage::new(dir.path()));
        let out = run(&mut shell, "rules");
        assert!(out.contains("andI"));
        assert!(!out.contains("tnd"));
        let err = shell.execute_line("rule tnd").unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_exit() {
        let (mut shell, _dir) = shell();
        assert_eq!(shell.execute_line("exit").unwrap(), Outcome::Exit);
    }
}
