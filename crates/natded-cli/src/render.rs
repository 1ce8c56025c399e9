//! Text rendering of proof trees.
//!
//! Each tree prints as an indented outline, conclusion first, premises below.
//! Lines are numbered in pre-order starting at 1; those numbers are how REPL
//! commands refer to nodes.

use colored::*;
use natded_core::{print_expr, Node, NodeId, Notation, Placed, ProofTree, Rule};
use std::fmt::Write;

/// Node id for outline number `number` of `tree`.
pub fn resolve(tree: &ProofTree, number: usize) -> Option<NodeId> {
    let nodes = tree.root().preorder();
    number
        .checked_sub(1)
        .and_then(|i| nodes.get(i))
        .map(|n| n.id())
}

fn status(tree: &ProofTree) -> ColoredString {
    match tree.open_goal_count() {
        0 => "complete".green().bold(),
        1 => "1 open goal".yellow(),
        n => format!("{} open goals", n).yellow(),
    }
}

fn write_node(
    out: &mut String,
    node: &Node,
    depth: usize,
    counter: &mut usize,
    notation: Notation,
) -> std::fmt::Result {
    *counter += 1;
    let indent = "  ".repeat(depth);
    let expr = print_expr(node.expr(), notation);
    write!(out, "{:>4}  {}", counter.to_string().dimmed(), indent)?;
    match node {
        Node::Goal { .. } => writeln!(out, "{} {}", "?".yellow().bold(), expr.yellow())?,
        Node::Assumption { .. } => writeln!(out, "{}", format!("[{}]", expr).blue())?,
        Node::Application {
            rule,
            discharge,
            hypotheses,
            ..
        } => {
            write!(out, "{}  {}", expr, format!("({})", rule.name).cyan())?;
            if let Some(d) = discharge {
                write!(out, " {}", format!("[{}]", print_expr(d, notation)).blue())?;
            }
            writeln!(out)?;
            for h in hypotheses {
                write_node(out, h, depth + 1, counter, notation)?;
            }
        }
    }
    Ok(())
}

/// Outline of a single tree, without header.
pub fn render_tree(tree: &ProofTree, notation: Notation) -> String {
    let mut out = String::new();
    let mut counter = 0;
    // Writing into a String cannot fail.
    let _ = write_node(&mut out, tree.root(), 0, &mut counter, notation);
    out
}

/// Header line plus outline for workspace item `index`.
pub fn render_placed(index: usize, placed: &Placed, notation: Notation) -> String {
    format!(
        "{} ({}, {})  {}\n{}",
        format!("[{}]", index).bold(),
        placed.x,
        placed.y,
        status(&placed.tree),
        render_tree(&placed.tree, notation)
    )
}

/// Every item of the workspace, in order.
pub fn render_workspace(items: &[Placed], notation: Notation) -> String {
    if items.is_empty() {
        return "Workspace is empty\n".dimmed().to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, p)| render_placed(i, p, notation))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One catalog line: code, name and schema.
pub fn render_rule(rule: &Rule, notation: Notation) -> String {
    let hypotheses = rule
        .hypotheses
        .iter()
        .map(|h| print_expr(h, notation))
        .collect::<Vec<_>>()
        .join(", ");
    let mut line = format!(
        "{:<8} {:<4} {}{}⊢ {}",
        rule.code.bold(),
        rule.name,
        hypotheses,
        if hypotheses.is_empty() { "" } else { " " },
        print_expr(&rule.conclusion, notation)
    );
    if let Some(d) = &rule.discharge {
        line.push_str(&format!("  [{}]", print_expr(d, notation)));
    }
    line
}
