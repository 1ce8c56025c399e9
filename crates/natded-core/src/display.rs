//! Display trait implementations for engine types.
//!
//! Expressions print in Unicode notation and always re-parse to an equal
//! expression. Nodes print as a one-line bracketed sketch for logs and
//! error messages; the terminal host has its own layout.

use std::fmt;

use crate::{
    expr::Expr,
    rules::Rule,
    syntax::{print_expr, Notation},
    tree::{Node, ProofTree},
    unification::Substitution,
};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print_expr(self, Notation::Unicode))
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, expr)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} ↦ {}", Expr::meta(var.clone()), expr)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, h) in self.hypotheses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", h)?;
        }
        if !self.hypotheses.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "⊢ {}", self.conclusion)?;
        if let Some(d) = &self.discharge {
            write!(f, " [{}]", d)?;
        }
        write!(f, " ({})", self.name)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Goal { expr, .. } => write!(f, "?{{{}}}", expr),
            Node::Assumption { expr, .. } => write!(f, "[{}]", expr),
            Node::Application {
                rule,
                conclusion,
                hypotheses,
                ..
            } => {
                write!(f, "{}(", rule.name)?;
                for (i, h) in hypotheses.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", h)?;
                }
                write!(f, ") ⊢ {}", conclusion)
            }
        }
    }
}

impl fmt::Display for ProofTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleCatalog;

    #[test]
    fn test_display_expr() {
        let e = Expr::implies(Expr::and(Expr::var("P"), Expr::meta("a")), Expr::falsity());
        assert_eq!(e.to_string(), "P ⋀ a ⇒ ⊥");
    }

    #[test]
    fn test_display_substitution() {
        let mut sigma = Substitution::empty();
        sigma.bind("b", Expr::var("Q"));
        sigma.bind("a", Expr::var("P"));
        assert_eq!(sigma.to_string(), "{a ↦ P, b ↦ Q}");
    }

    #[test]
    fn test_display_rule() {
        let catalog = RuleCatalog::default();
        assert_eq!(catalog.get("implI").unwrap().to_string(), "b ⊢ a ⇒ b [a] (⇒I)");
        assert_eq!(catalog.get("trueI").unwrap().to_string(), "⊢ ⊤ (⊤I)");
    }

    #[test]
    fn test_display_node() {
        let node = RuleCatalog::default().instantiate("andI").unwrap();
        assert_eq!(node.to_string(), "⋀I(?{a}, ?{b}) ⊢ a ⋀ b");
        assert_eq!(Node::assumption(Expr::var("P")).to_string(), "[P]");
    }
}
