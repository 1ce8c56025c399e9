//! Propositional expressions.
//!
//! Equality is purely structural: `And(a, b)` and `And(b, a)` are different
//! expressions unless `a` and `b` are themselves equal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Opaque atomic proposition named by the user.
    Variable(String),
    /// Placeholder for an arbitrary proposition inside a rule schema or an
    /// unresolved fragment.
    MetaVariable(String),
    Constant(bool),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Iff(Box<Expr>, Box<Expr>),
}

/// Binary connectives, used by the printer and parser to share precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Connective {
    Iff,
    Implies,
    Or,
    And,
}

impl Connective {
    /// Binding strength, lowest first.
    pub fn precedence(self) -> u8 {
        match self {
            Connective::Iff => 0,
            Connective::Implies => 1,
            Connective::Or => 2,
            Connective::And => 3,
        }
    }

    pub fn build(self, left: Expr, right: Expr) -> Expr {
        match self {
            Connective::Iff => Expr::iff(left, right),
            Connective::Implies => Expr::implies(left, right),
            Connective::Or => Expr::or(left, right),
            Connective::And => Expr::and(left, right),
        }
    }

    /// Fold a flat operand list right-to-left: `[a, b, c]` becomes
    /// `a op (b op c)`.
    pub fn fold(self, operands: Vec<Expr>) -> Option<Expr> {
        let mut operands = operands;
        let mut acc = operands.pop()?;
        while let Some(left) = operands.pop() {
            acc = self.build(left, acc);
        }
        Some(acc)
    }
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn meta(name: impl Into<String>) -> Self {
        Expr::MetaVariable(name.into())
    }

    pub fn constant(value: bool) -> Self {
        Expr::Constant(value)
    }

    pub fn truth() -> Self {
        Expr::Constant(true)
    }

    pub fn falsity() -> Self {
        Expr::Constant(false)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    pub fn implies(left: Expr, right: Expr) -> Self {
        Expr::Implies(Box::new(left), Box::new(right))
    }

    pub fn iff(left: Expr, right: Expr) -> Self {
        Expr::Iff(Box::new(left), Box::new(right))
    }

    /// Right-nested conjunction of all operands, `None` when empty.
    pub fn ands(operands: Vec<Expr>) -> Option<Self> {
        Connective::And.fold(operands)
    }

    pub fn ors(operands: Vec<Expr>) -> Option<Self> {
        Connective::Or.fold(operands)
    }

    pub fn implies_all(operands: Vec<Expr>) -> Option<Self> {
        Connective::Implies.fold(operands)
    }

    pub fn iffs(operands: Vec<Expr>) -> Option<Self> {
        Connective::Iff.fold(operands)
    }

    /// Split a binary expression into its connective and operands.
    pub fn as_binary(&self) -> Option<(Connective, &Expr, &Expr)> {
        match self {
            Expr::And(l, r) => Some((Connective::And, l, r)),
            Expr::Or(l, r) => Some((Connective::Or, l, r)),
            Expr::Implies(l, r) => Some((Connective::Implies, l, r)),
            Expr::Iff(l, r) => Some((Connective::Iff, l, r)),
            _ => None,
        }
    }

    pub fn is_meta_variable(&self) -> bool {
        matches!(self, Expr::MetaVariable(_))
    }

    /// Names of all metavariables occurring in the expression.
    pub fn free_meta_variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_meta_variables(&mut vars);
        vars
    }

    pub(crate) fn collect_meta_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Expr::MetaVariable(name) => {
                vars.insert(name.clone());
            }
            Expr::Variable(_) | Expr::Constant(_) => {}
            Expr::Not(inner) => inner.collect_meta_variables(vars),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Implies(l, r) | Expr::Iff(l, r) => {
                l.collect_meta_variables(vars);
                r.collect_meta_variables(vars);
            }
        }
    }

    /// Names of all opaque variables occurring in the expression.
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Expr::Variable(name) => {
                vars.insert(name.clone());
            }
            Expr::MetaVariable(_) | Expr::Constant(_) => {}
            Expr::Not(inner) => inner.collect_variables(vars),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Implies(l, r) | Expr::Iff(l, r) => {
                l.collect_variables(vars);
                r.collect_variables(vars);
            }
        }
    }

    /// True when `name` occurs as a metavariable anywhere in the expression.
    pub fn mentions_meta(&self, name: &str) -> bool {
        match self {
            Expr::MetaVariable(n) => n == name,
            Expr::Variable(_) | Expr::Constant(_) => false,
            Expr::Not(inner) => inner.mentions_meta(name),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Implies(l, r) | Expr::Iff(l, r) => {
                l.mentions_meta(name) || r.mentions_meta(name)
            }
        }
    }

    /// Expression without metavariables.
    pub fn is_ground(&self) -> bool {
        match self {
            Expr::MetaVariable(_) => false,
            Expr::Variable(_) | Expr::Constant(_) => true,
            Expr::Not(inner) => inner.is_ground(),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Implies(l, r) | Expr::Iff(l, r) => {
                l.is_ground() && r.is_ground()
            }
        }
    }

    /// Number of nodes in the syntax tree.
    pub fn size(&self) -> usize {
        match self {
            Expr::Variable(_) | Expr::MetaVariable(_) | Expr::Constant(_) => 1,
            Expr::Not(inner) => 1 + inner.size(),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Implies(l, r) | Expr::Iff(l, r) => {
                1 + l.size() + r.size()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = Expr::var("A");
        let b = Expr::var("B");
        assert_eq!(Expr::and(a.clone(), b.clone()), Expr::and(a.clone(), b.clone()));
        assert_ne!(Expr::and(a.clone(), b.clone()), Expr::and(b.clone(), a.clone()));
        assert_eq!(Expr::and(a.clone(), a.clone()), Expr::and(a.clone(), a));
    }

    #[test]
    fn test_variable_and_meta_variable_differ() {
        assert_ne!(Expr::var("a"), Expr::meta("a"));
        assert_ne!(Expr::truth(), Expr::falsity());
    }

    #[test]
    fn test_fold_is_right_nested() {
        let folded = Expr::ands(vec![Expr::meta("a"), Expr::meta("b"), Expr::meta("c")]).unwrap();
        assert_eq!(
            folded,
            Expr::and(Expr::meta("a"), Expr::and(Expr::meta("b"), Expr::meta("c")))
        );
        assert_eq!(Expr::ors(vec![Expr::meta("a")]), Some(Expr::meta("a")));
        assert_eq!(Expr::iffs(vec![]), None);
    }

    #[test]
    fn test_free_meta_variables() {
        let e = Expr::implies(
            Expr::and(Expr::meta("a"), Expr::var("P")),
            Expr::not(Expr::meta("b")),
        );
        let metas: Vec<_> = e.free_meta_variables().into_iter().collect();
        assert_eq!(metas, vec!["a".to_string(), "b".to_string()]);
        let vars: Vec<_> = e.free_variables().into_iter().collect();
        assert_eq!(vars, vec!["P".to_string()]);
        assert!(!e.is_ground());
        assert!(Expr::and(Expr::var("P"), Expr::truth()).is_ground());
    }

    #[test]
    fn test_size_and_mentions() {
        let e = Expr::iff(Expr::meta("a"), Expr::not(Expr::meta("a")));
        assert_eq!(e.size(), 4);
        assert!(e.mentions_meta("a"));
        assert!(!e.mentions_meta("b"));
    }
}
