//! # Substitution, Pattern Matching and Unification
//!
//! Two matching procedures are offered and they are intentionally different:
//!
//! - [`fuse`] is a one-directional pattern match. Metavariables may only occur
//!   on the pattern side; the concrete side is assumed ground. A metavariable
//!   is bound on first sight and must match the same subterm on every later
//!   sighting. No occurs-check is performed.
//! - [`unify`] is full syntactic unification. Metavariables may occur on
//!   either side, the occurs-check is enforced, and each new binding is
//!   composed eagerly into the accumulated substitution.
//!
//! Both return `None` when the terms do not match. That is ordinary control
//! flow ("this fragment does not apply here"), not an error.
//!
//! ## Examples
//!
//! ```rust
//! use natded_core::{fuse, unify, Expr};
//!
//! let pattern = Expr::and(Expr::meta("a"), Expr::meta("b"));
//! let goal = Expr::and(Expr::var("P"), Expr::var("Q"));
//!
//! let sigma = fuse(&goal, &pattern).unwrap();
//! assert_eq!(sigma.apply(&pattern), goal);
//!
//! // The occurs-check rejects a = a ∧ ⊤
//! let cyclic = Expr::and(Expr::meta("a"), Expr::truth());
//! assert!(unify(&Expr::meta("a"), &cyclic).is_none());
//! ```

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::expr::Expr;

/// A substitution maps metavariable names to expressions.
///
/// Bindings are kept in name order so that printing and iteration are
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    bindings: BTreeMap<String, Expr>,
}

impl Substitution {
    /// Create an empty substitution (identity).
    pub fn empty() -> Self {
        Substitution {
            bindings: BTreeMap::new(),
        }
    }

    /// Create a substitution with a single binding.
    pub fn singleton(var: impl Into<String>, expr: Expr) -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(var.into(), expr);
        Substitution { bindings }
    }

    pub fn from_map(bindings: BTreeMap<String, Expr>) -> Self {
        Substitution { bindings }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn get(&self, var: &str) -> Option<&Expr> {
        self.bindings.get(var)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.bindings.contains_key(var)
    }

    /// Add or overwrite a binding.
    pub fn bind(&mut self, var: impl Into<String>, expr: Expr) {
        self.bindings.insert(var.into(), expr);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Expr)> {
        self.bindings.iter()
    }

    /// Bound metavariable names, in order.
    pub fn domain(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    /// Apply this substitution to an expression.
    ///
    /// Only metavariable leaves are replaced. Variables and constants are
    /// returned unchanged, and the input is never mutated.
    pub fn apply(&self, expr: &Expr) -> Expr {
        if self.is_empty() {
            return expr.clone();
        }
        match expr {
            Expr::MetaVariable(name) => self
                .bindings
                .get(name)
                .cloned()
                .unwrap_or_else(|| expr.clone()),
            Expr::Variable(_) | Expr::Constant(_) => expr.clone(),
            Expr::Not(inner) => Expr::not(self.apply(inner)),
            Expr::And(l, r) => Expr::and(self.apply(l), self.apply(r)),
            Expr::Or(l, r) => Expr::or(self.apply(l), self.apply(r)),
            Expr::Implies(l, r) => Expr::implies(self.apply(l), self.apply(r)),
            Expr::Iff(l, r) => Expr::iff(self.apply(l), self.apply(r)),
        }
    }

    /// Compose two substitutions: (σ ∘ θ)(x) = σ(θ(x))
    ///
    /// The composition applies `other` (θ) first, then `self` (σ).
    pub fn compose(&self, other: &Substitution) -> Substitution {
        let mut result = BTreeMap::new();

        for (var, expr) in &other.bindings {
            result.insert(var.clone(), self.apply(expr));
        }

        for (var, expr) in &self.bindings {
            if !result.contains_key(var) {
                result.insert(var.clone(), expr.clone());
            }
        }

        Substitution::from_map(result)
    }

    /// Bind `var` to `expr` and rewrite every existing binding that mentions
    /// `var`, keeping the substitution idempotent.
    ///
    /// The caller must ensure `expr` is already fully substituted and does not
    /// mention `var`.
    fn bind_composed(&mut self, var: &str, expr: Expr) {
        let step = Substitution::singleton(var, expr.clone());
        for value in self.bindings.values_mut() {
            if value.mentions_meta(var) {
                *value = step.apply(value);
            }
        }
        self.bindings.insert(var.to_string(), expr);
    }
}

impl FromIterator<(String, Expr)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (String, Expr)>>(iter: I) -> Self {
        Substitution {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Substitution {
    type Item = (String, Expr);
    type IntoIter = std::collections::btree_map::IntoIter<String, Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.into_iter()
    }
}

/// Apply `sigma` to `expr`. Shorthand for [`Substitution::apply`].
pub fn substitute(expr: &Expr, sigma: &Substitution) -> Expr {
    sigma.apply(expr)
}

/// One-directional pattern match of `pattern` against `concrete`.
///
/// On success, `sigma.apply(pattern) == *concrete`.
pub fn fuse(concrete: &Expr, pattern: &Expr) -> Option<Substitution> {
    let mut sigma = Substitution::empty();
    let mut queue = VecDeque::new();
    queue.push_back((concrete, pattern));

    while let Some((c, p)) = queue.pop_front() {
        match (c, p) {
            (_, Expr::MetaVariable(name)) => match sigma.get(name) {
                Some(bound) if bound != c => {
                    trace!(meta = %name, "fuse: conflicting binding");
                    return None;
                }
                Some(_) => {}
                None => sigma.bind(name.clone(), c.clone()),
            },
            (Expr::Variable(a), Expr::Variable(b)) if a == b => {}
            (Expr::Constant(a), Expr::Constant(b)) if a == b => {}
            (Expr::Not(ci), Expr::Not(pi)) => queue.push_back((ci.as_ref(), pi.as_ref())),
            (Expr::And(cl, cr), Expr::And(pl, pr))
            | (Expr::Or(cl, cr), Expr::Or(pl, pr))
            | (Expr::Implies(cl, cr), Expr::Implies(pl, pr))
            | (Expr::Iff(cl, cr), Expr::Iff(pl, pr)) => {
                queue.push_back((cl.as_ref(), pl.as_ref()));
                queue.push_back((cr.as_ref(), pr.as_ref()));
            }
            _ => return None,
        }
    }

    Some(sigma)
}

/// Most general unifier of `e1` and `e2`.
///
/// On success, `sigma.apply(e1) == sigma.apply(e2)`. When both sides are
/// unbound metavariables, the left one is bound to the right one.
pub fn unify(e1: &Expr, e2: &Expr) -> Option<Substitution> {
    let mut sigma = Substitution::empty();
    let mut queue: VecDeque<(Expr, Expr)> = VecDeque::new();
    queue.push_back((e1.clone(), e2.clone()));

    while let Some((left, right)) = queue.pop_front() {
        let left = sigma.apply(&left);
        let right = sigma.apply(&right);
        if left == right {
            continue;
        }

        match (left, right) {
            (Expr::MetaVariable(name), other) | (other, Expr::MetaVariable(name)) => {
                if other.mentions_meta(&name) {
                    trace!(meta = %name, "unify: occurs-check failed");
                    return None;
                }
                sigma.bind_composed(&name, other);
            }
            (Expr::Not(a), Expr::Not(b)) => queue.push_back((*a, *b)),
            (Expr::And(al, ar), Expr::And(bl, br))
            | (Expr::Or(al, ar), Expr::Or(bl, br))
            | (Expr::Implies(al, ar), Expr::Implies(bl, br))
            | (Expr::Iff(al, ar), Expr::Iff(bl, br)) => {
                queue.push_back((*al, *bl));
                queue.push_back((*ar, *br));
            }
            // Distinct constants, distinct variable names, or different shapes.
            _ => return None,
        }
    }

    Some(sigma)
}
