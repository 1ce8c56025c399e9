//! # Goal Merging
//!
//! Attaching a fragment (a rule application, a goal, or an assumption) onto an
//! open goal is a two-phase protocol:
//!
//! 1. [`propose_merge`] is pure. It freshens the fragment's metavariables
//!    against the target tree, unifies the fragment's public expression with
//!    the goal, and returns an inert [`MergeProposal`] or `None`.
//! 2. [`commit_merge`] splices the fragment into the goal's slot, applies the
//!    substitution across the whole target tree, and re-links.
//!
//! Between the two phases the host may ask the user to resolve leftover
//! metavariables through [`MergeProposal::specialize`]. Dropping a proposal is
//! always a no-op.
//!
//! ## Examples
//!
//! ```rust
//! use natded_core::{commit_merge, propose_merge, Expr, ProofTree, RuleCatalog};
//!
//! let mut tree = ProofTree::goal(Expr::and(Expr::var("P"), Expr::var("Q")));
//! let goal = tree.root_id();
//! let fragment = RuleCatalog::default().instantiate("andI").unwrap();
//!
//! let proposal = propose_merge(&fragment, &tree, goal).unwrap();
//! let complete = commit_merge(&mut tree, proposal).unwrap();
//!
//! assert!(!complete);
//! assert_eq!(tree.open_goal_count(), 2);
//! ```

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::error::{CoreError, CoreResult};
use crate::expr::Expr;
use crate::tree::{Node, NodeId, ProofTree};
use crate::unification::{unify, Substitution};

/// Successor in the fresh-name sequence `A, B, …, Z, X1, X2, …`.
fn successor(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() && c < 'Z' => ((c as u8 + 1) as char).to_string(),
        (Some('Z'), None) => "X1".to_string(),
        _ => match name.strip_prefix('X').and_then(|n| n.parse::<u64>().ok()) {
            Some(n) => format!("X{}", n + 1),
            None => "A".to_string(),
        },
    }
}

/// Rename metavariables of `fragment` that also occur free in `other`.
///
/// New names are the first unused ones in the sequence `A..Z, X1, X2, …`,
/// unused meaning free in neither tree. Names that do not collide are kept.
pub fn freshen_meta_variables(fragment: &Node, other: &Node) -> Node {
    let (renamed, _) = freshen_with_renaming(fragment, other);
    renamed
}

/// [`freshen_meta_variables`], also returning the renaming it applied.
fn freshen_with_renaming(fragment: &Node, other: &Node) -> (Node, Substitution) {
    let fragment_vars = fragment.free_meta_variables();
    let other_vars = other.free_meta_variables();
    let conflicts: Vec<&String> = fragment_vars.intersection(&other_vars).collect();
    if conflicts.is_empty() {
        return (fragment.clone(), Substitution::empty());
    }

    let mut used: BTreeSet<String> = fragment_vars.union(&other_vars).cloned().collect();
    let mut next = "A".to_string();
    let mut renaming = Substitution::empty();
    for name in conflicts {
        while used.contains(&next) {
            next = successor(&next);
        }
        trace!(from = %name, to = %next, "freshening metavariable");
        renaming.bind(name.clone(), Expr::meta(next.clone()));
        used.insert(next.clone());
    }
    (fragment.substitute(&renaming), renaming)
}

/// A successful match of a fragment against a goal, not yet applied.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeProposal {
    fragment: Node,
    goal: NodeId,
    root: NodeId,
    substitution: Substitution,
    renaming: Substitution,
}

impl MergeProposal {
    /// The fragment after freshening, before substitution.
    pub fn fragment(&self) -> &Node {
        &self.fragment
    }

    pub fn goal(&self) -> NodeId {
        self.goal
    }

    /// Root of the target tree at proposal time.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    /// Fragment metavariables renamed to avoid the target tree's names,
    /// keyed by their name before freshening.
    pub fn renaming(&self) -> &Substitution {
        &self.renaming
    }

    /// Metavariables the fragment would still carry after the merge.
    pub fn unresolved_meta_variables(&self) -> BTreeSet<String> {
        self.fragment
            .substitute(&self.substitution)
            .free_meta_variables()
    }

    /// Compose user choices into the proposal's substitution.
    pub fn specialize(&mut self, choices: &Substitution) {
        self.substitution = choices.compose(&self.substitution);
    }

    /// Compose choices keyed by the fragment's own names, as they were
    /// before freshening.
    ///
    /// Fails with [`CoreError::UnknownMetaVariable`] on a name the fragment
    /// does not mention, so a choice can never bind a metavariable of the
    /// target tree.
    pub fn specialize_fragment(&mut self, choices: &Substitution) -> CoreResult<()> {
        let fragment_vars = self.fragment.free_meta_variables();
        let mut renamed = Substitution::empty();
        for (name, expr) in choices.iter() {
            let key = match self.renaming.get(name) {
                Some(Expr::MetaVariable(fresh)) => fresh.clone(),
                _ => name.clone(),
            };
            if !fragment_vars.contains(&key) {
                return Err(CoreError::UnknownMetaVariable { name: name.clone() });
            }
            renamed.bind(key, expr.clone());
        }
        self.specialize(&renamed);
        Ok(())
    }
}

/// Try to attach `fragment` onto the open goal `goal` of `target`.
///
/// Returns `None` when the goal is missing or closed, or when the fragment
/// does not unify with it. Assumption fragments keep their names, unify with
/// the goal expression on the left, and must be in scope: some enclosing
/// discharge of the goal has to agree with the assumption after unification.
pub fn propose_merge(fragment: &Node, target: &ProofTree, goal: NodeId) -> Option<MergeProposal> {
    let goal_expr = match target.find(goal) {
        Some(Node::Goal { expr, .. }) => expr,
        _ => {
            trace!(goal = %goal, "merge target is not an open goal");
            return None;
        }
    };

    let (fragment, substitution, renaming) = match fragment {
        Node::Assumption { expr, .. } => {
            let sigma = unify(goal_expr, expr)?;
            let assumed = sigma.apply(expr);
            let in_scope = target
                .context_discharges(goal)
                .iter()
                .any(|d| sigma.apply(d) == assumed);
            if !in_scope {
                debug!(goal = %goal, "assumption is not discharged above the goal");
                return None;
            }
            (fragment.clone(), sigma, Substitution::empty())
        }
        _ => {
            let (renamed, renaming) = freshen_with_renaming(fragment, target.root());
            let sigma = unify(renamed.expr(), goal_expr)?;
            (renamed, sigma, renaming)
        }
    };

    debug!(goal = %goal, bindings = substitution.len(), "merge proposed");
    Some(MergeProposal {
        fragment,
        goal,
        root: target.root_id(),
        substitution,
        renaming,
    })
}

/// Apply a proposal to `target`. Returns whether the tree is now complete.
///
/// Fails without touching the tree when the proposal's goal is no longer an
/// open goal of `target`.
pub fn commit_merge(target: &mut ProofTree, proposal: MergeProposal) -> CoreResult<bool> {
    let MergeProposal {
        fragment,
        goal,
        substitution,
        ..
    } = proposal;
    match target.find(goal) {
        Some(Node::Goal { .. }) => {}
        Some(_) => return Err(CoreError::NotAGoal { id: goal }),
        None => return Err(CoreError::NodeNotFound { id: goal }),
    }
    target
        .replace_node(goal, fragment)
        .ok_or(CoreError::NodeNotFound { id: goal })?;
    target.specialize(&substitution);
    let complete = target.is_complete();
    debug!(goal = %goal, complete, "merge committed");
    Ok(complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{axiom, RuleCatalog};

    fn p() -> Expr {
        Expr::var("P")
    }

    fn q() -> Expr {
        Expr::var("Q")
    }

    #[test]
    fn test_successor_sequence() {
        assert_eq!(successor("A"), "B");
        assert_eq!(successor("Y"), "Z");
        assert_eq!(successor("Z"), "X1");
        assert_eq!(successor("X1"), "X2");
        assert_eq!(successor("X41"), "X42");
    }

    #[test]
    fn test_freshen_renames_only_conflicts() {
        let fragment = Node::goal(Expr::and(Expr::meta("a"), Expr::meta("b")));
        let other = Node::goal(Expr::or(Expr::meta("a"), Expr::meta("A")));
        let renamed = freshen_meta_variables(&fragment, &other);
        // "a" collides; "A" is taken, so the next free name is "B".
        assert_eq!(renamed.expr(), &Expr::and(Expr::meta("B"), Expr::meta("b")));
        assert_eq!(renamed.id(), fragment.id());
    }

    #[test]
    fn test_freshen_without_conflicts_is_identity() {
        let fragment = Node::goal(Expr::meta("a"));
        let other = Node::goal(Expr::meta("b"));
        assert_eq!(freshen_meta_variables(&fragment, &other), fragment);
    }

    #[test]
    fn test_and_intro_onto_conjunction() {
        let mut tree = ProofTree::goal(Expr::and(p(), q()));
        let goal = tree.root_id();
        let fragment = RuleCatalog::default().instantiate("andI").unwrap();

        let proposal = propose_merge(&fragment, &tree, goal).unwrap();
        assert_eq!(proposal.substitution().get("a"), Some(&p()));
        assert_eq!(proposal.substitution().get("b"), Some(&q()));
        assert!(proposal.unresolved_meta_variables().is_empty());

        assert!(!commit_merge(&mut tree, proposal).unwrap());
        let goals: Vec<_> = tree.goals().into_iter().map(|g| g.expr().clone()).collect();
        assert_eq!(goals, vec![p(), q()]);
    }

    #[test]
    fn test_rejected_merge_leaves_tree_untouched() {
        let tree = ProofTree::goal(Expr::or(p(), q()));
        let before = tree.clone();
        let fragment = RuleCatalog::default().instantiate("andI").unwrap();
        assert!(propose_merge(&fragment, &tree, tree.root_id()).is_none());
        assert_eq!(tree, before);
    }

    #[test]
    fn test_merge_into_inner_goal_substitutes_whole_tree() {
        let catalog = RuleCatalog::default();
        // implE: a ⇒ b, a ⊢ b. Close the first premise with an axiom P ⇒ Q.
        let mut tree = ProofTree::new(catalog.instantiate("implE").unwrap());
        let first = tree.root().hypotheses()[0].id();
        let fragment = axiom(Expr::implies(p(), q()));

        let proposal = propose_merge(&fragment, &tree, first).unwrap();
        commit_merge(&mut tree, proposal).unwrap();

        assert_eq!(tree.root().expr(), &q());
        assert_eq!(tree.root().hypotheses()[1].expr(), &p());
        assert_eq!(tree.open_goal_count(), 1);
    }

    #[test]
    fn test_unresolved_meta_variables_and_specialize() {
        // andE1 onto P leaves the right conjunct open.
        let mut tree = ProofTree::goal(p());
        let goal = tree.root_id();
        let fragment = RuleCatalog::default().instantiate("andE1").unwrap();
        let mut proposal = propose_merge(&fragment, &tree, goal).unwrap();
        let unresolved: Vec<_> = proposal.unresolved_meta_variables().into_iter().collect();
        assert_eq!(unresolved, vec!["b".to_string()]);

        proposal.specialize(&Substitution::singleton("b", q()));
        assert!(proposal.unresolved_meta_variables().is_empty());
        commit_merge(&mut tree, proposal).unwrap();
        assert_eq!(tree.goals()[0].expr(), &Expr::and(p(), q()));
    }

    #[test]
    fn test_fragment_names_are_freshened() {
        let catalog = RuleCatalog::default();
        // notE onto the ⊥ premise of falseE: both rules use `a`.
        let mut tree = ProofTree::new(catalog.instantiate("falseE").unwrap());
        let premise = tree.root().hypotheses()[0].id();
        let fragment = catalog.instantiate("notE").unwrap();
        let proposal = propose_merge(&fragment, &tree, premise).unwrap();
        assert!(proposal.fragment().free_meta_variables().contains("A"));
        commit_merge(&mut tree, proposal).unwrap();
        let vars: Vec<_> = tree.free_meta_variables().into_iter().collect();
        assert_eq!(vars, vec!["A".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_fragment_choices_follow_freshening() {
        let catalog = RuleCatalog::default();
        // implI carries `a` and `b`; andE1 is renamed to `A`, `B` on its premise.
        let tree = ProofTree::new(catalog.instantiate("implI").unwrap());
        let premise = tree.root().hypotheses()[0].id();
        let fragment = catalog.instantiate("andE1").unwrap();
        let mut proposal = propose_merge(&fragment, &tree, premise).unwrap();
        assert_eq!(proposal.renaming().get("b"), Some(&Expr::meta("B")));

        proposal
            .specialize_fragment(&Substitution::singleton("b", q()))
            .unwrap();
        assert_eq!(proposal.substitution().get("B"), Some(&q()));
        assert!(!proposal.substitution().contains("b"));
        // Only the host's own `b`, flowing in through unification, is left.
        let unresolved: Vec<_> = proposal.unresolved_meta_variables().into_iter().collect();
        assert_eq!(unresolved, vec!["b".to_string()]);
    }

    #[test]
    fn test_fragment_choices_reject_foreign_names() {
        let catalog = RuleCatalog::default();
        let tree = ProofTree::new(catalog.instantiate("implI").unwrap());
        let premise = tree.root().hypotheses()[0].id();
        let mut proposal =
            propose_merge(&catalog.instantiate("andI").unwrap(), &tree, premise).unwrap();
        let before = proposal.clone();
        assert!(matches!(
            proposal.specialize_fragment(&Substitution::singleton("c", p())),
            Err(CoreError::UnknownMetaVariable { .. })
        ));
        assert_eq!(proposal, before);
    }

    #[test]
    fn test_assumption_merge_in_scope() {
        let catalog = RuleCatalog::default();
        // implI over P ⇒ P
        let mut tree = ProofTree::goal(Expr::implies(p(), p()));
        let goal = tree.root_id();
        let proposal = propose_merge(&catalog.instantiate("implI").unwrap(), &tree, goal).unwrap();
        commit_merge(&mut tree, proposal).unwrap();

        let premise = tree.root().hypotheses()[0].id();
        let fragment = tree.assumption_for_discharge(tree.root_id()).unwrap();
        let proposal = propose_merge(&fragment, &tree, premise).unwrap();
        assert!(commit_merge(&mut tree, proposal).unwrap());
        assert!(tree.is_complete());
    }

    #[test]
    fn test_assumption_merge_out_of_scope() {
        // Goal P with no enclosing discharge.
        let tree = ProofTree::goal(p());
        let fragment = Node::assumption(p());
        assert!(propose_merge(&fragment, &tree, tree.root_id()).is_none());
    }

    #[test]
    fn test_assumption_keeps_goal_names() {
        let catalog = RuleCatalog::default();
        // implI with meta discharge `a`, premise goal `b`: merging assumption
        // `a` binds the goal's `b` to `a`.
        let mut tree = ProofTree::new(catalog.instantiate("implI").unwrap());
        let premise = tree.root().hypotheses()[0].id();
        let fragment = tree.assumption_for_discharge(tree.root_id()).unwrap();
        let proposal = propose_merge(&fragment, &tree, premise).unwrap();
        assert_eq!(proposal.substitution().get("b"), Some(&Expr::meta("a")));
        commit_merge(&mut tree, proposal).unwrap();
        assert_eq!(
            tree.root().expr(),
            &Expr::implies(Expr::meta("a"), Expr::meta("a"))
        );
    }

    #[test]
    fn test_stale_proposal() {
        let mut tree = ProofTree::goal(Expr::and(p(), q()));
        let goal = tree.root_id();
        let proposal = propose_merge(
            &RuleCatalog::default().instantiate("andI").unwrap(),
            &tree,
            goal,
        )
        .unwrap();
        commit_merge(&mut tree, proposal.clone()).unwrap();
        assert!(matches!(
            commit_merge(&mut tree, proposal),
            Err(CoreError::NodeNotFound { .. })
        ));
        assert_eq!(tree.open_goal_count(), 2);
    }
}
