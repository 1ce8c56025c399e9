//! # Proof Trees
//!
//! A proof tree is built from three node shapes:
//!
//! - [`Node::Goal`]: an open obligation,
//! - [`Node::Assumption`]: a hypothesis, valid only below an application whose
//!   `discharge` is structurally equal to it,
//! - [`Node::Application`]: an instantiated rule with one child per premise.
//!
//! Nodes are addressed by [`NodeId`]. Identities are process-unique, are never
//! serialized, and are reassigned on load. Parent links live in a side table
//! owned by [`ProofTree`] and are rebuilt wholesale by [`ProofTree::relink`]
//! after every structural edit rather than kept live.
//!
//! ## Examples
//!
//! ```rust
//! use natded_core::{Expr, ProofTree, RuleCatalog};
//!
//! let catalog = RuleCatalog::default();
//! let tree = ProofTree::new(catalog.instantiate("andI").unwrap());
//!
//! assert_eq!(tree.open_goal_count(), 2);
//! assert!(!tree.is_complete());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::expr::Expr;
use crate::rules::Rule;
use crate::unification::Substitution;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A proof tree node.
///
/// Equality ignores identities: two nodes are equal when they have the same
/// shape, rules and expressions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Goal {
        #[serde(skip, default = "NodeId::fresh")]
        id: NodeId,
        expr: Expr,
    },
    Assumption {
        #[serde(skip, default = "NodeId::fresh")]
        id: NodeId,
        expr: Expr,
    },
    Application {
        #[serde(skip, default = "NodeId::fresh")]
        id: NodeId,
        rule: Rule,
        conclusion: Expr,
        hypotheses: Vec<Node>,
        #[serde(default)]
        discharge: Option<Expr>,
    },
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Goal { expr: a, .. }, Node::Goal { expr: b, .. }) => a == b,
            (Node::Assumption { expr: a, .. }, Node::Assumption { expr: b, .. }) => a == b,
            (
                Node::Application {
                    rule: r1,
                    conclusion: c1,
                    hypotheses: h1,
                    discharge: d1,
                    ..
                },
                Node::Application {
                    rule: r2,
                    conclusion: c2,
                    hypotheses: h2,
                    discharge: d2,
                    ..
                },
            ) => r1 == r2 && c1 == c2 && d1 == d2 && h1 == h2,
            _ => false,
        }
    }
}

impl Eq for Node {}

impl Node {
    pub fn goal(expr: Expr) -> Self {
        Node::Goal {
            id: NodeId::fresh(),
            expr,
        }
    }

    pub fn assumption(expr: Expr) -> Self {
        Node::Assumption {
            id: NodeId::fresh(),
            expr,
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Node::Goal { id, .. } | Node::Assumption { id, .. } | Node::Application { id, .. } => {
                *id
            }
        }
    }

    /// The expression this node offers to its parent: the goal or assumption
    /// expression, or the conclusion of an application.
    pub fn expr(&self) -> &Expr {
        match self {
            Node::Goal { expr, .. } | Node::Assumption { expr, .. } => expr,
            Node::Application { conclusion, .. } => conclusion,
        }
    }

    pub fn is_goal(&self) -> bool {
        matches!(self, Node::Goal { .. })
    }

    pub fn is_assumption(&self) -> bool {
        matches!(self, Node::Assumption { .. })
    }

    pub fn is_application(&self) -> bool {
        matches!(self, Node::Application { .. })
    }

    /// Premises of an application, empty for leaves.
    pub fn hypotheses(&self) -> &[Node] {
        match self {
            Node::Application { hypotheses, .. } => hypotheses,
            _ => &[],
        }
    }

    pub fn rule(&self) -> Option<&Rule> {
        match self {
            Node::Application { rule, .. } => Some(rule),
            _ => None,
        }
    }

    pub fn discharge(&self) -> Option<&Expr> {
        match self {
            Node::Application { discharge, .. } => discharge.as_ref(),
            _ => None,
        }
    }

    /// Rebuild the subtree with `sigma` applied to every expression.
    ///
    /// Identities are preserved.
    pub fn substitute(&self, sigma: &Substitution) -> Node {
        match self {
            Node::Goal { id, expr } => Node::Goal {
                id: *id,
                expr: sigma.apply(expr),
            },
            Node::Assumption { id, expr } => Node::Assumption {
                id: *id,
                expr: sigma.apply(expr),
            },
            Node::Application {
                id,
                rule,
                conclusion,
                hypotheses,
                discharge,
            } => Node::Application {
                id: *id,
                rule: rule.clone(),
                conclusion: sigma.apply(conclusion),
                hypotheses: hypotheses.iter().map(|h| h.substitute(sigma)).collect(),
                discharge: discharge.as_ref().map(|d| sigma.apply(d)),
            },
        }
    }

    /// Give every node in the subtree a new identity.
    pub fn refresh_ids(&mut self) {
        match self {
            Node::Goal { id, .. } | Node::Assumption { id, .. } => *id = NodeId::fresh(),
            Node::Application { id, hypotheses, .. } => {
                *id = NodeId::fresh();
                for h in hypotheses {
                    h.refresh_ids();
                }
            }
        }
    }

    /// Metavariables in every goal, assumption, conclusion and discharge.
    pub fn free_meta_variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_meta_variables(&mut vars);
        vars
    }

    fn collect_meta_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Node::Goal { expr, .. } | Node::Assumption { expr, .. } => {
                expr.collect_meta_variables(vars)
            }
            Node::Application {
                conclusion,
                hypotheses,
                discharge,
                ..
            } => {
                conclusion.collect_meta_variables(vars);
                if let Some(d) = discharge {
                    d.collect_meta_variables(vars);
                }
                for h in hypotheses {
                    h.collect_meta_variables(vars);
                }
            }
        }
    }

    /// Pre-order traversal.
    pub fn preorder(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.hypotheses().iter().rev());
        }
        out
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id() == id {
            return Some(self);
        }
        self.hypotheses().iter().find_map(|h| h.find(id))
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.id() == id {
            return Some(self);
        }
        match self {
            Node::Application { hypotheses, .. } => {
                hypotheses.iter_mut().find_map(|h| h.find_mut(id))
            }
            _ => None,
        }
    }

    /// True iff no goal remains anywhere in the subtree.
    pub fn is_complete(&self) -> bool {
        match self {
            Node::Goal { .. } => false,
            Node::Assumption { .. } => true,
            Node::Application { hypotheses, .. } => hypotheses.iter().all(Node::is_complete),
        }
    }

    pub fn depth(&self) -> usize {
        1 + self
            .hypotheses()
            .iter()
            .map(Node::depth)
            .max()
            .unwrap_or(0)
    }

    pub fn size(&self) -> usize {
        1 + self.hypotheses().iter().map(Node::size).sum::<usize>()
    }

    /// Demote every assumption not matched by a discharge in `scope`, or by a
    /// discharge of an enclosing application inside the subtree.
    fn revalidate(&mut self, scope: &mut Vec<Expr>) -> usize {
        match self {
            Node::Goal { .. } => 0,
            Node::Assumption { id, expr } => {
                if scope.contains(expr) {
                    0
                } else {
                    debug!(node = %id, "demoting assumption without enclosing discharge");
                    *self = Node::Goal {
                        id: *id,
                        expr: expr.clone(),
                    };
                    1
                }
            }
            Node::Application {
                hypotheses,
                discharge,
                ..
            } => {
                let pushed = match discharge {
                    Some(d) => {
                        scope.push(d.clone());
                        true
                    }
                    None => false,
                };
                let demoted: usize = hypotheses.iter_mut().map(|h| h.revalidate(scope)).sum();
                if pushed {
                    scope.pop();
                }
                demoted
            }
        }
    }
}

/// A proof tree with its parent side table.
///
/// Serialized as its root node; parent links are rebuilt on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "Node", into = "Node")]
pub struct ProofTree {
    root: Node,
    parents: HashMap<NodeId, NodeId>,
}

impl PartialEq for ProofTree {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for ProofTree {}

impl From<Node> for ProofTree {
    fn from(root: Node) -> Self {
        ProofTree::new(root)
    }
}

impl From<ProofTree> for Node {
    fn from(tree: ProofTree) -> Self {
        tree.root
    }
}

impl ProofTree {
    pub fn new(root: Node) -> Self {
        let mut tree = ProofTree {
            root,
            parents: HashMap::new(),
        };
        tree.relink();
        tree
    }

    /// A free-standing open goal.
    pub fn goal(expr: Expr) -> Self {
        ProofTree::new(Node::goal(expr))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_id(&self) -> NodeId {
        self.root.id()
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Rebuild the parent side table from scratch.
    pub fn relink(&mut self) {
        self.parents.clear();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            for h in node.hypotheses() {
                self.parents.insert(h.id(), node.id());
                stack.push(h);
            }
        }
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.root.find(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Replace the hypothesis `old` of application `parent` by `new`.
    ///
    /// Returns the removed child, or `None` without touching the tree when
    /// `parent` is a leaf or `old` is not one of its children.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: Node) -> Option<Node> {
        let removed = match self.root.find_mut(parent)? {
            Node::Application { hypotheses, .. } => {
                let slot = hypotheses.iter_mut().find(|h| h.id() == old)?;
                std::mem::replace(slot, new)
            }
            _ => return None,
        };
        self.relink();
        Some(removed)
    }

    /// Replace the node `id` wherever it sits, including at the root.
    pub fn replace_node(&mut self, id: NodeId, new: Node) -> Option<Node> {
        if self.root_id() == id {
            let removed = std::mem::replace(&mut self.root, new);
            self.relink();
            return Some(removed);
        }
        let parent = self.parent_of(id)?;
        self.replace_child(parent, id, new)
    }

    /// A copy of the tree with `sigma` applied to every expression.
    pub fn substitute(&self, sigma: &Substitution) -> ProofTree {
        ProofTree::new(self.root.substitute(sigma))
    }

    /// Apply `sigma` across the whole tree in place.
    pub fn specialize(&mut self, sigma: &Substitution) {
        self.root = self.root.substitute(sigma);
        self.relink();
    }

    pub fn free_meta_variables(&self) -> BTreeSet<String> {
        self.root.free_meta_variables()
    }

    /// Discharges of every application strictly above `id`, innermost first.
    pub fn context_discharges(&self, id: NodeId) -> Vec<Expr> {
        let mut discharges = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(ancestor) = current {
            if let Some(d) = self.find(ancestor).and_then(Node::discharge) {
                discharges.push(d.clone());
            }
            current = self.parent_of(ancestor);
        }
        discharges
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(ancestor) = current {
            out.push(ancestor);
            current = self.parent_of(ancestor);
        }
        out
    }

    /// Demote every assumption no longer covered by an enclosing discharge.
    ///
    /// Returns the number of demoted assumptions.
    pub fn revalidate_assumptions(&mut self) -> usize {
        let demoted = self.root.revalidate(&mut Vec::new());
        if demoted > 0 {
            debug!(demoted, "revalidated assumptions");
        }
        demoted
    }

    pub fn is_complete(&self) -> bool {
        self.root.is_complete()
    }

    pub fn goals(&self) -> Vec<&Node> {
        self.root
            .preorder()
            .into_iter()
            .filter(|n| n.is_goal())
            .collect()
    }

    pub fn open_goal_count(&self) -> usize {
        self.goals().len()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn size(&self) -> usize {
        self.root.size()
    }

    /// Cut the application `id` out of the tree.
    ///
    /// Its slot is filled with an open goal for its conclusion. The removed
    /// subtree is returned as a free-standing tree, with assumptions that lost
    /// their discharge demoted to goals. Detaching the root leaves the goal
    /// behind as the whole remaining tree.
    pub fn detach(&mut self, id: NodeId) -> CoreResult<ProofTree> {
        let conclusion = match self.find(id) {
            Some(Node::Application { conclusion, .. }) => conclusion.clone(),
            Some(_) => return Err(CoreError::NotAnApplication { id }),
            None => return Err(CoreError::NodeNotFound { id }),
        };
        let removed = self
            .replace_node(id, Node::goal(conclusion))
            .ok_or(CoreError::NodeNotFound { id })?;
        let mut detached = ProofTree::new(removed);
        let demoted = detached.revalidate_assumptions();
        debug!(node = %id, demoted, "detached subtree");
        Ok(detached)
    }

    /// Turn the assumption `id` back into an open goal in place.
    pub fn detach_assumption(&mut self, id: NodeId) -> CoreResult<Expr> {
        let expr = match self.find(id) {
            Some(Node::Assumption { expr, .. }) => expr.clone(),
            Some(_) => return Err(CoreError::NotAnAssumption { id }),
            None => return Err(CoreError::NodeNotFound { id }),
        };
        self.replace_node(id, Node::goal(expr.clone()))
            .ok_or(CoreError::NodeNotFound { id })?;
        Ok(expr)
    }

    /// A free assumption fragment for the discharge of application `owner`.
    pub fn assumption_for_discharge(&self, owner: NodeId) -> CoreResult<Node> {
        match self.find(owner) {
            Some(Node::Application {
                discharge: Some(d), ..
            }) => Ok(Node::assumption(d.clone())),
            Some(Node::Application { .. }) => Err(CoreError::NoDischarge { id: owner }),
            Some(_) => Err(CoreError::NotAnApplication { id: owner }),
            None => Err(CoreError::NodeNotFound { id: owner }),
        }
    }
}
