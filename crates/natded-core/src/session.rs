//! # Workspace Sessions
//!
//! A [`Workspace`] is the explicit editing context a host threads through
//! every gesture: an ordered forest of placed proof trees, the rule catalog in
//! force, an undo/redo [`History`], and the state [`Workspace::reset`]
//! returns to.
//!
//! Every gesture is atomic. Inputs are validated and matches computed before
//! anything changes; only then is a snapshot taken and the forest edited. A
//! rejected merge (the fragment does not fit the goal) returns `Ok(None)` and
//! leaves both the forest and the history untouched.
//!
//! Persistence goes through the [`Storage`] port, so the engine never touches
//! the file system itself.
//!
//! ## Examples
//!
//! ```rust
//! use natded_core::{parse_expr, RuleCatalog, Substitution, Workspace};
//!
//! let mut ws = Workspace::new(RuleCatalog::default());
//! let target = ws.add_goal(parse_expr("P & Q => Q").unwrap());
//! let source = ws.add_rule("implI").unwrap();
//! let goal = ws.tree(target).unwrap().root_id();
//!
//! let outcome = ws.merge(source, target, goal, &Substitution::empty()).unwrap().unwrap();
//! assert_eq!(outcome.index, 0);
//! assert_eq!(ws.len(), 1);
//!
//! assert!(ws.undo());
//! assert_eq!(ws.len(), 2);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::expr::Expr;
use crate::merge::{commit_merge, propose_merge, MergeProposal};
use crate::rules::{axiom, RuleCatalog};
use crate::serialization::{parse_session, session_to_json, SessionDocument};
use crate::tree::{Node, NodeId, ProofTree};
use crate::unification::Substitution;

/// Offset between successive new trees, and between a tree and a subtree
/// detached from it.
const PLACEMENT_STEP: f64 = 30.0;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// A tree with its canvas position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placed {
    pub tree: ProofTree,
    pub x: f64,
    pub y: f64,
}

impl Placed {
    pub fn new(tree: ProofTree, x: f64, y: f64) -> Self {
        Placed { tree, x, y }
    }
}

/// Parent-link-free copy of a forest.
type Frame = Vec<(Node, f64, f64)>;

fn capture(items: &[Placed]) -> Frame {
    items
        .iter()
        .map(|p| (p.tree.root().clone(), p.x, p.y))
        .collect()
}

fn restore(frame: Frame) -> Vec<Placed> {
    frame
        .into_iter()
        .map(|(root, x, y)| Placed::new(ProofTree::new(root), x, y))
        .collect()
}

/// Undo and redo stacks of forest snapshots.
#[derive(Clone, Debug)]
pub struct History {
    undo: Vec<Frame>,
    redo: Vec<Frame>,
    /// Redo stack cleared by the latest snapshot, kept for `cancel_snapshot`.
    discarded: Vec<Frame>,
    /// Oldest frame dropped by the latest snapshot to respect `limit`.
    trimmed: Option<Frame>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        History::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        History {
            undo: Vec::new(),
            redo: Vec::new(),
            discarded: Vec::new(),
            trimmed: None,
            limit: limit.max(1),
        }
    }

    /// Record `items` as the state to return to. Clears the redo stack.
    pub fn snapshot(&mut self, items: &[Placed]) {
        self.undo.push(capture(items));
        self.trimmed = if self.undo.len() > self.limit {
            Some(self.undo.remove(0))
        } else {
            None
        };
        self.discarded = std::mem::take(&mut self.redo);
    }

    /// Drop the most recent snapshot and bring back what it displaced: the
    /// redo stack and, at the limit, the oldest undo frame.
    pub fn cancel_snapshot(&mut self) {
        self.undo.pop();
        if let Some(frame) = self.trimmed.take() {
            self.undo.insert(0, frame);
        }
        self.redo = std::mem::take(&mut self.discarded);
    }

    /// Pop the last snapshot, pushing `current` for redo.
    pub fn undo(&mut self, current: &[Placed]) -> Option<Vec<Placed>> {
        let frame = self.undo.pop()?;
        self.redo.push(capture(current));
        Some(restore(frame))
    }

    pub fn redo(&mut self, current: &[Placed]) -> Option<Vec<Placed>> {
        let frame = self.redo.pop()?;
        self.undo.push(capture(current));
        Some(restore(frame))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.discarded.clear();
        self.trimmed = None;
    }
}

/// Text blob storage injected by the host.
pub trait Storage {
    fn read(&self, key: &str) -> CoreResult<Option<String>>;
    fn write(&mut self, key: &str, contents: &str) -> CoreResult<()>;
    fn remove(&mut self, key: &str) -> CoreResult<()>;
}

/// In-process storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, contents: &str) -> CoreResult<()> {
        self.entries.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Result of a committed merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Index of the target tree after the merge.
    pub index: usize,
    /// Whether the target tree no longer has open goals.
    pub complete: bool,
}

/// Result of a detach gesture.
#[derive(Clone, Debug, PartialEq)]
pub enum Detached {
    /// A subtree now standing alone at `index`.
    Subtree { index: usize },
    /// An assumption turned back into a goal in place.
    Assumption { expr: Expr },
}

/// The editing context: placed trees, rules, history.
#[derive(Clone, Debug)]
pub struct Workspace {
    items: Vec<Placed>,
    catalog: RuleCatalog,
    history: History,
    initial: Vec<Placed>,
}

impl Workspace {
    pub fn new(catalog: RuleCatalog) -> Self {
        Workspace::with_initial(catalog, Vec::new())
    }

    /// A workspace that starts from, and resets to, `items`.
    pub fn with_initial(catalog: RuleCatalog, items: Vec<Placed>) -> Self {
        Workspace {
            items: fresh_copy(&items),
            catalog,
            history: History::default(),
            initial: items,
        }
    }

    /// Replace the undo history, e.g. to change its depth limit.
    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    /// A workspace whose initial state is a saved session.
    pub fn from_json(catalog: RuleCatalog, text: &str) -> CoreResult<Self> {
        Ok(Workspace::with_initial(catalog, parse_session(text)?))
    }

    pub fn items(&self) -> &[Placed] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(CoreError::TreeNotFound {
                index,
                len: self.items.len(),
            })
        }
    }

    pub fn placed(&self, index: usize) -> CoreResult<&Placed> {
        self.check_index(index)?;
        Ok(&self.items[index])
    }

    pub fn tree(&self, index: usize) -> CoreResult<&ProofTree> {
        Ok(&self.placed(index)?.tree)
    }

    pub fn is_complete(&self, index: usize) -> CoreResult<bool> {
        Ok(self.tree(index)?.is_complete())
    }

    fn snapshot(&mut self) {
        self.history.snapshot(&self.items);
    }

    fn next_position(&self) -> (f64, f64) {
        let step = PLACEMENT_STEP * self.items.len() as f64;
        (step, step)
    }

    fn push_tree(&mut self, tree: ProofTree) -> usize {
        let (x, y) = self.next_position();
        self.snapshot();
        self.items.push(Placed::new(tree, x, y));
        self.items.len() - 1
    }

    /// Add a free-standing open goal. Returns its index.
    pub fn add_goal(&mut self, expr: Expr) -> usize {
        debug!(expr = %expr, "adding goal");
        self.push_tree(ProofTree::goal(expr))
    }

    /// Add a closed axiom application. Returns its index.
    pub fn add_axiom(&mut self, expr: Expr) -> usize {
        debug!(expr = %expr, "adding axiom");
        self.push_tree(ProofTree::new(axiom(expr)))
    }

    /// Add a fresh instance of a catalog rule. Returns its index.
    pub fn add_rule(&mut self, code: &str) -> CoreResult<usize> {
        let node = self.catalog.instantiate(code)?;
        debug!(rule = code, "adding rule instance");
        Ok(self.push_tree(ProofTree::new(node)))
    }

    pub fn delete(&mut self, index: usize) -> CoreResult<Placed> {
        self.check_index(index)?;
        self.snapshot();
        debug!(index, "deleting tree");
        Ok(self.items.remove(index))
    }

    pub fn move_to(&mut self, index: usize, x: f64, y: f64) -> CoreResult<()> {
        self.check_index(index)?;
        if !x.is_finite() || !y.is_finite() {
            return Err(CoreError::NonFiniteCoordinate { x, y });
        }
        self.snapshot();
        let placed = &mut self.items[index];
        placed.x = x;
        placed.y = y;
        Ok(())
    }

    /// Detach the node `node` of tree `index`.
    ///
    /// An application is cut out and placed as a new tree next to the
    /// original, leaving an open goal in its slot. An assumption becomes an
    /// open goal in place.
    pub fn detach(&mut self, index: usize, node: NodeId) -> CoreResult<Detached> {
        let (is_assumption, is_application) = match self.tree(index)?.find(node) {
            Some(n) => (n.is_assumption(), n.is_application()),
            None => return Err(CoreError::NodeNotFound { id: node }),
        };

        if is_assumption {
            self.snapshot();
            return match self.items[index].tree.detach_assumption(node) {
                Ok(expr) => Ok(Detached::Assumption { expr }),
                Err(e) => {
                    self.history.cancel_snapshot();
                    Err(e)
                }
            };
        }
        if !is_application {
            return Err(CoreError::NotAnApplication { id: node });
        }

        self.snapshot();
        let placed = &mut self.items[index];
        match placed.tree.detach(node) {
            Ok(subtree) => {
                let (x, y) = (placed.x + PLACEMENT_STEP, placed.y + PLACEMENT_STEP);
                self.items.push(Placed::new(subtree, x, y));
                Ok(Detached::Subtree {
                    index: self.items.len() - 1,
                })
            }
            Err(e) => {
                self.history.cancel_snapshot();
                Err(e)
            }
        }
    }

    /// Apply user-chosen replacements across tree `index`.
    pub fn specialize(&mut self, index: usize, sigma: &Substitution) -> CoreResult<()> {
        self.check_index(index)?;
        self.snapshot();
        debug!(index, sigma = %sigma, "specializing tree");
        self.items[index].tree.specialize(sigma);
        Ok(())
    }

    fn require_goal(tree: &ProofTree, goal: NodeId) -> CoreResult<()> {
        match tree.find(goal) {
            Some(Node::Goal { .. }) => Ok(()),
            Some(_) => Err(CoreError::NotAGoal { id: goal }),
            None => Err(CoreError::NodeNotFound { id: goal }),
        }
    }

    /// Match tree `source` against goal `goal` of tree `target` without
    /// changing anything.
    pub fn propose(
        &self,
        source: usize,
        target: usize,
        goal: NodeId,
    ) -> CoreResult<Option<MergeProposal>> {
        if source == target {
            return Err(CoreError::SelfMerge);
        }
        let fragment = self.tree(source)?.root();
        let target_tree = self.tree(target)?;
        Self::require_goal(target_tree, goal)?;
        Ok(propose_merge(fragment, target_tree, goal))
    }

    /// Commit a proposal from [`Workspace::propose`]: the source tree is
    /// consumed and spliced into the target.
    ///
    /// `source` must still hold the tree the proposal was made from.
    pub fn commit(
        &mut self,
        source: usize,
        target: usize,
        proposal: MergeProposal,
    ) -> CoreResult<MergeOutcome> {
        if source == target {
            return Err(CoreError::SelfMerge);
        }
        if self.tree(source)?.root_id() != proposal.fragment().id() {
            return Err(CoreError::StaleSource { index: source });
        }
        Self::require_goal(self.tree(target)?, proposal.goal())?;

        self.snapshot();
        let complete = match commit_merge(&mut self.items[target].tree, proposal) {
            Ok(complete) => complete,
            Err(e) => {
                self.history.cancel_snapshot();
                return Err(e);
            }
        };
        self.items.remove(source);
        let index = if target > source { target - 1 } else { target };
        debug!(source, target = index, complete, "merged trees");
        Ok(MergeOutcome { index, complete })
    }

    /// Drop tree `source` onto goal `goal` of tree `target`.
    ///
    /// `choices` resolves metavariables the match leaves open, named as in
    /// the source tree; pass an empty substitution to keep them. Returns `Ok(None)` when the fragment does
    /// not fit the goal.
    pub fn merge(
        &mut self,
        source: usize,
        target: usize,
        goal: NodeId,
        choices: &Substitution,
    ) -> CoreResult<Option<MergeOutcome>> {
        let Some(mut proposal) = self.propose(source, target, goal)? else {
            debug!(source, target, goal = %goal, "merge rejected");
            return Ok(None);
        };
        if !choices.is_empty() {
            proposal.specialize_fragment(choices)?;
        }
        self.commit(source, target, proposal).map(Some)
    }

    /// Instantiate rule `code` directly onto goal `goal` of tree `target`.
    pub fn apply_rule(
        &mut self,
        code: &str,
        target: usize,
        goal: NodeId,
        choices: &Substitution,
    ) -> CoreResult<Option<MergeOutcome>> {
        let fragment = self.catalog.instantiate(code)?;
        let tree = self.tree(target)?;
        Self::require_goal(tree, goal)?;
        let Some(mut proposal) = propose_merge(&fragment, tree, goal) else {
            debug!(rule = code, goal = %goal, "rule does not apply");
            return Ok(None);
        };
        if !choices.is_empty() {
            proposal.specialize_fragment(choices)?;
        }
        self.snapshot();
        match commit_merge(&mut self.items[target].tree, proposal) {
            Ok(complete) => Ok(Some(MergeOutcome {
                index: target,
                complete,
            })),
            Err(e) => {
                self.history.cancel_snapshot();
                Err(e)
            }
        }
    }

    /// Close goal `goal` with the hypothesis discharged by application
    /// `owner`, both in tree `target`.
    ///
    /// The goal must lie below `owner`.
    pub fn merge_assumption(
        &mut self,
        target: usize,
        owner: NodeId,
        goal: NodeId,
    ) -> CoreResult<Option<MergeOutcome>> {
        let tree = self.tree(target)?;
        let fragment = tree.assumption_for_discharge(owner)?;
        Self::require_goal(tree, goal)?;
        if !tree.ancestors(goal).contains(&owner) {
            return Err(CoreError::OutOfScope { owner, goal });
        }
        let Some(proposal) = propose_merge(&fragment, tree, goal) else {
            debug!(owner = %owner, goal = %goal, "assumption rejected");
            return Ok(None);
        };

        self.snapshot();
        match commit_merge(&mut self.items[target].tree, proposal) {
            Ok(complete) => Ok(Some(MergeOutcome {
                index: target,
                complete,
            })),
            Err(e) => {
                self.history.cancel_snapshot();
                Err(e)
            }
        }
    }

    /// Return to the initial state. Undoable.
    pub fn reset(&mut self) {
        self.snapshot();
        self.items = fresh_copy(&self.initial);
        debug!(items = self.items.len(), "workspace reset");
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.items) {
            Some(items) => {
                self.items = items;
                debug!(remaining = self.history.undo_depth(), "undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.items) {
            Some(items) => {
                self.items = items;
                debug!(remaining = self.history.redo_depth(), "redo");
                true
            }
            None => false,
        }
    }

    /// The forest as a bare JSON array.
    pub fn to_json(&self) -> CoreResult<String> {
        session_to_json(&self.items)
    }

    /// The forest wrapped in a versioned document.
    pub fn to_document_json(&self) -> CoreResult<String> {
        Ok(SessionDocument::new(self.items.clone()).to_json_pretty()?)
    }

    /// Replace the forest with a saved session. Undoable.
    pub fn load_json(&mut self, text: &str) -> CoreResult<()> {
        let items = parse_session(text)?;
        self.snapshot();
        self.items = items;
        Ok(())
    }

    pub fn save(&self, storage: &mut dyn Storage, key: &str) -> CoreResult<()> {
        storage.write(key, &self.to_json()?)?;
        debug!(key, items = self.items.len(), "session saved");
        Ok(())
    }

    /// Load the session stored under `key`. Returns `false` when there is
    /// none, leaving the workspace unchanged.
    pub fn load(&mut self, storage: &dyn Storage, key: &str) -> CoreResult<bool> {
        match storage.read(key)? {
            Some(text) => {
                self.load_json(&text)?;
                debug!(key, items = self.items.len(), "session loaded");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn fresh_copy(items: &[Placed]) -> Vec<Placed> {
    items
        .iter()
        .map(|p| {
            let mut root = p.tree.root().clone();
            root.refresh_ids();
            Placed::new(ProofTree::new(root), p.x, p.y)
        })
        .collect()
}
