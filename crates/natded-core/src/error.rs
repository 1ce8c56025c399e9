//! Error types for the engine and session layer.
//!
//! Failing to unify or pattern-match is not an error: those operations return
//! `None`, meaning "this fragment does not apply here".

use thiserror::Error;

use crate::syntax::ParseError;
use crate::tree::NodeId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Unknown rule '{code}'")]
    UnknownRule { code: String },
    #[error("Rule '{code}' is disabled in this catalog")]
    RuleDisabled { code: String },
    #[error("Tree {index} not found (workspace holds {len} trees)")]
    TreeNotFound { index: usize, len: usize },
    #[error("Node {id} not found in tree")]
    NodeNotFound { id: NodeId },
    #[error("Node {id} is not an open goal")]
    NotAGoal { id: NodeId },
    #[error("Node {id} is not an assumption")]
    NotAnAssumption { id: NodeId },
    #[error("Node {id} is not a rule application")]
    NotAnApplication { id: NodeId },
    #[error("Node {id} does not discharge any hypothesis")]
    NoDischarge { id: NodeId },
    #[error("Goal {goal} is outside the scope of the hypothesis discharged by {owner}")]
    OutOfScope { owner: NodeId, goal: NodeId },
    #[error("Cannot merge a tree into itself")]
    SelfMerge,
    #[error("Tree {index} is no longer the tree this merge was proposed for")]
    StaleSource { index: usize },
    #[error("Metavariable '{name}' does not occur in the fragment")]
    UnknownMetaVariable { name: String },
    #[error("Coordinates ({x}, {y}) are not finite")]
    NonFiniteCoordinate { x: f64, y: f64 },
    #[error("Session format version {found} is not compatible with {expected}")]
    IncompatibleVersion { found: String, expected: String },
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error for key '{key}': {message}")]
    Storage { key: String, message: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
