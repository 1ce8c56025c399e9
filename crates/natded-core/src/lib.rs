//! # natded-core
//!
//! **Symbolic engine for building natural-deduction proofs interactively**
//!
//! This crate holds everything an editor needs to let a user assemble a
//! propositional natural-deduction proof by dropping rule fragments onto open
//! goals. It performs no proof search; it checks that each attachment fits.
//!
//! ## Core Components
//!
//! ### Expressions ([`Expr`])
//! Propositions with structural equality:
//! - **Variables**: opaque atomic propositions named by the user (`P`, `Rain`)
//! - **Metavariables**: placeholders inside rule schemas and unfinished fragments
//! - **Connectives**: `¬`, `⋀`, `⋁`, `⇒`, `⇔` and the constants `⊤`, `⊥`
//!
//! ### Matching ([`Substitution`], [`fuse`], [`unify`])
//! - One-directional pattern matching of a schema against a ground expression
//! - Full two-sided unification with occurs-check and eager composition
//!
//! ### Rules ([`RuleCatalog`], [`Rule`])
//! Introduction and elimination rules for every connective, excluded middle,
//! double negation and reductio ad absurdum, plus user axioms. Catalogs can
//! be filtered with a [`RuleFilter`].
//!
//! ### Proof Trees ([`ProofTree`], [`Node`])
//! Goals, assumptions and rule applications, with a parent side table rebuilt
//! after every edit, scope queries over discharged hypotheses, detachment with
//! assumption revalidation, and a two-phase merge protocol
//! ([`propose_merge`] / [`commit_merge`]).
//!
//! ### Surface Syntax ([`syntax`])
//! Longest-match tokenizer with English, French and German keywords, a
//! recursive-descent parser, and a printer whose output always re-parses.
//!
//! ### Sessions ([`Workspace`])
//! An explicit editing context: placed trees, atomic gestures, undo/redo, and
//! JSON persistence through an injected [`Storage`].
//!
//! ## Quick Start
//!
//! ```rust
//! use natded_core::{parse_expr, RuleCatalog, Substitution, Workspace};
//!
//! let mut ws = Workspace::new(RuleCatalog::default());
//! let proof = ws.add_goal(parse_expr("P => P").unwrap());
//! let goal = ws.tree(proof).unwrap().root_id();
//!
//! // ⇒I on the goal, then close its premise with the discharged hypothesis.
//! ws.apply_rule("implI", proof, goal, &Substitution::empty()).unwrap();
//! let tree = ws.tree(proof).unwrap();
//! let owner = tree.root_id();
//! let premise = tree.root().hypotheses()[0].id();
//! let outcome = ws.merge_assumption(proof, owner, premise).unwrap().unwrap();
//!
//! assert!(outcome.complete);
//! ```

mod display;
mod error;
mod expr;
pub mod merge;
pub mod rules;
pub mod serialization;
pub mod session;
pub mod syntax;
pub mod tree;
pub mod unification;

pub use error::{CoreError, CoreResult};
pub use expr::{Connective, Expr};
pub use merge::{commit_merge, freshen_meta_variables, propose_merge, MergeProposal};
pub use rules::{axiom, standard_rules, Rule, RuleCatalog, RuleFilter, AXIOM_CODE};
pub use serialization::{
    parse_session, session_to_json, SessionDocument, FILE_EXTENSION, FORMAT_VERSION,
};
pub use session::{
    Detached, History, MemoryStorage, MergeOutcome, Placed, Storage, Workspace,
    DEFAULT_HISTORY_LIMIT,
};
pub use syntax::{parse_expr, print_expr, Locale, Notation, ParseError};
pub use tree::{Node, NodeId, ProofTree};
pub use unification::{fuse, substitute, unify, Substitution};
