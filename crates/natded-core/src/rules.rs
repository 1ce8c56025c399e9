//! # Inference Rule Catalog
//!
//! Each rule is a schema: hypothesis patterns, an optional discharge pattern
//! and a conclusion pattern, built from the metavariables `a`, `b` and `c`.
//!
//! | code      | hypotheses                  | discharge | conclusion |
//! |-----------|-----------------------------|-----------|------------|
//! | `trueI`   |                             |           | `⊤`        |
//! | `falseE`  | `⊥`                         |           | `a`        |
//! | `notI`    | `⊥`                         | `a`       | `¬a`       |
//! | `notE`    | `¬a`, `a`                   |           | `⊥`        |
//! | `andI`    | `a`, `b`                    |           | `a ⋀ b`    |
//! | `andE1`   | `a ⋀ b`                     |           | `a`        |
//! | `andE2`   | `a ⋀ b`                     |           | `b`        |
//! | `orI1`    | `a`                         |           | `a ⋁ b`    |
//! | `orI2`    | `b`                         |           | `a ⋁ b`    |
//! | `orE`     | `a ⋁ b`, `a ⇒ c`, `b ⇒ c`   |           | `c`        |
//! | `implI`   | `b`                         | `a`       | `a ⇒ b`    |
//! | `implE`   | `a ⇒ b`, `a`                |           | `b`        |
//! | `iffI`    | `a ⇒ b`, `b ⇒ a`            |           | `a ⇔ b`    |
//! | `iffE1`   | `a ⇔ b`                     |           | `a ⇒ b`    |
//! | `iffE2`   | `a ⇔ b`                     |           | `b ⇒ a`    |
//! | `notNotE` | `¬¬a`                       |           | `a`        |
//! | `tnd`     |                             |           | `a ⋁ ¬a`   |
//! | `raa`     | `⊥`                         | `¬a`      | `a`        |
//!
//! Instantiating a rule yields an [`Node::Application`] whose premises are
//! open goals carrying the hypothesis patterns verbatim. They are specialized
//! later, when fragments are merged onto them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::expr::Expr;
use crate::tree::{Node, NodeId};

/// Code of the dynamic axiom rule.
pub const AXIOM_CODE: &str = "axiom";

/// An inference rule schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier used by filters and the command line.
    pub code: String,
    /// Short label shown next to the inference line.
    pub name: String,
    pub hypotheses: Vec<Expr>,
    pub discharge: Option<Expr>,
    pub conclusion: Expr,
}

impl Rule {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        hypotheses: Vec<Expr>,
        discharge: Option<Expr>,
        conclusion: Expr,
    ) -> Self {
        Rule {
            code: code.into(),
            name: name.into(),
            hypotheses,
            discharge,
            conclusion,
        }
    }

    /// A zero-hypothesis trusted fact.
    pub fn axiom(expr: Expr) -> Self {
        Rule::new(AXIOM_CODE, "AX", Vec::new(), None, expr)
    }

    /// Build an application node with one fresh open goal per hypothesis.
    pub fn instantiate(&self) -> Node {
        Node::Application {
            id: NodeId::fresh(),
            rule: self.clone(),
            conclusion: self.conclusion.clone(),
            hypotheses: self.hypotheses.iter().cloned().map(Node::goal).collect(),
            discharge: self.discharge.clone(),
        }
    }

    /// Metavariables mentioned anywhere in the schema.
    pub fn meta_variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        for h in &self.hypotheses {
            h.collect_meta_variables(&mut vars);
        }
        if let Some(d) = &self.discharge {
            d.collect_meta_variables(&mut vars);
        }
        self.conclusion.collect_meta_variables(&mut vars);
        vars
    }
}

/// Wrap a user-supplied expression as a closed axiom application.
pub fn axiom(expr: Expr) -> Node {
    Rule::axiom(expr).instantiate()
}

fn a() -> Expr {
    Expr::meta("a")
}

fn b() -> Expr {
    Expr::meta("b")
}

fn c() -> Expr {
    Expr::meta("c")
}

/// The built-in natural deduction rules, in display order.
pub fn standard_rules() -> Vec<Rule> {
    vec![
        Rule::new("trueI", "⊤I", vec![], None, Expr::truth()),
        Rule::new("falseE", "⊥E", vec![Expr::falsity()], None, a()),
        Rule::new("notI", "¬I", vec![Expr::falsity()], Some(a()), Expr::not(a())),
        Rule::new("notE", "¬E", vec![Expr::not(a()), a()], None, Expr::falsity()),
        Rule::new("andI", "⋀I", vec![a(), b()], None, Expr::and(a(), b())),
        Rule::new("andE1", "⋀E1", vec![Expr::and(a(), b())], None, a()),
        Rule::new("andE2", "⋀E2", vec![Expr::and(a(), b())], None, b()),
        Rule::new("orI1", "⋁I1", vec![a()], None, Expr::or(a(), b())),
        Rule::new("orI2", "⋁I2", vec![b()], None, Expr::or(a(), b())),
        Rule::new(
            "orE",
            "⋁E",
            vec![
                Expr::or(a(), b()),
                Expr::implies(a(), c()),
                Expr::implies(b(), c()),
            ],
            None,
            c(),
        ),
        Rule::new("implI", "⇒I", vec![b()], Some(a()), Expr::implies(a(), b())),
        Rule::new("implE", "⇒E", vec![Expr::implies(a(), b()), a()], None, b()),
        Rule::new(
            "iffI",
            "⇔I",
            vec![Expr::implies(a(), b()), Expr::implies(b(), a())],
            None,
            Expr::iff(a(), b()),
        ),
        Rule::new("iffE1", "⇔E1", vec![Expr::iff(a(), b())], None, Expr::implies(a(), b())),
        Rule::new("iffE2", "⇔E2", vec![Expr::iff(a(), b())], None, Expr::implies(b(), a())),
        Rule::new("notNotE", "¬¬E", vec![Expr::not(Expr::not(a()))], None, a()),
        Rule::new("tnd", "TND", vec![], None, Expr::or(a(), Expr::not(a()))),
        Rule::new("raa", "RAA", vec![Expr::falsity()], Some(Expr::not(a())), a()),
    ]
}

/// Allow-list and deny-list of rule codes applied when a catalog is built.
///
/// `include` is applied first (when present), then `exclude`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl RuleFilter {
    pub fn allows(&self, code: &str) -> bool {
        let included = match &self.include {
            Some(codes) => codes.iter().any(|c| c == code),
            None => true,
        };
        included && !self.exclude.iter().any(|c| c == code)
    }
}

/// The rules available to a workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        RuleCatalog {
            rules: standard_rules(),
        }
    }
}

impl RuleCatalog {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleCatalog { rules }
    }

    /// Standard rules restricted by `filter`.
    pub fn filtered(filter: &RuleFilter) -> Self {
        RuleCatalog {
            rules: standard_rules()
                .into_iter()
                .filter(|r| filter.allows(&r.code))
                .collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Instantiate the rule with the given code.
    ///
    /// Distinguishes a rule that does not exist from one removed by the
    /// catalog's filter.
    pub fn instantiate(&self, code: &str) -> CoreResult<Node> {
        match self.get(code) {
            Some(rule) => Ok(rule.instantiate()),
            None if standard_rules().iter().any(|r| r.code == code) => {
                Err(CoreError::RuleDisabled {
                    code: code.to_string(),
                })
            }
            None => Err(CoreError::UnknownRule {
                code: code.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contains_required_rules() {
        let catalog = RuleCatalog::default();
        for code in [
            "trueI", "falseE", "notI", "notE", "andI", "andE1", "andE2", "orI1", "orI2", "orE",
            "implI", "implE", "iffI", "iffE1", "iffE2", "notNotE", "tnd", "raa",
        ] {
            assert!(catalog.get(code).is_some(), "missing rule {}", code);
        }
        assert_eq!(catalog.len(), 18);
    }

    #[test]
    fn test_instantiate_and_intro() {
        let node = RuleCatalog::default().instantiate("andI").unwrap();
        match node {
            Node::Application {
                conclusion,
                hypotheses,
                discharge,
                ..
            } => {
                assert_eq!(conclusion, Expr::and(a(), b()));
                assert_eq!(discharge, None);
                assert_eq!(hypotheses.len(), 2);
                assert!(matches!(&hypotheses[0], Node::Goal { expr, .. } if *expr == a()));
                assert!(matches!(&hypotheses[1], Node::Goal { expr, .. } if *expr == b()));
            }
            other => panic!("expected application, got {:?}", other),
        }
    }

    #[test]
    fn test_instantiate_gives_distinct_ids() {
        let rule = RuleCatalog::default().get("implE").cloned().unwrap();
        assert_ne!(rule.instantiate().id(), rule.instantiate().id());
    }

    #[test]
    fn test_discharging_rules() {
        let catalog = RuleCatalog::default();
        let discharging: Vec<_> = catalog
            .iter()
            .filter(|r| r.discharge.is_some())
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(discharging, vec!["notI", "implI", "raa"]);
    }

    #[test]
    fn test_axiom() {
        let node = axiom(Expr::var("P"));
        match node {
            Node::Application {
                rule,
                hypotheses,
                conclusion,
                ..
            } => {
                assert_eq!(rule.code, AXIOM_CODE);
                assert_eq!(rule.name, "AX");
                assert!(hypotheses.is_empty());
                assert_eq!(conclusion, Expr::var("P"));
            }
            other => panic!("expected application, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_include_then_exclude() {
        let filter = RuleFilter {
            include: Some(vec!["andI".into(), "andE1".into(), "orI1".into()]),
            exclude: vec!["orI1".into()],
        };
        let catalog = RuleCatalog::filtered(&filter);
        assert_eq!(catalog.codes(), vec!["andI", "andE1"]);
    }

    #[test]
    fn test_disabled_and_unknown_rules() {
        let catalog = RuleCatalog::filtered(&RuleFilter {
            include: None,
            exclude: vec!["tnd".into()],
        });
        assert!(matches!(
            catalog.instantiate("tnd"),
            Err(CoreError::RuleDisabled { .. })
        ));
        assert!(matches!(
            catalog.instantiate("modusTollens"),
            Err(CoreError::UnknownRule { .. })
        ));
    }

    #[test]
    fn test_rule_meta_variables() {
        let catalog = RuleCatalog::default();
        let or_e = catalog.get("orE").unwrap();
        let vars: Vec<_> = or_e.meta_variables().into_iter().collect();
        assert_eq!(vars, vec!["a", "b", "c"]);
        assert!(catalog.get("trueI").unwrap().meta_variables().is_empty());
    }
}
