//! Printer, the syntactic inverse of the parser.
//!
//! Both operands of a binary connective are printed one level above the
//! connective's own precedence, so nested connectives of equal precedence
//! are always parenthesized. Printing then parsing gives back an equal
//! expression; the text itself need not match the original input.

use serde::{Deserialize, Serialize};

use super::tokenizer::{is_identifier, is_reserved};
use crate::expr::{Connective, Expr};

/// Symbol set used when printing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    #[default]
    Unicode,
    Ascii,
}

impl std::str::FromStr for Notation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unicode" => Ok(Notation::Unicode),
            "ascii" => Ok(Notation::Ascii),
            other => Err(format!(
                "Unknown notation '{}' (expected unicode or ascii)",
                other
            )),
        }
    }
}

impl Notation {
    fn connective(self, c: Connective) -> &'static str {
        match (self, c) {
            (Notation::Unicode, Connective::And) => "⋀",
            (Notation::Unicode, Connective::Or) => "⋁",
            (Notation::Unicode, Connective::Implies) => "⇒",
            (Notation::Unicode, Connective::Iff) => "⇔",
            (Notation::Ascii, Connective::And) => "&",
            (Notation::Ascii, Connective::Or) => "|",
            (Notation::Ascii, Connective::Implies) => "=>",
            (Notation::Ascii, Connective::Iff) => "<=>",
        }
    }

    fn not(self) -> &'static str {
        match self {
            Notation::Unicode => "¬",
            Notation::Ascii => "~",
        }
    }

    fn constant(self, value: bool) -> &'static str {
        match (self, value) {
            (Notation::Unicode, true) => "⊤",
            (Notation::Unicode, false) => "⊥",
            (Notation::Ascii, true) => "true",
            (Notation::Ascii, false) => "false",
        }
    }
}

const NOT_LEVEL: u8 = 4;
const ATOM_LEVEL: u8 = 5;

fn level(expr: &Expr) -> u8 {
    match expr {
        Expr::Not(_) => NOT_LEVEL,
        _ => match expr.as_binary() {
            Some((c, _, _)) => c.precedence(),
            None => ATOM_LEVEL,
        },
    }
}

fn quote(name: &str, out: &mut String) {
    out.push('"');
    for c in name.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
}

fn write_variable(name: &str, out: &mut String) {
    if is_identifier(name) && !starts_lowercase(name) && !is_reserved(name) {
        out.push_str(name);
    } else {
        quote(name, out);
    }
}

fn write_meta_variable(name: &str, out: &mut String) {
    if is_identifier(name) && starts_lowercase(name) && !is_reserved(name) {
        out.push_str(name);
    } else if is_identifier(name) {
        out.push('?');
        out.push_str(name);
    } else {
        out.push('?');
        quote(name, out);
    }
}

fn write_expr(expr: &Expr, min_level: u8, notation: Notation, out: &mut String) {
    let own = level(expr);
    let wrap = own < min_level;
    if wrap {
        out.push('(');
    }
    match expr {
        Expr::Variable(name) => write_variable(name, out),
        Expr::MetaVariable(name) => write_meta_variable(name, out),
        Expr::Constant(value) => out.push_str(notation.constant(*value)),
        Expr::Not(inner) => {
            out.push_str(notation.not());
            write_expr(inner, NOT_LEVEL, notation, out);
        }
        _ => {
            if let Some((c, l, r)) = expr.as_binary() {
                write_expr(l, own + 1, notation, out);
                out.push(' ');
                out.push_str(notation.connective(c));
                out.push(' ');
                write_expr(r, own + 1, notation, out);
            }
        }
    }
    if wrap {
        out.push(')');
    }
}

/// Render `expr` so that parsing the result yields an equal expression.
pub fn print_expr(expr: &Expr, notation: Notation) -> String {
    let mut out = String::new();
    write_expr(expr, 0, notation, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_expr;

    fn a() -> Expr {
        Expr::meta("a")
    }

    fn b() -> Expr {
        Expr::meta("b")
    }

    #[test]
    fn test_unicode_symbols() {
        let e = Expr::iff(
            Expr::implies(Expr::and(a(), b()), Expr::or(a(), Expr::not(b()))),
            Expr::truth(),
        );
        assert_eq!(print_expr(&e, Notation::Unicode), "a ⋀ b ⇒ a ⋁ ¬b ⇔ ⊤");
    }

    #[test]
    fn test_nested_same_connective_is_parenthesized() {
        let right = Expr::and(a(), Expr::and(b(), a()));
        assert_eq!(print_expr(&right, Notation::Ascii), "a & (b & a)");
        let left = Expr::implies(Expr::implies(a(), b()), a());
        assert_eq!(print_expr(&left, Notation::Ascii), "(a => b) => a");
    }

    #[test]
    fn test_negation_of_binary() {
        let e = Expr::not(Expr::or(a(), b()));
        assert_eq!(print_expr(&e, Notation::Unicode), "¬(a ⋁ b)");
        assert_eq!(print_expr(&Expr::not(Expr::not(a())), Notation::Ascii), "~~a");
    }

    #[test]
    fn test_name_escaping() {
        assert_eq!(print_expr(&Expr::var("P"), Notation::Ascii), "P");
        assert_eq!(print_expr(&Expr::var("p"), Notation::Ascii), "\"p\"");
        assert_eq!(print_expr(&Expr::var("AND"), Notation::Ascii), "\"AND\"");
        assert_eq!(print_expr(&Expr::meta("X1"), Notation::Ascii), "?X1");
        assert_eq!(print_expr(&Expr::meta("or"), Notation::Ascii), "?or");
        assert_eq!(print_expr(&Expr::meta("a b"), Notation::Ascii), "?\"a b\"");
        assert_eq!(
            print_expr(&Expr::var("say \"hi\""), Notation::Ascii),
            r#""say \"hi\"""#
        );
    }

    #[test]
    fn test_printed_names_round_trip() {
        for e in [
            Expr::var("p"),
            Expr::var("et"),
            Expr::var(""),
            Expr::meta("X1"),
            Expr::meta("ssi"),
            Expr::meta("back\\slash"),
            Expr::and(Expr::var("a b"), Expr::meta("Q")),
        ] {
            for notation in [Notation::Unicode, Notation::Ascii] {
                let printed = print_expr(&e, notation);
                assert_eq!(parse_expr(&printed).unwrap(), e, "{}", printed);
            }
        }
    }
}
