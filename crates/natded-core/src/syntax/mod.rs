//! # Surface Syntax
//!
//! Text in, [`Expr`] out, and back. All functions here are pure.
//!
//! ```text
//! iff     := implies (IFF implies)*
//! implies := or (IMPLIES or)*
//! or      := and (OR and)*
//! and     := not (AND not)*
//! not     := NOT* atom
//! atom    := TRUE | FALSE | VARIABLE | METAVARIABLE | "(" iff ")"
//! ```
//!
//! Each binary level folds its operands to the right, so `a & b & c` reads
//! as `a & (b & c)`.
//!
//! Identifiers starting with a lowercase letter are metavariables and all
//! others are variables. `"quoted text"` is always a variable and `?name` or
//! `?"quoted"` is always a metavariable, which lets the printer write back any
//! name.
//!
//! ## Examples
//!
//! ```rust
//! use natded_core::syntax::{parse_expr, print_expr, Notation};
//! use natded_core::Expr;
//!
//! let e = parse_expr("a & b => c").unwrap();
//! assert_eq!(
//!     e,
//!     Expr::implies(Expr::and(Expr::meta("a"), Expr::meta("b")), Expr::meta("c"))
//! );
//! assert_eq!(print_expr(&e, Notation::Ascii), "a & b => c");
//! assert_eq!(parse_expr(&print_expr(&e, Notation::Unicode)).unwrap(), e);
//! ```

pub mod parser;
pub mod printer;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

pub use parser::{parse, parse_tokens, ParseError};
pub use printer::{print_expr, Notation};
pub use tokenizer::{tokenize, Token, TokenKind};

/// Keyword language for connectives and constants.
///
/// Symbols and English keywords are always recognized; a locale adds its own
/// spellings on top.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    De,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Fr, Locale::De];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::De => "de",
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "fr" => Ok(Locale::Fr),
            "de" => Ok(Locale::De),
            other => Err(format!("Unknown locale '{}' (expected en, fr or de)", other)),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Parse with English keywords.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    parse(input, Locale::En)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_str() {
        assert_eq!("FR".parse::<Locale>().unwrap(), Locale::Fr);
        assert_eq!("de".parse::<Locale>().unwrap(), Locale::De);
        assert!("xx".parse::<Locale>().is_err());
    }

    #[test]
    fn test_round_trip_example() {
        let e = parse_expr("a & b => c").unwrap();
        for notation in [Notation::Unicode, Notation::Ascii] {
            let printed = print_expr(&e, notation);
            assert_eq!(parse_expr(&printed).unwrap(), e, "{}", printed);
        }
    }
}
