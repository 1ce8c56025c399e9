//! Longest-match tokenizer.
//!
//! At every position each token class is tried in order and the longest
//! match wins; on a tie the earlier class wins, so keywords beat identifiers
//! of the same length. Input no class accepts becomes a one-character
//! [`TokenKind::Error`] token instead of failing.

use super::Locale;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    And,
    Or,
    Implies,
    Iff,
    Not,
    True,
    False,
    LeftParen,
    RightParen,
    Variable(String),
    MetaVariable(String),
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token.
    pub text: String,
    /// Byte offset in the input.
    pub offset: usize,
}

static SYMBOLS: &[(&str, TokenKind)] = &[
    ("∧", TokenKind::And),
    ("⋀", TokenKind::And),
    ("&", TokenKind::And),
    ("/\\", TokenKind::And),
    ("∨", TokenKind::Or),
    ("⋁", TokenKind::Or),
    ("|", TokenKind::Or),
    ("\\/", TokenKind::Or),
    ("⇒", TokenKind::Implies),
    ("→", TokenKind::Implies),
    ("=>", TokenKind::Implies),
    ("->", TokenKind::Implies),
    ("⇔", TokenKind::Iff),
    ("↔", TokenKind::Iff),
    ("<=>", TokenKind::Iff),
    ("<->", TokenKind::Iff),
    ("¬", TokenKind::Not),
    ("~", TokenKind::Not),
    ("!", TokenKind::Not),
    ("⊤", TokenKind::True),
    ("⊥", TokenKind::False),
];

static ENGLISH: &[(&str, TokenKind)] = &[
    ("and", TokenKind::And),
    ("AND", TokenKind::And),
    ("or", TokenKind::Or),
    ("OR", TokenKind::Or),
    ("implies", TokenKind::Implies),
    ("IMPLIES", TokenKind::Implies),
    ("iff", TokenKind::Iff),
    ("IFF", TokenKind::Iff),
    ("not", TokenKind::Not),
    ("NOT", TokenKind::Not),
    ("true", TokenKind::True),
    ("TRUE", TokenKind::True),
    ("false", TokenKind::False),
    ("FALSE", TokenKind::False),
];

static FRENCH: &[(&str, TokenKind)] = &[
    ("et", TokenKind::And),
    ("ET", TokenKind::And),
    ("ou", TokenKind::Or),
    ("OU", TokenKind::Or),
    ("implique", TokenKind::Implies),
    ("IMPLIQUE", TokenKind::Implies),
    ("ssi", TokenKind::Iff),
    ("SSI", TokenKind::Iff),
    ("non", TokenKind::Not),
    ("NON", TokenKind::Not),
    ("vrai", TokenKind::True),
    ("VRAI", TokenKind::True),
    ("faux", TokenKind::False),
    ("FAUX", TokenKind::False),
];

static GERMAN: &[(&str, TokenKind)] = &[
    ("und", TokenKind::And),
    ("UND", TokenKind::And),
    ("oder", TokenKind::Or),
    ("ODER", TokenKind::Or),
    ("impliziert", TokenKind::Implies),
    ("IMPLIZIERT", TokenKind::Implies),
    ("gdw", TokenKind::Iff),
    ("GDW", TokenKind::Iff),
    ("nicht", TokenKind::Not),
    ("NICHT", TokenKind::Not),
    ("wahr", TokenKind::True),
    ("WAHR", TokenKind::True),
    ("falsch", TokenKind::False),
    ("FALSCH", TokenKind::False),
];

impl Locale {
    fn keywords(self) -> impl Iterator<Item = &'static (&'static str, TokenKind)> {
        let extra: &'static [(&'static str, TokenKind)] = match self {
            Locale::En => &[],
            Locale::Fr => FRENCH,
            Locale::De => GERMAN,
        };
        SYMBOLS.iter().chain(ENGLISH).chain(extra)
    }
}

/// True when `word` is a keyword in any locale.
pub fn is_reserved(word: &str) -> bool {
    ENGLISH
        .iter()
        .chain(FRENCH)
        .chain(GERMAN)
        .any(|(kw, _)| kw.eq_ignore_ascii_case(word))
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

/// True when `name` scans as a single bare identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_continue),
        _ => false,
    }
}

fn scan_identifier(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices();
    match chars.next() {
        Some((_, c)) if is_identifier_start(c) => {}
        _ => return None,
    }
    Some(
        chars
            .find(|(_, c)| !is_identifier_continue(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len()),
    )
}

/// Scan a `"..."` literal with `\"` and `\\` escapes. Returns the consumed
/// length and the unescaped content.
fn scan_quoted(rest: &str) -> Option<(usize, String)> {
    let mut chars = rest.char_indices();
    if !matches!(chars.next(), Some((_, '"'))) {
        return None;
    }
    let mut content = String::new();
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            content.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some((i + 1, content));
        } else {
            content.push(c);
        }
    }
    None
}

fn scan_meta(rest: &str) -> Option<(usize, String)> {
    let after = rest.strip_prefix('?')?;
    if let Some((len, name)) = scan_quoted(after) {
        return Some((len + 1, name));
    }
    let len = scan_identifier(after)?;
    Some((len + 1, after[..len].to_string()))
}

/// Best candidate at the start of `rest`, or `None` when nothing matches.
fn next_token(rest: &str, locale: Locale) -> Option<(usize, TokenKind)> {
    let mut best: Option<(usize, TokenKind)> = None;
    let mut consider = |len: usize, kind: TokenKind| {
        if len > 0 && best.as_ref().map_or(true, |(b, _)| len > *b) {
            best = Some((len, kind));
        }
    };

    for (text, kind) in locale.keywords() {
        if rest.starts_with(text) {
            consider(text.len(), kind.clone());
        }
    }
    if rest.starts_with('(') {
        consider(1, TokenKind::LeftParen);
    }
    if rest.starts_with(')') {
        consider(1, TokenKind::RightParen);
    }
    if let Some((len, name)) = scan_quoted(rest) {
        consider(len, TokenKind::Variable(name));
    }
    if let Some((len, name)) = scan_meta(rest) {
        consider(len, TokenKind::MetaVariable(name));
    }
    if let Some(len) = scan_identifier(rest) {
        let name = rest[..len].to_string();
        let starts_lowercase = name.chars().next().is_some_and(char::is_lowercase);
        if starts_lowercase {
            consider(len, TokenKind::MetaVariable(name));
        } else {
            consider(len, TokenKind::Variable(name));
        }
    }

    best
}

/// Split `input` into tokens, skipping whitespace.
pub fn tokenize(input: &str, locale: Locale) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        let (len, kind) = next_token(rest, locale).unwrap_or((c.len_utf8(), TokenKind::Error));
        tokens.push(Token {
            kind,
            text: rest[..len].to_string(),
            offset: pos,
        });
        pos += len;
    }

    tokens
}
