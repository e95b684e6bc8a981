//! Generic S-expression parser for KiCad files.
//!
//! Both `.kicad_pcb` and `.kicad_sch` share the same outer grammar: a
//! Lisp-like tree of whitespace-separated atoms and parenthesized lists.
//! This parser knows nothing about KiCad semantics; it only produces a
//! generic value tree for the extractors to walk.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SexpError {
    #[error("Unexpected end of input - unclosed list")]
    UnclosedList,
    #[error("Unexpected end of input - unclosed quoted string")]
    UnclosedString,
}

/// One node of the generic value tree.
///
/// Unquoted atoms that fully parse as numbers become `Int` or `Float`
/// (atoms containing `.` are tried as floats, others as integers); quoted
/// strings always stay `Str`. The decision is a full-string parse, so
/// `3.5abc` remains a string atom.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    Str(String),
    Int(i64),
    Float(f64),
    List(Vec<Sexp>),
}

impl Sexp {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Sexp::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of an `Int` or `Float` atom.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Sexp::Int(n) => Some(*n as f64),
            Sexp::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Sexp::Int(n) => u32::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::List(items) => Some(items),
            _ => None,
        }
    }

    /// First atom of a list, by convention its semantic tag.
    pub fn tag(&self) -> Option<&str> {
        self.as_list().and_then(|l| l.first()).and_then(|a| a.as_str())
    }

    /// Atom rendered as text regardless of its numeric classification.
    /// Extractors use this where KiCad is lax about quoting (pad numbers,
    /// layer names that happen to look numeric).
    pub fn text(&self) -> Option<String> {
        match self {
            Sexp::Str(s) => Some(s.clone()),
            Sexp::Int(n) => Some(n.to_string()),
            Sexp::Float(f) => Some(f.to_string()),
            Sexp::List(_) => None,
        }
    }

    /// First child list tagged `tag`.
    pub fn child(&self, tag: &str) -> Option<&Sexp> {
        self.as_list()?.iter().find(|item| item.tag() == Some(tag))
    }

    /// All child lists tagged `tag`.
    pub fn children<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Sexp> {
        self.as_list()
            .unwrap_or(&[])
            .iter()
            .filter(move |item| item.tag() == Some(tag))
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Str(s) => {
                // Quote anything that would not reparse as the same string
                // atom: empty, delimiter-bearing, or numeric-looking.
                let needs_quotes = s.is_empty()
                    || s.chars()
                        .any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '"')
                    || !matches!(classify_atom(s.clone()), Sexp::Str(_));
                if needs_quotes {
                    write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
                } else {
                    write!(f, "{}", s)
                }
            }
            Sexp::Int(n) => write!(f, "{}", n),
            Sexp::Float(x) => {
                if x.fract() == 0.0 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Sexp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

pub struct SexpParser {
    input: Vec<char>,
    pos: usize,
}

impl SexpParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Parse one top-level expression. Empty or whitespace-only input
    /// yields `Ok(None)`; an unclosed list or string is a fatal error
    /// with no partial result.
    pub fn parse(&mut self) -> Result<Option<Sexp>, SexpError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Ok(None);
        }
        self.parse_expr().map(Some)
    }

    fn parse_expr(&mut self) -> Result<Sexp, SexpError> {
        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.parse_list()
        } else {
            self.parse_atom()
        }
    }

    fn parse_list(&mut self) -> Result<Sexp, SexpError> {
        self.pos += 1; // '('
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();

            match self.peek() {
                None => return Err(SexpError::UnclosedList),
                Some(')') => {
                    self.pos += 1;
                    return Ok(Sexp::List(items));
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Sexp, SexpError> {
        if self.peek() == Some('"') {
            return self.parse_quoted_string();
        }

        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' {
                break;
            }
            self.pos += 1;
        }
        let atom: String = self.input[start..self.pos].iter().collect();

        Ok(classify_atom(atom))
    }

    fn parse_quoted_string(&mut self) -> Result<Sexp, SexpError> {
        self.pos += 1; // opening quote
        let mut s = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.pos += 1;
                    return Ok(Sexp::Str(s));
                }
                '\\' => {
                    // Backslash escapes the next character verbatim.
                    self.pos += 1;
                    match self.peek() {
                        Some(next) => {
                            s.push(next);
                            self.pos += 1;
                        }
                        None => return Err(SexpError::UnclosedString),
                    }
                }
                _ => {
                    s.push(ch);
                    self.pos += 1;
                }
            }
        }

        Err(SexpError::UnclosedString)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, |c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}

fn classify_atom(atom: String) -> Sexp {
    if atom.contains('.') {
        if let Ok(f) = atom.parse::<f64>() {
            return Sexp::Float(f);
        }
    } else if let Ok(n) = atom.parse::<i64>() {
        return Sexp::Int(n);
    }
    Sexp::Str(atom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Sexp {
        SexpParser::new(text).parse().unwrap().unwrap()
    }

    #[test]
    fn test_parse_atom() {
        assert_eq!(parse("hello"), Sexp::Str("hello".to_string()));
    }

    #[test]
    fn test_parse_quoted_string() {
        assert_eq!(parse("\"hello world\""), Sexp::Str("hello world".to_string()));
    }

    #[test]
    fn test_quoted_numbers_stay_strings() {
        assert_eq!(parse("\"3.5\""), Sexp::Str("3.5".to_string()));
    }

    #[test]
    fn test_escape_is_verbatim() {
        assert_eq!(parse(r#""a\"b\\c""#), Sexp::Str("a\"b\\c".to_string()));
        // No special escape meanings: \n is just 'n'
        assert_eq!(parse(r#""a\nb""#), Sexp::Str("anb".to_string()));
    }

    #[test]
    fn test_numeric_classification() {
        assert_eq!(parse("3"), Sexp::Int(3));
        assert_eq!(parse("-12"), Sexp::Int(-12));
        assert_eq!(parse("3.0"), Sexp::Float(3.0));
        assert_eq!(parse("-0.25"), Sexp::Float(-0.25));
        // Full-string parse only: partial numbers stay strings
        assert_eq!(parse("3.5abc"), Sexp::Str("3.5abc".to_string()));
        assert_eq!(parse("F.Cu"), Sexp::Str("F.Cu".to_string()));
    }

    #[test]
    fn test_parse_list() {
        let result = parse("(a b c)");
        let items = result.as_list().expect("list");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Sexp::Str("a".to_string()));
    }

    #[test]
    fn test_parse_nested() {
        let result = parse("(kicad_pcb (net 1 \"GND\") (net 2 \"+3V3\"))");
        assert_eq!(result.tag(), Some("kicad_pcb"));
        let nets: Vec<_> = result.children("net").collect();
        assert_eq!(nets.len(), 2);
        assert_eq!(nets[0].as_list().unwrap()[1], Sexp::Int(1));
        assert_eq!(nets[1].as_list().unwrap()[2], Sexp::Str("+3V3".to_string()));
    }

    #[test]
    fn test_empty_input_is_none() {
        assert_eq!(SexpParser::new("").parse().unwrap(), None);
        assert_eq!(SexpParser::new("   \n\t ").parse().unwrap(), None);
    }

    #[test]
    fn test_unclosed_list() {
        assert_eq!(
            SexpParser::new("(a (b c)").parse(),
            Err(SexpError::UnclosedList)
        );
    }

    #[test]
    fn test_unclosed_string() {
        assert_eq!(
            SexpParser::new("(a \"oops").parse(),
            Err(SexpError::UnclosedString)
        );
    }

    #[test]
    fn test_display_round_trip() {
        let text = "(footprint \"Lib:R_0402\" (at 10.5 20 90) (pad \"1\" smd rect))";
        let first = parse(text);
        let second = parse(&first.to_string());
        assert_eq!(first, second);
    }

    #[test]
    fn test_display_round_trip_preserves_atom_kinds() {
        let first = parse("(x 3 3.0 \"3\" abc)");
        let second = parse(&first.to_string());
        assert_eq!(first, second);
    }

    #[test]
    fn test_child_lookup() {
        let fp = parse("(footprint \"L:F\" (at 1 2 45) (layer \"F.Cu\"))");
        let at = fp.child("at").unwrap().as_list().unwrap();
        assert_eq!(at[1].as_f64(), Some(1.0));
        assert_eq!(at[3].as_f64(), Some(45.0));
        assert!(fp.child("missing").is_none());
    }
}
