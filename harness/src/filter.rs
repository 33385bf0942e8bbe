//! Textual checks a candidate seed must pass before it is shown to the
//! compiler.
//!
//! These are substring heuristics over raw text, not a C parser. Braces and
//! keywords inside comments, strings or longer identifiers count the same as
//! real ones.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a candidate was dropped from the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooShort { length: usize },
    ShallowNesting,
    StrayBreak { offset: usize },
    StrayContinue { offset: usize },
    CompileFailed,
    CompileTimedOut,
    NotUtf8,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooShort { length } => write!(f, "too short ({length} chars)"),
            Rejection::ShallowNesting => f.write_str("not enough nested braces"),
            Rejection::StrayBreak { offset } => write!(f, "`break` outside a loop at {offset}"),
            Rejection::StrayContinue { offset } => {
                write!(f, "`continue` outside a loop at {offset}")
            }
            Rejection::CompileFailed => f.write_str("does not compile"),
            Rejection::CompileTimedOut => f.write_str("compiler timed out"),
            Rejection::NotUtf8 => f.write_str("not UTF-8 text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Gates {
    /// Candidates of this many characters or fewer are rejected.
    pub min_length: usize,
    /// Opening braces that must be followed by as many closing ones.
    pub nesting_depth: usize,
    /// Smallest brace balance at which `break` is allowed.
    pub break_depth: i64,
    /// Smallest brace balance at which `continue` is allowed.
    pub continue_depth: i64,
}

impl Default for Gates {
    fn default() -> Self {
        Self {
            min_length: 200,
            nesting_depth: 3,
            break_depth: 5,
            continue_depth: 4,
        }
    }
}

impl Gates {
    /// Run the length, nesting and loop-scoping gates in order.
    pub fn check(&self, text: &str) -> Result<(), Rejection> {
        check_length(text, self.min_length)?;
        check_nesting(text, self.nesting_depth)?;
        check_loop_scoping(text, self.break_depth, self.continue_depth)
    }
}

pub fn check_length(text: &str, min_length: usize) -> Result<(), Rejection> {
    let length = text.chars().count();
    if length <= min_length {
        return Err(Rejection::TooShort { length });
    }
    Ok(())
}

/// Passes if `depth` opening braces appear in order and are followed, further
/// right, by `depth` closing braces. Whether they actually pair up is not
/// checked.
pub fn check_nesting(text: &str, depth: usize) -> Result<(), Rejection> {
    if depth == 0 {
        return Ok(());
    }
    let mut opens = 0;
    let mut closes = 0;
    for c in text.chars() {
        if opens < depth {
            if c == '{' {
                opens += 1;
            }
        } else if c == '}' {
            closes += 1;
            if closes == depth {
                return Ok(());
            }
        }
    }
    Err(Rejection::ShallowNesting)
}

/// Every `break` needs a brace balance of at least `break_depth`, every
/// `continue` at least `continue_depth`, and both need `for` or `while`
/// somewhere before them.
pub fn check_loop_scoping(
    text: &str,
    break_depth: i64,
    continue_depth: i64,
) -> Result<(), Rejection> {
    let first_for = text.find("for").map(|p| p + "for".len());
    let first_while = text.find("while").map(|p| p + "while".len());
    let loop_before = |i: usize| {
        first_for.is_some_and(|end| end <= i) || first_while.is_some_and(|end| end <= i)
    };

    let bytes = text.as_bytes();
    let mut balance: i64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let rest = &bytes[i..];
        match b {
            b'{' => balance += 1,
            b'}' => balance -= 1,
            _ if rest.starts_with(b"break") => {
                if balance < break_depth || !loop_before(i) {
                    return Err(Rejection::StrayBreak { offset: i });
                }
            }
            _ if rest.starts_with(b"continue") => {
                if balance < continue_depth || !loop_before(i) {
                    return Err(Rejection::StrayContinue { offset: i });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_gate_boundary() {
        assert_eq!(
            check_length(&"x".repeat(200), 200),
            Err(Rejection::TooShort { length: 200 })
        );
        assert_eq!(check_length(&"x".repeat(201), 200), Ok(()));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 150 two-byte characters: 300 bytes but only 150 chars.
        assert!(check_length(&"é".repeat(150), 200).is_err());
    }

    #[test]
    fn nesting_needs_three_levels() {
        assert_eq!(check_nesting("a{b{c}d}e", 3), Err(Rejection::ShallowNesting));
        assert_eq!(check_nesting("a{b{c{d}e}f}g", 3), Ok(()));
        assert_eq!(check_nesting("{\n{\n{\n}\n}\n}", 3), Ok(()));
    }

    #[test]
    fn nesting_is_order_based_not_paired() {
        // Three sibling blocks followed by closers further right still pass.
        assert_eq!(check_nesting("{}{}{ } } }", 3), Ok(()));
        // Closers before the third opener do not count.
        assert_eq!(check_nesting("{}}}{{", 3), Err(Rejection::ShallowNesting));
    }

    #[test]
    fn break_inside_deep_loop_passes() {
        assert_eq!(check_loop_scoping("for(;;){{{{{break;}}}}}", 5, 4), Ok(()));
    }

    #[test]
    fn break_without_loop_fails() {
        assert_eq!(
            check_loop_scoping("{{break;}}", 5, 4),
            Err(Rejection::StrayBreak { offset: 2 })
        );
        // Deep enough but no loop keyword before it.
        assert!(check_loop_scoping("{{{{{break;}}}}} for", 5, 4).is_err());
    }

    #[test]
    fn break_too_shallow_fails_even_in_loop() {
        assert!(check_loop_scoping("while(1){{{break;}}}", 5, 4).is_err());
    }

    #[test]
    fn continue_needs_balance_four() {
        assert_eq!(check_loop_scoping("while(1){{{{continue;}}}}", 5, 4), Ok(()));
        assert_eq!(
            check_loop_scoping("while(1){{{continue;}}}", 5, 4),
            Err(Rejection::StrayContinue { offset: 11 })
        );
    }

    #[test]
    fn continue_without_loop_fails() {
        assert_eq!(
            check_loop_scoping("{{{{continue;}}}}", 5, 4),
            Err(Rejection::StrayContinue { offset: 4 })
        );
    }

    #[test]
    fn keywords_inside_identifiers_count() {
        // `breakfast` trips the scan the same way `break` does.
        assert!(check_loop_scoping("{int breakfast;}", 5, 4).is_err());
        // A `for` inside `format` satisfies the loop precondition.
        assert_eq!(check_loop_scoping("format{{{{{break;}}}}}", 5, 4), Ok(()));
    }

    #[test]
    fn gates_run_in_order() {
        let gates = Gates::default();
        assert_eq!(
            gates.check("{{{}}}"),
            Err(Rejection::TooShort { length: 6 })
        );
        let flat = "x".repeat(300);
        assert_eq!(gates.check(&flat), Err(Rejection::ShallowNesting));
        let stray = format!("{}{{{{{{break;}}}}}}", "x".repeat(300));
        assert!(matches!(gates.check(&stray), Err(Rejection::StrayBreak { .. })));
    }
}
