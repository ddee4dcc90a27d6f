//! Incremental lexer for `accept` dependency lists
//!
//! Extracts the literal dependency URLs passed to a module's hot-accept
//! declaration without running a full parse. Only the first argument
//! position is scanned; anything that is not a plain string or an array of
//! plain strings means the call shape cannot be analyzed and the module is
//! treated as self-accepting.
//!
//! # Example
//! ```
//! use quickserve::lexer::lex_accepted_hmr_deps;
//! use rustc_hash::FxHashSet;
//!
//! let source = "import.meta.hot.accept(['./a.js', './b.js'], () => {})";
//! let start = source.find('(').unwrap() + 1;
//! let mut urls = FxHashSet::default();
//! let self_accepts = lex_accepted_hmr_deps(source, start, &mut urls).unwrap();
//! assert!(!self_accepts);
//! assert!(urls.contains("./a.js") && urls.contains("./b.js"));
//! ```

use rustc_hash::FxHashSet;

use crate::error::{location_at, Error, Result};

/// Textual form of a hot-accept call head, up to and including the opening
/// parenthesis. [`scan_accept_calls`] looks for this exact sequence.
pub const ACCEPT_CALL: &str = "import.meta.hot.accept(";

/// Lexer states. Nesting never exceeds one level (a string inside the array
/// inside the call), so a single previous-state register replaces a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    InCall,
    InArray,
    InSingleQuoteString,
    InDoubleQuoteString,
    InTemplateString,
}

/// Scan the first argument of an accept call starting at byte offset
/// `start` (just past the opening parenthesis). String literals found in a
/// plain-string or array-of-strings argument are committed into `urls`.
///
/// Returns `true` when the argument shape is not analyzable (no argument,
/// callback first, or any other expression) - the module then accepts its
/// own updates. Returns `false` when a literal dependency list was read to
/// completion, or on end of input.
///
/// Template interpolation and non-literal array content are errors carrying
/// the offending source offset: dependency identifiers must be statically
/// known at scan time.
pub fn lex_accepted_hmr_deps(
    code: &str,
    start: usize,
    urls: &mut FxHashSet<String>,
) -> Result<bool> {
    let mut state = LexerState::InCall;
    let mut prev_state = LexerState::InCall;
    let mut current_dep = String::new();

    for (pos, ch) in code[start..].char_indices() {
        let offset = start + pos;
        match state {
            LexerState::InCall | LexerState::InArray => match ch {
                '\'' => {
                    prev_state = state;
                    state = LexerState::InSingleQuoteString;
                }
                '"' => {
                    prev_state = state;
                    state = LexerState::InDoubleQuoteString;
                }
                '`' => {
                    prev_state = state;
                    state = LexerState::InTemplateString;
                }
                c if c.is_whitespace() => {}
                '[' if state == LexerState::InCall => state = LexerState::InArray,
                _ if state == LexerState::InCall => {
                    // Not a string or array literal: callback, no argument,
                    // or an unsupported expression. Self-accepting.
                    return Ok(true);
                }
                ']' => return Ok(false),
                ',' => {}
                _ => {
                    return Err(Error::lexer_error_with_context(
                        format!("unexpected character {ch:?} in hot-accept dependency array; dependencies must be string literals"),
                        location_at(code, offset),
                        code,
                    ));
                }
            },
            LexerState::InSingleQuoteString | LexerState::InDoubleQuoteString => {
                let quote = if state == LexerState::InSingleQuoteString {
                    '\''
                } else {
                    '"'
                };
                if ch == quote {
                    urls.insert(std::mem::take(&mut current_dep));
                    if prev_state == LexerState::InCall {
                        // A bare string argument: the call is fully read.
                        return Ok(false);
                    }
                    state = prev_state;
                } else {
                    current_dep.push(ch);
                }
            }
            LexerState::InTemplateString => {
                if ch == '`' {
                    urls.insert(std::mem::take(&mut current_dep));
                    if prev_state == LexerState::InCall {
                        return Ok(false);
                    }
                    state = prev_state;
                } else if ch == '$' && code[offset + ch.len_utf8()..].starts_with('{') {
                    return Err(Error::lexer_error_with_context(
                        "template interpolation is not supported in hot-accept dependency lists; dependencies must be statically known",
                        location_at(code, offset),
                        code,
                    ));
                } else {
                    current_dep.push(ch);
                }
            }
        }
    }

    // Ran off the end of the source without a terminal condition. Keep
    // whatever was collected; the caller decides what a truncated call means.
    Ok(false)
}

/// Find hot-accept call sites in `code`, returning for each the byte offset
/// just past the opening parenthesis - the `start` that
/// [`lex_accepted_hmr_deps`] expects.
///
/// This is a textual scan: occurrences inside comments or string literals
/// are reported too. Callers that transform sources decide relevance.
pub fn scan_accept_calls(code: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut from = 0;
    while let Some(pos) = code[from..].find(ACCEPT_CALL) {
        let after_paren = from + pos + ACCEPT_CALL.len();
        offsets.push(after_paren);
        from = after_paren;
    }
    offsets
}
