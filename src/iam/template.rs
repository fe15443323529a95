//! Template patterns with embedded regex fragments
//!
//! A template mixes literal text with raw regular expressions wrapped in
//! caller-chosen delimiters. Literal spans are escaped, fragments are kept
//! verbatim, and the whole is anchored:
//!
//! ```
//! use iam_match::iam::compile_template;
//!
//! let compiled = compile_template("foo:bar.baz:<[0-9]{2,10}>", b'<', b'>').unwrap();
//! assert!(compiled.is_match("foo:bar.baz:123").unwrap());
//! assert!(!compiled.is_match("foo:bar.baz:abc").unwrap());
//! ```
//!
//! Prefer delimiters with no meaning in regex syntax such as `<` and `>`.

use super::pattern::{build_regex, CompiledPattern};
use crate::config::MatcherConfig;
use crate::error::{PolicyError, Result};
use std::time::Duration;

/// Compile a template using the default evaluation budget
pub fn compile_template(template: &str, open: u8, close: u8) -> Result<CompiledPattern> {
    compile_template_with_budget(
        template,
        open,
        close,
        MatcherConfig::default().match_timeout(),
    )
}

/// Compile a template with an explicit evaluation budget
///
/// Delimiter balance is checked before anything reaches the regex engine.
pub fn compile_template_with_budget(
    template: &str,
    open: u8,
    close: u8,
    budget: Duration,
) -> Result<CompiledPattern> {
    for delimiter in [open, close] {
        if !delimiter.is_ascii() {
            return Err(PolicyError::InvalidDelimiter(delimiter));
        }
    }

    let spans = delimiter_spans(template, open, close)?;

    let mut expr = String::with_capacity(template.len() * 2 + 2);
    expr.push('^');

    let mut end = 0;
    for &(start, stop) in &spans {
        let fragment = &template[start + 1..stop - 1];

        // Each fragment must stand alone as a valid expression
        build_regex(&format!("^{}$", fragment))?;

        expr.push_str(&regex::escape(&template[end..start]));
        expr.push('(');
        expr.push_str(fragment);
        expr.push(')');
        end = stop;
    }

    expr.push_str(&regex::escape(&template[end..]));
    expr.push('$');

    tracing::debug!("Compiling template {:?} as {:?}", template, expr);
    CompiledPattern::from_expression(template, &expr, budget)
}

/// Byte ranges `[start, stop)` of top-level delimited spans, delimiters included
///
/// Nested delimiters are kept inside their enclosing span.
fn delimiter_spans(template: &str, open: u8, close: u8) -> Result<Vec<(usize, usize)>> {
    let unbalanced = || PolicyError::UnbalancedDelimiters {
        template: template.to_string(),
    };

    let mut level: usize = 0;
    let mut start = 0;
    let mut spans = Vec::new();

    for (i, &byte) in template.as_bytes().iter().enumerate() {
        if byte == open {
            if level == 0 {
                start = i;
            }
            level += 1;
        } else if byte == close {
            level = level.checked_sub(1).ok_or_else(unbalanced)?;
            if level == 0 {
                spans.push((start, i + 1));
            }
        }
    }

    if level != 0 {
        return Err(unbalanced());
    }

    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_match() {
        let p = compile_template("foo:bar.baz:<[0-9]{2,10}>", b'<', b'>').unwrap();
        assert!(p.is_match("foo:bar.baz:123").unwrap());
        assert!(p.is_match("foo:bar.baz:1234567890").unwrap());
        assert!(!p.is_match("foo:bar.baz:abc").unwrap());
        assert!(!p.is_match("foo:bar.baz:1").unwrap());
        // Literal dots are escaped
        assert!(!p.is_match("foo:barXbaz:123").unwrap());
    }

    #[test]
    fn test_template_expression() {
        let p = compile_template("a.<b+>.c", b'<', b'>').unwrap();
        assert_eq!(p.as_regex_str(), r"^a\.(b+)\.c$");
        assert_eq!(p.source(), "a.<b+>.c");
    }

    #[test]
    fn test_multiple_fragments() {
        let p = compile_template("<[a-z]+>:<[0-9]+>", b'<', b'>').unwrap();
        assert!(p.is_match("abc:123").unwrap());
        assert!(!p.is_match("abc:def").unwrap());
    }

    #[test]
    fn test_no_fragments_is_literal() {
        let p = compile_template("plain.text", b'<', b'>').unwrap();
        assert!(p.is_match("plain.text").unwrap());
        assert!(!p.is_match("plainXtext").unwrap());
    }

    #[test]
    fn test_unbalanced_open() {
        let err = compile_template("foo:<bar", b'<', b'>').unwrap_err();
        assert!(matches!(err, PolicyError::UnbalancedDelimiters { .. }));
    }

    #[test]
    fn test_unbalanced_close() {
        let err = compile_template("foo:bar>", b'<', b'>').unwrap_err();
        assert!(matches!(err, PolicyError::UnbalancedDelimiters { .. }));

        let err = compile_template("<a>>b<", b'<', b'>').unwrap_err();
        assert!(matches!(err, PolicyError::UnbalancedDelimiters { .. }));
    }

    #[test]
    fn test_curly_delimiters_nest() {
        let spans = delimiter_spans("x{a{1}}y{b}", b'{', b'}').unwrap();
        assert_eq!(spans, vec![(1, 7), (8, 11)]);
    }

    #[test]
    fn test_non_ascii_delimiter() {
        let err = compile_template("caf\u{e9}", 0xc3, b'>').unwrap_err();
        assert!(matches!(err, PolicyError::InvalidDelimiter(0xc3)));
    }

    #[test]
    fn test_invalid_fragment() {
        let err = compile_template("foo:<[0-9>", b'<', b'>').unwrap_err();
        assert!(matches!(err, PolicyError::Compile(_)));
    }
}
