//! Deferred version resolution from a source file
//!
//! Reads a module-level `__version__ = "x.y.z"` assignment (plain or
//! annotated) out of a Python source file. This is deliberately a minimal
//! statement scanner, not a real parser: anything that is not a single
//! assignment of a plain string literal to `__version__` yields `None`
//! ("unresolved"), never an error.

use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a module-level `__version__` string literal from `path`.
///
/// The first top-level `__version__` assignment decides the outcome:
/// a plain string literal resolves, anything else is unresolved.
/// Unreadable files are unresolved, not an error.
pub fn read_version_literal(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;

    // Open triple-quote delimiter when inside a multi-line string
    let mut in_string: Option<&'static str> = None;

    for line in content.lines() {
        if in_string.is_some() {
            in_string = scan_triple_quotes(line, in_string);
            continue;
        }
        // Top-level statements only: indented lines belong to some block,
        // and a line inside a docstring is not a statement at all
        if !line.starts_with([' ', '\t'])
            && let Some(value) = assignment_value(line)
        {
            let resolved = parse_string_literal(value.trim());
            debug!(
                "__version__ in {}: {}",
                path.display(),
                resolved.as_deref().unwrap_or("<unresolved>")
            );
            return resolved;
        }
        in_string = scan_triple_quotes(line, None);
    }

    None
}

/// The right-hand side of a `__version__` assignment (plain or annotated),
/// or `None` when the line is not one.
fn assignment_value(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("__version__")?;
    // Reject longer identifiers such as `__version__info`
    if rest
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
        return None;
    }

    let rest = rest.trim_start();
    if let Some(annotated) = rest.strip_prefix(':') {
        // Annotated assignment: `__version__: str = "..."`.
        // A bare annotation without a value is not an assignment.
        annotated.find('=').map(|idx| &annotated[idx + 1..])
    } else if let Some(assigned) = rest.strip_prefix('=') {
        // `==` is a comparison, not an assignment
        if assigned.starts_with('=') {
            None
        } else {
            Some(assigned)
        }
    } else {
        None
    }
}

/// Track `"""`/`'''` open/close state across one line. Returns the delimiter
/// still open after the line, if any.
fn scan_triple_quotes(
    line: &str,
    mut open: Option<&'static str>,
) -> Option<&'static str> {
    let mut rest = line;
    loop {
        match open {
            Some(delim) => match rest.find(delim) {
                Some(idx) => {
                    rest = &rest[idx + delim.len()..];
                    open = None;
                }
                None => return open,
            },
            None => {
                let dq = rest.find("\"\"\"");
                let sq = rest.find("'''");
                let (idx, delim) = match (dq, sq) {
                    (Some(d), Some(s)) if s < d => (s, "'''"),
                    (Some(d), _) => (d, "\"\"\""),
                    (None, Some(s)) => (s, "'''"),
                    (None, None) => return None,
                };
                rest = &rest[idx + delim.len()..];
                open = Some(delim);
            }
        }
    }
}

/// Parse a complete single-line Python string literal, allowing only
/// trailing whitespace or a `#` comment after the closing quote.
fn parse_string_literal(s: &str) -> Option<String> {
    let quote = match s.chars().next()? {
        q @ ('"' | '\'') => q,
        _ => return None,
    };

    let mut out = String::new();
    let mut escaped = false;
    let mut end = None;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            match c {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' | '\'' | '"' => out.push(c),
                other => {
                    // Python leaves unknown escapes intact
                    out.push('\\');
                    out.push(other);
                }
            }
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            c if c == quote => {
                end = Some(i + c.len_utf8());
                break;
            }
            c => out.push(c),
        }
    }

    let end = end?;
    let trailing = s[end..].trim();
    if trailing.is_empty() || trailing.starts_with('#') {
        Some(out)
    } else {
        None
    }
}
