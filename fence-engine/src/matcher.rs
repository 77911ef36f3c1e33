//! Disallowed-path classification.
//!
//! A pattern matches a path if either
//! - it matches the whole path as a shell pattern, or
//! - the path contains it as a literal substring.
//!
//! Shell patterns use the usual path-matching rules:
//! - `*` is any run of characters other than `/`
//! - `?` is one character other than `/`
//! - `[abc]`, `[a-z]` and the negated `[^a-z]` are character classes
//! - `\c` matches `c` literally
//!
//! The substring rule lets a bare word such as `secret` catch any path that
//! mentions it. Malformed patterns only use the substring rule.

use std::str::Chars;

use glob::{MatchOptions, Pattern};

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct DisallowedPattern {
    raw: String,
    glob: Option<Pattern>,
}

impl DisallowedPattern {
    fn new(raw: String) -> Self {
        let glob = to_glob(&raw).and_then(|g| Pattern::new(&g).ok());
        Self { raw, glob }
    }

    fn matches(&self, path: &str) -> bool {
        self.glob
            .as_ref()
            .map_or(false, |g| g.matches_with(path, OPTIONS))
            || path.contains(&self.raw)
    }
}

/// Rewrite a shell pattern into `glob::Pattern` syntax, which negates
/// classes with `!` and has no backslash escapes. `None` if the pattern is
/// malformed: a trailing `\`, an unclosed or empty class, or an unescaped
/// `-` that does not form a range.
fn to_glob(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => push_literal(&mut out, chars.next()?),
            '[' => push_class(&mut out, &mut chars)?,
            _ => out.push(c),
        }
    }
    Some(out)
}

fn push_literal(out: &mut String, c: char) {
    match c {
        '*' | '?' | '[' | ']' => {
            out.push('[');
            out.push(c);
            out.push(']');
        }
        _ => out.push(c),
    }
}

/// Add `lo-hi` to a class, splitting a `]` or `-` endpoint off as its own
/// member so every `]` and `-` is a single that can be placed at an edge.
fn push_range(ranges: &mut Vec<(char, char)>, mut lo: char, mut hi: char) {
    if lo > hi {
        // empty either way; keep it free of characters glob treats specially
        if [lo, hi].iter().any(|c| matches!(c, ']' | '-' | '!')) {
            ranges.push(('b', 'a'));
        } else {
            ranges.push((lo, hi));
        }
        return;
    }
    if lo == hi {
        ranges.push((lo, hi));
        return;
    }
    if lo == ']' {
        ranges.push((']', ']'));
        lo = '^';
    }
    if hi == ']' {
        ranges.push((']', ']'));
        hi = '\\';
    }
    if lo == '-' {
        ranges.push(('-', '-'));
        lo = '.';
    }
    if hi == '-' {
        ranges.push(('-', '-'));
        hi = ',';
    }
    if lo <= hi {
        ranges.push((lo, hi));
    }
}

/// Class body after the opening `[`, up to and including the closing `]`.
fn push_class(out: &mut String, chars: &mut Chars<'_>) -> Option<()> {
    let negated = chars.as_str().starts_with('^');
    if negated {
        chars.next();
    }

    let mut ranges: Vec<(char, char)> = Vec::new();
    loop {
        let lo = match chars.next()? {
            ']' if !ranges.is_empty() => break,
            ']' | '-' => return None,
            '\\' => chars.next()?,
            c => c,
        };
        let hi = if chars.as_str().starts_with('-') {
            chars.next();
            match chars.next()? {
                ']' | '-' => return None,
                '\\' => chars.next()?,
                c => c,
            }
        } else {
            lo
        };
        push_range(&mut ranges, lo, hi);
    }

    // glob only reads `]` as a member in first position, reads a leading `!`
    // as negation, and reads `-` as literal only at the edges.
    ranges.sort_by_key(|&(lo, hi)| match (lo, lo == hi) {
        (']', _) => 0,
        ('-', true) => 3,
        ('!', _) => 2,
        _ => 1,
    });
    ranges.dedup();
    if !negated && ranges[0].0 == '!' {
        let (bangs, mut rest): (Vec<_>, Vec<_>) =
            ranges.into_iter().partition(|&r| r == ('!', '!'));
        if rest.is_empty() {
            out.push('!');
            return Some(());
        }
        if rest[0].0 == '!' {
            let hi = rest[0].1;
            rest.insert(0, (hi, hi));
        }
        if !bangs.is_empty() {
            let at = rest.iter().position(|&r| r == ('-', '-')).unwrap_or(rest.len());
            rest.insert(at, ('!', '!'));
        }
        ranges = rest;
    }

    out.push('[');
    if negated {
        out.push('!');
    }
    for (lo, hi) in ranges {
        out.push(lo);
        if hi != lo {
            out.push('-');
            out.push(hi);
        }
    }
    out.push(']');
    Some(())
}

/// Ordered list of disallowed patterns, compiled once.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    patterns: Vec<DisallowedPattern>,
}

impl Policy {
    /// Compile the patterns, keeping their order.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| DisallowedPattern::new(p.into()))
                .collect(),
        }
    }

    /// True if any pattern matches the path. An empty policy matches nothing.
    pub fn matches(&self, path: &str) -> bool {
        self.first_match(path).is_some()
    }

    /// The first pattern, in order, that matches the path.
    pub fn first_match(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.matches(path))
            .map(|p| p.raw.as_str())
    }

    /// The patterns as given.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.raw.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// One-shot form of [`Policy::matches`].
pub fn matches<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    patterns
        .iter()
        .any(|p| DisallowedPattern::new(p.as_ref().to_string()).matches(path))
}
