//! Route specification compiler.
//!
//! # Grammar
//! ```text
//! spec     := item*
//! item     := literal | "<" name ">" | "(" spec ")"
//! name     := [A-Za-z0-9_]+
//! ```
//!
//! `<name>` is a required capture, `( ... )` an optional group that may nest.
//! A spec is parsed once into a token tree. The tree drives both directions:
//! it is lowered to a single anchored regex for matching, and walked again by
//! [`RoutePattern::fill`] when a URI is generated.
//!
//! # Design Decisions
//! - The `regex` crate executes in time linear to the input, so no pattern
//!   shape can cause catastrophic backtracking on request paths
//! - Placeholders compile to internally numbered groups; the same name may
//!   appear more than once without clashing inside the regex
//! - Optional nesting depth is bounded at compile time

use std::collections::BTreeMap;
use std::mem;

use regex::{Captures, Regex};

use crate::routing::Params;
use crate::routing::error::PatternError;

/// Expression used for a placeholder without an override.
pub const DEFAULT_SEGMENT: &str = "[^/]+";

/// Deepest accepted nesting of optional groups.
pub const MAX_GROUP_DEPTH: usize = 16;

/// Per-placeholder expression overrides, keyed by placeholder name.
pub type RegexOverrides = BTreeMap<String, String>;

/// How much of the input a compiled pattern must consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The whole input (routes).
    Full,
    /// A leading prefix of the input (preroutes).
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
    Optional(Vec<Token>),
}

/// A placeholder that had neither a supplied value nor a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParameter(pub String);

/// A compiled route specification.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    tokens: Vec<Token>,
    regex: Regex,
    /// (regex group name, placeholder name) in order of appearance.
    groups: Vec<(String, String)>,
    required: Vec<String>,
    optional: Vec<String>,
}

impl RoutePattern {
    /// Compile a spec that must match an entire path.
    pub fn compile(spec: &str, overrides: &RegexOverrides) -> Result<Self, PatternError> {
        Self::compile_anchored(spec, overrides, Anchor::Full)
    }

    /// Compile a spec that matches a leading portion of a path.
    pub fn compile_prefix(spec: &str, overrides: &RegexOverrides) -> Result<Self, PatternError> {
        Self::compile_anchored(spec, overrides, Anchor::Prefix)
    }

    /// Compile with an explicit anchoring mode.
    pub fn compile_anchored(
        spec: &str,
        overrides: &RegexOverrides,
        anchor: Anchor,
    ) -> Result<Self, PatternError> {
        let tokens = parse(spec)?;

        let mut expression = String::from("^");
        let mut groups = Vec::new();
        write_expression(&tokens, overrides, &mut expression, &mut groups);
        if anchor == Anchor::Full {
            expression.push('$');
        }

        let regex = Regex::new(&expression).map_err(|e| PatternError::Regex(e.to_string()))?;

        let mut required = Vec::new();
        let mut optional = Vec::new();
        collect_names(&tokens, 0, &mut required, &mut optional);
        // Required is sticky: a name seen at top level is never optional.
        optional.retain(|name| !required.contains(name));

        Ok(Self {
            source: spec.to_string(),
            tokens,
            regex,
            groups,
            required,
            optional,
        })
    }

    /// The raw specification string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled expression.
    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }

    /// Placeholders appearing outside every optional group.
    pub fn required_names(&self) -> &[String] {
        &self.required
    }

    /// Placeholders appearing only inside optional groups.
    pub fn optional_names(&self) -> &[String] {
        &self.optional
    }

    /// Whether the pattern declares a placeholder with this name.
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.groups.iter().any(|(_, param)| param == name)
    }

    /// Match the whole input (or its prefix, for prefix patterns) and collect captures.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        Some(self.collect(&caps))
    }

    /// Match and also report how many bytes of `path` were consumed.
    pub fn match_prefix(&self, path: &str) -> Option<(usize, Params)> {
        let caps = self.regex.captures(path)?;
        let consumed = caps.get(0).map_or(0, |m| m.end());
        Some((consumed, self.collect(&caps)))
    }

    /// Substitute values into the route specification.
    ///
    /// Top-level placeholders are always emitted. An optional group is
    /// emitted only when it holds a supplied value that differs from its
    /// default, or a nested group that is emitted. A placeholder with no
    /// value and no default fails only if its enclosing group is emitted.
    pub fn fill(&self, params: &Params, defaults: &Params) -> Result<String, MissingParameter> {
        fill_tokens(&self.tokens, true, params, defaults).map(|(uri, _)| uri)
    }

    fn collect(&self, caps: &Captures<'_>) -> Params {
        let mut params = Params::new();
        for (group, name) in &self.groups {
            if let Some(m) = caps.name(group) {
                let slot = params.entry(name.clone()).or_default();
                if slot.is_empty() {
                    *slot = m.as_str().to_string();
                }
            }
        }
        params
    }
}

fn parse(spec: &str) -> Result<Vec<Token>, PatternError> {
    let bytes = spec.as_bytes();
    let mut open: Vec<(usize, Vec<Token>)> = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'<' => {
                let end = spec[pos + 1..]
                    .find('>')
                    .map(|offset| pos + 1 + offset)
                    .ok_or(PatternError::UnterminatedPlaceholder(pos))?;
                let name = &spec[pos + 1..end];
                if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                    return Err(PatternError::InvalidPlaceholderName(name.to_string()));
                }
                push_literal(&spec[literal_start..pos], &mut current);
                current.push(Token::Param(name.to_string()));
                pos = end + 1;
                literal_start = pos;
                continue;
            }
            b'(' => {
                push_literal(&spec[literal_start..pos], &mut current);
                if open.len() == MAX_GROUP_DEPTH {
                    return Err(PatternError::NestingTooDeep(MAX_GROUP_DEPTH));
                }
                open.push((pos, mem::take(&mut current)));
                literal_start = pos + 1;
            }
            b')' => {
                push_literal(&spec[literal_start..pos], &mut current);
                let (_, parent) = open.pop().ok_or(PatternError::UnexpectedGroupClose(pos))?;
                let group = mem::replace(&mut current, parent);
                current.push(Token::Optional(group));
                literal_start = pos + 1;
            }
            _ => {}
        }
        pos += 1;
    }

    if let Some((start, _)) = open.pop() {
        return Err(PatternError::UnclosedGroup(start));
    }
    push_literal(&spec[literal_start..], &mut current);
    Ok(current)
}

fn push_literal(text: &str, tokens: &mut Vec<Token>) {
    if !text.is_empty() {
        tokens.push(Token::Literal(text.to_string()));
    }
}

fn write_expression(
    tokens: &[Token],
    overrides: &RegexOverrides,
    out: &mut String,
    groups: &mut Vec<(String, String)>,
) {
    for token in tokens {
        match token {
            Token::Literal(text) => out.push_str(&regex::escape(text)),
            Token::Param(name) => {
                let group = format!("seg{}", groups.len());
                let class = overrides.get(name).map_or(DEFAULT_SEGMENT, String::as_str);
                out.push_str(&format!("(?P<{group}>{class})"));
                groups.push((group, name.clone()));
            }
            Token::Optional(inner) => {
                out.push_str("(?:");
                write_expression(inner, overrides, out, groups);
                out.push_str(")?");
            }
        }
    }
}

fn collect_names(tokens: &[Token], depth: usize, required: &mut Vec<String>, optional: &mut Vec<String>) {
    for token in tokens {
        match token {
            Token::Literal(_) => {}
            Token::Param(name) => {
                let bucket = if depth == 0 { &mut *required } else { &mut *optional };
                if !bucket.contains(name) {
                    bucket.push(name.clone());
                }
            }
            Token::Optional(inner) => collect_names(inner, depth + 1, required, optional),
        }
    }
}

fn fill_tokens(
    tokens: &[Token],
    mut required: bool,
    params: &Params,
    defaults: &Params,
) -> Result<(String, bool), MissingParameter> {
    let mut uri = String::new();
    let mut missing: Option<&String> = None;

    for token in tokens {
        match token {
            Token::Literal(text) => uri.push_str(text),
            Token::Param(name) => match (params.get(name), defaults.get(name)) {
                (Some(value), default) => {
                    required |= default != Some(value);
                    uri.push_str(value);
                }
                (None, Some(default)) => uri.push_str(default),
                (None, None) => {
                    if missing.is_none() {
                        missing = Some(name);
                    }
                }
            },
            Token::Optional(inner) => {
                let (segment, emitted) = fill_tokens(inner, false, params, defaults)?;
                if emitted {
                    required = true;
                    uri.push_str(&segment);
                }
            }
        }
    }

    match missing {
        Some(name) if required => Err(MissingParameter(name.clone())),
        _ => Ok((uri, required)),
    }
}
