use std::fmt;

use regex::Regex;

use crate::path::{Element, MatrixVariables};

use super::context::MatchingContext;

/// What a single node of a parsed pattern matches
#[derive(Clone, Debug)]
pub enum ElementKind {
    /// The configured separator
    Separator,
    /// Exact segment text
    Literal { text: String, case_sensitive: bool },
    /// Segment text where `?` matches any single character
    SingleCharWildcarded { text: String, case_sensitive: bool },
    /// `*` as a whole segment
    Wildcard,
    /// `{name}` or `{name:regex}` as a whole segment
    Capture { name: String, constraint: Option<Regex> },
    /// A segment mixing literal text with `*`, `?` and captures
    Regex {
        text: String,
        regex: Regex,
        variable_names: Vec<String>,
        wildcard_count: usize,
        normalized_length: usize,
    },
    /// `**` as a whole segment, spanning zero or more segments
    MultiSegmentWildcard,
    /// Trailing `/**`
    WildcardTheRest { separator: Option<char> },
    /// Trailing `/{*name}`
    CaptureTheRest { name: String, separator: Option<char> },
}

impl PartialEq for ElementKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementKind::Separator, ElementKind::Separator)
            | (ElementKind::Wildcard, ElementKind::Wildcard)
            | (ElementKind::MultiSegmentWildcard, ElementKind::MultiSegmentWildcard) => true,
            (
                ElementKind::Literal { text: a, case_sensitive: ca },
                ElementKind::Literal { text: b, case_sensitive: cb },
            )
            | (
                ElementKind::SingleCharWildcarded { text: a, case_sensitive: ca },
                ElementKind::SingleCharWildcarded { text: b, case_sensitive: cb },
            ) => a == b && ca == cb,
            (ElementKind::Capture { name: a, constraint: ra }, ElementKind::Capture { name: b, constraint: rb }) => {
                a == b && ra.as_ref().map(Regex::as_str) == rb.as_ref().map(Regex::as_str)
            }
            (ElementKind::Regex { text: a, regex: ra, .. }, ElementKind::Regex { text: b, regex: rb, .. }) => {
                a == b && ra.as_str() == rb.as_str()
            }
            (ElementKind::WildcardTheRest { separator: a }, ElementKind::WildcardTheRest { separator: b }) => a == b,
            (
                ElementKind::CaptureTheRest { name: a, separator: sa },
                ElementKind::CaptureTheRest { name: b, separator: sb },
            ) => a == b && sa == sb,
            _ => false,
        }
    }
}

impl Eq for ElementKind {}

/// One node of a parsed pattern; owns the rest of the chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathElement {
    position: usize,
    kind: ElementKind,
    next: Option<Box<PathElement>>,
}

impl PathElement {
    pub(crate) fn new(position: usize, kind: ElementKind, next: Option<Box<PathElement>>) -> Self {
        PathElement { position, kind, next }
    }

    /// Char offset of this element within the pattern text
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn next(&self) -> Option<&PathElement> {
        self.next.as_deref()
    }

    /// Separators and literal segments: nodes that match exactly one fixed element
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ElementKind::Separator | ElementKind::Literal { .. })
    }

    pub fn wildcard_count(&self) -> usize {
        match &self.kind {
            ElementKind::Wildcard | ElementKind::MultiSegmentWildcard | ElementKind::WildcardTheRest { .. } => 1,
            ElementKind::Regex { wildcard_count, .. } => *wildcard_count,
            _ => 0,
        }
    }

    pub fn capture_count(&self) -> usize {
        match &self.kind {
            ElementKind::Capture { .. } | ElementKind::CaptureTheRest { .. } => 1,
            ElementKind::Regex { variable_names, .. } => variable_names.len(),
            _ => 0,
        }
    }

    /// Length used for specificity: literal characters count fully, every
    /// separator, wildcard and capture counts as one.
    pub fn normalized_length(&self) -> usize {
        match &self.kind {
            ElementKind::Literal { text, .. } | ElementKind::SingleCharWildcarded { text, .. } => text.chars().count(),
            ElementKind::Regex { normalized_length, .. } => *normalized_length,
            _ => 1,
        }
    }

    pub(crate) fn matches<'a>(&'a self, index: usize, ctx: &mut MatchingContext<'a>) -> bool {
        match &self.kind {
            ElementKind::Separator => ctx.is_separator(index) && self.proceed(index + 1, ctx, false),
            ElementKind::Literal { text, case_sensitive } => match ctx.segment(index) {
                Some(seg) if text_eq(text, seg.value_to_match(), *case_sensitive) => self.proceed(index + 1, ctx, true),
                _ => false,
            },
            ElementKind::SingleCharWildcarded { text, case_sensitive } => match ctx.segment(index) {
                Some(seg) if single_char_wildcard_eq(text, seg.value_to_match(), *case_sensitive) => {
                    self.proceed(index + 1, ctx, true)
                }
                _ => false,
            },
            ElementKind::Wildcard => self.matches_wildcard(index, ctx),
            ElementKind::Capture { name, constraint } => {
                let seg = match ctx.segment(index) {
                    Some(seg) if !seg.value_to_match().is_empty() => seg,
                    _ => return false,
                };
                let value = seg.value_to_match();
                if constraint.as_ref().map(|re| !re.is_match(value)).unwrap_or(false) {
                    return false;
                }
                let mark = ctx.mark();
                ctx.bind(name, value, seg.parameters());
                self.proceed_or_rollback(index + 1, ctx, mark)
            }
            ElementKind::Regex {
                regex, variable_names, ..
            } => {
                let seg = match ctx.segment(index) {
                    Some(seg) => seg,
                    None => return false,
                };
                let value = seg.value_to_match();
                let mark = ctx.mark();
                if ctx.extract {
                    let caps = match regex.captures(value) {
                        Some(caps) => caps,
                        None => return false,
                    };
                    for (i, name) in variable_names.iter().enumerate() {
                        let captured = caps.get(i + 1).map(|m| m.as_str()).unwrap_or("");
                        ctx.bind(name, captured, seg.parameters());
                    }
                } else if !regex.is_match(value) {
                    return false;
                }
                self.proceed_or_rollback(index + 1, ctx, mark)
            }
            ElementKind::MultiSegmentWildcard => self.matches_multi_segment(index, ctx),
            ElementKind::WildcardTheRest { .. } => {
                if index < ctx.len() && !ctx.is_separator(index) {
                    return false;
                }
                if ctx.determine_remaining {
                    ctx.remaining_index = Some(ctx.len());
                }
                true
            }
            ElementKind::CaptureTheRest { name, .. } => {
                if index < ctx.len() && !ctx.is_separator(index) {
                    return false;
                }
                if ctx.determine_remaining {
                    ctx.remaining_index = Some(ctx.len());
                }
                if ctx.extract {
                    let rest = ctx.elements_from(index);
                    let value: String = rest.iter().map(Element::value_to_match).collect();
                    let matrix = rest
                        .iter()
                        .filter_map(Element::as_segment)
                        .flat_map(|seg| seg.parameters().iter())
                        .fold(MatrixVariables::new(), |mut acc, (key, values)| {
                            acc.entry(key.clone()).or_default().extend(values.iter().cloned());
                            acc
                        });
                    ctx.bind_owned(name, value, matrix);
                }
                true
            }
        }
    }

    fn matches_wildcard<'a>(&'a self, index: usize, ctx: &mut MatchingContext<'a>) -> bool {
        match ctx.segment(index) {
            // A wildcard in the middle of a pattern needs some segment text
            Some(seg) if self.next.is_some() && seg.value_to_match().is_empty() => false,
            Some(_) => self.proceed(index + 1, ctx, true),
            None if index >= ctx.len() && self.next.is_none() => ctx.finish_at(index, false),
            None => false,
        }
    }

    /// `**` in the middle of a pattern: try the longest span first, then
    /// shorter ones, finally zero segments by re-using the separator that
    /// led here, or by skipping the separator that follows a leading `**`.
    fn matches_multi_segment<'a>(&'a self, index: usize, ctx: &mut MatchingContext<'a>) -> bool {
        let next = match &self.next {
            Some(next) => next,
            None => return ctx.finish_at(ctx.len(), false),
        };
        if ctx.known_failure(self.position, index) {
            return false;
        }

        let len = ctx.len();
        let matched = (index..=len).rev().any(|split| attempt(next, split, ctx))
            || (index > 0 && ctx.is_separator(index - 1) && attempt(next, index - 1, ctx))
            || (index == 0
                && next.kind == ElementKind::Separator
                && match next.next() {
                    Some(after) => attempt(after, 0, ctx),
                    None => ctx.finish_at(0, false),
                });

        if !matched {
            ctx.record_failure(self.position, index);
        }
        matched
    }

    fn proceed<'a>(&'a self, next_index: usize, ctx: &mut MatchingContext<'a>, consumed_segment: bool) -> bool {
        match &self.next {
            Some(next) => next.matches(next_index, ctx),
            None => ctx.finish_at(next_index, consumed_segment),
        }
    }

    fn proceed_or_rollback<'a>(&'a self, next_index: usize, ctx: &mut MatchingContext<'a>, mark: usize) -> bool {
        if self.proceed(next_index, ctx, true) {
            true
        } else {
            ctx.rollback(mark);
            false
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ElementKind::Separator => write!(f, "Separator"),
            ElementKind::Literal { text, .. } => write!(f, "Literal({})", text),
            ElementKind::SingleCharWildcarded { text, .. } => write!(f, "SingleCharWildcarded({})", text),
            ElementKind::Wildcard => write!(f, "Wildcard(*)"),
            ElementKind::Capture { name, constraint: None } => write!(f, "Capture({{{}}})", name),
            ElementKind::Capture {
                name,
                constraint: Some(re),
            } => {
                // strip the ^(?:...)$ anchoring added by the parser
                let source = re.as_str();
                let inner = source
                    .strip_prefix("^(?:")
                    .and_then(|s| s.strip_suffix(")$"))
                    .unwrap_or(source);
                write!(f, "Capture({{{}:{}}})", name, inner)
            }
            ElementKind::Regex { text, .. } => write!(f, "Regex({})", text),
            ElementKind::MultiSegmentWildcard => write!(f, "MultiSegmentWildcard(**)"),
            ElementKind::WildcardTheRest { separator } => {
                write!(f, "WildcardTheRest({}**)", separator.map(String::from).unwrap_or_default())
            }
            ElementKind::CaptureTheRest { name, separator } => write!(
                f,
                "CaptureTheRest({}{{*{}}})",
                separator.map(String::from).unwrap_or_default(),
                name
            ),
        }
    }
}

/// Match `element` at `index` unless that attempt already failed once
fn attempt<'a>(element: &'a PathElement, index: usize, ctx: &mut MatchingContext<'a>) -> bool {
    if ctx.known_failure(element.position, index) {
        return false;
    }
    let matched = element.matches(index, ctx);
    if !matched {
        ctx.record_failure(element.position, index);
    }
    matched
}

fn text_eq(pattern: &str, candidate: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        pattern == candidate
    } else {
        pattern
            .chars()
            .flat_map(char::to_lowercase)
            .eq(candidate.chars().flat_map(char::to_lowercase))
    }
}

fn single_char_wildcard_eq(pattern: &str, candidate: &str, case_sensitive: bool) -> bool {
    if pattern.chars().count() != candidate.chars().count() {
        return false;
    }
    pattern.chars().zip(candidate.chars()).all(|(p, c)| {
        p == '?' || p == c || (!case_sensitive && p.to_lowercase().eq(c.to_lowercase()))
    })
}
