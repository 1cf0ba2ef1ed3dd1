//! Parsed path patterns and matching.
//!
//! Pattern syntax, with `/` as the default separator:
//!
//! - `foo` matches the literal segment `foo`
//! - `?` matches one character, `*` zero or more characters in a segment
//! - `**` as a whole segment matches zero or more segments, so `/a/**/b`
//!   matches `/a/b` and `**/b` matches `b`
//! - `{name}` captures one segment, `{name:[a-z]+}` constrains it with a regex
//! - `{*name}` at the end captures the rest of the path
//!
//! ```
//! use nvo_patterns::path::PathContainer;
//! use nvo_patterns::pattern::PathPatternParser;
//!
//! let pattern = PathPatternParser::new().parse("/hotels/{hotel}/**").unwrap();
//! let path = PathContainer::parse_http_path("/hotels/ritz/rooms/5").unwrap();
//!
//! let info = pattern.match_and_extract(&path).unwrap();
//! assert_eq!(info.uri_variables.get("hotel"), Some(&"ritz".to_string()));
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{PathError, PathResult};
use crate::path::{MatrixVariables, PathContainer};

mod context;
mod element;
mod parser;

use context::MatchingContext;
pub use element::{ElementKind, PathElement};
pub use parser::PathPatternParser;

/// Variables extracted by a successful match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMatchInfo {
    pub uri_variables: HashMap<String, String>,
    /// Matrix variables of captured segments, keyed by capture name
    pub matrix_variables: HashMap<String, MatrixVariables>,
}

impl PathMatchInfo {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.uri_variables.get(name).map(String::as_str)
    }
}

/// Result of matching a pattern against the start of a path
#[derive(Debug, Clone)]
pub struct PathRemainingMatchInfo {
    pub path_matched: PathContainer,
    pub path_remaining: PathContainer,
    pub match_info: PathMatchInfo,
}

/// An immutable parsed pattern, safe to share between threads
#[derive(Clone, Debug)]
pub struct PathPattern {
    text: String,
    parser: PathPatternParser,
    head: Option<Box<PathElement>>,
    capture_count: usize,
    wildcard_count: usize,
    normalized_length: usize,
    catch_all: bool,
    ends_with_separator_wildcard: bool,
}

impl PathPattern {
    pub(crate) fn new(text: String, parser: PathPatternParser, head: Option<Box<PathElement>>) -> Self {
        let mut capture_count = 0;
        let mut wildcard_count = 0;
        let mut normalized_length = 0;
        let mut catch_all = false;

        let mut elem = head.as_deref();
        while let Some(e) = elem {
            capture_count += e.capture_count();
            wildcard_count += e.wildcard_count();
            normalized_length += e.normalized_length();
            catch_all |= matches!(
                e.kind(),
                ElementKind::WildcardTheRest { .. } | ElementKind::CaptureTheRest { .. }
            );
            elem = e.next();
        }

        let separator_wildcard: String = [parser.separator(), '*'].iter().collect();
        let ends_with_separator_wildcard = text.ends_with(&separator_wildcard);

        PathPattern {
            text,
            parser,
            head,
            capture_count,
            wildcard_count,
            normalized_length,
            catch_all,
            ends_with_separator_wildcard,
        }
    }

    pub fn pattern_string(&self) -> &str {
        &self.text
    }

    pub fn separator(&self) -> char {
        self.parser.separator()
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.parser.is_case_sensitive()
    }

    pub fn head(&self) -> Option<&PathElement> {
        self.head.as_deref()
    }

    pub fn elements(&self) -> impl Iterator<Item = &PathElement> {
        std::iter::successors(self.head(), |e| e.next())
    }

    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    pub fn wildcard_count(&self) -> usize {
        self.wildcard_count
    }

    pub fn normalized_length(&self) -> usize {
        self.normalized_length
    }

    /// Captures weigh one, wildcards a hundred; lower is more specific
    pub fn score(&self) -> usize {
        self.capture_count + self.wildcard_count * 100
    }

    /// True for patterns ending in `/**` or `/{*name}`
    pub fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    pub fn has_pattern_syntax(&self) -> bool {
        self.score() > 0 || self.catch_all || self.text.contains('?')
    }

    /// Space separated element names, e.g. `Separator Literal(foo)`
    pub fn to_chain_string(&self) -> String {
        self.elements().map(|e| e.to_string()).collect::<Vec<_>>().join(" ")
    }

    pub fn matches(&self, path: &PathContainer) -> bool {
        self.run(path, false).is_some()
    }

    pub fn match_and_extract(&self, path: &PathContainer) -> Option<PathMatchInfo> {
        self.run(path, true)
    }

    fn run(&self, path: &PathContainer, extract: bool) -> Option<PathMatchInfo> {
        let head = match &self.head {
            None => {
                let matched = path.is_empty()
                    || (self.parser.is_match_optional_trailing_separator() && path.is_just_separator());
                return matched.then(PathMatchInfo::default);
            }
            Some(head) => head,
        };

        // Only patterns that can consume nothing are tried against an empty path
        if path.is_empty() && !self.can_match_empty() {
            return None;
        }

        let mut ctx = MatchingContext::new(path, self.parser.is_match_optional_trailing_separator(), extract);
        head.matches(0, &mut ctx).then(|| ctx.into_match_info())
    }

    fn can_match_empty(&self) -> bool {
        matches!(
            self.head().map(|h| (h.kind(), h.next().is_none())),
            Some((ElementKind::WildcardTheRest { .. }, _))
                | Some((ElementKind::CaptureTheRest { .. }, _))
                | Some((ElementKind::MultiSegmentWildcard, true))
        )
    }

    /// Match the pattern against the start of `path` and return the rest.
    ///
    /// The remaining path always starts at a separator or is empty, so
    /// `/hotels/` matches `/hotels/` but is not a prefix of `/hotels/ritz`.
    pub fn match_start_of_path(&self, path: &PathContainer) -> Option<PathRemainingMatchInfo> {
        let head = match &self.head {
            None => {
                return Some(PathRemainingMatchInfo {
                    path_matched: PathContainer::empty(path.options()),
                    path_remaining: path.clone(),
                    match_info: PathMatchInfo::default(),
                })
            }
            Some(head) => head,
        };
        if path.is_empty() {
            return None;
        }

        let mut ctx = MatchingContext::new(path, self.parser.is_match_optional_trailing_separator(), true)
            .determining_remaining();
        if !head.matches(0, &mut ctx) {
            return None;
        }

        let split = ctx.remaining_index.unwrap_or(path.len());
        let path_matched = path.sub_path(0, split).ok()?;
        let path_remaining = path.sub_path_from(split).ok()?;
        Some(PathRemainingMatchInfo {
            path_matched,
            path_remaining,
            match_info: ctx.into_match_info(),
        })
    }

    /// The part of `path` matched by the pattern's non-literal elements,
    /// e.g. `/docs/cvs/commit.html` for `/docs/*` gives `cvs/commit.html`.
    ///
    /// Leading and trailing separators are dropped and runs of adjacent
    /// separators collapse to one.
    pub fn extract_path_within_pattern(&self, path: &PathContainer) -> PathResult<PathContainer> {
        let options = path.options();
        let elements = path.elements();

        let literal_prefix = self.elements().take_while(|e| e.is_literal()).count();
        if literal_prefix == self.elements().count() {
            return Ok(PathContainer::empty(options));
        }

        let mut start = literal_prefix.min(elements.len());
        while start < elements.len() && elements[start].is_separator() {
            start += 1;
        }
        let mut end = elements.len();
        while end > start && elements[end - 1].is_separator() {
            end -= 1;
        }
        if start >= end {
            return Ok(PathContainer::empty(options));
        }

        let window = &elements[start..end];
        let adjacent_separators = window.windows(2).any(|w| w[0].is_separator() && w[1].is_separator());
        if !adjacent_separators {
            return path.sub_path(start, end);
        }

        let collapsed = window
            .iter()
            .enumerate()
            .filter(|(i, e)| !(e.is_separator() && *i > 0 && window[i - 1].is_separator()))
            .map(|(_, e)| e.value())
            .collect::<String>();
        PathContainer::parse_path(&collapsed, options)
    }

    /// Combine two patterns, e.g. a type level and a method level mapping.
    ///
    /// | self | other | result |
    /// |------|-------|--------|
    /// | `/hotels` | `/bookings` | `/hotels/bookings` |
    /// | `/hotels/*` | `/bookings` | `/hotels/bookings` |
    /// | `/*` | `/hotel` | `/hotel` |
    /// | `/*.html` | `/hotel` | `/hotel.html` |
    /// | `/*.html` | `/*.txt` | error |
    pub fn combine(&self, other: &PathPattern) -> PathResult<PathPattern> {
        if self.text.is_empty() {
            return if other.text.is_empty() {
                Ok(self.parser.parse("")?)
            } else {
                Ok(other.clone())
            };
        }
        if other.text.is_empty() {
            return Ok(self.clone());
        }

        if self.text != other.text
            && self.capture_count == 0
            && PathContainer::parse_path(&other.text, self.parser.path_options())
                .map(|p| self.matches(&p))
                .unwrap_or(false)
        {
            return Ok(other.clone());
        }

        if self.ends_with_separator_wildcard {
            let prefix_len = self.text.len() - self.separator().len_utf8() - 1;
            return Ok(self.parser.parse(&self.concat(&self.text[..prefix_len], &other.text))?);
        }

        let star_dot = match self.text.find("*.") {
            Some(pos) if self.capture_count == 0 && self.separator() != '.' => pos,
            _ => return Ok(self.parser.parse(&self.concat(&self.text, &other.text))?),
        };

        let first_extension = &self.text[star_dot + 1..];
        let (file, second_extension) = match other.text.find('.') {
            Some(dot) => other.text.split_at(dot),
            None => (other.text.as_str(), ""),
        };
        let first_wild = first_extension == ".*" || first_extension.is_empty();
        let second_wild = second_extension == ".*" || second_extension.is_empty();
        if !first_wild && !second_wild {
            return Err(PathError::Combine {
                first: self.text.clone(),
                second: other.text.clone(),
            });
        }

        let extension = if first_wild { second_extension } else { first_extension };
        Ok(self.parser.parse(&format!("{}{}", file, extension))?)
    }

    fn concat(&self, first: &str, second: &str) -> String {
        let separator = self.separator();
        match (first.ends_with(separator), second.starts_with(separator)) {
            (true, true) => format!("{}{}", first, &second[separator.len_utf8()..]),
            (true, false) | (false, true) => format!("{}{}", first, second),
            (false, false) => format!("{}{}{}", first, separator, second),
        }
    }

    /// Order patterns from most to least specific.
    ///
    /// Catch-all patterns go last, longer ones first among them; otherwise
    /// lower [`score`](Self::score) wins, then longer normalized length.
    pub fn specificity_cmp(a: &PathPattern, b: &PathPattern) -> Ordering {
        let catch_all_length = |p: &PathPattern| if p.catch_all { p.normalized_length } else { 0 };
        a.catch_all
            .cmp(&b.catch_all)
            .then_with(|| catch_all_length(b).cmp(&catch_all_length(a)))
            .then_with(|| a.score().cmp(&b.score()))
            .then_with(|| b.normalized_length.cmp(&a.normalized_length))
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.separator() == other.separator()
            && self.is_case_sensitive() == other.is_case_sensitive()
    }
}

impl Eq for PathPattern {}

impl Hash for PathPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.separator().hash(state);
        self.is_case_sensitive().hash(state);
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str) -> PathPattern {
        PathPatternParser::new().parse(pattern).unwrap()
    }

    fn path(path: &str) -> PathContainer {
        PathContainer::parse_http_path(path).unwrap()
    }

    #[test]
    fn test_counts_and_score() {
        let p = parse("/hotels/{hotel}/*.html");
        assert_eq!(p.capture_count(), 1);
        assert_eq!(p.wildcard_count(), 1);
        assert_eq!(p.score(), 101);
        assert!(!p.is_catch_all());
        assert!(p.has_pattern_syntax());

        assert!(!parse("/hotels").has_pattern_syntax());
        assert!(parse("/hotel?").has_pattern_syntax());
        assert!(parse("/**").is_catch_all());
    }

    #[test]
    fn test_normalized_length() {
        assert_eq!(parse("/foo/bar").normalized_length(), 8);
        assert_eq!(parse("/foo/{id}").normalized_length(), 6);
        assert_eq!(parse("/foo/*").normalized_length(), 6);
    }

    #[test]
    fn test_equality_uses_text_and_options() {
        let a = parse("/foo/{id}");
        let b = parse("/foo/{id}");
        let c = PathPatternParser::new().with_case_sensitive(false).parse("/foo/{id}").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.head(), b.head());
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_pattern() {
        let p = parse("");
        assert!(p.matches(&path("")));
        assert!(!p.matches(&path("/")));
        assert!(PathPatternParser::new()
            .with_match_optional_trailing_separator(true)
            .parse("")
            .unwrap()
            .matches(&path("/")));
    }

    #[test]
    fn test_match_start_of_path() {
        let p = parse("/hotels/{hotel}");
        let info = p.match_start_of_path(&path("/hotels/ritz/rooms/5")).unwrap();
        assert_eq!(info.path_matched.value(), "/hotels/ritz");
        assert_eq!(info.path_remaining.value(), "/rooms/5");
        assert_eq!(info.match_info.get("hotel"), Some("ritz"));

        let full = p.match_start_of_path(&path("/hotels/ritz")).unwrap();
        assert!(full.path_remaining.is_empty());

        assert!(p.match_start_of_path(&path("/hotelsx/ritz")).is_none());
        assert!(p.match_start_of_path(&path("")).is_none());
    }

    #[test]
    fn test_match_start_of_path_ends_at_separator() {
        let p = parse("/hotels/");
        assert!(p.match_start_of_path(&path("/hotels/ritz")).is_none());

        let info = p.match_start_of_path(&path("/hotels/")).unwrap();
        assert_eq!(info.path_matched.value(), "/hotels/");
        assert!(info.path_remaining.is_empty());

        let info = parse("/hotels").match_start_of_path(&path("/hotels/ritz")).unwrap();
        assert_eq!(info.path_remaining.value(), "/ritz");
    }

    #[test]
    fn test_leading_multi_segment_wildcard_matches_zero_segments() {
        let p = parse("**/b");
        assert!(p.matches(&path("b")));
        assert!(p.matches(&path("a/b")));
        assert!(p.matches(&path("/b")));
        assert!(!p.matches(&path("a/c")));

        let info = parse("**/{name}").match_and_extract(&path("x")).unwrap();
        assert_eq!(info.get("name"), Some("x"));
    }

    #[test]
    fn test_match_start_of_path_empty_pattern() {
        let info = parse("").match_start_of_path(&path("/a/b")).unwrap();
        assert!(info.path_matched.is_empty());
        assert_eq!(info.path_remaining.value(), "/a/b");
    }

    #[test]
    fn test_extract_path_within_pattern() {
        let check = |pattern: &str, p: &str, expected: &str| {
            let extracted = parse(pattern).extract_path_within_pattern(&path(p)).unwrap();
            assert_eq!(extracted.value(), expected, "{} against {}", pattern, p);
        };
        check("/docs/commit.html", "/docs/commit.html", "");
        check("/docs/*", "/docs/cvs/commit", "cvs/commit");
        check("/docs/cvs/*.html", "/docs/cvs/commit.html", "commit.html");
        check("/docs/**", "/docs/cvs/commit", "cvs/commit");
        check("/*.html", "/commit.html", "commit.html");
        check("/docs/*", "/docs//cvs//commit/", "cvs/commit");
        check("/{name}", "/", "");
    }

    #[test]
    fn test_combine() {
        let combine = |a: &str, b: &str| parse(a).combine(&parse(b)).unwrap().pattern_string().to_string();
        assert_eq!(combine("", ""), "");
        assert_eq!(combine("/hotels", ""), "/hotels");
        assert_eq!(combine("", "/hotels"), "/hotels");
        assert_eq!(combine("/hotels", "/bookings"), "/hotels/bookings");
        assert_eq!(combine("/hotels", "bookings"), "/hotels/bookings");
        assert_eq!(combine("/hotels/", "/bookings"), "/hotels/bookings");
        assert_eq!(combine("/hotels/*", "/bookings"), "/hotels/bookings");
        assert_eq!(combine("/hotels/*", "bookings"), "/hotels/bookings");
        assert_eq!(combine("/hotels/**", "/bookings"), "/hotels/**/bookings");
        assert_eq!(combine("/*", "/hotel"), "/hotel");
        assert_eq!(combine("/{foo}", "/bar"), "/{foo}/bar");
        assert_eq!(combine("/*.html", "/hotel"), "/hotel.html");
        assert_eq!(combine("/*.html", "/hotel.*"), "/hotel.html");
        assert_eq!(combine("/*.*", "/*.html"), "/*.html");
    }

    #[test]
    fn test_combine_conflicting_extensions() {
        let err = parse("/*.html").combine(&parse("/*.txt")).unwrap_err();
        assert!(matches!(err, PathError::Combine { .. }));
    }

    #[test]
    fn test_specificity_order() {
        let mut patterns = vec![parse("/**"), parse("/foo/*"), parse("/foo/**"), parse("/foo/{id}"), parse("/foo/bar")];
        patterns.sort_by(PathPattern::specificity_cmp);
        let ordered: Vec<&str> = patterns.iter().map(|p| p.pattern_string()).collect();
        assert_eq!(ordered, vec!["/foo/bar", "/foo/{id}", "/foo/*", "/foo/**", "/**"]);
    }

    #[test]
    fn test_capture_the_rest_binds_decoded_remainder() {
        let info = parse("/files/{*path}").match_and_extract(&path("/files/a%20b/c")).unwrap();
        assert_eq!(info.get("path"), Some("/a b/c"));

        let root = parse("/{*path}").match_and_extract(&path("")).unwrap();
        assert_eq!(root.get("path"), Some(""));
    }

    #[test]
    fn test_chain_string() {
        assert_eq!(
            parse("/hotels/{hotel}/**").to_chain_string(),
            "Separator Literal(hotels) Separator Capture({hotel}) WildcardTheRest(/**)"
        );
    }
}
