use log::trace;
use regex::{Regex, RegexBuilder};

use crate::error::{PatternMessage, PatternParseError};
use crate::path::PathOptions;

use super::element::{ElementKind, PathElement};
use super::PathPattern;

/// Parses pattern text into [`PathPattern`]s.
///
/// Immutable once configured; builder methods take and return `self`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathPatternParser {
    case_sensitive: bool,
    match_optional_trailing_separator: bool,
    path_options: PathOptions,
}

enum Token {
    Separator(usize),
    Segment(usize, usize),
}

enum Piece {
    Literal(String),
    Star,
    Question,
    Capture { name: String, constraint: Option<String> },
}

impl PathPatternParser {
    pub fn new() -> Self {
        PathPatternParser {
            case_sensitive: true,
            match_optional_trailing_separator: false,
            path_options: PathOptions::HTTP_PATH,
        }
    }

    pub fn with_case_sensitive(self, case_sensitive: bool) -> Self {
        Self { case_sensitive, ..self }
    }

    pub fn with_match_optional_trailing_separator(self, match_optional_trailing_separator: bool) -> Self {
        Self {
            match_optional_trailing_separator,
            ..self
        }
    }

    /// Options used for containers built internally; also sets the separator
    pub fn with_path_options(self, path_options: PathOptions) -> Self {
        Self { path_options, ..self }
    }

    pub fn with_separator(self, separator: char) -> Self {
        Self {
            path_options: PathOptions {
                separator,
                ..self.path_options
            },
            ..self
        }
    }

    pub fn separator(&self) -> char {
        self.path_options.separator
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn is_match_optional_trailing_separator(&self) -> bool {
        self.match_optional_trailing_separator
    }

    pub fn path_options(&self) -> PathOptions {
        self.path_options
    }

    /// Prepend the separator to a non-empty pattern that does not start with it
    pub fn init_full_path_pattern(&self, pattern: &str) -> String {
        if pattern.is_empty() || pattern.starts_with(self.separator()) {
            pattern.to_string()
        } else {
            format!("{}{}", self.separator(), pattern)
        }
    }

    pub fn parse(&self, pattern: &str) -> Result<PathPattern, PatternParseError> {
        let chars: Vec<char> = pattern.chars().collect();
        let tokens = self.tokenize(pattern, &chars)?;
        let mut captured: Vec<String> = Vec::new();
        let mut parsed: Vec<(usize, ElementKind)> = Vec::with_capacity(tokens.len());

        for (i, token) in tokens.iter().enumerate() {
            if let Some((_, ElementKind::CaptureTheRest { .. })) = parsed.last() {
                let pos = match token {
                    Token::Separator(pos) | Token::Segment(pos, _) => *pos,
                };
                return Err(PatternParseError::new(
                    pattern,
                    pos,
                    PatternMessage::NoMoreDataExpectedAfterCaptureTheRest,
                ));
            }

            let (start, end) = match token {
                Token::Separator(pos) => {
                    parsed.push((*pos, ElementKind::Separator));
                    continue;
                }
                Token::Segment(start, end) => (*start, *end),
            };
            let segment = &chars[start..end];
            let is_last = i + 1 == tokens.len();

            if segment == ['*', '*'] {
                if is_last && matches!(parsed.last(), Some((_, ElementKind::Separator))) {
                    let (sep_pos, _) = parsed.pop().unwrap_or((start, ElementKind::Separator));
                    parsed.push((
                        sep_pos,
                        ElementKind::WildcardTheRest {
                            separator: Some(self.separator()),
                        },
                    ));
                } else {
                    parsed.push((start, ElementKind::MultiSegmentWildcard));
                }
                continue;
            }

            if let Some(offset) = segment.windows(2).position(|w| w == ['{', '*']) {
                let name = self.capture_the_rest_name(pattern, segment, start, offset)?;
                Self::register_capture(pattern, start, name.clone(), &mut captured)?;
                let (position, separator) = match parsed.last() {
                    Some((sep_pos, ElementKind::Separator)) => {
                        let sep_pos = *sep_pos;
                        parsed.pop();
                        (sep_pos, Some(self.separator()))
                    }
                    _ => (start, None),
                };
                parsed.push((position, ElementKind::CaptureTheRest { name, separator }));
                continue;
            }

            let kind = self.classify(pattern, segment, start, &mut captured)?;
            parsed.push((start, kind));
        }

        let head = parsed
            .into_iter()
            .rev()
            .fold(None, |next, (position, kind)| Some(Box::new(PathElement::new(position, kind, next))));

        let path_pattern = PathPattern::new(pattern.to_string(), *self, head);
        trace!("Parsed pattern '{}' into [{}]", pattern, path_pattern.to_chain_string());
        Ok(path_pattern)
    }

    /// Split on separators outside of captures, validating brace structure
    fn tokenize(&self, pattern: &str, chars: &[char]) -> Result<Vec<Token>, PatternParseError> {
        let separator = self.separator();
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        let mut in_constraint = false;
        let mut escaped = false;
        let mut segment_start = 0;

        for (i, &c) in chars.iter().enumerate() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_constraint => escaped = true,
                '{' if depth == 0 => {
                    depth = 1;
                    in_constraint = false;
                }
                '{' if in_constraint => depth += 1,
                '{' => return Err(PatternParseError::new(pattern, i, PatternMessage::IllegalNestedCapture)),
                '}' if depth == 0 => {
                    return Err(PatternParseError::new(pattern, i, PatternMessage::MissingOpenCapture))
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        in_constraint = false;
                    }
                }
                ':' if depth == 1 => in_constraint = true,
                c if c == separator && depth == 0 => {
                    if i > segment_start {
                        tokens.push(Token::Segment(segment_start, i));
                    }
                    tokens.push(Token::Separator(i));
                    segment_start = i + 1;
                }
                _ => {}
            }
        }

        if depth > 0 {
            return Err(PatternParseError::new(pattern, chars.len(), PatternMessage::MissingCloseCapture));
        }
        if chars.len() > segment_start {
            tokens.push(Token::Segment(segment_start, chars.len()));
        }
        Ok(tokens)
    }

    fn capture_the_rest_name(
        &self,
        pattern: &str,
        segment: &[char],
        start: usize,
        offset: usize,
    ) -> Result<String, PatternParseError> {
        let closes_segment = segment.last() == Some(&'}') && segment.iter().filter(|c| **c == '}').count() == 1;
        if offset != 0 || !closes_segment {
            return Err(PatternParseError::new(
                pattern,
                start + offset,
                PatternMessage::CaptureTheRestIsStandalone,
            ));
        }
        let name = &segment[2..segment.len() - 1];
        if name.is_empty() {
            return Err(PatternParseError::new(
                pattern,
                start,
                PatternMessage::BadlyFormedCaptureTheRest,
            ));
        }
        Self::validate_name(pattern, name, start + 2)?;
        Ok(name.iter().collect())
    }

    fn classify(
        &self,
        pattern: &str,
        segment: &[char],
        start: usize,
        captured: &mut Vec<String>,
    ) -> Result<ElementKind, PatternParseError> {
        let text: String = segment.iter().collect();
        if segment == ['*'] {
            return Ok(ElementKind::Wildcard);
        }
        if !segment.contains(&'{') {
            if segment.contains(&'*') {
                return self.build_regex(pattern, text, self.split_pieces(pattern, segment, start, captured)?, start);
            }
            if segment.contains(&'?') {
                return Ok(ElementKind::SingleCharWildcarded {
                    text,
                    case_sensitive: self.case_sensitive,
                });
            }
            return Ok(ElementKind::Literal {
                text,
                case_sensitive: self.case_sensitive,
            });
        }

        let mut pieces = self.split_pieces(pattern, segment, start, captured)?;
        if pieces.len() == 1 {
            if let Some(Piece::Capture { name, constraint }) = pieces.pop() {
                let constraint = constraint
                    .map(|c| self.compile(pattern, &format!("^(?:{})$", c), start))
                    .transpose()?;
                return Ok(ElementKind::Capture { name, constraint });
            }
        }
        self.build_regex(pattern, text, pieces, start)
    }

    /// Break a segment into literal runs, wildcards and captures
    fn split_pieces(
        &self,
        pattern: &str,
        segment: &[char],
        start: usize,
        captured: &mut Vec<String>,
    ) -> Result<Vec<Piece>, PatternParseError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < segment.len() {
            match segment[i] {
                '{' => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    if let Some(Piece::Capture { .. }) = pieces.last() {
                        return Err(PatternParseError::new(
                            pattern,
                            start + i,
                            PatternMessage::CannotHaveAdjacentCaptures,
                        ));
                    }
                    let close = Self::find_capture_end(segment, i);
                    let descriptor = &segment[i + 1..close];
                    let capture = self.parse_capture(pattern, descriptor, start + i + 1, captured)?;
                    pieces.push(capture);
                    i = close + 1;
                    continue;
                }
                '*' | '?' => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(if segment[i] == '*' { Piece::Star } else { Piece::Question });
                }
                c => literal.push(c),
            }
            i += 1;
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(pieces)
    }

    /// Index of the `}` closing the capture opened at `open`; braces were
    /// already validated by the tokenizer.
    fn find_capture_end(segment: &[char], open: usize) -> usize {
        let mut depth = 0usize;
        let mut escaped = false;
        for (i, &c) in segment.iter().enumerate().skip(open) {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
        }
        segment.len().saturating_sub(1)
    }

    fn parse_capture(
        &self,
        pattern: &str,
        descriptor: &[char],
        start: usize,
        captured: &mut Vec<String>,
    ) -> Result<Piece, PatternParseError> {
        let colon = descriptor.iter().position(|c| *c == ':');
        let (name, constraint) = match colon {
            Some(pos) => (&descriptor[..pos], Some(&descriptor[pos + 1..])),
            None => (descriptor, None),
        };

        if name.is_empty() {
            return Err(PatternParseError::new(pattern, start, PatternMessage::EmptyCaptureName));
        }
        Self::validate_name(pattern, name, start)?;

        let constraint = match constraint {
            Some([]) => {
                return Err(PatternParseError::new(
                    pattern,
                    start + name.len() + 1,
                    PatternMessage::MissingRegexConstraint,
                ))
            }
            Some(c) => Some(c.iter().collect::<String>()),
            None => None,
        };

        let name: String = name.iter().collect();
        Self::register_capture(pattern, start, name.clone(), captured)?;
        Ok(Piece::Capture { name, constraint })
    }

    fn validate_name(pattern: &str, name: &[char], start: usize) -> Result<(), PatternParseError> {
        let first = name[0];
        if !(first.is_alphabetic() || first == '_' || first == '$') {
            return Err(PatternParseError::new(
                pattern,
                start,
                PatternMessage::IllegalCharacterAtStartOfCaptureDescriptor,
            )
            .with_detail(first.to_string()));
        }
        if let Some(pos) = name
            .iter()
            .position(|c| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '-')))
        {
            return Err(PatternParseError::new(
                pattern,
                start + pos,
                PatternMessage::IllegalCharacterInCaptureDescriptor,
            )
            .with_detail(name[pos].to_string()));
        }
        Ok(())
    }

    fn register_capture(
        pattern: &str,
        start: usize,
        name: String,
        captured: &mut Vec<String>,
    ) -> Result<(), PatternParseError> {
        if captured.contains(&name) {
            return Err(PatternParseError::new(pattern, start, PatternMessage::IllegalDoubleCapture).with_detail(name));
        }
        captured.push(name);
        Ok(())
    }

    fn build_regex(
        &self,
        pattern: &str,
        text: String,
        pieces: Vec<Piece>,
        start: usize,
    ) -> Result<ElementKind, PatternParseError> {
        let mut source = String::from("^");
        let mut variable_names = Vec::new();
        let mut wildcard_count = 0;
        let mut normalized_length = 0;

        for piece in pieces {
            match piece {
                Piece::Literal(lit) => {
                    normalized_length += lit.chars().count();
                    source.push_str(&regex::escape(&lit));
                }
                Piece::Star => {
                    wildcard_count += 1;
                    normalized_length += 1;
                    source.push_str(".*");
                }
                Piece::Question => {
                    normalized_length += 1;
                    source.push('.');
                }
                Piece::Capture { name, constraint } => {
                    normalized_length += 1;
                    match constraint {
                        Some(c) => {
                            source.push('(');
                            source.push_str(&c);
                            source.push(')');
                        }
                        None => source.push_str("(.*)"),
                    }
                    variable_names.push(name);
                }
            }
        }
        source.push('$');

        let regex = self.compile(pattern, &source, start)?;
        if regex.captures_len() != variable_names.len() + 1 {
            return Err(PatternParseError::new(pattern, start, PatternMessage::CaptureGroupInConstraint)
                .with_detail(text));
        }

        Ok(ElementKind::Regex {
            text,
            regex,
            variable_names,
            wildcard_count,
            normalized_length,
        })
    }

    fn compile(&self, pattern: &str, source: &str, start: usize) -> Result<Regex, PatternParseError> {
        RegexBuilder::new(source)
            .case_insensitive(!self.case_sensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| {
                PatternParseError::new(pattern, start, PatternMessage::RegexPatternSyntax).with_detail(e.to_string())
            })
    }
}

impl Default for PathPatternParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(pattern: &str) -> String {
        PathPatternParser::new().parse(pattern).unwrap().to_chain_string()
    }

    fn parse_error(pattern: &str) -> PatternParseError {
        PathPatternParser::new().parse(pattern).unwrap_err()
    }

    #[test]
    fn test_basic_chains() {
        assert_eq!(chain(""), "");
        assert_eq!(chain("/"), "Separator");
        assert_eq!(chain("/foo/bar"), "Separator Literal(foo) Separator Literal(bar)");
        assert_eq!(chain("foo"), "Literal(foo)");
        assert_eq!(chain("/f?o"), "Separator SingleCharWildcarded(f?o)");
    }

    #[test]
    fn test_capture_chains() {
        assert_eq!(chain("/{id}"), "Separator Capture({id})");
        assert_eq!(chain("/{id:\\d+}"), "Separator Capture({id:\\d+})");
        assert_eq!(chain("/{name}-{version}.jar"), "Separator Regex({name}-{version}.jar)");
        assert_eq!(chain("/foo/{*rest}"), "Separator Literal(foo) CaptureTheRest(/{*rest})");
        assert_eq!(chain("{*rest}"), "CaptureTheRest({*rest})");
    }

    #[test]
    fn test_wildcard_chains() {
        assert_eq!(chain("/*"), "Separator Wildcard(*)");
        assert_eq!(chain("/*.html"), "Separator Regex(*.html)");
        assert_eq!(chain("/foo/**"), "Separator Literal(foo) WildcardTheRest(/**)");
        assert_eq!(
            chain("/foo/**/bar"),
            "Separator Literal(foo) Separator MultiSegmentWildcard(**) Separator Literal(bar)"
        );
        assert_eq!(chain("**"), "MultiSegmentWildcard(**)");
    }

    #[test]
    fn test_separator_inside_constraint_does_not_split() {
        let parser = PathPatternParser::new().with_separator('.');
        let pattern = parser.parse("v.{version:\\d+\\.\\d+}").unwrap();
        assert_eq!(pattern.to_chain_string(), "Literal(v) Separator Capture({version:\\d+\\.\\d+})");
    }

    #[test]
    fn test_regex_quantifier_braces_in_constraint() {
        assert_eq!(chain("/{code:[a-z]{2,3}}"), "Separator Capture({code:[a-z]{2,3}})");
    }

    #[test]
    fn test_brace_errors() {
        let err = parse_error("/foo/{bar");
        assert_eq!(err.message, PatternMessage::MissingCloseCapture);
        assert_eq!(err.position, 9);

        let err = parse_error("/foo/bar}");
        assert_eq!(err.message, PatternMessage::MissingOpenCapture);
        assert_eq!(err.position, 8);

        let err = parse_error("/{a{b}}");
        assert_eq!(err.message, PatternMessage::IllegalNestedCapture);
        assert_eq!(err.position, 3);
    }

    #[test]
    fn test_capture_name_errors() {
        assert_eq!(parse_error("/{}").message, PatternMessage::EmptyCaptureName);
        assert_eq!(parse_error("/{:\\d+}").message, PatternMessage::EmptyCaptureName);
        assert_eq!(
            parse_error("/{1abc}").message,
            PatternMessage::IllegalCharacterAtStartOfCaptureDescriptor
        );

        let err = parse_error("/{ab c}");
        assert_eq!(err.message, PatternMessage::IllegalCharacterInCaptureDescriptor);
        assert_eq!(err.position, 4);

        assert_eq!(parse_error("/{abc:}").message, PatternMessage::MissingRegexConstraint);
    }

    #[test]
    fn test_capture_structure_errors() {
        let err = parse_error("/{a}{b}");
        assert_eq!(err.message, PatternMessage::CannotHaveAdjacentCaptures);
        assert_eq!(err.position, 4);

        let err = parse_error("/{a}/{a}");
        assert_eq!(err.message, PatternMessage::IllegalDoubleCapture);
        assert_eq!(err.detail.as_deref(), Some("a"));

        assert_eq!(parse_error("/{*a}/{a}").message, PatternMessage::NoMoreDataExpectedAfterCaptureTheRest);
        assert_eq!(parse_error("/{a:[}").message, PatternMessage::RegexPatternSyntax);
        assert_eq!(parse_error("/{a:(x)}-z").message, PatternMessage::CaptureGroupInConstraint);
    }

    #[test]
    fn test_capture_the_rest_errors() {
        let err = parse_error("/foo/{*rest}/bar");
        assert_eq!(err.message, PatternMessage::NoMoreDataExpectedAfterCaptureTheRest);
        assert_eq!(err.position, 12);

        assert_eq!(parse_error("/foo{*rest}").message, PatternMessage::CaptureTheRestIsStandalone);
        assert_eq!(parse_error("/{*rest}x").message, PatternMessage::CaptureTheRestIsStandalone);
        assert_eq!(parse_error("/{*}").message, PatternMessage::BadlyFormedCaptureTheRest);
        assert_eq!(parse_error("/{*rest}/").message, PatternMessage::NoMoreDataExpectedAfterCaptureTheRest);
    }

    #[test]
    fn test_init_full_path_pattern() {
        let parser = PathPatternParser::new();
        assert_eq!(parser.init_full_path_pattern(""), "");
        assert_eq!(parser.init_full_path_pattern("foo"), "/foo");
        assert_eq!(parser.init_full_path_pattern("/foo"), "/foo");
    }

    #[test]
    fn test_builder() {
        let parser = PathPatternParser::new()
            .with_case_sensitive(false)
            .with_match_optional_trailing_separator(true)
            .with_separator('.');
        assert!(!parser.is_case_sensitive());
        assert!(parser.is_match_optional_trailing_separator());
        assert_eq!(parser.separator(), '.');
        assert_eq!(parser.path_options().separator, '.');
    }
}
