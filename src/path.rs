//! Decoded, segmented view of a request path or message route.
//!
//! The raw text is split on the separator first and each segment is decoded
//! afterwards, so an encoded separator (`%2F`, `%2E`) stays segment content.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{PathError, PathResult};

mod decode;
mod element;

pub use decode::MatrixVariables;
pub(crate) use decode::decode;
pub use element::{Element, PathSegment, Separator};
use element::TextSpan;

/// How a raw path is split and decoded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathOptions {
    pub separator: char,
    pub decode_segments: bool,
    pub parse_matrix_variables: bool,
}

impl PathOptions {
    /// URL paths: `/` separated, percent-decoded, with matrix variables
    pub const HTTP_PATH: PathOptions = PathOptions {
        separator: '/',
        decode_segments: true,
        parse_matrix_variables: true,
    };

    /// Message routes such as `projects.spring-framework`
    pub const MESSAGE_ROUTE: PathOptions = PathOptions {
        separator: '.',
        decode_segments: true,
        parse_matrix_variables: false,
    };

    pub fn create(separator: char, decode_and_parse_segments: bool) -> Self {
        PathOptions {
            separator,
            decode_segments: decode_and_parse_segments,
            parse_matrix_variables: decode_and_parse_segments,
        }
    }
}

impl Default for PathOptions {
    fn default() -> Self {
        PathOptions::HTTP_PATH
    }
}

/// Immutable, cheaply cloneable view over a parsed path.
///
/// Sub paths share the element array and the source text of the container
/// they were cut from.
#[derive(Clone)]
pub struct PathContainer {
    source: Arc<str>,
    elements: Arc<[Element]>,
    range: Range<usize>,
    span: Range<usize>,
    options: PathOptions,
}

impl PathContainer {
    /// Split and decode `path` with the given options
    pub fn parse_path(path: &str, options: PathOptions) -> PathResult<PathContainer> {
        if path.is_empty() {
            return Ok(Self::empty(options));
        }

        let source: Arc<str> = Arc::from(path);
        let separator = options.separator;
        let sep_len = separator.len_utf8();
        let mut elements = Vec::new();
        let mut begin = 0;

        if path.starts_with(separator) {
            elements.push(Element::Separator(Separator::new(TextSpan::new(&source, 0..sep_len))));
            begin = sep_len;
        }

        while begin < path.len() {
            let end = path[begin..].find(separator).map(|i| begin + i);
            let segment_end = end.unwrap_or(path.len());
            if segment_end > begin {
                elements.push(Element::Segment(Self::parse_segment(&source, begin..segment_end, options)?));
            }
            match end {
                Some(end) => {
                    elements.push(Element::Separator(Separator::new(TextSpan::new(&source, end..end + sep_len))));
                    begin = end + sep_len;
                }
                None => break,
            }
        }

        trace!("Parsed path '{}' into {} elements", path, elements.len());

        let len = elements.len();
        Ok(PathContainer {
            span: 0..source.len(),
            source,
            elements: elements.into(),
            range: 0..len,
            options,
        })
    }

    /// Parse with [`PathOptions::HTTP_PATH`]
    pub fn parse_http_path(path: &str) -> PathResult<PathContainer> {
        Self::parse_path(path, PathOptions::HTTP_PATH)
    }

    pub fn empty(options: PathOptions) -> PathContainer {
        PathContainer {
            source: Arc::from(""),
            elements: Arc::from(Vec::<Element>::new()),
            range: 0..0,
            span: 0..0,
            options,
        }
    }

    fn parse_segment(source: &Arc<str>, range: Range<usize>, options: PathOptions) -> PathResult<PathSegment> {
        let raw = &source[range.clone()];
        let text = TextSpan::new(source, range.clone());

        let (match_part, parameters) = match raw.find(';') {
            Some(idx) if options.parse_matrix_variables => {
                let params = decode::parse_matrix_variables(&raw[idx..], range.start + idx)?;
                (&raw[..idx], params)
            }
            _ => (raw, MatrixVariables::new()),
        };

        let decoded = if options.decode_segments {
            decode(match_part, range.start)?
        } else {
            match_part.into()
        };

        // Keep a copy only when the match value differs from the raw text
        let decoded = if decoded.as_ref() == raw {
            None
        } else {
            Some(decoded.into_owned())
        };

        Ok(PathSegment::new(text, decoded, parameters))
    }

    /// The original path text of this view
    pub fn value(&self) -> &str {
        &self.source[self.span.clone()]
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn options(&self) -> PathOptions {
        self.options
    }

    /// True when the path consists of a single separator
    pub fn is_just_separator(&self) -> bool {
        matches!(self.elements(), [Element::Separator(_)])
    }

    /// View over elements `from..to`, sharing this container's data
    pub fn sub_path(&self, from: usize, to: usize) -> PathResult<PathContainer> {
        let len = self.len();
        if from == 0 && to == len {
            return Ok(self.clone());
        }
        if from > to || to > len {
            return Err(PathError::InvalidSubPath { from, to, len });
        }
        if from == to {
            return Ok(Self::empty(self.options));
        }

        let range = self.range.start + from..self.range.start + to;
        let span = self.elements[range.start].byte_range().start..self.elements[range.end - 1].byte_range().end;
        Ok(PathContainer {
            source: Arc::clone(&self.source),
            elements: Arc::clone(&self.elements),
            range,
            span,
            options: self.options,
        })
    }

    pub fn sub_path_from(&self, from: usize) -> PathResult<PathContainer> {
        self.sub_path(from, self.len())
    }

    /// True when both containers view the same element storage
    pub fn shares_elements_with(&self, other: &PathContainer) -> bool {
        Arc::ptr_eq(&self.elements, &other.elements)
    }
}

impl PartialEq for PathContainer {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for PathContainer {}

impl Hash for PathContainer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

impl fmt::Display for PathContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl fmt::Debug for PathContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathContainer")
            .field("value", &self.value())
            .field("elements", &self.elements())
            .finish()
    }
}
