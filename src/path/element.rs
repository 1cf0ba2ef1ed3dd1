use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use super::decode::MatrixVariables;

/// A slice of the shared path text
#[derive(Clone)]
pub(crate) struct TextSpan {
    source: Arc<str>,
    range: Range<usize>,
}

impl TextSpan {
    pub(crate) fn new(source: &Arc<str>, range: Range<usize>) -> Self {
        TextSpan {
            source: Arc::clone(source),
            range,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.source[self.range.clone()]
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// One element of a [`PathContainer`](super::PathContainer): a separator or a segment
#[derive(Clone, Debug)]
pub enum Element {
    Separator(Separator),
    Segment(PathSegment),
}

impl Element {
    /// Raw text of the element as it appears in the path
    pub fn value(&self) -> &str {
        match self {
            Element::Separator(sep) => sep.value(),
            Element::Segment(seg) => seg.value(),
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Element::Separator(_))
    }

    pub fn as_segment(&self) -> Option<&PathSegment> {
        match self {
            Element::Segment(seg) => Some(seg),
            Element::Separator(_) => None,
        }
    }

    /// Decoded value for segments, raw text for separators
    pub fn value_to_match(&self) -> &str {
        match self {
            Element::Separator(sep) => sep.value(),
            Element::Segment(seg) => seg.value_to_match(),
        }
    }

    pub(crate) fn byte_range(&self) -> Range<usize> {
        match self {
            Element::Separator(sep) => sep.text.range.clone(),
            Element::Segment(seg) => seg.text.range.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Separator {
    text: TextSpan,
}

impl Separator {
    pub(crate) fn new(text: TextSpan) -> Self {
        Separator { text }
    }

    pub fn value(&self) -> &str {
        self.text.as_str()
    }
}

/// A path segment with its raw text, decoded match value and matrix variables
#[derive(Clone, Debug)]
pub struct PathSegment {
    text: TextSpan,
    // None when the raw text is already the value to match
    decoded: Option<String>,
    parameters: MatrixVariables,
}

impl PathSegment {
    pub(crate) fn new(text: TextSpan, decoded: Option<String>, parameters: MatrixVariables) -> Self {
        PathSegment {
            text,
            decoded,
            parameters,
        }
    }

    /// Raw segment text, matrix variables and escapes included
    pub fn value(&self) -> &str {
        self.text.as_str()
    }

    /// Segment text used for matching: matrix variables removed, escapes decoded
    pub fn value_to_match(&self) -> &str {
        self.decoded.as_deref().unwrap_or_else(|| self.text.as_str())
    }

    pub fn parameters(&self) -> &MatrixVariables {
        &self.parameters
    }
}
