use std::collections::HashSet;

use smallvec::SmallVec;

use crate::path::{Element, MatrixVariables, PathContainer, PathSegment};

use super::PathMatchInfo;

struct Binding<'a> {
    name: &'a str,
    value: String,
    matrix: Option<MatrixVariables>,
}

/// Per-call matching state shared by the element chain.
///
/// Bindings pushed by an element are popped again by the same element when
/// the rest of the chain fails, so a failed match leaves nothing behind.
/// Whether an element matches at an index never depends on the bindings, so
/// failed `(element position, path index)` attempts are remembered and not
/// retried; this keeps `**` backtracking at O(elements * path length).
pub(crate) struct MatchingContext<'a> {
    elements: &'a [Element],
    match_optional_trailing_separator: bool,
    pub(crate) extract: bool,
    pub(crate) determine_remaining: bool,
    pub(crate) remaining_index: Option<usize>,
    bindings: SmallVec<[Binding<'a>; 4]>,
    failed: HashSet<(usize, usize)>,
}

impl<'a> MatchingContext<'a> {
    pub(crate) fn new(path: &'a PathContainer, match_optional_trailing_separator: bool, extract: bool) -> Self {
        MatchingContext {
            elements: path.elements(),
            match_optional_trailing_separator,
            extract,
            determine_remaining: false,
            remaining_index: None,
            bindings: SmallVec::new(),
            failed: HashSet::new(),
        }
    }

    pub(crate) fn determining_remaining(self) -> Self {
        Self {
            determine_remaining: true,
            ..self
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn is_separator(&self, index: usize) -> bool {
        self.elements.get(index).map(Element::is_separator).unwrap_or(false)
    }

    pub(crate) fn segment(&self, index: usize) -> Option<&'a PathSegment> {
        self.elements.get(index).and_then(Element::as_segment)
    }

    pub(crate) fn elements_from(&self, index: usize) -> &'a [Element] {
        self.elements.get(index..).unwrap_or(&[])
    }

    pub(crate) fn mark(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn rollback(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }

    pub(crate) fn known_failure(&self, position: usize, index: usize) -> bool {
        self.failed.contains(&(position, index))
    }

    pub(crate) fn record_failure(&mut self, position: usize, index: usize) {
        self.failed.insert((position, index));
    }

    pub(crate) fn bind(&mut self, name: &'a str, value: &str, matrix: &MatrixVariables) {
        if !self.extract {
            return;
        }
        self.bindings.push(Binding {
            name,
            value: value.to_string(),
            matrix: (!matrix.is_empty()).then(|| matrix.clone()),
        });
    }

    pub(crate) fn bind_owned(&mut self, name: &'a str, value: String, matrix: MatrixVariables) {
        if !self.extract {
            return;
        }
        self.bindings.push(Binding {
            name,
            value,
            matrix: (!matrix.is_empty()).then_some(matrix),
        });
    }

    /// Decide the match once the pattern chain ran out at `index`.
    ///
    /// `allow_trailing_separator` is set by elements that consumed a segment;
    /// only they may be followed by one optional trailing separator. A matched
    /// prefix must end at a separator or at the end of the path.
    pub(crate) fn finish_at(&mut self, index: usize, allow_trailing_separator: bool) -> bool {
        if self.determine_remaining {
            if index < self.len() && !self.is_separator(index) {
                return false;
            }
            self.remaining_index = Some(index);
            return true;
        }
        index == self.len()
            || (allow_trailing_separator
                && self.match_optional_trailing_separator
                && index + 1 == self.len()
                && self.is_separator(index))
    }

    pub(crate) fn into_match_info(self) -> PathMatchInfo {
        self.bindings
            .into_iter()
            .fold(PathMatchInfo::default(), |mut info, binding| {
                if let Some(matrix) = binding.matrix {
                    info.matrix_variables.insert(binding.name.to_string(), matrix);
                }
                info.uri_variables.insert(binding.name.to_string(), binding.value);
                info
            })
    }
}
