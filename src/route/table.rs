use std::cmp::Ordering;

use log::{debug, log_enabled, warn, Level};

use crate::error::{PathError, PathResult};
use crate::path::PathContainer;
use crate::pattern::{PathMatchInfo, PathPattern, PathPatternParser};

/// Handler selected for a path, with the variables its pattern extracted
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    pub handler: &'a T,
    pub pattern: &'a PathPattern,
    pub info: PathMatchInfo,
}

/// Router that keeps its patterns sorted from most to least specific.
///
/// Among equally specific patterns the one registered first wins.
#[derive(Debug)]
pub struct RouteTable<T> {
    parser: PathPatternParser,
    routes: Vec<(PathPattern, T)>,
}

impl<T> RouteTable<T> {
    pub fn new() -> Self {
        Self::with_parser(PathPatternParser::new())
    }

    pub fn with_parser(parser: PathPatternParser) -> Self {
        RouteTable {
            parser,
            routes: Vec::new(),
        }
    }

    pub fn parser(&self) -> &PathPatternParser {
        &self.parser
    }

    pub fn add_route(&mut self, pattern: &str, handler: T) -> PathResult<()> {
        let parsed = self.parser.parse(pattern)?;
        if self.routes.iter().any(|(existing, _)| existing.pattern_string() == pattern) {
            warn!("Rejected duplicate route: '{}'", pattern);
            return Err(PathError::DuplicateRoute {
                pattern: pattern.to_string(),
            });
        }

        let index = self
            .routes
            .iter()
            .position(|(existing, _)| PathPattern::specificity_cmp(existing, &parsed) == Ordering::Greater)
            .unwrap_or(self.routes.len());
        debug!("Registered route '{}' at position {}", pattern, index);
        self.routes.insert(index, (parsed, handler));
        Ok(())
    }

    /// Parse `path` with the table's path options and find its handler.
    ///
    /// A path that cannot be decoded is an error; no matching route is `Ok(None)`.
    pub fn find_match(&self, path: &str) -> PathResult<Option<RouteMatch<'_, T>>> {
        let container = PathContainer::parse_path(path, self.parser.path_options())?;
        Ok(self.find_match_in(&container))
    }

    pub fn find_match_in(&self, path: &PathContainer) -> Option<RouteMatch<'_, T>> {
        let (index, pattern, handler, info) = self
            .routes
            .iter()
            .enumerate()
            .find_map(|(i, (pattern, handler))| pattern.match_and_extract(path).map(|info| (i, pattern, handler, info)))?;

        if log_enabled!(Level::Debug) {
            self.routes[index + 1..]
                .iter()
                .take_while(|(other, _)| PathPattern::specificity_cmp(pattern, other) == Ordering::Equal)
                .filter(|(other, _)| other.matches(path))
                .for_each(|(other, _)| {
                    debug!(
                        "Path '{}' matches '{}' and '{}' equally; using '{}'",
                        path, pattern, other, pattern
                    )
                });
        }

        Some(RouteMatch { handler, pattern, info })
    }

    /// Registered patterns, most specific first
    pub fn patterns(&self) -> impl Iterator<Item = &PathPattern> {
        self.routes.iter().map(|(pattern, _)| pattern)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
