//! Route matching contract and its path-pattern backed implementation.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::cache::PatternCache;
use crate::error::PathResult;
use crate::path::{PathContainer, PathOptions};
use crate::pattern::{PathMatchInfo, PathPattern, PathPatternParser};

pub mod table;

/// Matches textual route patterns against parsed routes.
pub trait RouteMatcher {
    type Route;

    fn parse_route(&self, route: &str) -> PathResult<Self::Route>;

    /// True when `route` contains wildcards or captures
    fn is_pattern(&self, route: &str) -> bool;

    fn combine(&self, first: &str, second: &str) -> PathResult<String>;

    fn matches(&self, pattern: &str, route: &Self::Route) -> PathResult<bool>;

    fn match_and_extract(&self, pattern: &str, route: &Self::Route) -> PathResult<Option<PathMatchInfo>>;

    /// Most specific pattern first
    fn compare_patterns(&self, a: &str, b: &str) -> Ordering;
}

/// [`RouteMatcher`] over [`PathPattern`]s, parsing each pattern text once.
///
/// Defaults to message routes: `.` separated, decoded, no matrix variables.
pub struct PathPatternRouteMatcher {
    cache: PatternCache,
}

impl PathPatternRouteMatcher {
    pub fn new() -> Self {
        Self::with_parser(PathPatternParser::new().with_path_options(PathOptions::MESSAGE_ROUTE))
    }

    pub fn with_parser(parser: PathPatternParser) -> Self {
        PathPatternRouteMatcher {
            cache: PatternCache::new(parser),
        }
    }

    pub fn parser(&self) -> &PathPatternParser {
        self.cache.parser()
    }

    pub fn cached_patterns(&self) -> usize {
        self.cache.len()
    }

    fn pattern(&self, text: &str) -> PathResult<Arc<PathPattern>> {
        Ok(self.cache.get_or_parse(text)?)
    }
}

impl Default for PathPatternRouteMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteMatcher for PathPatternRouteMatcher {
    type Route = PathContainer;

    fn parse_route(&self, route: &str) -> PathResult<PathContainer> {
        PathContainer::parse_path(route, self.parser().path_options())
    }

    fn is_pattern(&self, route: &str) -> bool {
        self.pattern(route).map(|p| p.has_pattern_syntax()).unwrap_or(false)
    }

    fn combine(&self, first: &str, second: &str) -> PathResult<String> {
        let combined = self.pattern(first)?.combine(&*self.pattern(second)?)?;
        Ok(combined.pattern_string().to_string())
    }

    fn matches(&self, pattern: &str, route: &PathContainer) -> PathResult<bool> {
        Ok(self.pattern(pattern)?.matches(route))
    }

    fn match_and_extract(&self, pattern: &str, route: &PathContainer) -> PathResult<Option<PathMatchInfo>> {
        Ok(self.pattern(pattern)?.match_and_extract(route))
    }

    fn compare_patterns(&self, a: &str, b: &str) -> Ordering {
        match (self.pattern(a), self.pattern(b)) {
            (Ok(a), Ok(b)) => PathPattern::specificity_cmp(&a, &b),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => Ordering::Equal,
        }
    }
}
