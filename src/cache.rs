use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use crate::error::PatternParseError;
use crate::pattern::{PathPattern, PathPatternParser};

type Parsed = Result<Arc<PathPattern>, PatternParseError>;

/// Concurrent parse-once cache of patterns keyed by their text.
///
/// Failed parses are cached as well, so a bad pattern is reported the same
/// way on every lookup without being parsed again.
pub struct PatternCache {
    parser: PathPatternParser,
    patterns: DashMap<String, Parsed>,
}

impl PatternCache {
    pub fn new(parser: PathPatternParser) -> Self {
        PatternCache {
            parser,
            patterns: DashMap::new(),
        }
    }

    pub fn parser(&self) -> &PathPatternParser {
        &self.parser
    }

    pub fn get_or_parse(&self, text: &str) -> Parsed {
        if let Some(cached) = self.patterns.get(text) {
            return cached.value().clone();
        }

        // Parse without holding a shard lock; a racing insert wins
        debug!("Pattern cache miss for '{}'", text);
        let parsed = self.parser.parse(text).map(Arc::new);
        self.patterns
            .entry(text.to_string())
            .or_insert(parsed)
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn clear(&self) {
        self.patterns.clear();
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(PathPatternParser::new())
    }
}
