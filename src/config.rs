use serde::{Deserialize, Serialize};

use crate::error::{PathError, PathResult};
use crate::path::PathOptions;
use crate::pattern::PathPatternParser;

/// Parser settings loadable from JSON; missing fields take the defaults
/// of [`PathPatternParser::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub separator: char,
    pub case_sensitive: bool,
    pub match_optional_trailing_separator: bool,
    pub decode_segments: bool,
    pub parse_matrix_variables: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig {
            separator: '/',
            case_sensitive: true,
            match_optional_trailing_separator: false,
            decode_segments: true,
            parse_matrix_variables: true,
        }
    }
}

impl PatternConfig {
    pub fn from_json(json: &str) -> PathResult<Self> {
        let config: PatternConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Separators that would clash with pattern syntax or escaping are refused
    pub fn validate(&self) -> PathResult<()> {
        match self.separator {
            '{' | '}' | '*' | '?' | '%' | ':' | ';' | '\\' => Err(PathError::config(format!(
                "Separator '{}' is reserved by pattern syntax",
                self.separator
            ))),
            c if c.is_whitespace() || c.is_alphanumeric() => {
                Err(PathError::config(format!("Separator '{}' is not a punctuation character", c)))
            }
            _ => Ok(()),
        }
    }

    pub fn path_options(&self) -> PathOptions {
        PathOptions {
            separator: self.separator,
            decode_segments: self.decode_segments,
            parse_matrix_variables: self.parse_matrix_variables,
        }
    }
}

impl PathPatternParser {
    pub fn from_config(config: &PatternConfig) -> PathResult<Self> {
        config.validate()?;
        Ok(PathPatternParser::new()
            .with_case_sensitive(config.case_sensitive)
            .with_match_optional_trailing_separator(config.match_optional_trailing_separator)
            .with_path_options(config.path_options()))
    }
}
