use std::fmt;

/// What went wrong while parsing a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternMessage {
    MissingCloseCapture,
    MissingOpenCapture,
    IllegalNestedCapture,
    CannotHaveAdjacentCaptures,
    EmptyCaptureName,
    IllegalCharacterAtStartOfCaptureDescriptor,
    IllegalCharacterInCaptureDescriptor,
    MissingRegexConstraint,
    IllegalDoubleCapture,
    RegexPatternSyntax,
    CaptureGroupInConstraint,
    CaptureTheRestIsStandalone,
    BadlyFormedCaptureTheRest,
    NoMoreDataExpectedAfterCaptureTheRest,
}

impl fmt::Display for PatternMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PatternMessage::MissingCloseCapture => "Expected close capture character after variable name '}'",
            PatternMessage::MissingOpenCapture => "Missing preceding open capture character before variable name '{'",
            PatternMessage::IllegalNestedCapture => "Not allowed to nest variable captures",
            PatternMessage::CannotHaveAdjacentCaptures => "Adjacent captures are not allowed",
            PatternMessage::EmptyCaptureName => "Capture must declare a variable name",
            PatternMessage::IllegalCharacterAtStartOfCaptureDescriptor => {
                "Character is not allowed at start of capture descriptor"
            }
            PatternMessage::IllegalCharacterInCaptureDescriptor => "Character is not allowed in capture descriptor",
            PatternMessage::MissingRegexConstraint => "Missing regex constraint on capture",
            PatternMessage::IllegalDoubleCapture => "Not allowed to capture the same variable twice",
            PatternMessage::RegexPatternSyntax => "Regex constraint does not compile",
            PatternMessage::CaptureGroupInConstraint => "Regex constraint must not declare its own capture groups",
            PatternMessage::CaptureTheRestIsStandalone => "'{*...}' can only be preceded by a path separator",
            PatternMessage::BadlyFormedCaptureTheRest => "Expected form when capturing the rest of the path is simply '{*...}'",
            PatternMessage::NoMoreDataExpectedAfterCaptureTheRest => {
                "No more pattern data allowed after {*...} or ** pattern element"
            }
        };
        f.write_str(msg)
    }
}

/// Structural error raised while parsing pattern text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternParseError {
    pub pattern: String,
    /// Char offset of the offending character
    pub position: usize,
    pub message: PatternMessage,
    /// Extra detail, e.g. the offending variable name or regex error
    pub detail: Option<String>,
}

impl PatternParseError {
    pub fn new(pattern: &str, position: usize, message: PatternMessage) -> Self {
        PatternParseError {
            pattern: pattern.to_string(),
            position,
            message,
            detail: None,
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..self
        }
    }

    /// Render the pattern with a caret under the offending position
    pub fn to_detailed_string(&self) -> String {
        let caret = format!("{}^", " ".repeat(self.position));
        format!("{}\n{}\n{}", self.pattern, caret, self)
    }
}

impl fmt::Display for PatternParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pattern: '{}', position: {})", self.message, self.pattern, self.position)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for PatternParseError {}

/// Comprehensive error type for pattern parsing and path handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Malformed pattern text, a configuration fault
    PatternParse(PatternParseError),
    /// Invalid percent-encoding in a request path, a client input fault
    Decode {
        input: String,
        position: usize,
        context: String,
    },
    /// Sub-path range outside the element list
    InvalidSubPath {
        from: usize,
        to: usize,
        len: usize,
    },
    /// Two patterns with concrete, different file extensions
    Combine {
        first: String,
        second: String,
    },
    /// Same pattern text registered twice in one route table
    DuplicateRoute {
        pattern: String,
    },
    /// Configuration errors
    Config {
        context: String,
    },
}

impl PathError {
    pub fn decode(input: &str, position: usize, context: impl Into<String>) -> Self {
        PathError::Decode {
            input: input.to_string(),
            position,
            context: context.into(),
        }
    }

    pub fn config(context: impl Into<String>) -> Self {
        PathError::Config {
            context: context.into(),
        }
    }

    /// Status code the web layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            PathError::Decode { .. } => 400,
            _ => 500,
        }
    }

    /// True when the fault lies with the request rather than the configuration
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::PatternParse(err) => write!(f, "Pattern parse error: {}", err),
            PathError::Decode { input, position, context } => {
                write!(f, "Decode error at {} in '{}': {}", position, input, context)
            }
            PathError::InvalidSubPath { from, to, len } => {
                write!(f, "Invalid sub path {}..{} of {} elements", from, to, len)
            }
            PathError::Combine { first, second } => {
                write!(f, "Cannot combine patterns: {} and {}", first, second)
            }
            PathError::DuplicateRoute { pattern } => write!(f, "Route already registered: {}", pattern),
            PathError::Config { context } => write!(f, "Configuration error: {}", context),
        }
    }
}

impl std::error::Error for PathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PathError::PatternParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternParseError> for PathError {
    fn from(error: PatternParseError) -> Self {
        PathError::PatternParse(error)
    }
}

impl From<serde_json::Error> for PathError {
    fn from(error: serde_json::Error) -> Self {
        PathError::config(error.to_string())
    }
}

/// Result type alias for path operations
pub type PathResult<T> = Result<T, PathError>;
