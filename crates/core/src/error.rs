use serde::Serialize;

/// A lexing or parsing failure in grounded source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}

/// A failure while deriving a semantic object from a grounded node.
///
/// Build errors never abort a whole document: collections record them and
/// carry on with the remaining children (see [`crate::Built`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A grounded value has the wrong shape for the field it feeds.
    #[error("line {line}: {owner}.{field}: expected {expected}, found {found}")]
    TypeMismatch {
        owner: &'static str,
        field: String,
        expected: &'static str,
        found: &'static str,
        line: u32,
    },

    /// A grounded node that should hold an object does not.
    #[error("line {line}: {owner}: expected a mapping, found {found}")]
    NotAMapping {
        owner: &'static str,
        found: &'static str,
        line: u32,
    },

    /// One child of a collection, or a nested object of `collection`, failed
    /// to build and was left out.
    #[error("{collection}['{key}']: {source}")]
    Child {
        collection: &'static str,
        key: String,
        #[source]
        source: Box<BuildError>,
    },
}

impl BuildError {
    /// Source line the failure points at.
    pub fn line(&self) -> u32 {
        match self {
            BuildError::TypeMismatch { line, .. } | BuildError::NotAMapping { line, .. } => *line,
            BuildError::Child { source, .. } => source.line(),
        }
    }

    /// Serialize to a flat JSON record for tooling output.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "line":    self.line(),
            "message": self.to_string(),
        })
    }
}
