use std::fmt;

/// A chain, event, or preferred-tool entry referenced a tool id that is
/// not present in the tool registry. Never silently ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToolError {
    pub tool_id: String,
}

impl UnknownToolError {
    pub fn new(tool_id: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
        }
    }
}

impl fmt::Display for UnknownToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tool: {}", self.tool_id)
    }
}

impl std::error::Error for UnknownToolError {}

/// Registration-time failures. Surfaced synchronously; registration never
/// applies a partial write.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A dimension value fell outside [0, 10] (or was not finite).
    InvalidEntropyDimension {
        tool_id: String,
        dimension: String,
        value: f64,
    },
    /// Duplicate tool id without the `replace` flag.
    DuplicateTool { tool_id: String },
    /// Duplicate actor id without the `replace` flag.
    DuplicateActor { actor_id: String },
    /// Lookup of an actor id that was never registered.
    UnknownActor { actor_id: String },
    /// Actor signature with non-positive or non-finite stddev.
    DegenerateSignature { actor_id: String, stddev: f64 },
    /// Signature fitting needs at least two exemplar chains.
    InsufficientExemplars { actor_id: String, count: usize },
    /// An exemplar chain referenced an unregistered tool.
    UnknownTool(UnknownToolError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEntropyDimension {
                tool_id,
                dimension,
                value,
            } => write!(
                f,
                "tool {tool_id}: dimension {dimension} = {value} outside [0, 10]"
            ),
            Self::DuplicateTool { tool_id } => {
                write!(f, "tool {tool_id} already registered (replace not set)")
            }
            Self::DuplicateActor { actor_id } => {
                write!(f, "actor {actor_id} already registered (replace not set)")
            }
            Self::UnknownActor { actor_id } => write!(f, "unknown actor: {actor_id}"),
            Self::DegenerateSignature { actor_id, stddev } => {
                write!(f, "actor {actor_id}: degenerate signature stddev {stddev}")
            }
            Self::InsufficientExemplars { actor_id, count } => write!(
                f,
                "actor {actor_id}: signature fitting needs >= 2 exemplar chains, got {count}"
            ),
            Self::UnknownTool(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnknownTool(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UnknownToolError> for RegistryError {
    fn from(value: UnknownToolError) -> Self {
        Self::UnknownTool(value)
    }
}
