/// Result alias that carries the custom [`SketchReelError`] type.
pub type Result<T> = std::result::Result<T, SketchReelError>;

/// Common error type for the core crate.
///
/// Everything except the IO and JSON wrappers is a usage error that surfaces
/// while a timeline is being built or on its first `play`.
#[derive(Debug, thiserror::Error)]
pub enum SketchReelError {
    /// A segment or window was declared with a length of zero frames.
    #[error("segment length must be at least one frame")]
    ZeroLength,
    /// `play` was called before any segment was placed.
    #[error("timeline has no segments to play")]
    EmptyTimeline,
    /// An append offset pulled the start of a segment before frame 0.
    #[error("segment would start at frame {0}, before the timeline origin")]
    StartBeforeOrigin(i128),
    /// Attack, decay or peak values that make an envelope never settle.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(&'static str),
    /// A scene description that cannot be turned into a segment.
    #[error("invalid scene `{name}`: {reason}")]
    InvalidScene { name: String, reason: String },
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around config and recording (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl SketchReelError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid_scene(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidScene {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for SketchReelError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SketchReelError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
