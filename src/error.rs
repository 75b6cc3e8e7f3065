pub type ScholarResult<T> = Result<T, ScholarError>;

#[derive(thiserror::Error, Debug)]
pub enum ScholarError {
    /// Keys the lookup cannot rely on: unsorted, negative or non-finite.
    #[error("invalid track: {0}")]
    Track(String),

    #[error("invalid curve '{curve}': {reason}")]
    Curve { curve: String, reason: String },

    #[error("invalid script: {0}")]
    Script(String),

    #[error("malformed script JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScholarError {
    pub fn track(msg: impl Into<String>) -> Self {
        Self::Track(msg.into())
    }

    pub fn curve(curve: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Curve {
            curve: curve.into(),
            reason: reason.into(),
        }
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    /// Attributes a track error to the named curve; other errors pass through.
    pub fn in_curve(self, curve: &str) -> Self {
        match self {
            Self::Track(reason) => Self::curve(curve, reason),
            other => other,
        }
    }
}
