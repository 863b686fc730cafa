//! Crate-wide error type.
//!
//! Input and collaborator failures stop the pipeline; asset and per-field
//! problems are repaired where they happen and never reach this type unless
//! the repair itself is impossible (for example, no usable font anywhere).

pub type CardResult<T> = Result<T, CardError>;

#[derive(thiserror::Error, Debug)]
pub enum CardError {
    /// Missing or unusable user input (URL, API key, uploaded image).
    #[error("input error: {0}")]
    Input(String),

    /// The extracted article body is too short to plan slides from.
    #[error("article body too short: {len} characters (minimum {min})")]
    ArticleTooShort { len: usize, min: usize },

    /// The text-generation collaborator failed on every model it was offered.
    #[error("generation error: {0}")]
    Generation(String),

    /// The collaborator replied, but no slide could be parsed from the reply.
    #[error("the generated plan contained no slides")]
    EmptyPlan,

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CardError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Returns true for errors that must abort a job before any output is
    /// written: bad input and collaborator failures.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Input(_) | Self::ArticleTooShort { .. } | Self::Generation(_) | Self::EmptyPlan
        )
    }
}
