/// Result alias that carries the custom [`MoodMixError`] type.
pub type Result<T> = std::result::Result<T, MoodMixError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum MoodMixError {
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The input recording could not be read or is not valid audio.
    #[error("failed to decode audio: {0}")]
    Decode(String),
    /// The rendered buffer could not be written out.
    #[error("failed to encode audio: {0}")]
    Encode(String),
    /// A caller supplied parameter was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// Spectral processing failed.
    #[error("{0}")]
    Fft(#[from] realfft::FftError),
}

impl MoodMixError {
    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }
}
