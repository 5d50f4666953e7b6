/// Result alias that carries the custom [`VizError`] type.
pub type Result<T> = std::result::Result<T, VizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// An audio source could not be connected: the user denied the microphone
    /// permission, no capture device exists, or file decoding failed. The
    /// graph is guaranteed to hold no active source when this is returned.
    #[error("audio source unavailable: {0}")]
    SourceUnavailable(String),
    /// Free-form error for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around FFT processing errors.
    #[error("{0}")]
    Fft(#[from] realfft::FftError),
}

impl VizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a [`VizError::SourceUnavailable`] from any displayable cause.
    pub fn unavailable<T: Into<String>>(reason: T) -> Self {
        Self::SourceUnavailable(reason.into())
    }
}

impl From<&str> for VizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
