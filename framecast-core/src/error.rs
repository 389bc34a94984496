//! Error types for framecast

use thiserror::Error;

/// Result type alias using FramecastError
pub type Result<T> = std::result::Result<T, FramecastError>;

/// Main error type for framecast operations
#[derive(Debug, Error)]
pub enum FramecastError {
    /// Pipeline construction failed (fatal at initialization)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Sink rejected a buffer
    #[error("Sink error: {0}")]
    Sink(String),

    /// Frame encoding failed
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// UI surface refused or failed a snapshot request
    #[error("Surface error: {0}")]
    Surface(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Feature not compiled into this build
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FramecastError>,
    },
}

impl FramecastError {
    /// Create a pipeline error
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Create a sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create an encoder error
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// Create a surface error
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &FramecastError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// A short hint for the user on how to fix the problem
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.root() {
            Self::Pipeline(_) => Some(
                "Check that GStreamer and the required plugins (jpegdec, clockoverlay, \
                 rtpjpegpay, udpsink) are installed",
            ),
            Self::Unsupported(_) => Some(
                "Rebuild framecast with the `gstreamer` feature, or use --sink dir --out DIR",
            ),
            Self::Config(_) => Some("Check ~/.config/framecast/config.toml or the CLI flags"),
            Self::Surface(_) => Some("Check that the frame source is still available"),
            Self::Io(_) => Some("Check file permissions and that the path exists"),
            _ => None,
        }
    }

    /// Whether the capture cycle can continue after this error
    ///
    /// Push, encode, and snapshot failures drop a single frame. Everything
    /// else stops the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.root(),
            Self::Sink(_) | Self::Encoder(_) | Self::Surface(_)
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

// Conversions from external error types

impl From<image::ImageError> for FramecastError {
    fn from(err: image::ImageError) -> Self {
        Self::Encoder(err.to_string())
    }
}

impl From<toml::de::Error> for FramecastError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("Failed to parse config file: {}", err))
    }
}

#[cfg(feature = "gstreamer")]
impl From<gstreamer::glib::Error> for FramecastError {
    fn from(err: gstreamer::glib::Error) -> Self {
        Self::Pipeline(err.to_string())
    }
}

#[cfg(feature = "gstreamer")]
impl From<gstreamer::StateChangeError> for FramecastError {
    fn from(err: gstreamer::StateChangeError) -> Self {
        Self::Pipeline(format!("State change failed: {}", err))
    }
}
