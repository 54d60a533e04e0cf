//! Failure taxonomy for the classification pipeline.
//!
//! Every failure is caught where it happens and downgraded to a negative
//! result. The error value is kept so callers can count and log it.

use thiserror::Error;

/// Boxed error source carried by [`SieveError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Kind of pipeline failure, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The image could not be read or decoded.
    Decode,
    /// The model invocation failed or produced an unusable score.
    Inference,
    /// Copying an image to the destination failed.
    Export,
    /// Enumerating or querying the photo library failed.
    Query,
}

/// A failure inside the pipeline.
#[derive(Debug, Error)]
pub enum SieveError {
    /// Unreadable image.
    #[error("failed to decode {image}")]
    Decode {
        /// Locator of the image.
        image: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
    /// Model invocation error.
    #[error("inference failed for {image}")]
    Inference {
        /// Locator of the image.
        image: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
    /// Copy error.
    #[error("failed to export {image}")]
    Export {
        /// Locator of the image.
        image: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
    /// Library enumeration error.
    #[error("photo library query failed")]
    Query {
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
}

impl SieveError {
    /// Creates a decode failure for the given image.
    pub fn decode(image: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            image: image.into(),
            source: source.into(),
        }
    }

    /// Creates an inference failure for the given image.
    pub fn inference(image: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Inference {
            image: image.into(),
            source: source.into(),
        }
    }

    /// Creates an export failure for the given image.
    pub fn export(image: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Export {
            image: image.into(),
            source: source.into(),
        }
    }

    /// Creates a query failure.
    pub fn query(source: impl Into<BoxError>) -> Self {
        Self::Query {
            source: source.into(),
        }
    }

    /// Causes of this failure joined with `": "`, outermost first.
    #[must_use]
    pub fn causes(&self) -> String {
        let mut parts = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            parts.push(cause.to_string());
            source = cause.source();
        }
        parts.join(": ")
    }

    /// Returns the kind of this failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Decode { .. } => FailureKind::Decode,
            Self::Inference { .. } => FailureKind::Inference,
            Self::Export { .. } => FailureKind::Export,
            Self::Query { .. } => FailureKind::Query,
        }
    }
}
