//! Error types for the delta crate.

/// Errors that can occur while comparing two values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeltaError {
    /// A property accessor failed, or its value could not be converted.
    #[error("accessor for property {property:?} failed: {message}")]
    Accessor {
        /// Name of the failing property.
        property: String,
        /// The underlying failure.
        message: String,
    },

    /// Metadata was applied to a value of another type.
    #[error("metadata for {expected} applied to a value of a different type")]
    TypeMismatch {
        /// Type name of the metadata.
        expected: String,
    },

    /// The two sides expose different property lists.
    #[error("property shapes differ: {left} vs {right}")]
    ShapeMismatch {
        /// Shape seen on the left side.
        left: String,
        /// Shape seen on the right side.
        right: String,
    },

    /// Nested values go deeper than the configured bound.
    #[error("comparison exceeded maximum depth of {0}")]
    DepthExceeded(usize),

    /// A configuration document could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The metadata registry is unusable.
    #[error("registry error: {0}")]
    Registry(String),
}

/// Convenience alias for delta results.
pub type DeltaResult<T> = Result<T, DeltaError>;
