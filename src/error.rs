//! Error types
//!
//! Only failures that happen while *constructing* a check are errors here.
//! Failures inside a property become falsifications (see
//! [`Failure`](crate::property::Failure)); malformed generator construction
//! panics.

/// Result type for resolution operations
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Why a generator could not be synthesised for a type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error("no generator factory registered for base type `{0}`")]
    NoFactory(String),

    #[error("factory for `{base}` takes {expected} type arguments, found {found}")]
    Arity {
        base: String,
        expected: usize,
        found: usize,
    },

    #[error("cannot instantiate type parameter `{0}`: no non-generic factories registered")]
    NoCandidates(String),

    #[error("in `{operation}`, parameter {index}: {source}")]
    Operation {
        operation: String,
        index: usize,
        #[source]
        source: Box<ResolutionError>,
    },
}

/// Why a reflective invocation could not run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvokeError {
    #[error("expected a value of type {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("expected {expected} arguments, found {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("value of type {0} is not callable")]
    NotCallable(String),

    #[error("{0}")]
    Custom(String),
}
