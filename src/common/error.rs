//! Error handling for the execution core
//!
//! User and data level failures are reported through [`KuzuError`]. Broken
//! internal invariants are not errors; they go through [`ku_assert!`] and
//! [`ku_unreachable!`] instead.
//!
//! [`ku_assert!`]: crate::ku_assert
//! [`ku_unreachable!`]: crate::ku_unreachable

use thiserror::Error;

/// Main error type for the execution core
#[derive(Error, Debug)]
pub enum KuzuError {
    #[error("Binder exception: {0}")]
    Binder(String),

    #[error("Catalog exception: {0}")]
    Catalog(String),

    #[error("Conversion exception: {0}")]
    Conversion(String),

    #[error("Overflow exception: {0}")]
    Overflow(String),

    #[error("Runtime exception: {0}")]
    Runtime(String),

    #[error("Internal exception: {0}")]
    Internal(String),

    #[error("Buffer manager exception: {0}")]
    BufferManager(String),

    #[error("Transaction manager exception: {0}")]
    Transaction(String),

    #[error("Serialization exception: {0}")]
    Serialization(String),

    #[error("Interrupted.")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, KuzuError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_err {
    ($msg:expr) => {
        $crate::common::error::KuzuError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::KuzuError::Internal(format!($fmt, $($arg)*))
    };
}

/// Macro for creating runtime errors
#[macro_export]
macro_rules! runtime_err {
    ($msg:expr) => {
        $crate::common::error::KuzuError::Runtime($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::KuzuError::Runtime(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = KuzuError::Overflow("Value 9 is not within INT8 range".to_string());
        assert_eq!(
            err.to_string(),
            "Overflow exception: Value 9 is not within INT8 range"
        );

        let err = internal_err!("bad state {}", 3);
        assert!(matches!(err, KuzuError::Internal(ref msg) if msg == "bad state 3"));

        let err = runtime_err!("boom");
        assert_eq!(err.to_string(), "Runtime exception: boom");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: KuzuError = io.into();
        assert!(matches!(err, KuzuError::Io(_)));
    }
}
