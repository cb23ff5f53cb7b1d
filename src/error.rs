//! Error handling for the strand engine
//!
//! Every fallible operation returns [`Result`]. Allocation failure is a regular
//! error value (never an abort), and the flat entry points that cannot return a
//! `Result` map it onto [`ALLOCATION_FAILURE`](crate::memory::ALLOCATION_FAILURE).

use thiserror::Error;

/// Main error type for the strand engine
#[derive(Error, Debug)]
pub enum StrandError {
    /// I/O related errors (configuration files only, the engine itself does no I/O)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller violated an input contract
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message describing the violated contract
        message: String,
    },

    /// Index out of bounds access
    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The invalid index
        index: usize,
        /// The valid size/length
        size: usize,
    },

    /// The allocator returned no memory
    #[error("Memory allocation failed: requested {size} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        size: usize,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// Configuration (de)serialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message from the serializer
        message: String,
    },
}

impl StrandError {
    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::OutOfBounds { index, size }
    }

    /// Create an out of memory error
    pub fn out_of_memory(size: usize) -> Self {
        Self::OutOfMemory { size }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization { message: message.into() }
    }

    /// Check if this is a recoverable error
    ///
    /// Allocation failures are recoverable: retrying with a larger arena or the
    /// system allocator is a valid caller policy.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::OutOfMemory { .. } => true,
            Self::InvalidInput { .. } => false,
            Self::OutOfBounds { .. } => false,
            Self::Configuration { .. } => false,
            Self::Serialization { .. } => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidInput { .. } => "input",
            Self::OutOfBounds { .. } => "bounds",
            Self::OutOfMemory { .. } => "memory",
            Self::Configuration { .. } => "config",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for StrandError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, StrandError>;

/// Assert that an index is within bounds
#[inline]
pub fn check_bounds(index: usize, size: usize) -> Result<()> {
    if index >= size {
        Err(StrandError::out_of_bounds(index, size))
    } else {
        Ok(())
    }
}

/// Assert that a range is within bounds
#[inline]
pub fn check_range(start: usize, end: usize, size: usize) -> Result<()> {
    if start > end {
        return Err(StrandError::invalid_input(format!(
            "Invalid range: start {} > end {}",
            start, end
        )));
    }
    if end > size {
        return Err(StrandError::out_of_bounds(end, size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StrandError::invalid_input("empty needle");
        assert_eq!(err.category(), "input");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_bounds_checking() {
        assert!(check_bounds(5, 10).is_ok());
        assert!(check_bounds(10, 10).is_err());
        assert!(check_bounds(0, 0).is_err());
    }

    #[test]
    fn test_range_checking() {
        assert!(check_range(2, 8, 10).is_ok());
        assert!(check_range(5, 5, 5).is_ok());
        assert!(check_range(8, 2, 10).is_err());
        assert!(check_range(2, 15, 10).is_err());
    }

    #[test]
    fn test_memory_errors_are_recoverable() {
        let err = StrandError::out_of_memory(4096);
        assert_eq!(err.category(), "memory");
        assert!(err.is_recoverable());
        assert!(format!("{}", err).contains("4096"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing config");
        let err: StrandError = io_error.into();
        assert_eq!(err.category(), "io");
        assert!(format!("{}", err).contains("I/O error"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: StrandError = json_err.into();
        assert_eq!(err.category(), "serialization");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let bounds_err = StrandError::out_of_bounds(10, 5);
        let display = format!("{}", bounds_err);
        assert!(display.contains("Out of bounds"));
        assert!(display.contains("10"));
        assert!(display.contains("5"));
    }

    #[test]
    fn test_categories_are_distinct() {
        let errors = [
            StrandError::invalid_input("bad window"),
            StrandError::out_of_bounds(1, 0),
            StrandError::out_of_memory(64),
            StrandError::configuration("bad capacity"),
            StrandError::serialization("bad json"),
            std::io::Error::other("closed").into(),
        ];
        let mut categories: Vec<&str> = errors.iter().map(|e| e.category()).collect();
        categories.sort_unstable();
        categories.dedup();
        assert_eq!(categories.len(), errors.len());
    }
}
