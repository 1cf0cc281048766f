//! Error context enhancement utilities
//!
//! Lets handler code turn foreign errors into `AppError` values with a
//! short description of what was being attempted.

use super::types::AppError;

/// Extension trait for adding context to error types
pub trait ErrorContextExt<T> {
    /// Add operation context to the error
    fn with_context(self, operation: impl Into<String>) -> Result<T, AppError>;

    /// Add operation context with a closure (lazy evaluation)
    fn with_context_lazy<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContextExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context(self, operation: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| {
            let operation = operation.into();
            AppError::Other {
                message: format!("{}: {}", operation, e),
                source: Some(Box::new(e)),
            }
        })
    }

    fn with_context_lazy<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let operation = f();
            AppError::Other {
                message: format!("{}: {}", operation, e),
                source: Some(Box::new(e)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_prefixes_message() {
        let result: Result<u32, std::num::ParseIntError> = "abc".parse::<u32>();
        let err = result.with_context("parsing port").unwrap_err();
        assert!(err.to_string().starts_with("parsing port: "));
    }

    #[test]
    fn test_with_context_lazy_is_not_called_on_success() {
        let result: Result<u32, std::num::ParseIntError> = "42".parse::<u32>();
        let value = result
            .with_context_lazy(|| panic!("should not be evaluated"))
            .unwrap();
        assert_eq!(value, 42);
    }
}
