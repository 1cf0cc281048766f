//! Centralized error handling module
//!
//! Every fallible operation in the engine returns `AppResult`, so callers
//! can match on the taxonomy instead of parsing messages.

pub mod context;
pub mod types;

pub use context::ErrorContextExt;
pub use types::{AppError, AppResult, UnknownToken};

/// Convert from anyhow::Error to AppError so handlers written with anyhow
/// can still return through the engine
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Other {
            message: err.to_string(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_conversion() {
        let anyhow_err = anyhow::anyhow!("test error");
        let app_err: AppError = anyhow_err.into();

        match app_err {
            AppError::Other { message, .. } => {
                assert_eq!(message, "test error");
            }
            _ => panic!("Expected AppError::Other, got {:?}", app_err),
        }
    }
}
