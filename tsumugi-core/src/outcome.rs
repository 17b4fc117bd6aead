//! Outcome conversion traits.

use crate::error::BoxError;

/// Trait for converting a handler's output into a dispatch outcome.
///
/// # Default Implementations
///
/// - `()` → success
/// - `Result<T, E>` → delegates to `T` or reports the error
/// - `Option<T>` → `None` is success
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `IntoOutcome`",
    label = "missing `IntoOutcome` implementation",
    note = "Handler outputs must convert into `Result<(), BoxError>`."
)]
pub trait IntoOutcome {
    /// Convert the output into success or a boxed error.
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<(), BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(e.into()),
        }
    }
}

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Result<(), BoxError> {
        match self {
            Some(t) => t.into_outcome(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_is_success() {
        assert!(().into_outcome().is_ok());
    }

    #[test]
    fn test_result_error_is_boxed() {
        let out: Result<(), std::io::Error> = Err(std::io::Error::other("send failed"));
        let err = out.into_outcome().unwrap_err();
        assert_eq!(err.to_string(), "send failed");
    }

    #[test]
    fn test_option_none_is_success() {
        let out: Option<Result<(), BoxError>> = None;
        assert!(out.into_outcome().is_ok());
    }
}
