//! Error types for binding.

use tagbind_map::MapError;
use tagbind_validate::ValidationErrors;
use thiserror::Error;

/// Errors returned by a binding.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindError {
    /// Mapping or coercion failed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// The bound value was rejected by the validator.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// One or more elements of a batch destination failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// The request carries nothing the binding can read.
    #[error("invalid request")]
    InvalidRequest,
}

/// Per-element failures of a batch destination, indexed by element position.
///
/// Renders as one `[i]: message` line per failed element; successful
/// elements are skipped.
#[derive(Debug, Default, Error)]
#[error("{}", render(.0))]
pub struct AggregateError(pub Vec<Option<BindError>>);

impl AggregateError {
    /// `Ok(())` when no element failed.
    pub fn into_result(self) -> Result<(), BindError> {
        if self.0.iter().all(Option::is_none) {
            Ok(())
        } else {
            Err(BindError::Aggregate(self))
        }
    }

    /// Failed elements with their original index.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &BindError)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(idx, err)| err.as_ref().map(|err| (idx, err)))
    }
}

fn render(errors: &[Option<BindError>]) -> String {
    errors
        .iter()
        .enumerate()
        .filter_map(|(idx, err)| err.as_ref().map(|err| format!("[{idx}]: {err}")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_none_collapses_to_ok() {
        assert!(AggregateError(vec![None, None]).into_result().is_ok());
        assert!(AggregateError::default().into_result().is_ok());
    }

    #[test]
    fn renders_original_indices() {
        let err = AggregateError(vec![
            None,
            Some(BindError::InvalidRequest),
            None,
            Some(BindError::Map(MapError::UnknownType)),
        ]);
        assert_eq!(err.to_string(), "[1]: invalid request\n[3]: unknown type");
        assert_eq!(err.failures().map(|(idx, _)| idx).collect::<Vec<_>>(), vec![1, 3]);
    }
}
