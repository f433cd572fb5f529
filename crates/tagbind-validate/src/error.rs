use thiserror::Error;

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Key: '{namespace}' Error:Field validation for '{field}' failed on the '{tag}' tag")]
pub struct FieldError {
    /// Dotted path from the root struct, e.g. `User.Address.City`.
    pub namespace: String,
    pub field: String,
    /// The rule that failed.
    pub tag: String,
}

/// Every field failure of one struct, rendered one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", render(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn render(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
