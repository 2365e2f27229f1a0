//! Domain error types.

use thiserror::Error;
use validator::ValidationErrors;

use crate::store::StoreError;

/// Errors returned by domain services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// A storage failure, tagged with the step that was running.
    #[error("Storage failure during {stage}: {source}")]
    Storage {
        stage: &'static str,
        #[source]
        source: StoreError,
    },
}

impl DomainError {
    /// Returns a mapper that tags a store error with the given stage.
    pub fn storage(stage: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| DomainError::Storage { stage, source }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        DomainError::Validation(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(range(min = 1, message = "count must be positive"))]
        count: i32,
    }

    #[test]
    fn test_validation_errors_convert_with_messages() {
        let err: DomainError = Probe { count: 0 }.validate().unwrap_err().into();
        match err {
            DomainError::Validation(msg) => assert_eq!(msg, "count must be positive"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_storage_mapper_keeps_stage() {
        let err = DomainError::storage("persist_location")(StoreError::Backend("down".into()));
        assert!(matches!(
            err,
            DomainError::Storage {
                stage: "persist_location",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "Storage failure during persist_location: Storage backend error: down"
        );
    }
}
