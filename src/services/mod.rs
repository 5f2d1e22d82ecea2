//! Use-cases behind the console tabs and the portal steps.
//!
//! Services are generic over the api traits so they can run against the real
//! [`crate::api::client::ApiClient`] or a mock. Every failure is logged here and
//! surfaces as a [`ServiceError`] whose message is what the banner shows.

use thiserror::Error;

use crate::api::ApiError;
use crate::domain::provisioning::ProvisioningError;
use crate::domain::types::TypeConstraintError;
use crate::domain::wizard::WizardError;
use crate::forms::FormError;

pub mod clients;
pub mod collections;
pub mod contracts;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod invoices;
pub mod offers;
pub mod portal;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),
    #[error("Another operation is still in progress.")]
    Busy,
    #[error("{0} not found.")]
    NotFound(&'static str),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Keeps `current` when it is still listed, otherwise falls back to the first id.
pub(crate) fn keep_or_first<T: PartialEq + Clone>(current: Option<T>, ids: &[T]) -> Option<T> {
    current
        .filter(|id| ids.contains(id))
        .or_else(|| ids.first().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_falls_back_to_first() {
        let ids = vec!["a", "b"];
        assert_eq!(keep_or_first(Some("b"), &ids), Some("b"));
        assert_eq!(keep_or_first(Some("z"), &ids), Some("a"));
        assert_eq!(keep_or_first(None, &ids), Some("a"));
        assert_eq!(keep_or_first(Some("a"), &[]), None);
    }

    #[test]
    fn banner_messages_come_from_the_source_error() {
        let err = ServiceError::from(FormError::PaymentAmount);
        assert_eq!(err.to_string(), "Payment amount must be greater than zero.");
        let err = ServiceError::from(WizardError::InvalidCin);
        assert_eq!(err.to_string(), "Enter a valid CIN.");
        assert_eq!(
            ServiceError::Busy.to_string(),
            "Another operation is still in progress."
        );
    }
}
