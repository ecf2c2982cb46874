pub mod budget_service;
pub mod onboarding_service;
pub mod savings_service;

pub use budget_service::{BudgetService, SettingsUpdate};
pub use onboarding_service::OnboardingService;
pub use savings_service::SavingsService;

use serde::Serialize;

use crate::errors::FinanceError;
use crate::store::DocPatch;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Finance(#[from] FinanceError),
    #[error("{0}")]
    Invalid(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Finance(FinanceError::Serde(err))
    }
}

/// Single-field merge-patch.
pub(crate) fn field_patch<V: Serialize>(key: &str, value: &V) -> ServiceResult<DocPatch> {
    let mut patch = DocPatch::new();
    patch.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(patch)
}
