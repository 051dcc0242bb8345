use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{ItemKey, PaymentPlan};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeeError {
    #[error("fee structure not configured: {message}")]
    Configuration {
        message: String,
    },

    #[error("payment plan {plan} cannot produce a schedule")]
    InvalidPlan {
        plan: PaymentPlan,
    },

    #[error("inconsistent state on {item}: paid {paid} exceeds payable {payable}")]
    InconsistentState {
        item: ItemKey,
        payable: Money,
        paid: Money,
    },

    #[error("calculation error: {message}")]
    Calculation {
        message: String,
    },

    #[error("invalid schedule key: {key}")]
    InvalidOverrideKey {
        key: String,
    },

    #[error("invalid schedule override: {message}")]
    InvalidOverride {
        message: String,
    },

    #[error("scholarship not found: {id}")]
    ScholarshipNotFound {
        id: Uuid,
    },

    #[error("repository error: {message}")]
    Repository {
        message: String,
    },
}

impl FeeError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        FeeError::Configuration { message: message.into() }
    }

    pub(crate) fn calculation(message: impl Into<String>) -> Self {
        FeeError::Calculation { message: message.into() }
    }

    pub(crate) fn invalid_override(message: impl Into<String>) -> Self {
        FeeError::InvalidOverride { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, FeeError>;
