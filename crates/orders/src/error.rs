use thiserror::Error;

use shopfront_core::{DomainError, StoreError};

use crate::OrderStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("invalid items: {0}")]
    InvalidItems(String),

    #[error("missing address: {0}")]
    MissingAddress(String),

    #[error("payment method is required")]
    MissingPaymentMethod,

    #[error("payment failed: {0}")]
    PaymentFailed(String),

    #[error("order not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("invalid tracking: {0}")]
    InvalidTracking(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for OrderError {
    fn from(value: StoreError) -> Self {
        OrderError::Store(value)
    }
}

impl From<DomainError> for OrderError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => OrderError::NotFound,
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => OrderError::InvalidItems(msg),
        }
    }
}
