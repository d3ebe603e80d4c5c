//! Payment capture port and the simulated gateway used by the storefront.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Payment method that never goes through the gateway.
pub const CASH_ON_DELIVERY: &str = "cash_on_delivery";

/// True for the pay-on-delivery method (either spelling).
pub fn is_cash_on_delivery(method: &str) -> bool {
    let method = method.trim();
    method.eq_ignore_ascii_case(CASH_ON_DELIVERY) || method.eq_ignore_ascii_case("cod")
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The request itself was unusable (missing card fields, zero amount).
    #[error("{0}")]
    Invalid(String),

    /// The gateway did not recognise the reference or amount.
    #[error("payment declined: {0}")]
    Declined(String),

    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Method-specific details supplied by the checkout client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentDetails {
    pub card_number: Option<String>,
    pub card_holder: Option<String>,
    pub expiry_date: Option<String>,
    pub cvv: Option<String>,
    pub upi_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub method: String,
    /// Amount in cents.
    pub amount: u64,
    pub details: PaymentDetails,
}

/// Non-sensitive echo of what was charged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
    pub id: String,
    pub method: String,
    pub amount: u64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CaptureSummary>,
}

/// External payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge `request.amount` and return the capture reference.
    async fn capture(&self, request: CaptureRequest) -> Result<Capture, PaymentError>;

    /// Confirm that `reference` is an unused capture of exactly `amount`.
    ///
    /// A confirmed reference is consumed and cannot back a second order.
    async fn confirm(&self, reference: &str, amount: u64) -> Result<(), PaymentError>;

    /// Return a confirmed reference to the unused state so it can back a
    /// later attempt. Called when the order could not be stored.
    async fn release(&self, reference: &str) -> Result<(), PaymentError>;
}

#[derive(Debug, Clone)]
struct CaptureRecord {
    amount: u64,
    consumed: bool,
}

/// In-process gateway that approves every well-formed capture.
#[derive(Debug, Default)]
pub struct SimulatedPaymentGateway {
    captures: Mutex<HashMap<String, CaptureRecord>>,
}

impl SimulatedPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn summarize(method: &str, details: &PaymentDetails) -> Result<Option<CaptureSummary>, PaymentError> {
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }

        match method {
            "credit_card" | "debit_card" => {
                let (Some(number), Some(holder), Some(_), Some(_)) = (
                    present(&details.card_number),
                    present(&details.card_holder),
                    present(&details.expiry_date),
                    present(&details.cvv),
                ) else {
                    return Err(PaymentError::Invalid("Missing card details".to_string()));
                };
                let digits: Vec<char> = number.chars().filter(|c| !c.is_whitespace()).collect();
                let last4: String = digits[digits.len().saturating_sub(4)..].iter().collect();
                Ok(Some(CaptureSummary {
                    last4: Some(last4),
                    card_holder: Some(holder.to_string()),
                    upi_id: None,
                }))
            }
            "upi" => {
                let upi_id = present(&details.upi_id)
                    .ok_or_else(|| PaymentError::Invalid("Missing UPI ID".to_string()))?;
                Ok(Some(CaptureSummary {
                    upi_id: Some(upi_id.to_string()),
                    ..CaptureSummary::default()
                }))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    #[instrument(skip(self, request), fields(method = %request.method, amount = request.amount))]
    async fn capture(&self, request: CaptureRequest) -> Result<Capture, PaymentError> {
        let method = request.method.trim().to_string();
        if method.is_empty() || request.amount == 0 {
            return Err(PaymentError::Invalid("Missing required fields".to_string()));
        }

        let details = Self::summarize(&method, &request.details)?;
        let simple = Uuid::now_v7().simple().to_string();
        let id = format!("PP-{}", &simple[simple.len() - 13..]);

        self.captures
            .lock()
            .map_err(|_| PaymentError::Unavailable("capture ledger lock poisoned".to_string()))?
            .insert(
                id.clone(),
                CaptureRecord {
                    amount: request.amount,
                    consumed: false,
                },
            );
        debug!(payment_id = %id, "payment captured");

        Ok(Capture {
            id,
            method,
            amount: request.amount,
            status: "completed".to_string(),
            details,
        })
    }

    async fn confirm(&self, reference: &str, amount: u64) -> Result<(), PaymentError> {
        let mut captures = self
            .captures
            .lock()
            .map_err(|_| PaymentError::Unavailable("capture ledger lock poisoned".to_string()))?;

        let record = captures
            .get_mut(reference.trim())
            .ok_or_else(|| PaymentError::Declined("unknown payment reference".to_string()))?;
        if record.consumed {
            return Err(PaymentError::Declined("payment reference already used".to_string()));
        }
        if record.amount != amount {
            return Err(PaymentError::Declined(format!(
                "captured {} but order total is {}",
                record.amount, amount
            )));
        }
        record.consumed = true;
        Ok(())
    }

    async fn release(&self, reference: &str) -> Result<(), PaymentError> {
        let mut captures = self
            .captures
            .lock()
            .map_err(|_| PaymentError::Unavailable("capture ledger lock poisoned".to_string()))?;

        let record = captures
            .get_mut(reference.trim())
            .ok_or_else(|| PaymentError::Declined("unknown payment reference".to_string()))?;
        record.consumed = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> PaymentDetails {
        PaymentDetails {
            card_number: Some("4111 1111 1111 1234".into()),
            card_holder: Some("Alice".into()),
            expiry_date: Some("12/30".into()),
            cvv: Some("123".into()),
            upi_id: None,
        }
    }

    #[tokio::test]
    async fn card_capture_masks_number_and_confirms_once() {
        let gateway = SimulatedPaymentGateway::new();
        let capture = gateway
            .capture(CaptureRequest {
                method: "credit_card".into(),
                amount: 5998,
                details: card(),
            })
            .await
            .unwrap();

        assert!(capture.id.starts_with("PP-"));
        assert_eq!(capture.details.as_ref().unwrap().last4.as_deref(), Some("1234"));

        assert!(matches!(gateway.confirm(&capture.id, 100).await, Err(PaymentError::Declined(_))));
        gateway.confirm(&capture.id, 5998).await.unwrap();
        assert!(matches!(gateway.confirm(&capture.id, 5998).await, Err(PaymentError::Declined(_))));
    }

    #[tokio::test]
    async fn missing_method_details_are_invalid() {
        let gateway = SimulatedPaymentGateway::new();
        let no_cvv = PaymentDetails { cvv: None, ..card() };
        let err = gateway
            .capture(CaptureRequest {
                method: "debit_card".into(),
                amount: 100,
                details: no_cvv,
            })
            .await
            .unwrap_err();
        assert_eq!(err, PaymentError::Invalid("Missing card details".into()));

        let err = gateway
            .capture(CaptureRequest {
                method: "upi".into(),
                amount: 100,
                details: PaymentDetails::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, PaymentError::Invalid("Missing UPI ID".into()));
    }

    #[tokio::test]
    async fn released_reference_can_be_confirmed_again() {
        let gateway = SimulatedPaymentGateway::new();
        let capture = gateway
            .capture(CaptureRequest {
                method: "paypal".into(),
                amount: 700,
                details: PaymentDetails::default(),
            })
            .await
            .unwrap();

        gateway.confirm(&capture.id, 700).await.unwrap();
        gateway.release(&capture.id).await.unwrap();
        gateway.confirm(&capture.id, 700).await.unwrap();
        assert!(matches!(gateway.release("PP-nope").await, Err(PaymentError::Declined(_))));
    }

    #[tokio::test]
    async fn unknown_reference_is_declined() {
        let gateway = SimulatedPaymentGateway::new();
        assert!(matches!(gateway.confirm("PP-nope", 1).await, Err(PaymentError::Declined(_))));
    }

    #[test]
    fn cod_spellings() {
        assert!(is_cash_on_delivery("cash_on_delivery"));
        assert!(is_cash_on_delivery(" COD "));
        assert!(!is_cash_on_delivery("paypal"));
    }
}
