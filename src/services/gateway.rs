//! Payment gateway abstraction and the built-in stub gateway

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Order opened with the gateway before the visitor pays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub order_id: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Short gateway name stored on payments
    fn name(&self) -> &'static str;

    /// Open a checkout order for `amount`
    async fn create_order(&self, amount: Decimal, currency: &str, booking_id: Uuid) -> AppResult<GatewayOrder>;

    /// Confirm that `transaction_id` settles `order_id`
    async fn verify_payment(&self, order_id: &str, transaction_id: &str) -> AppResult<bool>;

    /// Refund part of a settled transaction; returns the gateway refund id.
    /// Repeating a call with the same `reference` must not refund twice.
    async fn refund(&self, transaction_id: &str, amount: Decimal, reference: &str) -> AppResult<String>;
}

/// Gateway that approves every well-formed request without contacting anyone
#[derive(Debug, Default, Clone)]
pub struct StubGateway;

#[async_trait]
impl PaymentGateway for StubGateway {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn create_order(&self, amount: Decimal, currency: &str, booking_id: Uuid) -> AppResult<GatewayOrder> {
        if amount <= Decimal::ZERO {
            return Err(AppError::PaymentGateway("Order amount must be positive".to_string()));
        }
        let nonce: u64 = rand::thread_rng().gen();
        tracing::debug!(%booking_id, %amount, currency, "Stub gateway order created");
        Ok(GatewayOrder {
            order_id: format!("order_{:016x}", nonce),
        })
    }

    async fn verify_payment(&self, order_id: &str, transaction_id: &str) -> AppResult<bool> {
        Ok(!order_id.is_empty() && !transaction_id.trim().is_empty())
    }

    async fn refund(&self, transaction_id: &str, amount: Decimal, reference: &str) -> AppResult<String> {
        if amount <= Decimal::ZERO {
            return Err(AppError::PaymentGateway("Refund amount must be positive".to_string()));
        }
        tracing::debug!(transaction_id, %amount, reference, "Stub gateway refund issued");
        Ok(format!("rfnd_{}", reference.replace('-', "")))
    }
}

/// Build the gateway named in configuration
pub fn from_name(name: &str) -> AppResult<std::sync::Arc<dyn PaymentGateway>> {
    match name {
        "stub" => Ok(std::sync::Arc::new(StubGateway)),
        other => Err(AppError::Internal(format!("Unknown payment gateway: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_order_ids_are_distinct() {
        let gateway = StubGateway;
        let booking = Uuid::new_v4();
        let a = tokio_test::block_on(gateway.create_order(Decimal::new(100, 0), "INR", booking)).unwrap();
        let b = tokio_test::block_on(gateway.create_order(Decimal::new(100, 0), "INR", booking)).unwrap();
        assert!(a.order_id.starts_with("order_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_stub_rejects_zero_amount() {
        let result = tokio_test::block_on(StubGateway.create_order(Decimal::ZERO, "INR", Uuid::new_v4()));
        assert!(matches!(result, Err(AppError::PaymentGateway(_))));
    }

    #[test]
    fn test_stub_verify_requires_transaction() {
        assert!(tokio_test::block_on(StubGateway.verify_payment("order_1", "txn_1")).unwrap());
        assert!(!tokio_test::block_on(StubGateway.verify_payment("order_1", "  ")).unwrap());
    }

    #[test]
    fn test_stub_refund_id_follows_reference() {
        let first = tokio_test::block_on(StubGateway.refund("txn_1", Decimal::new(500, 2), "pass-1")).unwrap();
        let again = tokio_test::block_on(StubGateway.refund("txn_1", Decimal::new(500, 2), "pass-1")).unwrap();
        assert_eq!(first, "rfnd_pass1");
        assert_eq!(first, again);
        assert!(tokio_test::block_on(StubGateway.refund("txn_1", Decimal::ZERO, "pass-1")).is_err());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(from_name("stub").unwrap().name(), "stub");
        assert!(from_name("acme").is_err());
    }
}
