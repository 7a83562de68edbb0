//! Payment-link issuer
//!
//! Looks a service up in the catalog, opens a checkout session for its
//! price and records the attempt. Verification and refunds are manual
//! dashboard actions and are not part of this flow.

use std::sync::Arc;
use tracing::info;

use hc_core::config::StripeConfig;
use hc_core::{RecordStore, ServiceCatalog};

use crate::error::{PaymentError, Result};
use crate::stripe::{CheckoutRequest, StripeClient};

/// Service used when the sender asks to pay without naming one
const DEFAULT_SERVICE: &str = "Basic Health Check Up";

/// Issues hosted checkout links for catalog services
pub struct PaymentLinkIssuer {
    stripe: StripeClient,
    config: StripeConfig,
    catalog: Arc<ServiceCatalog>,
    store: Arc<RecordStore>,
}

impl PaymentLinkIssuer {
    pub fn new(
        config: StripeConfig,
        catalog: Arc<ServiceCatalog>,
        store: Arc<RecordStore>,
    ) -> Self {
        Self {
            stripe: StripeClient::new(config.secret_key.clone()),
            config,
            catalog,
            store,
        }
    }

    /// Create a checkout link for `service_name` (or the default service)
    /// and persist the payment attempt.
    ///
    /// An unknown service fails before anything is stored or sent to
    /// Stripe.
    pub async fn create_link(
        &self,
        phone_number: &str,
        service_name: Option<&str>,
    ) -> Result<String> {
        let name = service_name.unwrap_or(DEFAULT_SERVICE);

        let record = self
            .catalog
            .find_exact(name)
            .ok_or_else(|| PaymentError::ServiceNotFound(name.to_string()))?;

        let request = CheckoutRequest {
            service_name: record.name.clone(),
            // Stripe takes the minor currency unit
            unit_amount: (record.price * 100.0).round() as i64,
            currency: self.config.currency.clone(),
            phone_number: phone_number.to_string(),
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
        };

        let session = self.stripe.create_checkout_session(&request).await?;

        self.store
            .save_payment(phone_number, &record.name, record.price, &session.id)?;

        info!(
            "Payment link issued for {} ({}): session {}",
            record.name, phone_number, session.id
        );

        Ok(session.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> Arc<ServiceCatalog> {
        Arc::new(
            ServiceCatalog::from_json(
                r#"{
                    "wellness_packages": [
                        {"name": "Basic Health Check Up", "price": 399.0}
                    ]
                }"#,
            )
            .unwrap(),
        )
    }

    fn test_issuer(catalog: Arc<ServiceCatalog>) -> (tempfile::TempDir, Arc<RecordStore>, PaymentLinkIssuer) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordStore::new(dir.path().join("test.db")).unwrap());
        let issuer = PaymentLinkIssuer::new(
            StripeConfig::default(),
            catalog,
            Arc::clone(&store),
        );
        (dir, store, issuer)
    }

    #[tokio::test]
    async fn test_unknown_service_fails_without_a_payment_record() {
        let (_dir, store, issuer) = test_issuer(test_catalog());

        let err = issuer
            .create_link("+971501234567", Some("Unknown Service"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::ServiceNotFound(_)));
        assert!(store.payments(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_service_missing_from_catalog() {
        let (_dir, store, issuer) = test_issuer(Arc::new(ServiceCatalog::empty()));

        let err = issuer.create_link("+971501234567", None).await.unwrap_err();

        assert!(matches!(err, PaymentError::ServiceNotFound(_)));
        assert!(store.payments(None).unwrap().is_empty());
    }
}
