//! Stripe Checkout API client

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::error::{PaymentError, Result};

const STRIPE_API_URL: &str = "https://api.stripe.com";

/// Stripe API client
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

/// A created checkout session
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Everything needed to open a hosted checkout page for one service
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub service_name: String,
    /// Amount in the currency's minor unit (fils for AED)
    pub unit_amount: i64,
    pub currency: String,
    pub phone_number: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            base_url: STRIPE_API_URL.to_string(),
        }
    }

    /// Create a hosted checkout session for a single card payment
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession> {
        info!(
            "Creating checkout session for {} ({})",
            request.service_name, request.phone_number
        );

        let url = format!("{}/v1/checkout/sessions", self.base_url);

        let unit_amount = request.unit_amount.to_string();
        let params: Vec<(&str, &str)> = vec![
            ("payment_method_types[0]", "card"),
            ("line_items[0][price_data][currency]", &request.currency),
            ("line_items[0][price_data][unit_amount]", &unit_amount),
            (
                "line_items[0][price_data][product_data][name]",
                &request.service_name,
            ),
            ("line_items[0][quantity]", "1"),
            ("mode", "payment"),
            ("success_url", &request.success_url),
            ("cancel_url", &request.cancel_url),
            ("metadata[phone_number]", &request.phone_number),
            ("metadata[service]", &request.service_name),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api(format!(
                "Failed to create checkout session: {} - {}",
                status, text
            )));
        }

        let session: CheckoutSession = response.json().await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StripeClient::new("sk_test_123".to_string());
        assert_eq!(client.base_url, STRIPE_API_URL);
    }

    #[test]
    fn test_checkout_session_deserialization() {
        let json = r#"{
            "id": "cs_test_abc",
            "url": "https://checkout.stripe.com/pay/cs_test_abc",
            "object": "checkout.session"
        }"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "cs_test_abc");
        assert!(session.url.starts_with("https://checkout.stripe.com/"));
    }
}
