//! Twilio API client for WhatsApp

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use hc_core::phone::normalize_phone;
use hc_core::{Direction, RecordStore};

use crate::error::{Result, WhatsAppError};

/// Twilio API client
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    whatsapp_number: String,
    base_url: String,
}

/// Incoming WhatsApp message from a Twilio webhook
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: String,
}

/// Outgoing message payload
#[derive(Debug, Serialize)]
struct SendMessagePayload {
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "To")]
    to: String,
    #[serde(rename = "Body")]
    body: String,
}

impl TwilioClient {
    /// Create a new Twilio client
    pub fn new(account_sid: String, auth_token: String, whatsapp_number: String) -> Self {
        Self {
            client: Client::new(),
            account_sid,
            auth_token,
            whatsapp_number,
            base_url: "https://api.twilio.com".to_string(),
        }
    }

    /// Send a WhatsApp message and log it as outgoing.
    ///
    /// The recipient number is normalized first; an invalid number is a
    /// typed error, not a silent drop.
    pub async fn send_message(
        &self,
        store: &RecordStore,
        to: &str,
        body: &str,
    ) -> Result<String> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Err(WhatsAppError::CredentialsNotSet);
        }

        let number = normalize_phone(to)
            .ok_or_else(|| WhatsAppError::InvalidPhoneNumber(to.to_string()))?;

        info!("Sending WhatsApp message to {}", number);

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let payload = SendMessagePayload {
            from: self.whatsapp_number.clone(),
            to: format!("whatsapp:{}", number),
            body: body.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api(format!(
                "Failed to send message: {} - {}",
                status, text
            )));
        }

        #[derive(Deserialize)]
        struct SendMessageResponse {
            sid: String,
        }

        let result: SendMessageResponse = response.json().await?;

        store
            .log_chat(&number, body, "", Direction::Outgoing)
            .map_err(|e| WhatsAppError::Api(e.to_string()))?;

        Ok(result.sid)
    }

    /// Verify a webhook signature against the auth token
    pub fn verify_signature(&self, url: &str, params: &str, signature: &str) -> bool {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        type HmacSha256 = Hmac<Sha256>;

        let mut mac = match HmacSha256::new_from_slice(self.auth_token.as_bytes()) {
            Ok(m) => m,
            Err(_) => return false,
        };

        let data = format!("{}{}", url, params);
        mac.update(data.as_bytes());

        let expected = mac.finalize().into_bytes();
        let expected_hex = hex::encode(expected);

        expected_hex == signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> TwilioClient {
        TwilioClient::new(
            "AC123".to_string(),
            "token123".to_string(),
            "whatsapp:+14155238886".to_string(),
        )
    }

    #[test]
    fn test_client_creation() {
        let client = test_client();
        assert_eq!(client.account_sid, "AC123");
        assert_eq!(client.whatsapp_number, "whatsapp:+14155238886");
    }

    #[test]
    fn test_signature_roundtrip() {
        let client = test_client();
        let url = "https://example.com/webhook/whatsapp";
        let params = "Bodyhello From+971501234567";

        // Compute the expected signature the same way the client does
        use hmac::{Hmac, Mac};
        use sha2::Sha256;
        let mut mac = Hmac::<Sha256>::new_from_slice(b"token123").unwrap();
        mac.update(format!("{}{}", url, params).as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(client.verify_signature(url, params, &signature));
        assert!(!client.verify_signature(url, params, "deadbeef"));
    }

    #[test]
    fn test_incoming_message_field_names() {
        // Twilio sends capitalized form fields
        let msg: IncomingMessage = serde_json::from_str(
            r#"{"From": "whatsapp:+971501234567", "Body": "hello", "MessageSid": "SM123"}"#,
        )
        .unwrap();
        assert_eq!(msg.from, "whatsapp:+971501234567");
        assert_eq!(msg.body, "hello");
        assert_eq!(msg.message_sid, "SM123");
    }

    #[test]
    fn test_incoming_message_missing_body_defaults_empty() {
        let msg: IncomingMessage =
            serde_json::from_str(r#"{"From": "whatsapp:+971501234567"}"#).unwrap();
        assert!(msg.body.is_empty());
    }
}
