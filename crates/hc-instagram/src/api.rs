//! Meta Graph API client for Instagram messaging

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{InstagramError, Result};

/// Graph API base URL
const GRAPH_API_URL: &str = "https://graph.facebook.com/v17.0";

/// Instagram Graph API client
#[derive(Clone)]
pub struct InstagramApi {
    client: Client,
    access_token: String,
    page_id: String,
    verify_token: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest {
    pub recipient: Recipient,
    pub message: MessagePayload,
    pub messaging_type: String,
}

#[derive(Debug, Serialize)]
pub struct Recipient {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct MessagePayload {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageResponse {
    pub recipient_id: Option<String>,
    pub message_id: Option<String>,
}

/// Webhook payload as POSTed by Meta
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: WebhookSender,
    pub message: Option<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookSender {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub text: Option<String>,
}

impl WebhookPayload {
    /// Flatten the nested entry/messaging structure into (sender, text)
    /// pairs, skipping events without message text.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.entry
            .iter()
            .flat_map(|entry| &entry.messaging)
            .filter_map(|event| {
                let text = event.message.as_ref()?.text.clone()?;
                if text.is_empty() {
                    return None;
                }
                Some((event.sender.id.clone(), text))
            })
            .collect()
    }
}

impl InstagramApi {
    /// Create a new Instagram API client
    pub fn new(access_token: String, page_id: String, verify_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            page_id,
            verify_token,
            base_url: GRAPH_API_URL.to_string(),
        }
    }

    /// Send a Direct Message reply to a user
    pub async fn send_message(&self, recipient_id: &str, text: &str) -> Result<SendMessageResponse> {
        info!("Sending Instagram message to {}", recipient_id);

        let url = format!("{}/{}/messages", self.base_url, self.page_id);

        let request_body = SendMessageRequest {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            message: MessagePayload {
                text: text.to_string(),
            },
            messaging_type: "RESPONSE".to_string(),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("access_token", &self.access_token)])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!("Graph API response: {} - {}", status, body);

        if !status.is_success() {
            error!("Graph API error: {} - {}", status, body);
            return Err(InstagramError::GraphApi(format!(
                "Status: {}, Body: {}",
                status, body
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Check a webhook verification request and return the challenge to
    /// echo back.
    pub fn verify_webhook(&self, mode: &str, token: &str, challenge: &str) -> Result<String> {
        if mode == "subscribe" && !self.verify_token.is_empty() && token == self.verify_token {
            Ok(challenge.to_string())
        } else {
            Err(InstagramError::WebhookVerificationFailed)
        }
    }

    /// The configured page ID
    pub fn page_id(&self) -> &str {
        &self.page_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_api() -> InstagramApi {
        InstagramApi::new(
            "token".to_string(),
            "page123".to_string(),
            "secret".to_string(),
        )
    }

    #[test]
    fn test_verify_webhook_echoes_challenge_on_match() {
        let api = test_api();
        let challenge = api.verify_webhook("subscribe", "secret", "12345").unwrap();
        assert_eq!(challenge, "12345");
    }

    #[test]
    fn test_verify_webhook_rejects_bad_token_or_mode() {
        let api = test_api();
        assert!(api.verify_webhook("subscribe", "wrong", "12345").is_err());
        assert!(api.verify_webhook("unsubscribe", "secret", "12345").is_err());
    }

    #[test]
    fn test_verify_webhook_rejects_when_unconfigured() {
        let api = InstagramApi::new("token".to_string(), "page123".to_string(), String::new());
        assert!(api.verify_webhook("subscribe", "", "12345").is_err());
    }

    #[test]
    fn test_webhook_payload_flattening() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{
                "object": "instagram",
                "entry": [
                    {"messaging": [
                        {"sender": {"id": "user1"}, "message": {"text": "hello"}},
                        {"sender": {"id": "user2"}, "message": {}},
                        {"sender": {"id": "user3"}}
                    ]},
                    {"messaging": [
                        {"sender": {"id": "user4"}, "message": {"text": "book"}}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let messages = payload.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ("user1".to_string(), "hello".to_string()));
        assert_eq!(messages[1], ("user4".to_string(), "book".to_string()));
    }

    #[test]
    fn test_send_request_serialization() {
        let request = SendMessageRequest {
            recipient: Recipient {
                id: "user1".to_string(),
            },
            message: MessagePayload {
                text: "hi".to_string(),
            },
            messaging_type: "RESPONSE".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""recipient":{"id":"user1"}"#));
        assert!(json.contains(r#""messaging_type":"RESPONSE""#));
    }
}
