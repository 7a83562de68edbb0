//! HTTP handlers for the auxiliary endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use hc_core::{AppointmentRecord, AppointmentStatus, Origin};

use crate::routes::ApiState;

/// Sender id used for the debug console
const DEBUG_SENDER: &str = "debug-console";

/// Queries exercised by the debug endpoint
const DEBUG_QUERIES: [&str; 5] = [
    "hello",
    "blood test",
    "vitamin d",
    "wellness package",
    "book an appointment",
];

/// One canned query and its reply
#[derive(Debug, Serialize)]
pub struct DebugExchange {
    pub query: String,
    pub response: String,
}

/// Appointment listing filters
#[derive(Debug, Deserialize)]
pub struct AppointmentsQuery {
    pub phone: Option<String>,
    pub status: Option<String>,
}

/// Generic API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Run the canned queries through the responder pipeline
pub async fn debug_chat(State(state): State<Arc<ApiState>>) -> Json<Vec<DebugExchange>> {
    let mut exchanges = Vec::with_capacity(DEBUG_QUERIES.len());

    for query in DEBUG_QUERIES {
        debug!("Debug query: {}", query);
        let response = state.handler.handle(Origin::Website, DEBUG_SENDER, query).await;
        exchanges.push(DebugExchange {
            query: query.to_string(),
            response,
        });
    }

    Json(exchanges)
}

/// List stored appointments, optionally filtered by phone and status
pub async fn list_appointments(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<AppointmentsQuery>,
) -> Result<Json<Vec<AppointmentRecord>>, (StatusCode, Json<ErrorResponse>)> {
    let status = match params.status.as_deref() {
        Some(value) => match AppointmentStatus::parse(value) {
            Some(status) => Some(status),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Unknown status: {}", value),
                    }),
                ));
            }
        },
        None => None,
    };

    match state.store.appointments(params.phone.as_deref(), status) {
        Ok(appointments) => Ok(Json(appointments)),
        Err(e) => {
            error!("Failed to list appointments: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hc_core::{MessageHandler, RecordStore};

    struct CannedHandler;

    #[async_trait]
    impl MessageHandler for CannedHandler {
        async fn handle(&self, _origin: Origin, _sender: &str, text: &str) -> String {
            format!("reply to {}", text)
        }
    }

    fn test_state() -> (tempfile::TempDir, Arc<ApiState>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordStore::new(dir.path().join("test.db")).unwrap());
        let state = Arc::new(ApiState {
            handler: Arc::new(CannedHandler),
            store,
        });
        (dir, state)
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "OK");
    }

    #[tokio::test]
    async fn test_debug_chat_runs_every_canned_query() {
        let (_dir, state) = test_state();
        let Json(exchanges) = debug_chat(State(state)).await;

        assert_eq!(exchanges.len(), DEBUG_QUERIES.len());
        assert_eq!(exchanges[0].query, "hello");
        assert_eq!(exchanges[0].response, "reply to hello");
    }

    #[tokio::test]
    async fn test_list_appointments_filters() {
        let (_dir, state) = test_state();
        state
            .store
            .save_appointment(
                "+971501234567",
                "Basic Health Check Up",
                "2025-03-02",
                "9:00 AM",
                AppointmentStatus::Confirmed,
            )
            .unwrap();

        let Json(all) = list_appointments(
            State(state.clone()),
            Query(AppointmentsQuery {
                phone: None,
                status: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(all.len(), 1);

        let Json(confirmed) = list_appointments(
            State(state.clone()),
            Query(AppointmentsQuery {
                phone: Some("+971501234567".to_string()),
                status: Some("Confirmed".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(confirmed.len(), 1);

        let err = list_appointments(
            State(state),
            Query(AppointmentsQuery {
                phone: None,
                status: Some("Bogus".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}
