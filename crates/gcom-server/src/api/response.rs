//! JSON response envelope and error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{PlanError, StoreError};
use crate::pipeline::PipelineFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseType {
    Error,
    Message,
}

/// Body of every non-entity response.
#[derive(Debug, Serialize)]
pub struct JsonResponse {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    pub message: String,
}

impl JsonResponse {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            kind: ResponseType::Message,
            message: message.into(),
        })
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: JsonResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: ResponseType, message: impl Into<String>) -> Self {
        Self {
            status,
            body: JsonResponse {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ResponseType::Error, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ResponseType::Error, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, ResponseType::Error, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NonSentinelIdentifier { .. } | StoreError::UncreatedIdentifier { .. } => {
                Self::bad_request(err.to_string())
            }
            StoreError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, ResponseType::Error, err.to_string())
            }
            StoreError::Io(_) => {
                tracing::error!("Storage failure: {}", err);
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<PipelineFailure> for ApiError {
    fn from(failure: PipelineFailure) -> Self {
        match failure.error {
            PlanError::Store(err) => err.into(),
            PlanError::Resolve(_) => Self::bad_request(failure.to_string()),
            _ => Self::internal(failure.to_string()),
        }
    }
}

/// Outbound collaborator failures.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Upstream request failed: {:#}", err);
        Self::internal(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EntityKind;
    use crate::pipeline::PipelineStage;
    use gcom_core::ResolveError;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (
                StoreError::NonSentinelIdentifier {
                    kind: EntityKind::Waypoint,
                    id: 4,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::UncreatedIdentifier {
                    kind: EntityKind::Route,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::NotFound {
                    kind: EntityKind::Route,
                },
                StatusCode::NOT_FOUND,
            ),
            (StoreError::Io(sqlx::Error::PoolClosed), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn resolve_failure_is_a_bad_request() {
        let failure = PipelineFailure {
            stage: PipelineStage::BuildingInput,
            error: PlanError::Resolve(ResolveError::UnknownWaypoint {
                route_number: 3,
                name: "nowhere".to_string(),
            }),
        };

        let err = ApiError::from(failure);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.kind, ResponseType::Error);
        assert!(err.body.message.contains("nowhere"));
    }

    #[test]
    fn envelope_serializes_type_field() {
        let body = serde_json::to_value(JsonResponse {
            kind: ResponseType::Message,
            message: "ok".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"type": "Message", "message": "ok"}));
    }
}
