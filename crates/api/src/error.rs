//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bundle::{BundleError, BundleFailure, BundleState};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No valid credential was presented.
    Unauthenticated(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// The bundle workflow did not complete.
    Bundle(BundleFailure),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated(msg) => {
                simple(StatusCode::UNAUTHORIZED, &msg)
            }
            ApiError::BadRequest(msg) => simple(StatusCode::BAD_REQUEST, &msg),
            ApiError::NotFound(msg) => simple(StatusCode::NOT_FOUND, &msg),
            ApiError::Bundle(failure) => failure_response(failure),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                simple(StatusCode::INTERNAL_SERVER_ERROR, &msg)
            }
        }
    }
}

fn simple(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, axum::Json(body)).into_response()
}

/// Maps a structured bundle failure to a status and a body that names the
/// failed step and the compensation outcome, so the caller knows exactly
/// what state the system is in.
fn failure_response(failure: BundleFailure) -> Response {
    // A failed rollback leaves orphans behind; that is a server-side
    // condition no matter what tripped the step itself.
    let status = if failure.state == BundleState::CompensationFailed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        match &failure.error {
            BundleError::Validation(_) => StatusCode::BAD_REQUEST,
            BundleError::Authorization(_) => StatusCode::FORBIDDEN,
            BundleError::NotFound { .. } => StatusCode::NOT_FOUND,
            BundleError::Conflict(_) => StatusCode::CONFLICT,
            BundleError::Downstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    };

    let mut body = serde_json::json!({
        "error": failure.error.to_string(),
        "state": failure.state.as_str(),
    });

    if let Some(step) = failure.step {
        body["step"] = serde_json::json!(step.as_str());
    }
    if let Some(violations) = failure.error.violations() {
        body["details"] = serde_json::json!(violations);
    }
    if let Some(report) = &failure.compensation {
        body["compensation"] = serde_json::to_value(report)
            .unwrap_or_else(|_| serde_json::json!("unserializable"));
    }

    (status, axum::Json(body)).into_response()
}

impl From<BundleFailure> for ApiError {
    fn from(failure: BundleFailure) -> Self {
        ApiError::Bundle(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle::{CompensationOutcome, CompensationReport, Step, Violation};

    #[test]
    fn test_validation_failure_is_bad_request() {
        let failure = BundleFailure::rejected(BundleError::Validation(vec![Violation::new(
            "order.items",
            "must not be empty",
        )]));
        let response = ApiError::Bundle(failure).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflict_failure_is_conflict() {
        let failure = BundleFailure::at_step(
            Step::CheckConsistency,
            BundleError::Conflict("client mismatch".into()),
        );
        let response = ApiError::Bundle(failure).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_compensated_downstream_failure_is_internal() {
        let failure = BundleFailure::compensated(
            Step::CreateItems,
            BundleError::Downstream("insert failed".into()),
            CompensationReport {
                outcome: CompensationOutcome::Compensated,
                compensated: vec![],
                orphaned: vec![],
            },
        );
        let response = ApiError::Bundle(failure).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_compensation_failure_is_internal_even_for_conflict() {
        let failure = BundleFailure::compensated(
            Step::AnchorLead,
            BundleError::Conflict("stale status".into()),
            CompensationReport {
                outcome: CompensationOutcome::Failed,
                compensated: vec![],
                orphaned: vec![],
            },
        );
        let response = ApiError::Bundle(failure).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthenticated_is_401() {
        let response = ApiError::Unauthenticated("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
