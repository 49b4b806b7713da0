//! Translation of outcomes into HTTP responses.
//!
//! This is the only module that knows status codes. Resolver, serializer and
//! handlers report typed outcomes; everything here turns them into
//! `http::Response<Bytes>` with an [`ErrorEnvelope`] body.

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE, WWW_AUTHENTICATE};
use http::{Method, Response, StatusCode};
use portico_core::{
    ApiError, AuthFailure, AuthenticationError, ErrorCategory, ErrorEnvelope,
    HandlerContractError,
};
use portico_extract::{MultipartError, PartsError, ResolveError};

use crate::serialize::Serialized;

/// Error code of request validation failures.
pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";

/// Error code of malformed request input (unparseable JSON).
pub const MALFORMED_REQUEST: &str = "MALFORMED_REQUEST";

/// Error code of oversized bodies.
pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";

/// Error code of contract violations by handlers.
pub const RESPONSE_CONTRACT_VIOLATION: &str = "RESPONSE_CONTRACT_VIOLATION";

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";

/// Default status for an error category.
#[must_use]
pub const fn category_status(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
        ErrorCategory::Authorization => StatusCode::FORBIDDEN,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Status for a failed resolution.
///
/// Validation failures are `422`, or `400` when any of them is a
/// `parse_error`.
#[must_use]
pub fn resolve_status(error: &ResolveError) -> StatusCode {
    match error {
        ResolveError::Validation(_) if error.has_parse_error() => StatusCode::BAD_REQUEST,
        ResolveError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ResolveError::Authentication(auth) => auth_status(auth),
        ResolveError::Dependency { error, .. } => category_status(error.category()),
        ResolveError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
    }
}

fn auth_status(error: &AuthenticationError) -> StatusCode {
    match error.kind {
        AuthFailure::Unauthorized => StatusCode::UNAUTHORIZED,
        AuthFailure::Forbidden => StatusCode::FORBIDDEN,
    }
}

/// Response for a failed resolution.
#[must_use]
pub fn resolve_error_response(error: &ResolveError) -> Response<Bytes> {
    let status = resolve_status(error);
    match error {
        ResolveError::Validation(failures) => {
            let code = if error.has_parse_error() {
                MALFORMED_REQUEST
            } else {
                VALIDATION_FAILED
            };
            let envelope = ErrorEnvelope::new(
                code,
                "Request validation failed",
                ErrorCategory::Validation,
            )
            .with_details(serde_json::to_value(failures).unwrap_or_default());
            envelope_response(status, &envelope)
        }
        ResolveError::Authentication(auth) => {
            let category = match auth.kind {
                AuthFailure::Unauthorized => ErrorCategory::Authentication,
                AuthFailure::Forbidden => ErrorCategory::Authorization,
            };
            let code = match auth.kind {
                AuthFailure::Unauthorized => "AUTHENTICATION_ERROR",
                AuthFailure::Forbidden => "AUTHORIZATION_DENIED",
            };
            let mut response =
                envelope_response(status, &ErrorEnvelope::new(code, &auth.message, category));
            if let Some(challenge) = auth
                .challenge
                .as_deref()
                .and_then(|c| HeaderValue::from_str(c).ok())
            {
                response.headers_mut().insert(WWW_AUTHENTICATE, challenge);
            }
            response
        }
        ResolveError::Dependency { error, .. } => api_error_response(error),
        ResolveError::PayloadTooLarge { limit, actual } => {
            let envelope = ErrorEnvelope::new(
                PAYLOAD_TOO_LARGE,
                error.to_string(),
                ErrorCategory::Validation,
            )
            .with_details(serde_json::json!({ "limit": limit, "actual": actual }));
            envelope_response(status, &envelope)
        }
    }
}

/// Response for an error a handler or provider raised on purpose.
#[must_use]
pub fn api_error_response(error: &ApiError) -> Response<Bytes> {
    envelope_response(category_status(error.category()), &error.to_envelope())
}

/// Response for a handler that broke its contract.
///
/// The failures stay in the server log; the client gets a generic `500`.
#[must_use]
pub fn contract_error_response(_error: &HandlerContractError) -> Response<Bytes> {
    let envelope = ErrorEnvelope::new(
        RESPONSE_CONTRACT_VIOLATION,
        "Internal server error",
        ErrorCategory::Internal,
    );
    envelope_response(StatusCode::INTERNAL_SERVER_ERROR, &envelope)
}

/// Response for a serialized handler result.
///
/// # Errors
///
/// Returns [`HandlerContractError::Serialization`] if the body cannot be
/// encoded.
pub fn success_response(serialized: &Serialized) -> Result<Response<Bytes>, HandlerContractError> {
    // Status codes are range-checked when the endpoint is registered.
    let status = StatusCode::from_u16(serialized.status).unwrap_or(StatusCode::OK);
    let body = serialized.to_bytes()?;
    let mut response = Response::new(body);
    *response.status_mut() = status;
    if serialized.body.is_some() {
        response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    }
    Ok(response)
}

/// Response for a request that could not be buffered into parts.
///
/// Oversized multipart forms are `413`; every other defect is `400`.
#[must_use]
pub fn parts_error_response(error: &PartsError) -> Response<Bytes> {
    let (status, code) = match error {
        PartsError::Multipart(
            MultipartError::FieldTooLarge { .. } | MultipartError::TooManyFields { .. },
        ) => (StatusCode::PAYLOAD_TOO_LARGE, PAYLOAD_TOO_LARGE),
        _ => (StatusCode::BAD_REQUEST, MALFORMED_REQUEST),
    };
    envelope_response(
        status,
        &ErrorEnvelope::new(code, error.to_string(), ErrorCategory::Validation),
    )
}

/// `404` for a path no endpoint matches.
#[must_use]
pub fn not_found_response(path: &str) -> Response<Bytes> {
    envelope_response(
        StatusCode::NOT_FOUND,
        &ErrorEnvelope::new("NOT_FOUND", format!("no route for {path}"), ErrorCategory::NotFound),
    )
}

/// `405` listing the methods the path does accept.
#[must_use]
pub fn method_not_allowed_response(method: &Method, allowed: &[Method]) -> Response<Bytes> {
    let mut response = envelope_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorEnvelope::new(
            "METHOD_NOT_ALLOWED",
            format!("method {method} is not allowed"),
            ErrorCategory::NotFound,
        ),
    );
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// `200` with a JSON body that is already encoded.
#[must_use]
pub fn json_response(body: impl Into<Bytes>) -> Response<Bytes> {
    let mut response = Response::new(body.into());
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    response
}

/// `200` with an HTML page.
#[must_use]
pub fn html_response(body: impl Into<Bytes>) -> Response<Bytes> {
    let mut response = Response::new(body.into());
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(HTML));
    response
}

fn envelope_response(status: StatusCode, envelope: &ErrorEnvelope) -> Response<Bytes> {
    let body = serde_json::to_vec(envelope).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{ParamSource, ValidationFailure};
    use serde_json::Value;

    fn body(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_validation_is_422() {
        let err = ResolveError::Validation(vec![
            ValidationFailure::type_error(vec!["item_id".into()], "value is not a valid integer")
                .at(ParamSource::Path),
        ]);
        let response = resolve_error_response(&err);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body(&response);
        assert_eq!(json["error"]["code"], VALIDATION_FAILED);
        assert_eq!(json["error"]["category"], "validation");
        assert_eq!(json["error"]["details"][0]["field_path"], serde_json::json!(["item_id"]));
        assert_eq!(json["error"]["details"][0]["kind"], "type_error");
    }

    #[test]
    fn test_parse_error_is_400() {
        let err = ResolveError::Validation(vec![
            ValidationFailure::parse_error(vec!["item".into()], "JSON decode error")
                .at(ParamSource::Body),
            ValidationFailure::missing(vec!["q".into()]).at(ParamSource::Query),
        ]);
        let response = resolve_error_response(&err);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&response)["error"]["code"], MALFORMED_REQUEST);
    }

    #[test]
    fn test_authentication_statuses() {
        let err: ResolveError = AuthenticationError::unauthorized("Not authenticated")
            .with_challenge("Bearer")
            .into();
        let response = resolve_error_response(&err);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");

        let err: ResolveError = AuthenticationError::forbidden("Not enough permissions").into();
        let response = resolve_error_response(&err);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
        assert_eq!(body(&response)["error"]["category"], "authorization");
    }

    #[test]
    fn test_dependency_uses_category() {
        let err = ResolveError::Dependency {
            name: "db".to_string(),
            error: ApiError::unavailable("database is down"),
        };
        assert_eq!(resolve_status(&err), StatusCode::SERVICE_UNAVAILABLE);

        let err = ResolveError::Dependency {
            name: "db".to_string(),
            error: ApiError::internal("boom"),
        };
        assert_eq!(resolve_status(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_payload_too_large() {
        let err = ResolveError::PayloadTooLarge {
            limit: 10,
            actual: 20,
        };
        let response = resolve_error_response(&err);
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body(&response)["error"]["details"]["limit"], 10);
    }

    #[test]
    fn test_api_error_categories() {
        assert_eq!(
            api_error_response(&ApiError::not_found("item 3")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            api_error_response(&ApiError::conflict("taken")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            category_status(ErrorCategory::Validation),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_contract_error_hides_details() {
        let response = contract_error_response(&HandlerContractError::MissingBody);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body(&response);
        assert_eq!(json["error"]["code"], RESPONSE_CONTRACT_VIOLATION);
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_success_without_body() {
        let response = success_response(&Serialized {
            status: 204,
            body: None,
        })
        .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_parts_errors() {
        let err = PartsError::InvalidHeader("x y".to_string());
        assert_eq!(parts_error_response(&err).status(), StatusCode::BAD_REQUEST);

        let err = PartsError::Multipart(MultipartError::TooManyFields { max: 2 });
        let response = parts_error_response(&err);
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body(&response)["error"]["code"], PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let response = method_not_allowed_response(&Method::DELETE, &[Method::GET, Method::POST]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");
    }
}
