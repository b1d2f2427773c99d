use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Json, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::Stage;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Unwraps a JSON body, reporting malformed input as a validation error
/// instead of axum's plain-text rejection.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))
}

pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ServiceError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))
}

/// Unparseable ids cannot name a visible order.
pub fn parse_order_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::NotFound(format!("Order {} not found", raw)))
}

pub fn parse_stage(raw: &str) -> Result<Stage, ServiceError> {
    raw.parse::<Stage>()
        .map_err(|_| ServiceError::NotFound(format!("Unknown stage '{}'", raw)))
}

/// Reads the optional `If-Match` header as an order version. Quotes and a
/// weak-validator prefix are tolerated.
pub fn expected_version(headers: &HeaderMap) -> Result<Option<u64>, ServiceError> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| ServiceError::ValidationError("If-Match must be ASCII".to_string()))?;
    let trimmed = raw.trim().trim_start_matches("W/").trim_matches('"');

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ServiceError::ValidationError(format!("If-Match '{}' is not a version", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    #[test]
    fn if_match_accepts_plain_and_quoted_versions() {
        let mut headers = HeaderMap::new();
        assert_eq!(expected_version(&headers).unwrap(), None);

        headers.insert(header::IF_MATCH, HeaderValue::from_static("3"));
        assert_eq!(expected_version(&headers).unwrap(), Some(3));

        headers.insert(header::IF_MATCH, HeaderValue::from_static("W/\"7\""));
        assert_eq!(expected_version(&headers).unwrap(), Some(7));

        headers.insert(header::IF_MATCH, HeaderValue::from_static("abc"));
        assert_matches!(expected_version(&headers), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn stage_paths_use_kebab_case() {
        assert_eq!(parse_stage("wetman-entry").unwrap(), Stage::WetmanEntry);
        assert_matches!(parse_stage("wetman_entry"), Err(ServiceError::NotFound(_)));
    }

    #[test]
    fn malformed_order_id_is_not_found() {
        assert_matches!(parse_order_id("nope"), Err(ServiceError::NotFound(_)));
    }
}
