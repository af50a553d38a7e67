use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::{DatabaseError, Row};
use crate::error::ApiError;

/// A row of the `duties` table. `name` may be NULL when the table allows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

impl TryFrom<Row> for Duty {
    type Error = DatabaseError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::Object(row))
            .map_err(|e| DatabaseError::UnexpectedRow(e.to_string()))
    }
}

impl Duty {
    pub fn from_rows(rows: Vec<Row>) -> Result<Vec<Duty>, DatabaseError> {
        rows.into_iter().map(Duty::try_from).collect()
    }
}

/// Request body for create and update.
///
/// A missing or null `name` is passed to the store as NULL, and so is a
/// request without a body or without a content type. A body declared as JSON
/// must be a JSON object with an optional string `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DutyInput {
    #[serde(default)]
    pub name: Option<String>,
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

#[async_trait]
impl<S> FromRequest<S> for DutyInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let has_content_type = req.headers().contains_key(header::CONTENT_TYPE);
        let is_json = is_json_content_type(req.headers());

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::rejected(rejection.status(), rejection.body_text()))?;

        if bytes.is_empty() || !has_content_type {
            return Ok(Self::default());
        }
        if !is_json {
            return Err(ApiError::rejected(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Expected request with `Content-Type: application/json`",
            ));
        }

        let Json(input) = Json::<DutyInput>::from_bytes(&bytes)
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(input)
    }
}
