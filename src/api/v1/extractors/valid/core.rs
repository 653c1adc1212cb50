use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::{HeaderMap, header, request::Parts};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use validator::Validate;

use crate::error::{AppError, Violation};

use super::violations::flatten;

/// A DTO that can be checked as one request part.
///
/// `normalize` runs after deserialization and before validation
/// (trim, case-fold); the handler sees the normalized value.
pub trait RequestSchema: DeserializeOwned + Validate + Send {
    fn normalize(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPart {
    Query,
    Body,
    Path,
}

impl RequestPart {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Body => "body",
            Self::Path => "path",
        }
    }
}

fn check<T: RequestSchema>(part: RequestPart, mut value: T) -> Result<T, AppError> {
    value.normalize();

    if let Err(errors) = value.validate() {
        let violations = flatten(part.as_str(), &errors);
        tracing::debug!(part = part.as_str(), count = violations.len(), "request rejected");
        return Err(AppError::validation(violations));
    }

    Ok(value)
}

// Unparseable input (bad syntax, wrong content type) is reported on the part itself.
fn malformed(part: RequestPart, message: String) -> AppError {
    tracing::debug!(part = part.as_str(), %message, "malformed request part");
    AppError::validation(vec![Violation::new(part.as_str(), message)])
}

// Shape errors point at the field that failed: `query.to`, `body.carriers[1]`.
fn misshapen<E: std::fmt::Display>(
    part: RequestPart,
    err: serde_path_to_error::Error<E>,
) -> AppError {
    let message = err.inner().to_string();
    let path = located(part, &err.path().to_string(), &message);
    tracing::debug!(part = part.as_str(), %path, %message, "request part has wrong shape");
    AppError::validation(vec![Violation::new(path, message)])
}

fn located(part: RequestPart, at: &str, message: &str) -> String {
    let mut path = part.as_str().to_string();
    // "." is the root of the part
    if at != "." {
        if !at.starts_with('[') {
            path.push('.');
        }
        path.push_str(at);
    }
    // serde reports a missing field on its parent
    if let Some(field) = missing_field(message) {
        path.push('.');
        path.push_str(field);
    }
    path
}

fn missing_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next().filter(|f| !f.is_empty())
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Validated query string.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: RequestSchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts.uri.query().unwrap_or_default();
        let de = serde_urlencoded::Deserializer::new(form_urlencoded::parse(raw.as_bytes()));
        let value: T = serde_path_to_error::deserialize(de)
            .map_err(|err| misshapen(RequestPart::Query, err))?;

        check(RequestPart::Query, value).map(ValidQuery)
    }
}

/// Validated path parameters.
#[derive(Debug)]
pub struct ValidPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: RequestSchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rej| malformed(RequestPart::Path, rej.body_text()))?;

        check(RequestPart::Path, value).map(ValidPath)
    }
}

/// Validated JSON body.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: RequestSchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Err(malformed(
                RequestPart::Body,
                "expected `Content-Type: application/json`".to_string(),
            ));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rej| malformed(RequestPart::Body, rej.body_text()))?;

        let mut de = serde_json::Deserializer::from_slice(&bytes);
        let value: T = match serde_path_to_error::deserialize(&mut de) {
            Ok(value) => value,
            Err(err) if err.inner().classify() == Category::Data => {
                return Err(misshapen(RequestPart::Body, err));
            }
            Err(err) => return Err(malformed(RequestPart::Body, err.inner().to_string())),
        };
        de.end()
            .map_err(|err| malformed(RequestPart::Body, err.to_string()))?;

        check(RequestPart::Body, value).map(ValidJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_reported_under_its_parent() {
        assert_eq!(
            located(RequestPart::Query, ".", "missing field `to`"),
            "query.to"
        );
        assert_eq!(
            located(RequestPart::Body, "filter", "missing field `from` at line 1 column 14"),
            "body.filter.from"
        );
    }

    #[test]
    fn wrong_type_points_at_the_field() {
        assert_eq!(
            located(RequestPart::Query, "client_id", "invalid digit found in string"),
            "query.client_id"
        );
        assert_eq!(
            located(RequestPart::Body, "carriers[1]", "invalid type: integer `3`"),
            "body.carriers[1]"
        );
    }

    #[test]
    fn root_errors_stay_on_the_part() {
        assert_eq!(
            located(RequestPart::Body, ".", "unknown field `amount`, expected `status`"),
            "body"
        );
    }

    #[test]
    fn json_content_types() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(header::CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(is_json(&headers));
        headers.insert(header::CONTENT_TYPE, "application/problem+json".parse().unwrap());
        assert!(is_json(&headers));
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json(&headers));
    }
}
