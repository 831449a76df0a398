//! Request body extractor accepting JSON or URL-encoded forms.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, header};
use axum::{Form, Json};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// A request body decoded from JSON, or from a form when the request is
/// `application/x-www-form-urlencoded`.
///
/// An empty body decodes as an empty object whatever the content type,
/// so a bodiless update is a no-op patch. Any decoding failure becomes
/// [`ApiError::Validation`] carrying the decoder's message, so a bad body
/// is always a 400.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let kind = BodyKind::of(req.headers());

        if kind == BodyKind::Form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_slice(b"{}")
                .map(Self)
                .map_err(|e| ApiError::Validation(e.to_string()));
        }

        if kind != BodyKind::Json {
            return Err(ApiError::Validation(String::from(
                "Expected request with `Content-Type: application/json`",
            )));
        }

        let Json(value) = Json::<T>::from_bytes(&bytes)
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    /// Classify by media type: `application/json` or any `application/*+json`
    /// is JSON, and parameters such as `charset` are ignored.
    fn of(headers: &HeaderMap) -> Self {
        let Some(content_type) = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        else {
            return Self::Other;
        };

        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.strip_prefix("application/") {
            Some("x-www-form-urlencoded") => Self::Form,
            Some(subtype) if subtype == "json" || subtype.ends_with("+json") => Self::Json,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn kind(content_type: &'static str) -> BodyKind {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        BodyKind::of(&headers)
    }

    #[test]
    fn classifies_content_types() {
        assert_eq!(kind("application/json"), BodyKind::Json);
        assert_eq!(kind("application/json; charset=utf-8"), BodyKind::Json);
        assert_eq!(kind("Application/JSON"), BodyKind::Json);
        assert_eq!(kind("application/merge-patch+json"), BodyKind::Json);
        assert_eq!(kind("application/x-www-form-urlencoded"), BodyKind::Form);
        assert_eq!(kind("text/plain"), BodyKind::Other);
        assert_eq!(BodyKind::of(&HeaderMap::new()), BodyKind::Other);
    }
}
