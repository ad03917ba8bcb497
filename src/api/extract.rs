use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use serde::de::DeserializeOwned;

use crate::api::errors::ApiError;

/// `Json` whose rejections are reported through the standard error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct ApiJson<T>(pub(crate) T);

/// `Query` with the same error envelope as [`ApiJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub(crate) struct ApiQuery<T>(pub(crate) T);

/// JSON body that may be omitted entirely; an empty body yields `T::default()`.
#[derive(Debug)]
pub(crate) struct OptionalJson<T>(pub(crate) T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|err| ApiError::BadRequest(format!("Invalid JSON body: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Notes {
        #[serde(default)]
        notes: Option<String>,
    }

    async fn extract(body: &'static str) -> Result<Notes, ApiError> {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(body))
            .unwrap();
        OptionalJson::<Notes>::from_request(request, &()).await.map(|OptionalJson(value)| value)
    }

    #[tokio::test]
    async fn empty_body_uses_default() {
        assert_eq!(extract("").await.unwrap(), Notes::default());
        assert_eq!(extract("  \n").await.unwrap(), Notes::default());
    }

    #[tokio::test]
    async fn present_body_is_parsed_and_garbage_rejected() {
        let parsed = extract(r#"{"notes":"ok"}"#).await.unwrap();
        assert_eq!(parsed.notes.as_deref(), Some("ok"));
        assert!(matches!(extract("{not json").await, Err(ApiError::BadRequest(_))));
    }
}
