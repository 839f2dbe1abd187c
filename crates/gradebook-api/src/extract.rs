use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// `Json<T>` whose rejection renders as an [`ApiError::BadRequest`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection_message(&rejection))),
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    format!("Invalid request body: {}", rejection.body_text())
}

/// Trimmed, non-empty value of an optional request field.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Like [`present`], but a missing value becomes a 400 with `message`.
pub fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, ApiError> {
    present(value).ok_or_else(|| ApiError::bad_request(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_skips_blank() {
        assert_eq!(present(&Some("  Ada ".into())), Some("Ada"));
        assert_eq!(present(&Some("   ".into())), None);
        assert_eq!(present(&None), None);
    }

    #[test]
    fn test_required_reports_message() {
        let err = required(&None, "Name cannot be empty").unwrap_err();
        assert_eq!(err.to_string(), "Name cannot be empty");
    }
}
