use axum::{
    extract::{FromRequest, Request},
    Json,
};

use crate::error::QuizError;

/// JSON extractor whose rejections use the same `{"error", "status"}` body as
/// every other client error.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = QuizError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(QuizError::invalid_request(format!(
                "Failed to parse JSON request body: {}",
                rejection.body_text()
            ))),
        }
    }
}
