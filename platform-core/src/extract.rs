//! Request extractors shared by the platform's services.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// `axum::Json` under the platform's error contract: a body that fails to
/// deserialize (missing fields, wrong types, bad syntax) is a 400 with the
/// standard `{ error }` shape rather than axum's stock 422 rejection.
#[derive(Debug)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(AppError::BadRequest(anyhow::anyhow!(
                "{}",
                rejection.body_text()
            ))),
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{self, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Payload {
        order_id: String,
        payment_id: String,
    }

    fn json_request(body: &'static str) -> Request {
        http::Request::builder()
            .method("POST")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_fields_reject_with_bad_request() {
        let request = json_request(r#"{ "order_id": "order_1" }"#);

        let err = Json::<Payload>::from_request(request, &())
            .await
            .expect_err("deserialization should fail");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_rejects_with_bad_request() {
        let request = json_request("{ not json");

        let err = Json::<Payload>::from_request(request, &())
            .await
            .expect_err("parse should fail");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn valid_body_extracts() {
        let request =
            json_request(r#"{ "order_id": "order_1", "payment_id": "pay_1" }"#);

        let Json(payload) = Json::<Payload>::from_request(request, &())
            .await
            .expect("extraction should succeed");
        assert_eq!(payload.order_id, "order_1");
    }
}
