use axum::{
    body::Body,
    extract::State,
    http::{Request, header::CONTENT_LENGTH},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    error::{ErrorBody, ErrorDetail},
    state::SharedState,
};

/// Swap the generic 500 body for the full error chain outside production.
pub async fn render_error_detail(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let Some(ErrorDetail(detail)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if state.config().environment.is_production() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    match serde_json::to_vec(&ErrorBody::new(detail)) {
        Ok(bytes) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            warn!(error = %err, "failed to render error detail");
            Response::from_parts(parts, body)
        }
    }
}
