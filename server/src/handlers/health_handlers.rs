// Health check endpoint

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{state::AppState, types::StatusMsg};

pub(crate) async fn health_handler(State(state): State<AppState>) -> Response {
    match state.text_files.ping().await {
        Ok(()) => Json(StatusMsg {
            status: "UP",
            service_name: Some(state.metadata.service_name),
        })
        .into_response(),
        Err(error) => {
            warn!(error = %error, "health probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StatusMsg {
                    status: "DOWN",
                    service_name: None,
                }),
            )
                .into_response()
        }
    }
}
