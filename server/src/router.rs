// Router configuration

use axum::{Router, http::Method, routing::get};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{health_handlers::*, textfile_handlers::*},
    observability,
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Text files
        .route(
            "/msapi/textfile/",
            get(get_text_file_handler).post(replace_text_file_handler),
        )
        .route(
            "/msapi/textfile",
            get(get_text_file_handler).post(replace_text_file_handler),
        )
        .route("/msapi/textfile/swagger", get(get_text_file_handler))
        .route("/msapi/textfile/swagger/", get(get_text_file_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(observability::http_make_span())
                .on_response(observability::response_logger()),
        )
        .layer(cors)
        .layer(observability::request_context_layer())
        .with_state(state)
}
