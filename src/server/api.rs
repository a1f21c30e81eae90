use crate::gateway::Gateway;
use crate::models::chat::{ ChatReply, ConversationRequest, ErrorReply };
use std::convert::Infallible;
use axum::{
    body::{ Body, Bytes },
    extract::State,
    http::{ header, StatusCode },
    response::{ IntoResponse, Response },
    routing::post,
    Json,
    Router,
};
use futures::StreamExt;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::ServeDir;
use log::{ info, error };

pub const EMPTY_USER_MESSAGE: &str = "Empty user message";

#[derive(Clone)]
struct AppState {
    gateway: Gateway,
}

/// `/chat`, `/chat_stream`, and the static client under everything else.
pub fn build_router(gateway: Gateway, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat_stream", post(chat_stream_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(AppState { gateway })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorReply::new(message))).into_response()
}

/// Parses the body as JSON regardless of `Content-Type` and rejects blank
/// user messages. Returns the request with its trimmed user text.
fn validate(body: &Bytes) -> Result<(ConversationRequest, String), Response> {
    let request: ConversationRequest = serde_json
        ::from_slice(body)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)))?;

    let user_text = request.user.trim().to_string();
    if user_text.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, EMPTY_USER_MESSAGE));
    }
    Ok((request, user_text))
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let (request, user_text) = match validate(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    info!(
        "POST /chat → model={} history={} user_chars={}",
        state.gateway.model(),
        request.history.len(),
        user_text.chars().count()
    );

    match state.gateway.reply(&request.history, &user_text).await {
        Ok(reply) => (StatusCode::OK, Json(ChatReply { reply })).into_response(),
        Err(e) => {
            error!("Generation failed for /chat: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn chat_stream_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let (request, user_text) = match validate(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    info!(
        "POST /chat_stream → model={} history={} user_chars={}",
        state.gateway.model(),
        request.history.len(),
        user_text.chars().count()
    );

    match state.gateway.reply_stream(&request.history, &user_text).await {
        Ok(fragments) => {
            let body = Body::from_stream(fragments.map(Ok::<_, Infallible>));
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                body,
            ).into_response()
        }
        Err(e) => {
            error!("Generation stream failed to start: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
